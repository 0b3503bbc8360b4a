// SPDX-FileCopyrightText: 2026 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

mod sim;

use clap::Parser;
use common::location::{EnhancedLocation, RawLocation};
use common::position::Position;
use common::route::{Route, RouteProgress};
use sim::{DeadReckoningEngine, LoggingServiceHost, SimulatedLocationProvider};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use trip_session::{
    LocationObserver, LocationPriority, LocationRequest, RouteProgressObserver, TripSession,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Engine status poll interval in milliseconds.
    #[arg(short, long, default_value_t = 1000)]
    poll_interval_ms: u64,
    /// Interval between simulated provider fixes in milliseconds.
    #[arg(short, long, default_value_t = 250)]
    fix_interval_ms: u64,
    /// Simulated ground speed in meters per second.
    #[arg(short = 's', long, default_value_t = 13.9)]
    speed: f64,
    /// JSON file containing the route to drive. Uses a built-in demo route
    /// when absent.
    #[arg(short, long)]
    route_file: Option<String>,
    /// Stop automatically after this many seconds instead of waiting for
    /// Ctrl-C.
    #[arg(short, long)]
    duration_secs: Option<u64>,
}

struct ConsoleObserver;

impl LocationObserver for ConsoleObserver {
    fn on_raw_location_changed(&self, location: &RawLocation) {
        info!(
            "Raw fix: {:.6}, {:.6}",
            location.position.latitude, location.position.longitude
        );
    }

    fn on_enhanced_location_changed(&self, location: &EnhancedLocation) {
        info!(
            "Enhanced location: {:.6}, {:.6}",
            location.position.latitude, location.position.longitude
        );
    }
}

impl RouteProgressObserver for ConsoleObserver {
    fn on_route_progress_changed(&self, progress: &RouteProgress) {
        info!(
            "Route progress: {:.1}% done, {:.0} m remaining",
            progress.fraction_traveled * 100.0,
            progress.distance_remaining
        );
    }
}

fn demo_route(speed: f64) -> Route {
    Route::new(
        "magdeburg ring demo",
        vec![
            Position::new(52.120736, 11.627568),
            Position::new(52.122097, 11.629985),
            Position::new(52.123980, 11.633406),
            Position::new(52.126237, 11.637489),
            Position::new(52.128493, 11.641577),
        ],
        speed,
    )
}

fn load_route(cli: &Cli) -> Result<Route, ()> {
    let Some(path) = &cli.route_file else {
        return Ok(demo_route(cli.speed));
    };
    let json = std::fs::read_to_string(path).map_err(|e| {
        error!("Failed to read route file {path}. Error: {e}");
    })?;
    Route::from_json(&json).map_err(|e| {
        error!("Failed to parse route file {path}. Error: {e}");
    })
}

#[tokio::main]
async fn main() -> Result<(), ()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let route = load_route(&cli)?;
    let provider = Arc::new(SimulatedLocationProvider::new(
        route.waypoints.clone(),
        cli.speed,
    ));
    let engine = Arc::new(DeadReckoningEngine::default());
    let request = LocationRequest {
        interval: Duration::from_millis(cli.fix_interval_ms),
        priority: LocationPriority::HighAccuracy,
    };
    let session = TripSession::new(Arc::new(LoggingServiceHost), provider, request, engine)
        .with_poll_interval(Duration::from_millis(cli.poll_interval_ms));

    let observer = Arc::new(ConsoleObserver);
    session.register_location_observer(observer.clone());
    session.register_route_progress_observer(observer);

    session.set_route(Some(route)).await;
    session.start().await.map_err(|e| {
        error!("Failed to start the trip session. Error: {e}");
    })?;
    info!("Trip session running, press Ctrl-C to stop");

    match cli.duration_secs {
        Some(secs) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = tokio::time::sleep(Duration::from_secs(secs)) => {}
            }
        }
        None => {
            let _ = tokio::signal::ctrl_c().await;
        }
    }

    session.stop().await;
    Ok(())
}
