// SPDX-FileCopyrightText: 2026 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use common::location::{EnhancedLocation, RawLocation};
use common::route::{Route, RouteProgress};

/// The latest known values of an active trip.
///
/// Every field stays unset until its producer delivers a first value. Each
/// field has exactly one writer: the raw location is written by the dispatch
/// loop, enhanced location and progress by the engine poll loop, and the
/// route by the caller through `set_route`.
#[derive(Debug, Default)]
pub(crate) struct SessionState {
    pub raw_location: Option<RawLocation>,
    pub enhanced_location: Option<EnhancedLocation>,
    pub route_progress: Option<RouteProgress>,
    pub route: Option<Route>,
}
