// SPDX-FileCopyrightText: 2026 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use thiserror::Error;

/// Errors reported by a location provider.
///
/// A provider failure is terminal for the affected subscription but never for
/// the session: location consumption stops while the rest of the session
/// stays intact and a later restart is allowed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// The provider cannot deliver fixes at all, e.g. no hardware or no
    /// permission to use it.
    #[error("location provider unavailable: {0}")]
    Unavailable(String),

    /// The provider rejected this update request.
    #[error("location update request rejected: {0}")]
    Rejected(String),
}

/// Errors reported by the navigation engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// A status query failed. The affected poll tick is skipped and the
    /// previously known values are retained.
    #[error("navigation engine status query failed: {0}")]
    StatusQuery(String),
}

/// Errors returned by the trip session surface itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
}
