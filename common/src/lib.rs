// SPDX-FileCopyrightText: 2026 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

//! Common crate for the trip-state synchronization engine
//!
//! Provides the data types that are shared between the session engine,
//! its collaborators and its consumers.

pub mod location;
pub mod position;
pub mod route;
