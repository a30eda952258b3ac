// Copyright 2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

//! Small helpers shared across the crate.

use core::time::Duration;

/// Returns the duration since the unix epoch.
pub fn unix_timestamp_now() -> Duration {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time went backwards")
}
