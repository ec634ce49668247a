// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Utility functions for time conversions.

use crate::constants::SECONDS_PER_MINUTE;
use std::time::{SystemTime, UNIX_EPOCH};

/// Converts a wall-clock instant into nanoseconds since the Unix epoch.
///
/// Instants before the epoch are clamped to `0`, instants past the `i64` range
/// saturate at `i64::MAX`.
///
/// # Examples
///
/// ```
/// use sematext::util::epoch_nanos;
/// use std::time::{Duration, UNIX_EPOCH};
///
/// assert_eq!(epoch_nanos(UNIX_EPOCH + Duration::from_secs(2)), 2_000_000_000);
/// assert_eq!(epoch_nanos(UNIX_EPOCH), 0);
/// ```
pub fn epoch_nanos(instant: SystemTime) -> i64 {
    instant
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_nanos()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}

/// Returns the number of whole minutes elapsed since the Unix epoch.
///
/// # Examples
///
/// ```
/// use sematext::util::epoch_minute;
/// use std::time::{Duration, UNIX_EPOCH};
///
/// assert_eq!(epoch_minute(UNIX_EPOCH + Duration::from_secs(59)), 0);
/// assert_eq!(epoch_minute(UNIX_EPOCH + Duration::from_secs(121)), 2);
/// ```
pub fn epoch_minute(instant: SystemTime) -> i64 {
    let seconds = instant
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or_default();
    seconds / SECONDS_PER_MINUTE
}
