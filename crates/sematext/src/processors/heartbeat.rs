// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::constants::{HEARTBEAT_FIELD_NAME, HEARTBEAT_METRIC_NAME};
use crate::errors;
use crate::metric::{Metric, MetricKind};
use crate::processors::BatchProcessor;
use crate::util::{epoch_minute, epoch_nanos};
use std::sync::Mutex;
use std::time::SystemTime;
use tracing::debug;

/// Appends a `heartbeat` metric to the batch at most once per wall-clock minute.
///
/// The heartbeat is always stamped with the current time rather than with the
/// batch timestamps, so a batch resent after a failed flush never carries a stale
/// heartbeat.
#[derive(Debug, Default)]
pub struct Heartbeat {
    last_injected_minute: Mutex<i64>,
}

impl Heartbeat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process_at(
        &self,
        mut metrics: Vec<Metric>,
        now: SystemTime,
    ) -> Result<Vec<Metric>, errors::Processor> {
        let current_minute = epoch_minute(now);
        let mut last_injected_minute = self
            .last_injected_minute
            .lock()
            .map_err(|_| errors::Processor::failed(HEARTBEAT_METRIC_NAME, "lock poisoned"))?;

        if current_minute > *last_injected_minute {
            debug!("Injecting heartbeat for minute {current_minute}");
            metrics.push(build_heartbeat(now));
            *last_injected_minute = current_minute;
        }

        Ok(metrics)
    }

    #[cfg(test)]
    fn last_injected_minute(&self) -> i64 {
        *self.last_injected_minute.lock().unwrap()
    }
}

impl BatchProcessor for Heartbeat {
    fn name(&self) -> &'static str {
        HEARTBEAT_METRIC_NAME
    }

    fn process(&self, metrics: Vec<Metric>) -> Result<Vec<Metric>, errors::Processor> {
        self.process_at(metrics, SystemTime::now())
    }
}

/// No Sematext specific tags here, the metric processors run afterwards.
pub fn build_heartbeat(now: SystemTime) -> Metric {
    Metric::new(HEARTBEAT_METRIC_NAME, epoch_nanos(now), MetricKind::Gauge)
        .with_field(HEARTBEAT_FIELD_NAME, 1i64)
}
