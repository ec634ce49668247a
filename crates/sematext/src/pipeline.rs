// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Ordered execution of batch and metric processors.
//!
//! Every metric leaving the pipeline carries the processed marker tag. A batch
//! made only of marked metrics (e.g. resent after a failed flush) is passed
//! through untouched, and marked metrics inside a mixed batch skip the metric
//! processors, so tokens, host tags or heartbeats are never injected twice.

use crate::errors;
use crate::metric::Metric;
use crate::processors::{BatchProcessor, MetricProcessor};
use std::sync::Arc;
use tracing::{debug, error, warn};

#[derive(Default)]
pub struct Pipeline {
    batch_processors: Vec<Arc<dyn BatchProcessor>>,
    metric_processors: Vec<Arc<dyn MetricProcessor>>,
}

impl Pipeline {
    /// Processors run in the order given here.
    pub fn new(
        batch_processors: Vec<Arc<dyn BatchProcessor>>,
        metric_processors: Vec<Arc<dyn MetricProcessor>>,
    ) -> Self {
        Self {
            batch_processors,
            metric_processors,
        }
    }

    /// Returns an error only when the whole batch has to be discarded.
    pub fn process(&self, mut metrics: Vec<Metric>) -> Result<Vec<Metric>, errors::Processor> {
        if !metrics.is_empty() && metrics.iter().all(Metric::is_processed) {
            debug!("Batch of {} metrics already processed", metrics.len());
            return Ok(metrics);
        }

        for processor in &self.batch_processors {
            metrics = processor.process(metrics).map_err(|e| {
                error!("Error while running batch processor {}: {e}", processor.name());
                e
            })?;
        }

        let mut processed = Vec::with_capacity(metrics.len());
        'metrics: for mut metric in metrics {
            if !metric.is_processed() {
                for processor in &self.metric_processors {
                    if let Err(e) = processor.process(&mut metric) {
                        warn!("Can't process metric {}, it will be dropped: {e}", metric.name);
                        continue 'metrics;
                    }
                }
                metric.mark_processed();
            }
            processed.push(metric);
        }
        Ok(processed)
    }

    pub fn close(&self) {
        for processor in &self.metric_processors {
            processor.close();
        }
        for processor in &self.batch_processors {
            processor.close();
        }
    }
}
