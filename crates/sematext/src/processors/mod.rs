// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Processors adjusting agent metrics to what the Sematext backend expects.
//!
//! Batch processors see the whole batch and may add or remove metrics.
//! Metric processors mutate one metric at a time. Both are run by the
//! [`crate::pipeline::Pipeline`] in the order they were registered.

use crate::errors;
use crate::metric::Metric;

pub mod container;
pub mod heartbeat;
pub mod host;
pub mod metainfo;
pub mod rename;
pub mod token;

pub trait BatchProcessor: Send + Sync {
    fn name(&self) -> &'static str;

    /// Transforms the batch. An error discards the whole batch.
    fn process(&self, metrics: Vec<Metric>) -> Result<Vec<Metric>, errors::Processor>;

    /// Releases resources held by the processor.
    fn close(&self) {}
}

pub trait MetricProcessor: Send + Sync {
    fn name(&self) -> &'static str;

    /// Adjusts a single metric. An error drops only that metric.
    fn process(&self, metric: &mut Metric) -> Result<(), errors::Processor>;

    fn close(&self) {}
}
