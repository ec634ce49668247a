// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Metric processing and serialization for the Sematext output.
//!
//! A batch of metrics coming from the collection agent goes through the
//! [`pipeline::Pipeline`] (batch processors first, then per-metric processors)
//! and is then encoded by a [`serializer::MetricSerializer`] into the Sematext
//! flavour of the Influx line protocol. [`output::SematextOutput`] ties both to
//! the HTTP [`flusher::Flusher`].

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod config;
pub mod constants;
pub mod errors;
pub mod flusher;
pub mod metric;
pub mod output;
pub mod pipeline;
pub mod processors;
pub mod serializer;
pub mod util;
