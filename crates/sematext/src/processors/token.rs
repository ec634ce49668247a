// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::constants::TOKEN_TAG;
use crate::errors;
use crate::metric::Metric;
use crate::processors::MetricProcessor;

/// Injects the Sematext App token into each metric.
#[derive(Debug, Clone)]
pub struct Token {
    token: String,
}

impl Token {
    pub fn new(token: &str) -> Self {
        Self {
            token: token.to_string(),
        }
    }
}

impl MetricProcessor for Token {
    fn name(&self) -> &'static str {
        TOKEN_TAG
    }

    fn process(&self, metric: &mut Metric) -> Result<(), errors::Processor> {
        metric.add_tag(TOKEN_TAG, &self.token);
        Ok(())
    }
}
