// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::constants::CONTAINER_TAG_ENV_VARS;
use crate::errors;
use crate::metric::Metric;
use crate::processors::MetricProcessor;

/// Injects container and Kubernetes tags captured once from the environment.
#[derive(Debug, Clone, Default)]
pub struct ContainerTags {
    tags: Vec<(String, String)>,
}

impl ContainerTags {
    /// Keeps only non-empty values so metrics collected outside of a container
    /// are left alone.
    pub fn new(tags: Vec<(String, String)>) -> Self {
        Self {
            tags: tags.into_iter().filter(|(_, v)| !v.is_empty()).collect(),
        }
    }

    /// Builds the tag set from an environment lookup, e.g. `|k| std::env::var(k).ok()`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::new(
            CONTAINER_TAG_ENV_VARS
                .iter()
                .filter_map(|(env_var, tag)| lookup(env_var).map(|v| ((*tag).to_string(), v)))
                .collect(),
        )
    }

    pub fn tags(&self) -> &[(String, String)] {
        &self.tags
    }
}

impl MetricProcessor for ContainerTags {
    fn name(&self) -> &'static str {
        "container"
    }

    fn process(&self, metric: &mut Metric) -> Result<(), errors::Processor> {
        for (tag, value) in &self.tags {
            metric.add_tag(tag, value);
        }
        Ok(())
    }
}
