// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Detection of metric definitions that were never published to the Sematext
//! metainfo catalog.
//!
//! Every `(host, measurement, field)` triple is described once. New descriptors
//! are handed to the catalog publisher through an unbounded channel so that the
//! pipeline never waits on the network.

use crate::constants::AGENT_HOST_TAG;
use crate::errors;
use crate::metric::{Field, FieldValue, Metric, MetricKind};
use crate::processors::BatchProcessor;
use derive_more::Display;
use fnv::FnvHasher;
use hashbrown::HashMap;
use serde::Serialize;
use std::hash::BuildHasherDefault;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, warn};

#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Serialize)]
pub enum SemanticType {
    Counter,
    Gauge,
}

impl From<MetricKind> for SemanticType {
    fn from(kind: MetricKind) -> Self {
        match kind {
            MetricKind::Counter => SemanticType::Counter,
            MetricKind::Gauge => SemanticType::Gauge,
        }
    }
}

#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Serialize)]
pub enum NumericType {
    Long,
    Double,
    Bool,
}

impl NumericType {
    /// `None` for values the catalog has no type for.
    pub fn of(value: &FieldValue) -> Option<NumericType> {
        match value {
            FieldValue::Float(_) => Some(NumericType::Double),
            FieldValue::Int(_) | FieldValue::UInt(_) => Some(NumericType::Long),
            FieldValue::Bool(_) => Some(NumericType::Bool),
            FieldValue::Str(_) => None,
        }
    }
}

/// Catalog entry describing one metric field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricMetainfo {
    pub token: String,
    pub name: String,
    pub namespace: String,
    #[serde(rename = "type")]
    pub semantic_type: SemanticType,
    pub numeric_type: NumericType,
    pub label: String,
    pub description: String,
    pub host: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct MetainfoKey {
    host: String,
    namespace: String,
    name: String,
}

type SeenSet = HashMap<MetainfoKey, MetricMetainfo, BuildHasherDefault<FnvHasher>>;

pub struct Metainfo {
    token: String,
    seen: Mutex<SeenSet>,
    max_entries: Option<usize>,
    publisher: Option<mpsc::UnboundedSender<Vec<MetricMetainfo>>>,
}

impl Metainfo {
    /// `max_entries` bounds the seen-set; once full it is cleared and every
    /// definition gets described again. `None` keeps it growing.
    pub fn new(
        token: &str,
        max_entries: Option<usize>,
        publisher: Option<mpsc::UnboundedSender<Vec<MetricMetainfo>>>,
    ) -> Self {
        Self {
            token: token.to_string(),
            seen: Mutex::new(SeenSet::default()),
            max_entries,
            publisher,
        }
    }

    /// Returns descriptors for the definitions seen for the first time and
    /// records them.
    pub fn collect(&self, metrics: &[Metric]) -> Result<Vec<MetricMetainfo>, errors::Processor> {
        let mut seen = self
            .seen
            .lock()
            .map_err(|_| errors::Processor::failed("metainfo", "lock poisoned"))?;

        let mut new_metainfo = Vec::new();
        for metric in metrics {
            // metainfo without a host is meaningless to the backend
            let Some(host) = metric.get_tag(AGENT_HOST_TAG) else {
                continue;
            };
            for field in &metric.fields {
                let key = MetainfoKey {
                    host: host.to_string(),
                    namespace: metric.name.to_string(),
                    name: field.key.clone(),
                };
                if seen.contains_key(&key) {
                    continue;
                }
                let Some(metainfo) = build_metainfo(&self.token, host, metric, field) else {
                    continue;
                };
                if self.max_entries.is_some_and(|max| seen.len() >= max) {
                    debug!("Metainfo cache reached {} entries, resetting", seen.len());
                    seen.clear();
                }
                seen.insert(key, metainfo.clone());
                new_metainfo.push(metainfo);
            }
        }
        Ok(new_metainfo)
    }

    pub fn len(&self) -> usize {
        self.seen.lock().map(|s| s.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BatchProcessor for Metainfo {
    fn name(&self) -> &'static str {
        "metainfo"
    }

    fn process(&self, metrics: Vec<Metric>) -> Result<Vec<Metric>, errors::Processor> {
        let new_metainfo = self.collect(&metrics)?;
        if new_metainfo.is_empty() {
            return Ok(metrics);
        }

        debug!("Found {} new metric definitions", new_metainfo.len());
        if let Some(publisher) = &self.publisher {
            if publisher.send(new_metainfo).is_err() {
                warn!("Metainfo publisher is gone, new metric definitions were not published");
            }
        }
        Ok(metrics)
    }
}

/// JSON body for the catalog publisher.
pub fn encode(metainfo: &[MetricMetainfo]) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(metainfo)
}

fn build_metainfo(token: &str, host: &str, metric: &Metric, field: &Field) -> Option<MetricMetainfo> {
    let numeric_type = NumericType::of(&field.value)?;
    Some(MetricMetainfo {
        token: token.to_string(),
        name: field.key.clone(),
        namespace: metric.name.to_string(),
        semantic_type: metric.kind.into(),
        numeric_type,
        label: format!("{}.{}", metric.name, field.key),
        description: String::new(),
        host: host.to_string(),
    })
}
