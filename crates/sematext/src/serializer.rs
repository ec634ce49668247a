// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Sematext flavour of the Influx line protocol.
//!
//! ```text
//! measurement[,tag=value...] field=value[,field=value...] unix_nanos\n
//! ```
//!
//! Tags and fields are written sorted by key. Integers get an `i` suffix,
//! floats use the shortest representation that round-trips, NaN and infinite
//! floats are dropped. The processed marker tag is never written.

use crate::constants::PROCESSED_TAG_KEY;
use crate::metric::{Field, FieldValue, Metric};
use std::collections::BTreeMap;
use std::fmt::Write;
use std::str::FromStr;
use tracing::debug;

/// Serializes a processed batch into the request body.
pub trait MetricSerializer: Send + Sync {
    fn write(&self, metrics: &[Metric]) -> Vec<u8>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SerializerKind {
    #[default]
    Compact,
    LinePerMetric,
}

impl FromStr for SerializerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "compact" => Ok(SerializerKind::Compact),
            "line" | "line_per_metric" => Ok(SerializerKind::LinePerMetric),
            other => Err(format!("unknown serializer {other}")),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SerializerConfig {
    /// String fields are not supported by the backend yet and are dropped
    /// unless this is set.
    pub string_fields: bool,
}

pub fn new_serializer(kind: SerializerKind, config: SerializerConfig) -> Box<dyn MetricSerializer> {
    match kind {
        SerializerKind::Compact => Box::new(CompactSerializer::new(config)),
        SerializerKind::LinePerMetric => Box::new(LinePerMetricSerializer::new(config)),
    }
}

/// Writes each metric on its own line. Simpler than [`CompactSerializer`] at the
/// cost of a bigger payload.
#[derive(Debug, Clone, Default)]
pub struct LinePerMetricSerializer {
    config: SerializerConfig,
}

impl LinePerMetricSerializer {
    pub fn new(config: SerializerConfig) -> Self {
        Self { config }
    }
}

impl MetricSerializer for LinePerMetricSerializer {
    fn write(&self, metrics: &[Metric]) -> Vec<u8> {
        let mut output = String::new();
        for metric in metrics {
            if metric.fields.is_empty() {
                debug!("Skipping the serialization of metric {} without fields", metric.name);
                continue;
            }
            let fields: Vec<&Field> = metric.fields.iter().collect();
            write_line(&mut output, metric, fields, &self.config);
        }
        output.into_bytes()
    }
}

/// Merges metrics sharing timestamp, name and tags into a single line.
#[derive(Debug, Clone, Default)]
pub struct CompactSerializer {
    config: SerializerConfig,
}

impl CompactSerializer {
    pub fn new(config: SerializerConfig) -> Self {
        Self { config }
    }
}

/// Groups are ordered by numeric timestamp, then name, then sorted tags. This
/// differs from a lexicographic sort of the rendered `<nanos>-<name>-<tags>`
/// id only when timestamps have a different number of digits.
type GroupKey<'a> = (i64, &'a str, Vec<(&'a str, &'a str)>);

impl MetricSerializer for CompactSerializer {
    fn write(&self, metrics: &[Metric]) -> Vec<u8> {
        // BTreeMap keeps the group order stable across identical inputs
        let mut groups: BTreeMap<GroupKey<'_>, Vec<&Metric>> = BTreeMap::new();
        for metric in metrics {
            if metric.fields.is_empty() {
                debug!("Skipping the serialization of metric {} without fields", metric.name);
                continue;
            }
            let key = (metric.timestamp, metric.name.as_str(), metric.sorted_tags());
            groups.entry(key).or_default().push(metric);
        }

        let mut output = String::new();
        for members in groups.values() {
            let Some(first) = members.first() else {
                continue;
            };
            let fields: Vec<&Field> = members.iter().flat_map(|m| m.fields.iter()).collect();
            write_line(&mut output, first, fields, &self.config);
        }
        output.into_bytes()
    }
}

/// Appends one line for `metric` carrying `fields`. Nothing is written when no
/// field survives encoding.
fn write_line(output: &mut String, metric: &Metric, mut fields: Vec<&Field>, config: &SerializerConfig) {
    fields.sort_by(|a, b| a.key.cmp(&b.key));
    let encoded: Vec<String> = fields
        .iter()
        .filter_map(|field| encode_field(field, config))
        .collect();
    if encoded.is_empty() {
        return;
    }

    output.push_str(&escape(&metric.name));
    for (key, value) in metric.sorted_tags() {
        if key == PROCESSED_TAG_KEY {
            continue;
        }
        output.push(',');
        output.push_str(&escape(key));
        output.push('=');
        output.push_str(&escape(value));
    }
    output.push(' ');
    output.push_str(&encoded.join(","));
    // writing into a String cannot fail
    let _ = writeln!(output, " {}", metric.timestamp);
}

/// `key=value`, or `None` when the value cannot be represented.
fn encode_field(field: &Field, config: &SerializerConfig) -> Option<String> {
    let value = match &field.value {
        FieldValue::Bool(v) => v.to_string(),
        FieldValue::Float(v) if v.is_finite() => v.to_string(),
        FieldValue::Float(_) => return None,
        FieldValue::Int(v) => format!("{v}i"),
        FieldValue::UInt(v) => format!("{v}i"),
        FieldValue::Str(v) if config.string_fields => format!("\"{}\"", escape_string_field(v)),
        FieldValue::Str(_) => return None,
    };
    Some(format!("{}={value}", escape(&field.key)))
}

/// Escapes commas, spaces and equals signs in names, tag keys and tag values.
pub fn escape(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, ',' | ' ' | '=') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn escape_string_field(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '"' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
