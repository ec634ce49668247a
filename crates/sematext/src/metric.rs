// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Metric model shared by the processors and the serializers.

use crate::constants::{PROCESSED_TAG_KEY, PROCESSED_TAG_VALUE};
use derive_more::Display;
use hashbrown::HashMap;
use ustr::Ustr;

pub type Tags = HashMap<String, String>;

/// Value type reported by the collection agent.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
pub enum MetricKind {
    #[display("counter")]
    Counter,
    #[display("gauge")]
    Gauge,
}

/// Typed payload of a single field.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        FieldValue::UInt(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Str(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Str(value)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub key: String,
    pub value: FieldValue,
}

/// A timestamped measurement with its tags and fields.
///
/// Fields keep insertion order; keys are unique. The timestamp is expressed in
/// nanoseconds since the Unix epoch.
#[derive(Clone, Debug, PartialEq)]
pub struct Metric {
    pub name: Ustr,
    pub tags: Tags,
    pub fields: Vec<Field>,
    pub timestamp: i64,
    pub kind: MetricKind,
}

impl Metric {
    pub fn new(name: &str, timestamp: i64, kind: MetricKind) -> Metric {
        Metric {
            name: Ustr::from(name),
            tags: Tags::new(),
            fields: Vec::new(),
            timestamp,
            kind,
        }
    }

    #[must_use]
    pub fn with_tag(mut self, key: &str, value: &str) -> Metric {
        self.add_tag(key, value);
        self
    }

    #[must_use]
    pub fn with_field(mut self, key: &str, value: impl Into<FieldValue>) -> Metric {
        self.add_field(key, value);
        self
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = Ustr::from(name);
    }

    pub fn add_tag(&mut self, key: &str, value: &str) {
        self.tags.insert(key.to_string(), value.to_string());
    }

    pub fn remove_tag(&mut self, key: &str) -> Option<String> {
        self.tags.remove(key)
    }

    pub fn get_tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Adds a field, replacing the value in place when the key already exists.
    pub fn add_field(&mut self, key: &str, value: impl Into<FieldValue>) {
        let value = value.into();
        match self.fields.iter_mut().find(|f| f.key == key) {
            Some(field) => field.value = value,
            None => self.fields.push(Field {
                key: key.to_string(),
                value,
            }),
        }
    }

    pub fn remove_field(&mut self, key: &str) -> Option<FieldValue> {
        let index = self.fields.iter().position(|f| f.key == key)?;
        Some(self.fields.remove(index).value)
    }

    pub fn get_field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|f| f.key == key).map(|f| &f.value)
    }

    /// Whether the metric already went through the whole pipeline.
    pub fn is_processed(&self) -> bool {
        self.get_tag(PROCESSED_TAG_KEY) == Some(PROCESSED_TAG_VALUE)
    }

    pub fn mark_processed(&mut self) {
        self.add_tag(PROCESSED_TAG_KEY, PROCESSED_TAG_VALUE);
    }

    /// Tags ordered by key, which is the order used on the wire.
    pub fn sorted_tags(&self) -> Vec<(&str, &str)> {
        let mut tags: Vec<(&str, &str)> = self
            .tags
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        tags.sort_unstable();
        tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_field_replaces_existing_key() {
        let mut metric = Metric::new("os", 0, MetricKind::Gauge).with_field("disk.size", 1i64);
        metric.add_field("disk.size", 2.5);

        assert_eq!(metric.fields.len(), 1);
        assert_eq!(metric.get_field("disk.size"), Some(&FieldValue::Float(2.5)));
    }

    #[test]
    fn test_remove_field_keeps_order() {
        let mut metric = Metric::new("os", 0, MetricKind::Gauge)
            .with_field("a", 1i64)
            .with_field("b", 2i64)
            .with_field("c", 3i64);

        assert_eq!(metric.remove_field("b"), Some(FieldValue::Int(2)));
        assert_eq!(metric.remove_field("b"), None);
        let keys: Vec<&str> = metric.fields.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "c"]);
    }

    #[test]
    fn test_processed_marker() {
        let mut metric = Metric::new("os", 0, MetricKind::Counter);
        assert!(!metric.is_processed());

        metric.mark_processed();
        assert!(metric.is_processed());
        assert_eq!(metric.get_tag(PROCESSED_TAG_KEY), Some("true"));

        metric.add_tag(PROCESSED_TAG_KEY, "false");
        assert!(!metric.is_processed());
    }

    #[test]
    fn test_sorted_tags() {
        let metric = Metric::new("os", 0, MetricKind::Gauge)
            .with_tag("os.host", "hostname")
            .with_tag("os.disk", "sda1")
            .with_tag("a", "z");

        assert_eq!(
            metric.sorted_tags(),
            vec![("a", "z"), ("os.disk", "sda1"), ("os.host", "hostname")]
        );
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(MetricKind::Counter.to_string(), "counter");
        assert_eq!(MetricKind::Gauge.to_string(), "gauge");
    }
}
