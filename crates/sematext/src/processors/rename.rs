// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Renames agent measurements and fields to the names used by the Sematext
//! integrations.

use crate::errors;
use crate::metric::Metric;
use crate::processors::BatchProcessor;
use hashbrown::HashMap;

/// Agent measurement name to Sematext measurement name.
const MEASUREMENT_RENAMES: &[(&str, &str)] = &[
    ("phpfpm", "php"),
    ("mongodb", "mongo"),
    ("mongodb_db_stats", "mongo"),
    ("mongodb_col_stats", "mongo"),
    ("mongodb_shard_stats", "mongo"),
    ("apache", "apache"),
    ("nginx", "nginx"),
    ("win_cpu.Percent_DPC_Time", "os.cpu.dpc.time"),
    ("win_cpu.Percent_Idle_Time", "os.cpu.idle.time"),
    ("win_cpu.Percent_Interrupt_Time", "os.cpu.interrupt.time"),
    ("win_cpu.Percent_Privileged_Time", "os.cpu.privileged.time"),
    ("win_cpu.Percent_Processor_Time", "os.cpu.processor.time"),
    ("win_cpu.Percent_User_Time", "os.cpu.user.time"),
    ("win_disk.Percent_Free_Space", "os.disk.free.bytes"),
    ("win_diskio.Disk_Read_Bytes_persec", "os.disk.read.bytes"),
    ("win_diskio.Disk_Write_Bytes_persec", "os.disk.write.bytes"),
    ("win_mem.Available_Bytes", "os.memory.free"),
    ("win_mem.Modified_Page_List_Bytes", "os.memory.modified.page.list.bytes"),
    ("win_mem.Standby_Cache_Core_Bytes", "os.memory.standby.cache.core.bytes"),
    (
        "win_mem.Standby_Cache_Normal_Priority_Bytes",
        "os.memory.standby.cache.normal.priority.bytes",
    ),
    (
        "win_mem.Standby_Cache_Reserve_Bytes",
        "os.memory.standby.cache.reserve.bytes",
    ),
    ("win_net.Bytes_Received_persec", "os.network.rx"),
    ("win_net.Bytes_Sent_persec", "os.network.tx"),
    ("win_swap.Percent_Usage", "os.swap.percentage.usage"),
    ("win_system.Processor_Queue_Length", "os.processor.queue.length"),
];

/// (agent measurement, agent field) to Sematext field name. Keyed by the
/// original measurement, every entry must belong to a renamed measurement.
const FIELD_RENAMES: &[(&str, &str, &str)] = &[
    ("apache", "BusyWorkers", "workers.busy"),
    ("apache", "BytesPerReq", "bytes"),
    ("apache", "ReqPerSec", "requests"),
    ("apache", "ConnsAsyncClosing", "connections.async.closing"),
    ("apache", "ConnsAsyncKeepAlive", "connections.async.keepAlive"),
    ("apache", "ConnsAsyncWriting", "connections.async.writing"),
    ("apache", "ConnsTotal", "connections"),
    ("apache", "IdleWorkers", "workers.idle"),
    ("apache", "scboard_closing", "workers.closing"),
    ("apache", "scboard_dnslookup", "workers.dns"),
    ("apache", "scboard_finishing", "workers.finishing"),
    ("apache", "scboard_idle_cleanup", "workers.cleanup"),
    ("apache", "scboard_keepalive", "workers.keepalive"),
    ("apache", "scboard_logging", "workers.logging"),
    ("apache", "scboard_open", "workers.open"),
    ("apache", "scboard_reading", "workers.reading"),
    ("apache", "scboard_sending", "workers.sending"),
    ("apache", "scboard_starting", "workers.starting"),
    ("apache", "scboard_waiting", "workers.waiting"),
    ("phpfpm", "accepted_conn", "fpm.requests.accepted.conns"),
    ("phpfpm", "listen_queue", "fpm.queue.listen"),
    ("phpfpm", "max_listen_queue", "fpm.queue.listen.max"),
    ("phpfpm", "listen_queue_len", "fpm.queue.listen.len"),
    ("phpfpm", "idle_processes", "fpm.process.idle"),
    ("phpfpm", "active_processes", "fpm.process.active"),
    ("phpfpm", "total_processes", "fpm.process.total"),
    ("phpfpm", "max_active_processes", "fpm.process.active.max"),
    ("phpfpm", "max_children_reached", "fpm.process.childrenReached.max"),
    ("phpfpm", "slow_requests", "fpm.requests.slow"),
    ("nginx", "accepts", "requests.connections.accepted"),
    ("nginx", "handled", "requests.connections.handled"),
    ("nginx", "active", "requests.connections.active"),
    ("nginx", "reading", "requests.connections.reading"),
    ("nginx", "writing", "requests.connections.writing"),
    ("nginx", "waiting", "requests.connections.waiting"),
    ("nginx", "requests", "request.count"),
    ("mongodb", "flushes", "flushes"),
    ("mongodb", "flushes_total_time_ns", "flushes.time"),
    ("mongodb", "document_inserted", "documents.inserted"),
    ("mongodb", "document_updated", "documents.updated"),
    ("mongodb", "document_deleted", "documents.deleted"),
    ("mongodb", "document_returned", "documents.returned"),
    ("mongodb", "resident_megabytes", "memory.resident"),
    ("mongodb", "vsize_megabytes", "memory.virtual"),
    ("mongodb", "mapped_megabytes", "memory.mapped"),
    ("mongodb", "inserts", "ops.insert"),
    ("mongodb", "queries", "ops.query"),
    ("mongodb", "updates", "ops.update"),
    ("mongodb", "getmores", "ops.getmore"),
    ("mongodb", "commands", "ops.command"),
    ("mongodb", "repl_inserts", "replica.ops.insert"),
    ("mongodb", "repl_queries", "replica.ops.query"),
    ("mongodb", "repl_updates", "replica.ops.update"),
    ("mongodb", "repl_deletes", "replica.ops.delete"),
    ("mongodb", "repl_getmores", "replica.ops.getmore"),
    ("mongodb", "repl_commands", "replica.ops.command"),
    ("mongodb", "count_command_failed", "commands.failed"),
    ("mongodb", "count_command_total", "commands.total"),
    ("mongodb", "connections_current", "network.connections"),
    ("mongodb", "connections_total_created", "network.connections.total"),
    ("mongodb", "net_in_bytes", "network.transfer.rx.rate"),
    ("mongodb", "net_out_bytes", "network.transfer.tx.rate"),
    ("mongodb_db_stats", "data_size", "database.data.size"),
    ("mongodb_db_stats", "storage_size", "database.storage.size"),
    ("mongodb_db_stats", "index_size", "database.index.size"),
    ("mongodb_db_stats", "collections", "database.collections"),
    ("mongodb_db_stats", "objects", "database.objects"),
    ("mongodb_db_stats", "avg_obj_size", "database.avg_obj_size"),
    ("mongodb_db_stats", "indexes", "database.indexes"),
    ("mongodb_db_stats", "num_extents", "database.num_extents"),
    ("mongodb_db_stats", "ok", "database.ok"),
    // collection and shard stats keep their prefix once folded into `mongo`
    ("mongodb_col_stats", "avg_obj_size", "mongodb_col_stats.avg_obj_size"),
    ("mongodb_col_stats", "count", "mongodb_col_stats.count"),
    ("mongodb_col_stats", "ok", "mongodb_col_stats.ok"),
    ("mongodb_col_stats", "size", "mongodb_col_stats.size"),
    ("mongodb_col_stats", "storage_size", "mongodb_col_stats.storage_size"),
    (
        "mongodb_col_stats",
        "total_index_size",
        "mongodb_col_stats.total_index_size",
    ),
    ("mongodb_shard_stats", "in_use", "mongodb_shard_stats.in_use"),
    ("mongodb_shard_stats", "available", "mongodb_shard_stats.available"),
    ("mongodb_shard_stats", "created", "mongodb_shard_stats.created"),
    ("mongodb_shard_stats", "refreshing", "mongodb_shard_stats.refreshing"),
];

/// Batch processor renaming measurements and their fields from static tables.
#[derive(Debug, Clone)]
pub struct Rename {
    measurements: HashMap<String, String>,
    fields: HashMap<(String, String), String>,
}

impl Default for Rename {
    fn default() -> Self {
        Self::with_tables(MEASUREMENT_RENAMES, FIELD_RENAMES)
    }
}

impl Rename {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tables(measurements: &[(&str, &str)], fields: &[(&str, &str, &str)]) -> Self {
        Self {
            measurements: measurements
                .iter()
                .map(|(from, to)| ((*from).to_string(), (*to).to_string()))
                .collect(),
            fields: fields
                .iter()
                .map(|(measurement, field, to)| {
                    (
                        ((*measurement).to_string(), (*field).to_string()),
                        (*to).to_string(),
                    )
                })
                .collect(),
        }
    }

    fn rename(&self, metric: &mut Metric) {
        let original_name = metric.name;
        let Some(canonical_name) = self.measurements.get(original_name.as_str()) else {
            return;
        };

        // Removing while looking up would shift the field list and skip fields
        // that also need renaming, so removals happen in a second pass.
        let mut renamed_fields = Vec::new();
        let mut added_fields = Vec::new();
        for index in 0..metric.fields.len() {
            let field = &metric.fields[index];
            let key = (original_name.to_string(), field.key.clone());
            if let Some(new_key) = self.fields.get(&key) {
                let value = field.value.clone();
                renamed_fields.push(field.key.clone());
                added_fields.push(new_key.as_str());
                metric.add_field(new_key, value);
            }
        }
        // a key produced by a rename must survive, even when it is its own source
        for key in &renamed_fields {
            if !added_fields.contains(&key.as_str()) {
                metric.remove_field(key);
            }
        }

        metric.set_name(canonical_name);
    }
}

impl BatchProcessor for Rename {
    fn name(&self) -> &'static str {
        "rename"
    }

    fn process(&self, mut metrics: Vec<Metric>) -> Result<Vec<Metric>, errors::Processor> {
        for metric in metrics.iter_mut().filter(|m| !m.is_processed()) {
            self.rename(metric);
        }
        Ok(metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::{FieldValue, MetricKind};

    fn process_one(rename: &Rename, metric: Metric) -> Metric {
        rename.process(vec![metric]).unwrap().remove(0)
    }

    #[test]
    fn test_rename_measurement_and_field() {
        let metric = Metric::new("phpfpm", 1, MetricKind::Gauge)
            .with_tag("pool", "www")
            .with_field("accepted_conn", 10i64);

        let renamed = process_one(&Rename::new(), metric);

        assert_eq!(renamed.name.as_str(), "php");
        assert_eq!(
            renamed.get_field("fpm.requests.accepted.conns"),
            Some(&FieldValue::Int(10))
        );
        assert_eq!(renamed.get_field("accepted_conn"), None);
        assert_eq!(renamed.get_tag("pool"), Some("www"));
    }

    #[test]
    fn test_field_renamed_onto_itself_is_kept() {
        let metric = Metric::new("mongodb", 1, MetricKind::Counter)
            .with_field("flushes", 5i64)
            .with_field("flushes_total_time_ns", 20i64);

        let renamed = process_one(&Rename::new(), metric);

        assert_eq!(renamed.name.as_str(), "mongo");
        assert_eq!(renamed.get_field("flushes"), Some(&FieldValue::Int(5)));
        assert_eq!(renamed.get_field("flushes.time"), Some(&FieldValue::Int(20)));
        assert_eq!(renamed.get_field("flushes_total_time_ns"), None);
        assert_eq!(renamed.fields.len(), 2);
    }

    #[test]
    fn test_mongodb_connection_fields_renamed() {
        let metric = Metric::new("mongodb", 1, MetricKind::Gauge)
            .with_field("connections_current", 12i64)
            .with_field("net_in_bytes", 1024i64);

        let renamed = process_one(&Rename::new(), metric);

        assert_eq!(
            renamed.get_field("network.connections"),
            Some(&FieldValue::Int(12))
        );
        assert_eq!(
            renamed.get_field("network.transfer.rx.rate"),
            Some(&FieldValue::Int(1024))
        );
        assert_eq!(renamed.get_field("connections_current"), None);
    }

    #[test]
    fn test_unmapped_measurement_untouched() {
        let metric = Metric::new("cpu", 1, MetricKind::Gauge).with_field("usage_idle", 99.5);

        let renamed = process_one(&Rename::new(), metric.clone());

        assert_eq!(renamed, metric);
    }

    #[test]
    fn test_unmapped_fields_of_renamed_measurement_kept() {
        let metric = Metric::new("nginx", 1, MetricKind::Counter)
            .with_field("accepts", 3u64)
            .with_field("custom", true);

        let renamed = process_one(&Rename::new(), metric);

        assert_eq!(renamed.name.as_str(), "nginx");
        assert_eq!(
            renamed.get_field("requests.connections.accepted"),
            Some(&FieldValue::UInt(3))
        );
        assert_eq!(renamed.get_field("custom"), Some(&FieldValue::Bool(true)));
        assert_eq!(renamed.fields.len(), 2);
    }

    #[test]
    fn test_every_adjacent_field_is_renamed() {
        let metric = Metric::new("nginx", 1, MetricKind::Counter)
            .with_field("accepts", 1i64)
            .with_field("handled", 2i64)
            .with_field("active", 3i64)
            .with_field("reading", 4i64);

        let renamed = process_one(&Rename::new(), metric);

        let mut keys: Vec<&str> = renamed.fields.iter().map(|f| f.key.as_str()).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec![
                "requests.connections.accepted",
                "requests.connections.active",
                "requests.connections.handled",
                "requests.connections.reading",
            ]
        );
    }

    #[test]
    fn test_field_lookup_uses_original_measurement() {
        let metric =
            Metric::new("mongodb_db_stats", 1, MetricKind::Gauge).with_field("data_size", 42i64);

        let renamed = process_one(&Rename::new(), metric);

        assert_eq!(renamed.name.as_str(), "mongo");
        assert_eq!(
            renamed.get_field("database.data.size"),
            Some(&FieldValue::Int(42))
        );
    }

    #[test]
    fn test_field_transform_without_measurement_transform_is_ignored() {
        let rename = Rename::with_tables(&[], &[("cpu", "usage", "cpu.usage")]);
        let metric = Metric::new("cpu", 1, MetricKind::Gauge).with_field("usage", 1.5);

        let renamed = process_one(&rename, metric.clone());

        assert_eq!(renamed, metric);
    }

    #[test]
    fn test_processed_metrics_are_not_renamed_again() {
        let mut metric = Metric::new("phpfpm", 1, MetricKind::Gauge).with_field("accepted_conn", 1i64);
        metric.mark_processed();

        let renamed = process_one(&Rename::new(), metric.clone());

        assert_eq!(renamed, metric);
    }

    #[test]
    fn test_field_table_only_references_renamed_measurements() {
        let measurements: Vec<&str> = MEASUREMENT_RENAMES.iter().map(|(from, _)| *from).collect();
        for (measurement, field, _) in FIELD_RENAMES {
            assert!(
                measurements.contains(measurement),
                "field {measurement}.{field} belongs to a measurement that is never renamed"
            );
        }
    }
}
