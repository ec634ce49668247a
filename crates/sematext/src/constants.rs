// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

/// Reserved tag stamped on every metric that went through the whole pipeline.
pub const PROCESSED_TAG_KEY: &str = "sematext.processed";
pub const PROCESSED_TAG_VALUE: &str = "true";

/// Host tag as produced by the collection agent.
pub const AGENT_HOST_TAG: &str = "host";
/// Host tag expected by the Sematext backend.
pub const SEMATEXT_HOST_TAG: &str = "os.host";
pub const TOKEN_TAG: &str = "token";

pub const HEARTBEAT_METRIC_NAME: &str = "heartbeat";
pub const HEARTBEAT_FIELD_NAME: &str = "alive";
pub const SECONDS_PER_MINUTE: i64 = 60;

pub const HOSTNAME_FILE_NAME: &str = ".resolved-hostname";
pub const HOSTNAME_RELOAD_INTERVAL: Duration = Duration::from_secs(5 * 60);

pub const DEFAULT_RECEIVER_URL: &str = "https://spm-receiver.sematext.com";
pub const METRICS_WRITE_PATH: &str = "/write?db=metrics";
pub const DEFAULT_ROOT_DIR: &str = "/opt/spm/";

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const CONTENT_TYPE: &str = "text/plain; charset=utf-8";
pub const USER_AGENT: &str = "telegraf";

/// Environment variables read once at startup, paired with the tag they feed.
pub const CONTAINER_TAG_ENV_VARS: [(&str, &str); 8] = [
    ("SEMATEXT_CONTAINER_NAME", "container.name"),
    ("SEMATEXT_CONTAINER_ID", "container.id"),
    ("SEMATEXT_CONTAINER_IMAGE_NAME", "container.image.name"),
    ("SEMATEXT_CONTAINER_IMAGE_TAG", "container.image.tag"),
    ("SEMATEXT_CONTAINER_IMAGE_DIGEST", "container.image.digest"),
    ("SEMATEXT_K8S_POD_NAME", "kubernetes.pod.name"),
    ("SEMATEXT_K8S_NAMESPACE", "kubernetes.namespace"),
    ("SEMATEXT_K8S_CLUSTER", "kubernetes.cluster.name"),
];
