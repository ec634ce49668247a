// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::constants::{
    DEFAULT_RECEIVER_URL, DEFAULT_ROOT_DIR, HOSTNAME_FILE_NAME, HOSTNAME_RELOAD_INTERVAL,
    METRICS_WRITE_PATH,
};
use crate::errors;
use crate::processors::container::ContainerTags;
use crate::serializer::SerializerKind;
use reqwest::Url;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    pub url: Url,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Snapshot of the output configuration, taken once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub token: String,
    pub receiver_url: String,
    pub proxy: Option<ProxyConfig>,
    /// File written by the Sematext agent with the resolved hostname.
    pub hostname_file: Option<PathBuf>,
    pub hostname_reload_interval: Duration,
    pub serializer: SerializerKind,
    /// Bound on the metainfo seen-set, unbounded when `None`.
    pub metainfo_max_entries: Option<usize>,
    pub container_tags: ContainerTags,
}

impl Config {
    pub fn new() -> Result<Config, errors::Config> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Config, errors::Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let token = non_empty("SEMATEXT_TOKEN").ok_or(errors::Config::MissingToken)?;
        let receiver_url = non_empty("SEMATEXT_RECEIVER_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_RECEIVER_URL.to_string());

        let proxy = match non_empty("SEMATEXT_PROXY_SERVER") {
            Some(server) => Some(ProxyConfig {
                url: Url::parse(&server).map_err(|e| errors::Config::InvalidProxy {
                    url: server.clone(),
                    reason: e.to_string(),
                })?,
                username: non_empty("SEMATEXT_PROXY_USERNAME"),
                password: non_empty("SEMATEXT_PROXY_PASSWORD"),
            }),
            None => None,
        };

        let hostname_reload_interval = match non_empty("SEMATEXT_HOSTNAME_RELOAD_SECS") {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or(errors::Config::InvalidValue {
                    name: "SEMATEXT_HOSTNAME_RELOAD_SECS",
                    value,
                })?,
            None => HOSTNAME_RELOAD_INTERVAL,
        };

        let serializer = match non_empty("SEMATEXT_SERIALIZER") {
            Some(value) => value
                .parse::<SerializerKind>()
                .map_err(|_| errors::Config::InvalidValue {
                    name: "SEMATEXT_SERIALIZER",
                    value,
                })?,
            None => SerializerKind::default(),
        };

        let metainfo_max_entries = match non_empty("SEMATEXT_METAINFO_MAX_ENTRIES") {
            Some(value) => Some(value.trim().parse::<usize>().map_err(|_| {
                errors::Config::InvalidValue {
                    name: "SEMATEXT_METAINFO_MAX_ENTRIES",
                    value,
                }
            })?),
            None => None,
        };

        let hostname_file =
            root_dir(non_empty("SPM_ROOT").as_deref()).map(|root| root.join(HOSTNAME_FILE_NAME));

        Ok(Config {
            token,
            receiver_url,
            proxy,
            hostname_file,
            hostname_reload_interval,
            serializer,
            metainfo_max_entries,
            container_tags: ContainerTags::from_lookup(&lookup),
        })
    }

    pub fn metrics_url(&self) -> String {
        format!("{}{}", self.receiver_url, METRICS_WRITE_PATH)
    }
}

/// Root directory of the Sematext agent installation, if there is one.
pub fn root_dir(spm_root: Option<&str>) -> Option<PathBuf> {
    if let Some(dir) = spm_root {
        if Path::new(dir).exists() {
            return Some(PathBuf::from(dir));
        }
    }
    let default = Path::new(DEFAULT_ROOT_DIR);
    default.exists().then(|| default.to_path_buf())
}
