// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Host tag adjustment.
//!
//! The Sematext agent resolves the hostname and writes it to a file under its
//! root directory. When that file is available, its content replaces the host
//! tag set by the collection agent; otherwise the agent's host tag is renamed.

use crate::constants::{AGENT_HOST_TAG, SEMATEXT_HOST_TAG};
use crate::errors;
use crate::metric::Metric;
use crate::processors::MetricProcessor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

pub struct Host {
    hostname: Arc<RwLock<String>>,
    cancel_token: CancellationToken,
    reload_task: Mutex<Option<JoinHandle<()>>>,
}

impl Host {
    /// Loads the hostname file and, when a tokio runtime is available, keeps
    /// reloading it every `reload_interval` until [`Host::close`] is called.
    pub fn new(hostname_file: Option<PathBuf>, reload_interval: Duration) -> Self {
        let Some(path) = hostname_file else {
            debug!("No hostname file configured, keeping the agent host tag");
            return Self::with_hostname("");
        };

        let initial = load_hostname(&path).unwrap_or_else(|e| {
            warn!("Unable to load the resolved hostname: {e}");
            String::new()
        });
        let host = Self::with_hostname(&initial);

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let task = runtime.spawn(reload_loop(
                    path,
                    Arc::clone(&host.hostname),
                    reload_interval,
                    host.cancel_token.clone(),
                ));
                if let Ok(mut slot) = host.reload_task.lock() {
                    *slot = Some(task);
                }
            }
            Err(_) => warn!("No tokio runtime available, the hostname will not be reloaded"),
        }

        host
    }

    /// Host processor with a fixed hostname and no background reload.
    pub fn with_hostname(hostname: &str) -> Self {
        Self {
            hostname: Arc::new(RwLock::new(hostname.to_string())),
            cancel_token: CancellationToken::new(),
            reload_task: Mutex::new(None),
        }
    }

    pub fn hostname(&self) -> String {
        self.hostname
            .read()
            .map(|h| h.clone())
            .unwrap_or_default()
    }

    /// Stops the reload task and waits for it to finish.
    pub async fn shutdown(&self) {
        self.cancel_token.cancel();
        let task = self.reload_task.lock().ok().and_then(|mut slot| slot.take());
        if let Some(task) = task {
            if let Err(e) = task.await {
                error!("Hostname reload task failed: {e}");
            }
        }
    }
}

impl MetricProcessor for Host {
    fn name(&self) -> &'static str {
        AGENT_HOST_TAG
    }

    fn process(&self, metric: &mut Metric) -> Result<(), errors::Processor> {
        let hostname = self
            .hostname
            .read()
            .map_err(|_| errors::Processor::failed(AGENT_HOST_TAG, "lock poisoned"))?;
        adjust_hostname(metric, &hostname);
        Ok(())
    }

    fn close(&self) {
        self.cancel_token.cancel();
    }
}

impl Drop for Host {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

pub fn adjust_hostname(metric: &mut Metric, loaded_hostname: &str) {
    if loaded_hostname.is_empty() {
        if let Some(agent_host) = metric.remove_tag(AGENT_HOST_TAG) {
            metric.add_tag(SEMATEXT_HOST_TAG, &agent_host);
        }
    } else {
        metric.remove_tag(AGENT_HOST_TAG);
        metric.add_tag(SEMATEXT_HOST_TAG, loaded_hostname);
    }
}

/// Returns the first line of the hostname file. An empty first line yields an
/// empty hostname, which keeps the agent host tag value.
pub fn load_hostname(path: &Path) -> Result<String, errors::Hostname> {
    let contents = std::fs::read_to_string(path).map_err(|source| errors::Hostname::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(first_line(&contents))
}

async fn read_hostname(path: &Path) -> Result<String, errors::Hostname> {
    let contents =
        tokio::fs::read_to_string(path)
            .await
            .map_err(|source| errors::Hostname::Io {
                path: path.display().to_string(),
                source,
            })?;
    Ok(first_line(&contents))
}

fn first_line(contents: &str) -> String {
    contents.lines().next().unwrap_or_default().to_string()
}

async fn reload_loop(
    path: PathBuf,
    hostname: Arc<RwLock<String>>,
    reload_interval: Duration,
    cancel_token: CancellationToken,
) {
    let mut ticker = interval_at(Instant::now() + reload_interval, reload_interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // file I/O happens outside of the lock
                match read_hostname(&path).await {
                    Ok(reloaded) => match hostname.write() {
                        Ok(mut current) => *current = reloaded,
                        Err(_) => error!("Hostname lock poisoned, reload skipped"),
                    },
                    Err(e) => warn!("Failed to reload hostname, keeping the previous one: {e}"),
                }
            }
            () = cancel_token.cancelled() => {
                debug!("Hostname reload shutting down");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::MetricKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn os_metric() -> Metric {
        Metric::new("os", 1, MetricKind::Gauge)
            .with_tag("host", "somehost")
            .with_tag("os.disk", "sda1")
            .with_field("disk.used", 12.34)
            .with_field("disk.free", 55i64)
            .with_field("disk.size", 777u64)
    }

    fn hostname_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_adjust_hostname_with_loaded_hostname() {
        let mut metric = os_metric();

        adjust_hostname(&mut metric, "abc");

        assert_eq!(metric.get_tag("os.host"), Some("abc"));
        assert_eq!(metric.get_tag("host"), None);
        assert_eq!(metric.get_tag("os.disk"), Some("sda1"));
    }

    #[test]
    fn test_adjust_hostname_without_loaded_hostname() {
        let mut metric = os_metric();

        adjust_hostname(&mut metric, "");

        assert_eq!(metric.get_tag("os.host"), Some("somehost"));
        assert_eq!(metric.get_tag("host"), None);
    }

    #[test]
    fn test_adjust_hostname_without_any_host() {
        let mut metric = Metric::new("os", 1, MetricKind::Gauge).with_tag("os.disk", "sda1");
        let before = metric.clone();

        adjust_hostname(&mut metric, "");

        assert_eq!(metric, before);
    }

    #[test]
    fn test_host_process() {
        let host = Host::with_hostname("abc");
        let mut metric = os_metric();

        host.process(&mut metric).unwrap();

        assert_eq!(metric.get_tag("os.host"), Some("abc"));
    }

    #[test]
    fn test_load_hostname_first_line() {
        assert_eq!(
            load_hostname(hostname_file("somehost001").path()).unwrap(),
            "somehost001"
        );
        assert_eq!(
            load_hostname(hostname_file("somehost001\nsecond\n").path()).unwrap(),
            "somehost001"
        );
        assert_eq!(
            load_hostname(hostname_file("somehost001\r\n\r\n").path()).unwrap(),
            "somehost001"
        );
    }

    #[test]
    fn test_load_hostname_missing_file() {
        assert!(matches!(
            load_hostname(Path::new("/baddir/doesnt-exist")),
            Err(errors::Hostname::Io { .. })
        ));
    }

    #[test]
    fn test_load_hostname_empty_first_line() {
        assert_eq!(load_hostname(hostname_file("").path()).unwrap(), "");
        assert_eq!(
            load_hostname(hostname_file("\nsomehost").path()).unwrap(),
            ""
        );
        assert_eq!(
            load_hostname(hostname_file(" padded \n").path()).unwrap(),
            " padded "
        );
    }

    #[test]
    fn test_empty_hostname_file_keeps_agent_host() {
        let file = hostname_file("\nsomehost");
        let host = Host::new(Some(file.path().to_path_buf()), Duration::from_secs(1));
        let mut metric = os_metric();

        host.process(&mut metric).unwrap();

        assert_eq!(metric.get_tag("os.host"), Some("somehost"));
        assert_eq!(metric.get_tag("host"), None);
    }

    #[test]
    fn test_new_without_runtime_loads_once() {
        let file = hostname_file("static-host");
        let host = Host::new(Some(file.path().to_path_buf()), Duration::from_millis(10));

        assert_eq!(host.hostname(), "static-host");
        assert!(host.reload_task.lock().unwrap().is_none());
    }

    #[test]
    fn test_new_without_file() {
        let host = Host::new(None, Duration::from_secs(1));
        let mut metric = os_metric();

        host.process(&mut metric).unwrap();

        assert_eq!(host.hostname(), "");
        assert_eq!(metric.get_tag("os.host"), Some("somehost"));
    }

    #[tokio::test]
    async fn test_periodic_reload() {
        let file = hostname_file("first-host");
        let host = Host::new(Some(file.path().to_path_buf()), Duration::from_millis(20));
        assert_eq!(host.hostname(), "first-host");

        std::fs::write(file.path(), "second-host\n").unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(host.hostname(), "second-host");
        host.shutdown().await;
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_previous_hostname() {
        let file = hostname_file("first-host");
        let path = file.path().to_path_buf();
        let host = Host::new(Some(path), Duration::from_millis(20));

        file.close().unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(host.hostname(), "first-host");
        host.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_stops_reload_task() {
        let file = hostname_file("first-host");
        let host = Host::new(Some(file.path().to_path_buf()), Duration::from_millis(20));

        host.shutdown().await;
        std::fs::write(file.path(), "second-host").unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(host.reload_task.lock().unwrap().is_none());
        assert_eq!(host.hostname(), "first-host");
    }
}
