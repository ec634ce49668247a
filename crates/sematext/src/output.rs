// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::config::Config;
use crate::errors;
use crate::flusher::{Flusher, FlusherConfig};
use crate::metric::Metric;
use crate::pipeline::Pipeline;
use crate::processors::heartbeat::Heartbeat;
use crate::processors::host::Host;
use crate::processors::metainfo::{Metainfo, MetricMetainfo};
use crate::processors::rename::Rename;
use crate::processors::token::Token;
use crate::processors::{BatchProcessor, MetricProcessor};
use crate::serializer::{new_serializer, MetricSerializer, SerializerConfig};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Sematext metrics output: processes a batch, encodes it and sends it to the
/// receiver.
pub struct SematextOutput {
    pipeline: Pipeline,
    serializer: Box<dyn MetricSerializer>,
    flusher: Flusher,
    host: Option<Arc<Host>>,
}

impl SematextOutput {
    /// Builds the default processor chain. Must be called from within a tokio
    /// runtime for the hostname to be reloaded in the background.
    pub fn new(
        config: &Config,
        metainfo_publisher: Option<mpsc::UnboundedSender<Vec<MetricMetainfo>>>,
    ) -> Result<Self, errors::Ship> {
        let host = Arc::new(Host::new(
            config.hostname_file.clone(),
            config.hostname_reload_interval,
        ));

        let batch_processors: Vec<Arc<dyn BatchProcessor>> = vec![
            Arc::new(Rename::new()),
            Arc::new(Heartbeat::new()),
            Arc::new(Metainfo::new(
                &config.token,
                config.metainfo_max_entries,
                metainfo_publisher,
            )),
        ];
        let metric_processors: Vec<Arc<dyn MetricProcessor>> = vec![
            Arc::new(Token::new(&config.token)),
            host.clone(),
            Arc::new(config.container_tags.clone()),
        ];

        let flusher = Flusher::new(FlusherConfig::new(
            config.metrics_url(),
            config.proxy.clone(),
        ))?;

        info!("Sematext output sending metrics to {}", flusher.url());
        Ok(Self {
            pipeline: Pipeline::new(batch_processors, metric_processors),
            serializer: new_serializer(config.serializer, SerializerConfig::default()),
            flusher,
            host: Some(host),
        })
    }

    pub fn with_parts(
        pipeline: Pipeline,
        serializer: Box<dyn MetricSerializer>,
        flusher: Flusher,
    ) -> Self {
        Self {
            pipeline,
            serializer,
            flusher,
            host: None,
        }
    }

    /// Processes `metrics` in place and sends them. A batch rejected by a
    /// processor is cleared without an error, only a failed delivery is
    /// reported. On failure `metrics` holds the processed batch, which can be
    /// passed to `write` again without being processed twice.
    pub async fn write(&self, metrics: &mut Vec<Metric>) -> Result<(), errors::Ship> {
        match self.pipeline.process(std::mem::take(metrics)) {
            Ok(processed) => *metrics = processed,
            Err(e) => {
                warn!("Dropping batch: {e}");
                return Ok(());
            }
        }

        if metrics.is_empty() {
            debug!("Nothing to send");
            return Ok(());
        }

        let body = self.serializer.write(metrics.as_slice());
        if body.is_empty() {
            debug!("No serializable fields in {} metrics", metrics.len());
            return Ok(());
        }

        self.flusher.ship(body).await
    }

    pub async fn close(&self) {
        self.pipeline.close();
        if let Some(host) = &self.host {
            host.shutdown().await;
        }
    }
}
