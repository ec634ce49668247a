// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use reqwest::StatusCode;

/// Failure reported by a batch or metric processor.
#[derive(Debug, thiserror::Error)]
pub enum Processor {
    #[error("{processor} processor failed: {reason}")]
    Failed {
        processor: &'static str,
        reason: String,
    },
}

impl Processor {
    pub fn failed(processor: &'static str, reason: impl Into<String>) -> Self {
        Self::Failed {
            processor,
            reason: reason.into(),
        }
    }
}

/// Errors while building the configuration snapshot.
#[derive(Debug, thiserror::Error)]
pub enum Config {
    #[error("SEMATEXT_TOKEN environment variable is not set")]
    MissingToken,
    #[error("invalid url {url} for the proxy server: {reason}")]
    InvalidProxy { url: String, reason: String },
    #[error("invalid value {value:?} for {name}")]
    InvalidValue { name: &'static str, value: String },
}

#[derive(Debug, thiserror::Error)]
pub enum Hostname {
    #[error("unable to read hostname file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors while handing a serialized payload to the receiver.
#[derive(Debug, thiserror::Error)]
pub enum Ship {
    #[error("unable to build http client: {0}")]
    Client(String),
    #[error("error while sending to {url}: {reason}")]
    Request { url: String, reason: String },
    #[error("received {status} status code, message = '{body}' while sending to {url}")]
    Destination {
        url: String,
        status: StatusCode,
        body: String,
    },
}
