// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::config::ProxyConfig;
use crate::constants::{CONNECT_TIMEOUT, CONTENT_TYPE, REQUEST_TIMEOUT, USER_AGENT};
use crate::errors;
use reqwest::header;
use std::time::Duration;
use tracing::{debug, error};

pub struct FlusherConfig {
    pub url: String,
    pub proxy: Option<ProxyConfig>,
    pub connect_timeout: Duration,
    pub timeout: Duration,
}

impl FlusherConfig {
    pub fn new(url: String, proxy: Option<ProxyConfig>) -> Self {
        Self {
            url,
            proxy,
            connect_timeout: CONNECT_TIMEOUT,
            timeout: REQUEST_TIMEOUT,
        }
    }
}

/// Posts serialized metrics to the Sematext receiver. Retries are left to the
/// caller.
#[derive(Clone, Debug)]
pub struct Flusher {
    client: reqwest::Client,
    url: String,
}

impl Flusher {
    pub fn new(config: FlusherConfig) -> Result<Self, errors::Ship> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout);

        if let Some(proxy) = config.proxy {
            let mut reqwest_proxy = reqwest::Proxy::all(proxy.url)
                .map_err(|e| errors::Ship::Client(e.to_string()))?;
            if let (Some(username), Some(password)) = (&proxy.username, &proxy.password) {
                reqwest_proxy = reqwest_proxy.basic_auth(username, password);
            }
            builder = builder.proxy(reqwest_proxy);
        }

        let client = builder
            .build()
            .map_err(|e| errors::Ship::Client(e.to_string()))?;

        Ok(Self {
            client,
            url: config.url,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn ship(&self, body: Vec<u8>) -> Result<(), errors::Ship> {
        debug!("Sending {} bytes to {}", body.len(), self.url);
        let response = self
            .client
            .post(&self.url)
            .header(header::CONTENT_TYPE, CONTENT_TYPE)
            .header(header::USER_AGENT, USER_AGENT)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                error!("Error while sending to {}: {e}", self.url);
                errors::Ship::Request {
                    url: self.url.clone(),
                    reason: e.to_string(),
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let error = errors::Ship::Destination {
            url: self.url.clone(),
            status,
            body,
        };
        error!("{error}");
        Err(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[tokio::test]
    async fn test_ship_posts_line_protocol() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/write?db=metrics")
            .match_header("content-type", "text/plain; charset=utf-8")
            .match_header("user-agent", "telegraf")
            .match_body("os disk.size=777i 1\n")
            .with_status(204)
            .create_async()
            .await;

        let flusher = Flusher::new(FlusherConfig::new(
            format!("{}/write?db=metrics", server.url()),
            None,
        ))
        .unwrap();

        flusher
            .ship(b"os disk.size=777i 1\n".to_vec())
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_ship_reports_destination_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/write?db=metrics")
            .with_status(400)
            .with_body("bad line")
            .create_async()
            .await;

        let flusher = Flusher::new(FlusherConfig::new(
            format!("{}/write?db=metrics", server.url()),
            None,
        ))
        .unwrap();

        let result = flusher.ship(b"garbage".to_vec()).await;

        match result {
            Err(errors::Ship::Destination { status, body, .. }) => {
                assert_eq!(status.as_u16(), 400);
                assert_eq!(body, "bad line");
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_ship_reports_request_error() {
        let flusher = Flusher::new(FlusherConfig {
            url: "http://127.0.0.1:1/write?db=metrics".to_string(),
            proxy: None,
            connect_timeout: Duration::from_millis(200),
            timeout: Duration::from_millis(500),
        })
        .unwrap();

        let result = flusher.ship(b"os x=1i 1\n".to_vec()).await;

        assert!(matches!(result, Err(errors::Ship::Request { .. })));
    }

    #[test]
    fn test_new_with_proxy() {
        let proxy = ProxyConfig {
            url: reqwest::Url::parse("http://proxy:8080").unwrap(),
            username: Some("user".to_string()),
            password: Some("pass".to_string()),
        };

        let flusher = Flusher::new(FlusherConfig::new(
            "https://spm-receiver.sematext.com/write?db=metrics".to_string(),
            Some(proxy),
        ));

        assert!(flusher.is_ok());
    }
}
