//! Delivery: send processed PDFs to a remote collector over HTTP.
//!
//! The collector (an n8n workflow in the reference deployment) receives a
//! multipart POST per file: the PDF bytes plus `filename`/`filepath` form
//! fields and any caller-supplied metadata. The endpoint is injected at
//! construction — [`crate::config::DEFAULT_WEBHOOK_URL`] is only a default
//! config value, never read here — so tests and alternate deployments can
//! point anywhere.
//!
//! Network failures, timeouts, and non-2xx responses are per-file outcomes;
//! a batch of deliveries always runs to completion.

use crate::error::{DocumentError, PipelineError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use super::enhance::file_name;

/// Result of delivering one file, mirroring what the collector answered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    /// True for a 2xx response.
    pub success: bool,
    pub status_code: u16,
    pub response_body: String,
    pub file: String,
}

/// HTTP client for the remote collector endpoint.
pub struct WebhookDelivery {
    client: reqwest::Client,
    url: String,
    timeout_secs: u64,
}

impl WebhookDelivery {
    /// `url` is the collector endpoint; `timeout_secs` bounds one upload.
    pub fn new(url: impl Into<String>, timeout_secs: u64) -> Result<Self, PipelineError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| PipelineError::Internal(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
            timeout_secs,
        })
    }

    /// The endpoint this sender posts to.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send one PDF with optional metadata form fields.
    ///
    /// A non-2xx response is reported in the receipt, not as an `Err`;
    /// `Err` is reserved for files that never produced a response (missing
    /// file, connection failure, timeout).
    pub async fn deliver(
        &self,
        pdf: &Path,
        metadata: &HashMap<String, String>,
    ) -> Result<DeliveryReceipt, DocumentError> {
        let name = file_name(pdf);

        let bytes = tokio::fs::read(pdf).await.map_err(|e| DocumentError::Read {
            name: name.clone(),
            detail: e.to_string(),
        })?;

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(name.clone())
            .mime_str("application/pdf")
            .map_err(|e| DocumentError::Delivery {
                name: name.clone(),
                detail: e.to_string(),
            })?;

        let mut form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("filename", name.clone())
            .text("filepath", pdf.display().to_string());
        for (key, value) in metadata {
            form = form.text(key.clone(), value.clone());
        }

        info!("Delivering {} to {}", name, self.url);

        let response = self
            .client
            .post(&self.url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DocumentError::DeliveryTimeout {
                        name: name.clone(),
                        secs: self.timeout_secs,
                    }
                } else {
                    DocumentError::Delivery {
                        name: name.clone(),
                        detail: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            warn!("Collector rejected {} with HTTP {}", name, status);
        }

        Ok(DeliveryReceipt {
            success: status.is_success(),
            status_code: status.as_u16(),
            response_body: body,
            file: name,
        })
    }
}
