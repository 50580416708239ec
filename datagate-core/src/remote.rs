//! Delegation of validation work to an external HTTP service, normalizing
//! whatever error shapes it returns into the local schema. Two modes: one
//! bulk request for the whole dataset, or one request per sample.

use crate::domain::{Dataset, Options, Sample};
use crate::progress::Reporter;
use crate::validation::{ValidationErrorDetail, Validator};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum RemoteConfigError {
    #[error("no 'endpoint' provided in options for {0}")]
    MissingEndpoint(&'static str),
}

fn http_client() -> Client {
    Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(60))
        .build()
        .unwrap_or_else(|_| Client::new())
}

fn endpoint_from(options: &Options, name: &'static str) -> Result<String, RemoteConfigError> {
    options
        .str_opt("endpoint")
        .map(str::to_string)
        .ok_or(RemoteConfigError::MissingEndpoint(name))
}

#[derive(Debug, Deserialize)]
struct RemoteResponse {
    status: Option<String>,
    #[serde(default)]
    errors: Vec<serde_json::Value>,
}

/// Normalizes one element of a remote `errors` array. Objects already in the
/// local schema pass through untouched; anything else is wrapped.
fn normalize_remote_error(raw: &serde_json::Value) -> ValidationErrorDetail {
    if raw.is_object() {
        match serde_json::from_value::<ValidationErrorDetail>(raw.clone()) {
            Ok(detail) if !detail.error.is_empty() => detail,
            _ => ValidationErrorDetail::new(format!("unexpected error format: {raw}"))
                .with_code("remote_error_parse"),
        }
    } else {
        let message = raw
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| raw.to_string());
        ValidationErrorDetail::new(message).with_code("remote_error")
    }
}

/// Gate X, bulk mode: sends the whole dataset in one request and translates
/// the response into local error details.
pub struct RemoteValidator {
    reporter: Reporter,
    client: Client,
    endpoint: String,
}

impl std::fmt::Debug for RemoteValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteValidator")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl RemoteValidator {
    pub const NAME: &'static str = "remote";

    pub fn new(options: Options, reporter: Reporter) -> Result<Self, RemoteConfigError> {
        let endpoint = endpoint_from(&options, Self::NAME)?;
        Ok(Self {
            reporter,
            client: http_client(),
            endpoint,
        })
    }
}

#[async_trait]
impl Validator for RemoteValidator {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn run(&self, data: &Dataset) -> anyhow::Result<Vec<ValidationErrorDetail>> {
        self.reporter.report_stage("sending to remote");
        let body = serde_json::json!({ "data": data });
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("remote request failed: {e}"))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Ok(vec![ValidationErrorDetail::new(format!(
                "remote HTTP error {}: {text}",
                status.as_u16()
            ))
            .with_code("remote_http_error")]);
        }

        let result: RemoteResponse = match resp.json().await {
            Ok(r) => r,
            Err(e) => {
                return Ok(vec![ValidationErrorDetail::new(format!(
                    "failed to parse remote response: {e}"
                ))
                .with_code("remote_error_parse")])
            }
        };

        self.reporter.report_stage("processing response");

        if result.status.as_deref() == Some("pass") {
            return Ok(Vec::new());
        }
        Ok(result.errors.iter().map(normalize_remote_error).collect())
    }
}

/// Gate X, per-item mode: one request per sample, with native per-item
/// progress. An HTTP failure for one item is local to that item; the
/// remaining items are still sent.
pub struct RemoteItemValidator {
    reporter: Reporter,
    client: Client,
    endpoint: String,
}

impl RemoteItemValidator {
    pub const NAME: &'static str = "remote_item";

    pub fn new(options: Options, reporter: Reporter) -> Result<Self, RemoteConfigError> {
        let endpoint = endpoint_from(&options, Self::NAME)?;
        Ok(Self {
            reporter,
            client: http_client(),
            endpoint,
        })
    }

    async fn validate_item(
        &self,
        index: usize,
        item: &Sample,
        errors: &mut Vec<ValidationErrorDetail>,
    ) {
        let body = serde_json::json!({ "item": item, "index": index });
        let resp = match self.client.post(&self.endpoint).json(&body).send().await {
            Ok(resp) => resp,
            // Transport failure is local to this item.
            Err(e) => {
                errors.push(
                    ValidationErrorDetail::new(format!("request failed: {e}"))
                        .at_index(index)
                        .with_code("fetch_error"),
                );
                return;
            }
        };

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            errors.push(
                ValidationErrorDetail::new(format!("HTTP {}: {text}", status.as_u16()))
                    .at_index(index)
                    .with_code("remote_http_error"),
            );
            return;
        }

        let result: RemoteResponse = match resp.json().await {
            Ok(r) => r,
            Err(e) => {
                errors.push(
                    ValidationErrorDetail::new(format!("failed to parse remote response: {e}"))
                        .at_index(index)
                        .with_code("remote_error_parse"),
                );
                return;
            }
        };

        if result.status.as_deref() != Some("fail") {
            return;
        }
        for raw in &result.errors {
            if raw.is_object() {
                let mut detail = normalize_remote_error(raw);
                // The remote index wins only when the payload carries one.
                detail.index = detail.index.or(Some(index));
                errors.push(detail);
            } else {
                let message = raw
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| raw.to_string());
                errors.push(
                    ValidationErrorDetail::new(message)
                        .at_index(index)
                        .with_code("remote_item_error"),
                );
            }
        }
    }
}

#[async_trait]
impl Validator for RemoteItemValidator {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn run(&self, data: &Dataset) -> anyhow::Result<Vec<ValidationErrorDetail>> {
        let total = data.len();
        self.reporter
            .report_stage(format!("validating {total} items remotely"));

        let mut errors = Vec::new();
        for (idx, item) in data.iter().enumerate() {
            self.reporter.report_progress(idx + 1, total);
            self.validate_item(idx, item, &mut errors).await;
        }

        self.reporter.report_stage("complete");
        Ok(errors)
    }
}
