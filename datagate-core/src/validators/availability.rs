use crate::domain::Dataset;
use crate::progress::Reporter;
use crate::validation::{ValidationErrorDetail, Validator};
use async_trait::async_trait;
use futures_util::future::join_all;
use regex::Regex;
use reqwest::Client;
use std::sync::OnceLock;
use std::time::Duration;

fn url_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"https?://[^\s]+").expect("url pattern is valid"))
}

/// Gate 3: every URL mentioned in message content must be reachable.
///
/// The progress denominator is the total message count; progress advances
/// once per message, whether it carries zero or many URLs, so the total is
/// deterministic. URLs within one message are fetched concurrently.
pub struct LinkAvailabilityValidator {
    reporter: Reporter,
    client: Client,
}

impl LinkAvailabilityValidator {
    pub const NAME: &'static str = "link_availability";

    pub fn new(reporter: Reporter) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self::with_client(client, reporter)
    }

    pub fn with_client(client: Client, reporter: Reporter) -> Self {
        Self { reporter, client }
    }

    fn extract_urls(content: &str) -> Vec<String> {
        url_pattern()
            .find_iter(content)
            .map(|m| m.as_str().trim_end_matches(['.', ',', ')', ']', ';']).to_string())
            .collect()
    }

    async fn check_url(&self, url: &str) -> Option<(String, &'static str)> {
        match self.client.get(url).send().await {
            Ok(resp) if resp.status().is_success() => None,
            Ok(resp) => Some((
                format!("URL {url} returned status {}", resp.status().as_u16()),
                "unavailable_url",
            )),
            Err(e) => Some((format!("URL {url} fetch failed: {e}"), "fetch_error")),
        }
    }
}

#[async_trait]
impl Validator for LinkAvailabilityValidator {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn run(&self, data: &Dataset) -> anyhow::Result<Vec<ValidationErrorDetail>> {
        let total: usize = data.iter().map(|s| s.messages.len()).sum();
        let mut processed = 0;
        let mut errors = Vec::new();

        for (i, sample) in data.iter().enumerate() {
            for (j, msg) in sample.messages.iter().enumerate() {
                let urls = Self::extract_urls(&msg.content);
                let checks = urls.iter().map(|url| self.check_url(url));
                for outcome in join_all(checks).await.into_iter().flatten() {
                    let (message, code) = outcome;
                    errors.push(
                        ValidationErrorDetail::new(message)
                            .at_index(i)
                            .with_field(format!("messages[{j}].content"))
                            .with_code(code),
                    );
                }
                processed += 1;
                self.reporter.report_progress(processed, total);
            }
        }

        Ok(errors)
    }
}
