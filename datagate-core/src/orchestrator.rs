use crate::domain::Dataset;
use crate::logging::{LogEvent, LogLevel, SharedEventLogger};
use crate::metrics::Metrics;
use crate::validation::{ValidationErrorDetail, ValidationResult, ValidationStatus, Validator};
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One result per configured check, in submission order, regardless of how
/// individual checks fared.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunReport {
    pub results: Vec<ValidationResult>,
}

impl RunReport {
    pub fn all_passed(&self) -> bool {
        self.results.iter().all(ValidationResult::passed)
    }

    pub fn failed(&self) -> impl Iterator<Item = &ValidationResult> {
        self.results
            .iter()
            .filter(|r| r.status == ValidationStatus::Fail)
    }
}

/// Runs a configured set of checks against one dataset. Checks are mutually
/// independent and never mutate the dataset, so they run concurrently over
/// the same borrow.
pub struct Orchestrator {
    validators: Vec<Arc<dyn Validator>>,
    metrics: Arc<dyn Metrics>,
    logger: SharedEventLogger,
    check_timeout: Option<Duration>,
}

impl Orchestrator {
    pub fn new(
        validators: Vec<Arc<dyn Validator>>,
        metrics: Arc<dyn Metrics>,
        logger: SharedEventLogger,
    ) -> Self {
        Self {
            validators,
            metrics,
            logger,
            check_timeout: None,
        }
    }

    /// Upper bound on one check's wall-clock time. A check that exceeds it
    /// has its in-flight work dropped and is reported as `cancelled`.
    pub fn with_check_timeout(mut self, timeout: Duration) -> Self {
        self.check_timeout = Some(timeout);
        self
    }

    pub async fn run(&self, data: &Dataset) -> RunReport {
        let checks = self
            .validators
            .iter()
            .map(|validator| self.run_check(validator.clone(), data));
        RunReport {
            results: join_all(checks).await,
        }
    }

    async fn run_check(&self, validator: Arc<dyn Validator>, data: &Dataset) -> ValidationResult {
        let name = validator.name().to_string();
        self.metrics.inc_check_started();
        self.logger.log(
            LogEvent::new(LogLevel::Info, "orchestrator.check.started")
                .with_validator(name.clone())
                .with_field("samples", data.len().to_string()),
        );

        let started = Instant::now();
        let result = match self.check_timeout {
            Some(limit) => match tokio::time::timeout(limit, validator.validate(data)).await {
                Ok(result) => result,
                Err(_) => {
                    self.metrics.inc_check_cancelled();
                    ValidationResult::fail(
                        name.clone(),
                        vec![ValidationErrorDetail::new(format!(
                            "check cancelled after {}ms",
                            limit.as_millis()
                        ))
                        .with_code("cancelled")],
                    )
                }
            },
            None => validator.validate(data).await,
        };

        match result.status {
            ValidationStatus::Pass => self.metrics.record_check_passed(),
            ValidationStatus::Fail => {
                self.metrics.record_check_failed();
                self.metrics.add_error_details(result.errors.len() as u64);
            }
        }
        self.logger.log(
            LogEvent::new(LogLevel::Info, "orchestrator.check.completed")
                .with_validator(name)
                .with_field(
                    "status",
                    match result.status {
                        ValidationStatus::Pass => "pass",
                        ValidationStatus::Fail => "fail",
                    },
                )
                .with_field("errors", result.errors.len().to_string())
                .with_field("elapsed_ms", started.elapsed().as_millis().to_string()),
        );
        result
    }
}
