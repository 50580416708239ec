use crate::domain::{Dataset, Role, Sample};
use crate::progress::Reporter;
use crate::validation::{ValidationErrorDetail, Validator};
use async_trait::async_trait;

/// Gate 1: message roles and ordering. A chat must open with a `user`
/// message, or a `system` message immediately followed by `user`.
pub struct ChatStructureValidator {
    reporter: Reporter,
}

impl ChatStructureValidator {
    pub const NAME: &'static str = "chat_structure";

    pub fn new(reporter: Reporter) -> Self {
        Self { reporter }
    }

    fn check_sample(sample: &Sample) -> Option<ValidationErrorDetail> {
        let roles: Vec<Role> = sample.messages.iter().map(|m| m.role).collect();
        if roles.is_empty() {
            return Some(
                ValidationErrorDetail::new("chat must contain messages")
                    .with_field("messages")
                    .with_code("schema_validation"),
            );
        }
        let ok = match roles[0] {
            Role::User => true,
            Role::System => roles.get(1) == Some(&Role::User),
            Role::Assistant => false,
        };
        if ok {
            None
        } else {
            Some(
                ValidationErrorDetail::new(
                    "chat must start with a user message, or a system message followed by a user",
                )
                .with_field("messages[0].role")
                .with_code("schema_validation"),
            )
        }
    }
}

#[async_trait]
impl Validator for ChatStructureValidator {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn run(&self, data: &Dataset) -> anyhow::Result<Vec<ValidationErrorDetail>> {
        if data.is_empty() {
            // Dataset-level error: no index.
            return Ok(vec![ValidationErrorDetail::new(
                "empty dataset: nothing to validate",
            )
            .with_code("schema_validation")]);
        }

        let total = data.len();
        let mut errors = Vec::new();
        for (i, sample) in data.iter().enumerate() {
            if let Some(detail) = Self::check_sample(sample) {
                errors.push(detail.at_index(i));
            }
            self.reporter.report_progress(i + 1, total);
        }
        Ok(errors)
    }
}
