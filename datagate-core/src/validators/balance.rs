use crate::domain::{Dataset, Options, Role};
use crate::progress::Reporter;
use crate::validation::{ValidationErrorDetail, Validator};
use async_trait::async_trait;

struct DialogStats {
    length: usize,
    user_count: usize,
    assistant_count: usize,
}

/// Gate 5: dataset-wide balance. Flags datasets whose dialogs are too short
/// or too long on average, or whose user/assistant message ratio drifts
/// outside the configured band. All findings are dataset-level.
pub struct DialogBalanceValidator {
    reporter: Reporter,
    min_length: f64,
    max_length: f64,
    min_ratio: f64,
    max_ratio: f64,
}

impl DialogBalanceValidator {
    pub const NAME: &'static str = "dialog_balance";

    pub fn new(options: Options, reporter: Reporter) -> Self {
        Self {
            reporter,
            min_length: options.f64_or("min_length", 2.0),
            max_length: options.f64_or("max_length", 20.0),
            min_ratio: options.f64_or("min_user_assistant_ratio", 0.5),
            max_ratio: options.f64_or("max_user_assistant_ratio", 1.5),
        }
    }
}

#[async_trait]
impl Validator for DialogBalanceValidator {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn run(&self, data: &Dataset) -> anyhow::Result<Vec<ValidationErrorDetail>> {
        let total = data.len();
        let mut stats: Vec<DialogStats> = Vec::new();

        for (i, sample) in data.iter().enumerate() {
            if !sample.messages.is_empty() {
                stats.push(DialogStats {
                    length: sample.messages.len(),
                    user_count: sample
                        .messages
                        .iter()
                        .filter(|m| m.role == Role::User)
                        .count(),
                    assistant_count: sample
                        .messages
                        .iter()
                        .filter(|m| m.role == Role::Assistant)
                        .count(),
                });
            }
            self.reporter.report_progress(i + 1, total);
        }

        if stats.is_empty() {
            return Ok(vec![ValidationErrorDetail::new(
                "no dialogs found in the dataset",
            )
            .with_code("empty_dataset")]);
        }

        let mut errors = Vec::new();
        let n = stats.len() as f64;

        let avg_length = stats.iter().map(|s| s.length as f64).sum::<f64>() / n;
        if avg_length < self.min_length {
            errors.push(
                ValidationErrorDetail::new(format!(
                    "dialogs seem too short on average ({avg_length:.1} turns)"
                ))
                .with_code("dialog_too_short"),
            );
        } else if avg_length > self.max_length {
            errors.push(
                ValidationErrorDetail::new(format!(
                    "dialogs seem excessively long on average ({avg_length:.1} turns)"
                ))
                .with_code("long_dialogs"),
            );
        }

        // The epsilon keeps dialogs without assistant turns from dividing by
        // zero, matching how the ratio is defined.
        let avg_ratio = stats
            .iter()
            .map(|s| s.user_count as f64 / (s.assistant_count as f64 + 1e-6))
            .sum::<f64>()
            / n;
        if avg_ratio < self.min_ratio {
            errors.push(
                ValidationErrorDetail::new(format!(
                    "user messages are underrepresented (user/assistant ratio: {avg_ratio:.2})"
                ))
                .with_code("user_underrepresented"),
            );
        } else if avg_ratio > self.max_ratio {
            errors.push(
                ValidationErrorDetail::new(format!(
                    "user messages are overrepresented (user/assistant ratio: {avg_ratio:.2})"
                ))
                .with_code("user_overrepresented"),
            );
        }

        Ok(errors)
    }
}
