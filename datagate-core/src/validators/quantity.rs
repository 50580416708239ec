use crate::domain::{Dataset, Options};
use crate::progress::Reporter;
use crate::validation::{ValidationErrorDetail, Validator};
use async_trait::async_trait;

/// Gate 6: is there enough data to train on at all. One dataset-level error
/// when the sample count is below `min_samples`, plus a per-sample error for
/// every dialog shorter than `min_turns`.
pub struct QuantitySizeValidator {
    reporter: Reporter,
    min_samples: u64,
    min_turns: u64,
}

impl QuantitySizeValidator {
    pub const NAME: &'static str = "quantity_size";

    pub fn new(options: Options, reporter: Reporter) -> Self {
        Self {
            reporter,
            min_samples: options.u64_or("min_samples", 50),
            min_turns: options.u64_or("min_turns", 2),
        }
    }
}

#[async_trait]
impl Validator for QuantitySizeValidator {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn run(&self, data: &Dataset) -> anyhow::Result<Vec<ValidationErrorDetail>> {
        let mut errors = Vec::new();

        if (data.len() as u64) < self.min_samples {
            errors.push(
                ValidationErrorDetail::new(format!(
                    "dataset has only {} dialogs, but at least {} are required",
                    data.len(),
                    self.min_samples
                ))
                .with_code("too_few_dialogs"),
            );
        }

        let total = data.len();
        for (i, sample) in data.iter().enumerate() {
            if (sample.messages.len() as u64) < self.min_turns {
                errors.push(
                    ValidationErrorDetail::new(format!(
                        "dialog {i} has only {} turn(s); at least {} are required",
                        sample.messages.len(),
                        self.min_turns
                    ))
                    .at_index(i)
                    .with_field("messages")
                    .with_code("too_few_turns"),
                );
            }
            self.reporter.report_progress(i + 1, total);
        }

        Ok(errors)
    }
}
