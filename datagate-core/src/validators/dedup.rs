use crate::domain::Dataset;
use crate::progress::Reporter;
use crate::validation::{ValidationErrorDetail, Validator};
use async_trait::async_trait;
use std::collections::HashMap;

/// Gate 2: exact-duplicate detection over the full message array.
///
/// The canonical key is the JSON serialization of `messages`; struct fields
/// serialize in declaration order, so the key is deterministic. The error is
/// reported on the later occurrence and names the first-seen index.
pub struct DeduplicationValidator {
    reporter: Reporter,
}

impl DeduplicationValidator {
    pub const NAME: &'static str = "deduplication";

    pub fn new(reporter: Reporter) -> Self {
        Self { reporter }
    }
}

#[async_trait]
impl Validator for DeduplicationValidator {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn run(&self, data: &Dataset) -> anyhow::Result<Vec<ValidationErrorDetail>> {
        let total = data.len();
        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut errors = Vec::new();

        for (i, sample) in data.iter().enumerate() {
            match serde_json::to_string(&sample.messages) {
                Ok(key) => {
                    if let Some(&first) = seen.get(&key) {
                        errors.push(
                            ValidationErrorDetail::new(format!(
                                "sample {i} is a duplicate of sample {first}"
                            ))
                            .at_index(i)
                            .with_code("duplicate_sample"),
                        );
                    } else {
                        seen.insert(key, i);
                    }
                }
                // A sample that cannot be serialized is flagged and skipped;
                // the scan keeps going.
                Err(e) => errors.push(
                    ValidationErrorDetail::new(format!("sample {i} is not serializable: {e}"))
                        .at_index(i)
                        .with_code("serialization_error"),
                ),
            }
            self.reporter.report_progress(i + 1, total);
        }

        Ok(errors)
    }
}
