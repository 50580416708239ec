use crate::domain::Dataset;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One structured error produced by a check. An absent `index` means the
/// error concerns the dataset as a whole rather than one sample.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ValidationErrorDetail {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl Default for ValidationErrorDetail {
    fn default() -> Self {
        Self {
            error: String::new(),
            index: None,
            field: None,
            code: None,
        }
    }
}

impl ValidationErrorDetail {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            ..Default::default()
        }
    }

    pub fn at_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    Pass,
    Fail,
}

/// The envelope every check produces, exactly once per invocation.
/// `errors` is empty iff `status` is `Pass`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationResult {
    pub status: ValidationStatus,
    #[serde(default)]
    pub errors: Vec<ValidationErrorDetail>,
    #[serde(rename = "validator")]
    pub validator_name: String,
}

impl ValidationResult {
    pub fn pass(validator_name: impl Into<String>) -> Self {
        Self {
            status: ValidationStatus::Pass,
            errors: Vec::new(),
            validator_name: validator_name.into(),
        }
    }

    pub fn fail(validator_name: impl Into<String>, errors: Vec<ValidationErrorDetail>) -> Self {
        Self {
            status: ValidationStatus::Fail,
            errors,
            validator_name: validator_name.into(),
        }
    }

    pub fn from_errors(
        validator_name: impl Into<String>,
        errors: Vec<ValidationErrorDetail>,
    ) -> Self {
        if errors.is_empty() {
            Self::pass(validator_name)
        } else {
            Self::fail(validator_name, errors)
        }
    }

    pub fn passed(&self) -> bool {
        self.status == ValidationStatus::Pass
    }
}

/// The contract every gate check implements, local or remote.
///
/// `run` holds the check-specific logic and returns the error details it
/// found. `validate` is the only entry point external callers use: it wraps
/// `run`, so any error escaping a check body becomes a `Fail` result with a
/// single synthetic detail instead of aborting the overall run.
#[async_trait]
pub trait Validator: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self, data: &Dataset) -> anyhow::Result<Vec<ValidationErrorDetail>>;

    async fn validate(&self, data: &Dataset) -> ValidationResult {
        match self.run(data).await {
            Ok(errors) => ValidationResult::from_errors(self.name(), errors),
            Err(e) => ValidationResult::fail(
                self.name(),
                vec![ValidationErrorDetail::new(format!("{e:#}"))],
            ),
        }
    }
}
