mod availability;
mod balance;
mod dedup;
mod guardrail;
mod language;
mod quantity;
mod structural;

pub use availability::LinkAvailabilityValidator;
pub use balance::DialogBalanceValidator;
pub use dedup::DeduplicationValidator;
pub use guardrail::{
    GuardrailComplianceValidator, LexiconToxicityAnalyzer, PiiScrubber, RegexPiiScrubber,
    ToxicityAnalyzer,
};
pub use language::{HeuristicLanguageDetector, LanguageConsistencyValidator, LanguageDetector};
pub use quantity::QuantitySizeValidator;
pub use structural::ChatStructureValidator;

use crate::domain::Options;
use crate::progress::Reporter;
use crate::remote::{RemoteItemValidator, RemoteValidator};
use crate::validation::Validator;
use std::sync::Arc;

/// All registered gate names, in conventional gate order.
pub const GATE_NAMES: &[&str] = &[
    ChatStructureValidator::NAME,
    DeduplicationValidator::NAME,
    LinkAvailabilityValidator::NAME,
    LanguageConsistencyValidator::NAME,
    DialogBalanceValidator::NAME,
    QuantitySizeValidator::NAME,
    GuardrailComplianceValidator::NAME,
];

/// Explicit name-to-factory registry. Checks are added here by registration,
/// never discovered by scanning.
pub fn create_validator(
    name: &str,
    options: Options,
    reporter: Reporter,
) -> anyhow::Result<Arc<dyn Validator>> {
    match name {
        ChatStructureValidator::NAME => Ok(Arc::new(ChatStructureValidator::new(reporter))),
        DeduplicationValidator::NAME => Ok(Arc::new(DeduplicationValidator::new(reporter))),
        LinkAvailabilityValidator::NAME => Ok(Arc::new(LinkAvailabilityValidator::new(reporter))),
        LanguageConsistencyValidator::NAME => {
            Ok(Arc::new(LanguageConsistencyValidator::new(options, reporter)))
        }
        DialogBalanceValidator::NAME => {
            Ok(Arc::new(DialogBalanceValidator::new(options, reporter)))
        }
        QuantitySizeValidator::NAME => Ok(Arc::new(QuantitySizeValidator::new(options, reporter))),
        GuardrailComplianceValidator::NAME => Ok(Arc::new(
            GuardrailComplianceValidator::with_default_analyzers(reporter),
        )),
        RemoteValidator::NAME => Ok(Arc::new(RemoteValidator::new(options, reporter)?)),
        RemoteItemValidator::NAME => Ok(Arc::new(RemoteItemValidator::new(options, reporter)?)),
        other => anyhow::bail!("unknown validator '{other}'"),
    }
}
