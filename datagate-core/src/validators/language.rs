use crate::domain::{Dataset, Options, Role};
use crate::progress::Reporter;
use crate::validation::{ValidationErrorDetail, Validator};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Languages a dataset is allowed to contain. Detection results outside this
/// set are flagged; "unknown" is never flagged.
pub const SUPPORTED_LANGUAGES: &[&str] = &[
    "en", "zh-cn", "es", "hi", "ar", "bn", "pt", "ru", "ja", "de", "jv", "ko", "fr", "tr", "vi",
    "it", "pl", "uk", "fa",
];

const UNKNOWN: &str = "unknown";

/// Language detection is an injected capability; the algorithm behind it is
/// not part of the gate. Returns a language tag, or "unknown" when the text
/// gives no signal.
pub trait LanguageDetector: Send + Sync {
    fn detect(&self, text: &str) -> anyhow::Result<String>;
}

/// Script-based detector used when no external detector is wired in. Good
/// enough to separate the major scripts; anything ambiguous is "unknown".
pub struct HeuristicLanguageDetector;

impl LanguageDetector for HeuristicLanguageDetector {
    fn detect(&self, text: &str) -> anyhow::Result<String> {
        if text.trim().is_empty() {
            return Ok(UNKNOWN.to_string());
        }
        let mut counts: [usize; 7] = [0; 7];
        for c in text.chars() {
            match c {
                '\u{4E00}'..='\u{9FFF}' => counts[0] += 1,          // Han
                '\u{3040}'..='\u{30FF}' => counts[1] += 1,          // Kana
                '\u{AC00}'..='\u{D7AF}' => counts[2] += 1,          // Hangul
                '\u{0400}'..='\u{04FF}' => counts[3] += 1,          // Cyrillic
                '\u{0600}'..='\u{06FF}' => counts[4] += 1,          // Arabic
                '\u{0900}'..='\u{097F}' => counts[5] += 1,          // Devanagari
                c if c.is_ascii_alphabetic() => counts[6] += 1,     // Latin
                _ => {}
            }
        }
        let tags = ["zh-cn", "ja", "ko", "ru", "ar", "hi", "en"];
        let (best, &count) = counts
            .iter()
            .enumerate()
            .max_by_key(|(_, c)| **c)
            .unwrap_or((6, &0));
        if count == 0 {
            Ok(UNKNOWN.to_string())
        } else {
            // Kana anywhere means Japanese even when Han characters dominate.
            if counts[1] > 0 && (best == 0 || best == 1) {
                return Ok("ja".to_string());
            }
            Ok(tags[best].to_string())
        }
    }
}

/// Gate 4: language and encoding consistency. Checks every sample for
/// unsupported languages, user/assistant language mismatch, deviation from
/// an explicitly configured `expected_lang`, and replacement characters left
/// behind by a broken encoding step.
pub struct LanguageConsistencyValidator {
    reporter: Reporter,
    detector: Arc<dyn LanguageDetector>,
    expected_lang: Option<String>,
}

impl LanguageConsistencyValidator {
    pub const NAME: &'static str = "language_consistency";

    pub fn new(options: Options, reporter: Reporter) -> Self {
        Self::with_detector(Arc::new(HeuristicLanguageDetector), options, reporter)
    }

    pub fn with_detector(
        detector: Arc<dyn LanguageDetector>,
        options: Options,
        reporter: Reporter,
    ) -> Self {
        Self {
            reporter,
            detector,
            expected_lang: options.str_opt("expected_lang").map(str::to_string),
        }
    }

    fn check_sample(
        &self,
        index: usize,
        roles: &[Role],
        langs: &[String],
        contents: &[&str],
        errors: &mut Vec<ValidationErrorDetail>,
    ) {
        let unsupported: BTreeSet<&str> = langs
            .iter()
            .map(String::as_str)
            .filter(|l| *l != UNKNOWN && !SUPPORTED_LANGUAGES.contains(l))
            .collect();
        if !unsupported.is_empty() {
            let listed: Vec<&str> = unsupported.into_iter().collect();
            errors.push(
                ValidationErrorDetail::new(format!(
                    "contains unsupported language(s): {}",
                    listed.join(", ")
                ))
                .at_index(index)
                .with_code("unsupported_language"),
            );
        }

        let first_user = roles
            .iter()
            .position(|r| *r == Role::User)
            .map(|j| langs[j].as_str());
        let first_assistant = roles
            .iter()
            .position(|r| *r == Role::Assistant)
            .map(|j| langs[j].as_str());
        if let (Some(user), Some(assistant)) = (first_user, first_assistant) {
            if user != assistant {
                errors.push(
                    ValidationErrorDetail::new(format!(
                        "user language '{user}' does not match assistant language '{assistant}'"
                    ))
                    .at_index(index)
                    .with_code("language_mismatch"),
                );
            }
        }

        if let Some(expected) = &self.expected_lang {
            let off: BTreeSet<&str> = langs
                .iter()
                .map(String::as_str)
                .filter(|l| *l != UNKNOWN && *l != expected)
                .collect();
            if !off.is_empty() {
                let listed: Vec<&str> = off.into_iter().collect();
                errors.push(
                    ValidationErrorDetail::new(format!(
                        "language mismatch: expected '{expected}', got {}",
                        listed.join(", ")
                    ))
                    .at_index(index)
                    .with_code("expected_language_mismatch"),
                );
            }
        }

        for (j, content) in contents.iter().enumerate() {
            if content.contains('\u{FFFD}') {
                errors.push(
                    ValidationErrorDetail::new("contains garbled/invalid characters")
                        .at_index(index)
                        .with_field(format!("messages[{j}].content"))
                        .with_code("garbled_characters"),
                );
            }
        }
    }
}

#[async_trait]
impl Validator for LanguageConsistencyValidator {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn run(&self, data: &Dataset) -> anyhow::Result<Vec<ValidationErrorDetail>> {
        let total = data.len();
        let mut errors = Vec::new();

        for (i, sample) in data.iter().enumerate() {
            if sample.messages.is_empty() {
                self.reporter.report_progress(i + 1, total);
                continue;
            }
            let roles: Vec<Role> = sample.messages.iter().map(|m| m.role).collect();
            let contents: Vec<&str> =
                sample.messages.iter().map(|m| m.content.as_str()).collect();

            let mut langs = Vec::with_capacity(contents.len());
            let mut detection_failed = false;
            for content in &contents {
                match self.detector.detect(content) {
                    Ok(lang) => langs.push(lang),
                    Err(e) => {
                        errors.push(
                            ValidationErrorDetail::new(format!("language detection error: {e}"))
                                .at_index(i)
                                .with_code("detection_exception"),
                        );
                        detection_failed = true;
                        break;
                    }
                }
            }
            if !detection_failed {
                self.check_sample(i, &roles, &langs, &contents, &mut errors);
            }
            self.reporter.report_progress(i + 1, total);
        }

        Ok(errors)
    }
}
