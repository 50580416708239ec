use crate::domain::Dataset;
use crate::progress::Reporter;
use crate::validation::{ValidationErrorDetail, Validator};
use async_trait::async_trait;
use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::OnceLock;

/// Toxicity detection is an injected capability. The lexicon or model behind
/// it is not part of the gate.
pub trait ToxicityAnalyzer: Send + Sync {
    fn is_toxic(&self, text: &str) -> bool;
}

/// PII detection is an injected capability. `scrub` returns the cleaned text
/// when something was found, `None` when the text is clean.
pub trait PiiScrubber: Send + Sync {
    fn scrub(&self, text: &str) -> Option<String>;
}

/// Word-list analyzer used when nothing better is wired in.
pub struct LexiconToxicityAnalyzer {
    words: HashSet<String>,
}

impl LexiconToxicityAnalyzer {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            words: words.into_iter().map(|w| w.into().to_lowercase()).collect(),
        }
    }
}

impl Default for LexiconToxicityAnalyzer {
    fn default() -> Self {
        Self::new(["idiot", "stupid", "moron", "shut up", "hate you"])
    }
}

impl ToxicityAnalyzer for LexiconToxicityAnalyzer {
    fn is_toxic(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.words.iter().any(|w| lowered.contains(w.as_str()))
    }
}

fn pii_patterns() -> &'static [(Regex, &'static str)] {
    static PATTERNS: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        vec![
            (
                Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}")
                    .expect("email pattern is valid"),
                "{{EMAIL}}",
            ),
            (
                Regex::new(r"\+?\d[\d\s().-]{7,}\d").expect("phone pattern is valid"),
                "{{PHONE}}",
            ),
            (
                Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").expect("ssn pattern is valid"),
                "{{SSN}}",
            ),
        ]
    })
}

/// Regex scrubber for the obvious structured identifiers: emails, phone
/// numbers, SSNs.
#[derive(Default)]
pub struct RegexPiiScrubber;

impl PiiScrubber for RegexPiiScrubber {
    fn scrub(&self, text: &str) -> Option<String> {
        let mut cleaned = text.to_string();
        for (pattern, replacement) in pii_patterns() {
            cleaned = pattern.replace_all(&cleaned, *replacement).into_owned();
        }
        if cleaned == text {
            None
        } else {
            Some(cleaned)
        }
    }
}

fn markdown_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[*_]{3,}").expect("markdown pattern is valid"))
}

fn preview(text: &str) -> String {
    let mut short: String = text.chars().take(30).collect();
    if text.chars().count() > 30 {
        short.push_str("...");
    }
    short
}

/// Gate 8: content-safety guardrails. Every message runs three independent
/// sub-checks: toxicity, PII, and a formatting heuristic. An analyzer that
/// was not wired in is reported as `missing_dependency` (once, dataset
/// level), so "no profanity found" stays distinguishable from "profanity
/// checking never ran".
pub struct GuardrailComplianceValidator {
    reporter: Reporter,
    toxicity: Option<Arc<dyn ToxicityAnalyzer>>,
    pii: Option<Arc<dyn PiiScrubber>>,
}

impl GuardrailComplianceValidator {
    pub const NAME: &'static str = "guardrail_compliance";

    pub fn new(
        toxicity: Option<Arc<dyn ToxicityAnalyzer>>,
        pii: Option<Arc<dyn PiiScrubber>>,
        reporter: Reporter,
    ) -> Self {
        Self {
            reporter,
            toxicity,
            pii,
        }
    }

    pub fn with_default_analyzers(reporter: Reporter) -> Self {
        Self::new(
            Some(Arc::new(LexiconToxicityAnalyzer::default())),
            Some(Arc::new(RegexPiiScrubber)),
            reporter,
        )
    }
}

#[async_trait]
impl Validator for GuardrailComplianceValidator {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn run(&self, data: &Dataset) -> anyhow::Result<Vec<ValidationErrorDetail>> {
        let mut errors = Vec::new();

        if self.toxicity.is_none() {
            errors.push(
                ValidationErrorDetail::new("no toxicity analyzer configured; check skipped")
                    .with_code("missing_dependency"),
            );
        }
        if self.pii.is_none() {
            errors.push(
                ValidationErrorDetail::new("no PII scrubber configured; check skipped")
                    .with_code("missing_dependency"),
            );
        }

        let total: usize = data.iter().map(|s| s.messages.len()).sum();
        let mut processed = 0;

        for (i, sample) in data.iter().enumerate() {
            for (j, msg) in sample.messages.iter().enumerate() {
                let field = format!("messages[{j}].content");

                if let Some(analyzer) = &self.toxicity {
                    if analyzer.is_toxic(&msg.content) {
                        errors.push(
                            ValidationErrorDetail::new(format!(
                                "toxic content detected in text: \"{}\"",
                                preview(&msg.content)
                            ))
                            .at_index(i)
                            .with_field(field.clone())
                            .with_code("toxic_content"),
                        );
                    }
                }

                if let Some(scrubber) = &self.pii {
                    if let Some(cleaned) = scrubber.scrub(&msg.content) {
                        errors.push(
                            ValidationErrorDetail::new(format!(
                                "potential PII detected; cleaned version: \"{}\"",
                                preview(&cleaned)
                            ))
                            .at_index(i)
                            .with_field(field.clone())
                            .with_code("pii_detected"),
                        );
                    }
                }

                if markdown_pattern().is_match(&msg.content) {
                    errors.push(
                        ValidationErrorDetail::new("formatting issue: excessive markdown")
                            .at_index(i)
                            .with_field(field)
                            .with_code("formatting_issue"),
                    );
                }

                processed += 1;
                self.reporter.report_progress(processed, total);
            }
        }

        Ok(errors)
    }
}
