//! Validation engine for step responses.

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde::Serialize;

use super::flow::{InputKind, Locale, LocalizedText, StepDefinition};
use super::response::Response;

/// Predicate for `custom` rules. Must be pure.
pub type Predicate = Arc<dyn Fn(&Response) -> bool + Send + Sync>;

/// What a rule checks.
#[derive(Clone)]
pub enum RuleKind {
    /// Fails on an absent response (see [`Response::is_absent`]).
    Required,
    /// Text length or numeric value must be at least the threshold.
    Min(f64),
    /// Text length or numeric value must be at most the threshold.
    Max(f64),
    /// Text must match the expression.
    Pattern(Regex),
    Custom(Predicate),
}

impl RuleKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::Min(_) => "min",
            Self::Max(_) => "max",
            Self::Pattern(_) => "pattern",
            Self::Custom(_) => "custom",
        }
    }
}

impl fmt::Debug for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => write!(f, "Required"),
            Self::Min(n) => write!(f, "Min({n})"),
            Self::Max(n) => write!(f, "Max({n})"),
            Self::Pattern(re) => write!(f, "Pattern({})", re.as_str()),
            Self::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// A rule plus the message shown when it fails.
#[derive(Debug, Clone)]
pub struct ValidationRule {
    pub kind: RuleKind,
    pub message: LocalizedText,
}

impl ValidationRule {
    pub fn required(message: LocalizedText) -> Self {
        Self {
            kind: RuleKind::Required,
            message,
        }
    }

    pub fn min(threshold: f64, message: LocalizedText) -> Self {
        Self {
            kind: RuleKind::Min(threshold),
            message,
        }
    }

    pub fn max(threshold: f64, message: LocalizedText) -> Self {
        Self {
            kind: RuleKind::Max(threshold),
            message,
        }
    }

    pub fn pattern(regex: Regex, message: LocalizedText) -> Self {
        Self {
            kind: RuleKind::Pattern(regex),
            message,
        }
    }

    pub fn custom<F>(predicate: F, message: LocalizedText) -> Self
    where
        F: Fn(&Response) -> bool + Send + Sync + 'static,
    {
        Self {
            kind: RuleKind::Custom(Arc::new(predicate)),
            message,
        }
    }

    /// Whether `response` passes this rule.
    ///
    /// `min`, `max` and `pattern` only look at responses they can measure; the
    /// flow builder refuses to attach them to other input kinds, so anything
    /// else passes. An absent response passes every rule except `required`.
    pub fn passes(&self, response: &Response) -> bool {
        match &self.kind {
            RuleKind::Required => !response.is_absent(),
            _ if response.is_absent() => true,
            RuleKind::Min(min) => measure(response).is_none_or(|v| v >= *min),
            RuleKind::Max(max) => measure(response).is_none_or(|v| v <= *max),
            RuleKind::Pattern(re) => match response {
                Response::Text(s) => re.is_match(s),
                _ => true,
            },
            RuleKind::Custom(predicate) => predicate(response),
        }
    }
}

/// Text length (in characters) or numeric value.
fn measure(response: &Response) -> Option<f64> {
    match response {
        Response::Text(s) => Some(s.chars().count() as f64),
        Response::Number(n) | Response::Slider(n) => Some(*n),
        _ => None,
    }
}

/// Outcome of validating one response: the failing rules' messages in
/// declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationResult {
    errors: Vec<String>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<String> {
        self.errors
    }
}

fn kind_mismatch(locale: Locale) -> &'static str {
    match locale {
        Locale::Fr => "Type de réponse invalide pour cette question",
        Locale::En | Locale::Us => "Invalid response type for this question",
    }
}

/// Check `response` against every rule of `step`.
///
/// Pure: the same inputs always produce the same result. A step without rules
/// accepts any response. Otherwise a response of the wrong widget type fails
/// with a single message before any rule runs.
pub fn validate(step: &StepDefinition, response: &Response, locale: Locale) -> ValidationResult {
    if step.rules.is_empty() {
        return ValidationResult::default();
    }
    if let (Some(expected), Some(actual)) = (step.input, response.input_kind()) {
        let compatible = expected == actual
            || matches!(
                (expected, actual),
                (InputKind::Slider, InputKind::Number) | (InputKind::Number, InputKind::Slider)
            );
        if !compatible {
            return ValidationResult {
                errors: vec![kind_mismatch(locale).to_string()],
            };
        }
    }

    let errors = step
        .rules
        .iter()
        .filter(|rule| !rule.passes(response))
        .map(|rule| rule.message.render(locale).to_string())
        .collect();
    ValidationResult { errors }
}
