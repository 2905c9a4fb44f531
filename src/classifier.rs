//! Feedback selection for wrong input at a gate
//!
//! Rules are evaluated top-down over the raw message text and the first
//! match wins. The order is fixed: binary-only, digits-only,
//! digits-with-separators, then the catch-all.

use serde::{Deserialize, Serialize};

/// Named predicate over raw text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// One or more of `0`/`1` and nothing else
    BinaryOnly,
    /// One or more ASCII digits and nothing else
    DigitsOnly,
    /// Digits mixed with whitespace, `.` and `-`, at least one digit
    DigitsWithSeparators,
    /// Always matches
    Fallback,
}

impl Rule {
    /// Evaluation order
    pub const ORDER: [Rule; 4] = [
        Rule::BinaryOnly,
        Rule::DigitsOnly,
        Rule::DigitsWithSeparators,
        Rule::Fallback,
    ];

    #[must_use]
    pub fn matches(self, raw: &str) -> bool {
        match self {
            Rule::BinaryOnly => !raw.is_empty() && raw.chars().all(|c| c == '0' || c == '1'),
            Rule::DigitsOnly => !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit()),
            Rule::DigitsWithSeparators => {
                raw.chars().any(|c| c.is_ascii_digit())
                    && raw
                        .chars()
                        .all(|c| c.is_ascii_digit() || c.is_whitespace() || c == '.' || c == '-')
            }
            Rule::Fallback => true,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Rule::BinaryOnly => "binary_only",
            Rule::DigitsOnly => "digits_only",
            Rule::DigitsWithSeparators => "digits_with_separators",
            Rule::Fallback => "fallback",
        }
    }
}

/// Response text per rule, as it appears in a script file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierResponses {
    pub binary: String,
    pub digits: String,
    pub wrong_format: String,
    pub fallback: String,
}

impl Default for ClassifierResponses {
    fn default() -> Self {
        Self {
            binary: "You understand these numbers better than I do. Think harder.".to_string(),
            digits: "You mixed something up.".to_string(),
            wrong_format: "The answer is in the wrong format.".to_string(),
            fallback: "What else do you want? Stop bothering me.".to_string(),
        }
    }
}

/// Ordered list of `(rule, response)` pairs ending in the catch-all
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ClassifierResponses", into = "ClassifierResponses")]
pub struct Classifier {
    rules: Vec<(Rule, String)>,
}

impl Classifier {
    #[must_use]
    pub fn new(responses: &ClassifierResponses) -> Self {
        let rules = Rule::ORDER
            .iter()
            .map(|&rule| {
                let text = match rule {
                    Rule::BinaryOnly => &responses.binary,
                    Rule::DigitsOnly => &responses.digits,
                    Rule::DigitsWithSeparators => &responses.wrong_format,
                    Rule::Fallback => &responses.fallback,
                };
                (rule, text.clone())
            })
            .collect();
        Self { rules }
    }

    /// First rule matching `raw`, with its response
    #[must_use]
    pub fn classify(&self, raw: &str) -> (Rule, &str) {
        self.rules
            .iter()
            .find(|(rule, _)| rule.matches(raw))
            .map_or((Rule::Fallback, ""), |(rule, text)| (*rule, text.as_str()))
    }

    /// Response for input that carries no text at all
    #[must_use]
    pub fn fallback(&self) -> &str {
        self.classify("").1
    }
}

impl From<ClassifierResponses> for Classifier {
    fn from(responses: ClassifierResponses) -> Self {
        Self::new(&responses)
    }
}

impl From<Classifier> for ClassifierResponses {
    fn from(classifier: Classifier) -> Self {
        let mut responses = ClassifierResponses::default();
        for (rule, text) in classifier.rules {
            let slot = match rule {
                Rule::BinaryOnly => &mut responses.binary,
                Rule::DigitsOnly => &mut responses.digits,
                Rule::DigitsWithSeparators => &mut responses.wrong_format,
                Rule::Fallback => &mut responses.fallback,
            };
            *slot = text;
        }
        responses
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(&ClassifierResponses::default())
    }
}
