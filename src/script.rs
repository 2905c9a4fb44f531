//! Quiz definition: questions, gates, response texts and the payload
//!
//! A `Script` is loaded once at startup, validated, and shared read-only
//! by every conversation.

use crate::classifier::{Classifier, Rule};
use crate::normalize::normalize;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;
use thiserror::Error;

/// Largest number of gates a script may define
pub const MAX_GATES: usize = 2;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Script parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Restart command must not be empty")]
    EmptyRestartCommand,
    #[error("Script has no questions")]
    NoQuestions,
    #[error("Question {0} has no accepted answers")]
    NoAcceptedAnswers(usize),
    #[error("Question {0} has an accepted answer that is blank after normalization")]
    BlankAnswer(usize),
    #[error("Script has no gates")]
    NoGates,
    #[error("Script has {0} gates, at most {max} are supported", max = MAX_GATES)]
    TooManyGates(usize),
    #[error("Gate {0} has a secret that is blank after normalization")]
    BlankSecret(usize),
    #[error("Special reply refers to question {index}, but there are only {count}")]
    SpecialReplyOutOfRange { index: usize, count: usize },
    #[error("Special reply for question {0} has a blank answer")]
    BlankSpecialAnswer(usize),
    #[error("Special reply for question {question} keys on {answer:?}, which is an accepted answer")]
    UnreachableSpecialReply { question: usize, answer: String },
}

/// One quiz question and the answers that clear it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionAnswer {
    pub prompt: String,
    /// Canonical forms once the script is validated
    pub answers: BTreeSet<String>,
}

impl QuestionAnswer {
    #[must_use]
    pub fn new<I, A>(prompt: impl Into<String>, answers: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        Self {
            prompt: prompt.into(),
            answers: answers.into_iter().map(Into::into).collect(),
        }
    }
}

/// Extra rebuke for one specific wrong answer to one question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialReply {
    pub question: usize,
    pub answer: String,
    pub reply: String,
}

/// What the quiz says when a message carries no text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuizNonText {
    Notice { text: String },
    RepeatPrompt,
}

/// How a gate answers text that is not its secret
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MismatchReply {
    Classify(Classifier),
    Fixed {
        text: String,
    },
}

impl MismatchReply {
    /// Pick the reply for a raw message; the rule is reported when a
    /// classifier made the choice
    #[must_use]
    pub fn reply<'a>(&'a self, raw: &str) -> (Option<Rule>, &'a str) {
        match self {
            MismatchReply::Classify(classifier) => {
                let (rule, text) = classifier.classify(raw);
                (Some(rule), text)
            }
            MismatchReply::Fixed { text } => (None, text),
        }
    }
}

/// A stage that waits for an exact secret phrase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateStage {
    pub secret: String,
    /// Sent when the secret matches, before advancing or delivering
    #[serde(default)]
    pub reveal: Option<String>,
    pub mismatch: MismatchReply,
    pub non_text: String,
}

/// Opaque reference handed to the delivery collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Payload {
    Url { url: String },
    File { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    pub restart_command: String,
    /// When set, `/start@name` only counts as a restart if `name` is this
    /// bot. Compared without the leading `@` and ignoring ASCII case.
    #[serde(default)]
    pub bot_username: Option<String>,
    pub welcome: Vec<String>,
    /// Reply to anything but the restart command when no session exists
    pub idle_hint: String,
    pub questions: Vec<QuestionAnswer>,
    pub wrong_answer: String,
    pub quiz_non_text: QuizNonText,
    #[serde(default)]
    pub special_replies: Vec<SpecialReply>,
    /// Sent once the last question is answered
    pub quiz_complete: String,
    pub gates: Vec<GateStage>,
    pub payload: Payload,
}

impl Script {
    /// Parse and validate a JSON script.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::Parse`] for malformed JSON, otherwise any
    /// error from [`Script::validated`].
    pub fn from_json(json: &str) -> Result<Self, ScriptError> {
        let script: Script = serde_json::from_str(json)?;
        script.validated()
    }

    /// Check the script and canonicalize every answer and secret.
    ///
    /// Startup must fail on any error here; the engine assumes a
    /// validated script.
    ///
    /// # Errors
    ///
    /// Returns the first [`ScriptError`] found.
    pub fn validated(mut self) -> Result<Self, ScriptError> {
        if self.restart_command.trim().is_empty() {
            return Err(ScriptError::EmptyRestartCommand);
        }
        self.restart_command = self.restart_command.trim().to_string();
        self.bot_username = self
            .bot_username
            .take()
            .map(|name| name.trim().trim_start_matches('@').to_string())
            .filter(|name| !name.is_empty());

        if self.questions.is_empty() {
            return Err(ScriptError::NoQuestions);
        }
        for (index, question) in self.questions.iter_mut().enumerate() {
            if question.answers.is_empty() {
                return Err(ScriptError::NoAcceptedAnswers(index));
            }
            let canonical: BTreeSet<String> =
                question.answers.iter().map(|a| normalize(a)).collect();
            if canonical.contains("") {
                return Err(ScriptError::BlankAnswer(index));
            }
            question.answers = canonical;
        }

        if self.gates.is_empty() {
            return Err(ScriptError::NoGates);
        }
        if self.gates.len() > MAX_GATES {
            return Err(ScriptError::TooManyGates(self.gates.len()));
        }
        for (index, gate) in self.gates.iter_mut().enumerate() {
            gate.secret = normalize(&gate.secret);
            if gate.secret.is_empty() {
                return Err(ScriptError::BlankSecret(index));
            }
        }

        let count = self.questions.len();
        for special in &mut self.special_replies {
            if special.question >= count {
                return Err(ScriptError::SpecialReplyOutOfRange {
                    index: special.question,
                    count,
                });
            }
            special.answer = normalize(&special.answer);
            if special.answer.is_empty() {
                return Err(ScriptError::BlankSpecialAnswer(special.question));
            }
            if self.questions[special.question].answers.contains(&special.answer) {
                return Err(ScriptError::UnreachableSpecialReply {
                    question: special.question,
                    answer: special.answer.clone(),
                });
            }
        }

        Ok(self)
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn question(&self, index: usize) -> Option<&QuestionAnswer> {
        self.questions.get(index)
    }

    #[must_use]
    pub fn gate(&self, index: usize) -> Option<&GateStage> {
        self.gates.get(index)
    }

    #[must_use]
    pub fn special_reply(&self, question: usize, answer: &str) -> Option<&str> {
        self.special_replies
            .iter()
            .find(|s| s.question == question && s.answer == answer)
            .map(|s| s.reply.as_str())
    }

    /// Whether `text` invokes the restart command (`/start`, `/start@bot`,
    /// `/start payload`)
    #[must_use]
    pub fn is_restart(&self, text: &str) -> bool {
        let Some(first) = text.split_whitespace().next() else {
            return false;
        };
        match first.split_once('@') {
            None => first == self.restart_command,
            Some((command, mention)) => {
                command == self.restart_command
                    && self
                        .bot_username
                        .as_deref()
                        .is_none_or(|name| name.eq_ignore_ascii_case(mention))
            }
        }
    }
}

impl Default for Script {
    /// Built-in two-gate script
    fn default() -> Self {
        let classifier = Classifier::default();
        let gate_fallback = classifier.fallback().to_string();
        Self {
            restart_command: "/start".to_string(),
            bot_username: None,
            welcome: vec!["Let's play a game.".to_string()],
            idle_hint: "Send /start to begin the game.".to_string(),
            questions: vec![
                QuestionAnswer::new("What year is it?", ["2025"]),
                QuestionAnswer::new("What season is it?", ["autumn", "fall"]),
                QuestionAnswer::new("What day of the week is it?", ["saturday"]),
                QuestionAnswer::new("What month is it?", ["november"]),
                QuestionAnswer::new("How old are you?", ["24"]),
            ],
            wrong_answer: "Wrong answer.".to_string(),
            quiz_non_text: QuizNonText::Notice {
                text: "Please answer with text.".to_string(),
            },
            special_replies: vec![SpecialReply {
                question: 0,
                answer: "2024".to_string(),
                reply: "That was last year. Keep up.".to_string(),
            }],
            quiz_complete: "Here is your lock code: 3412".to_string(),
            gates: vec![
                GateStage {
                    secret: "238141264816".to_string(),
                    reveal: Some("Rebus".to_string()),
                    mismatch: MismatchReply::Classify(classifier),
                    non_text: gate_fallback,
                },
                GateStage {
                    secret: "hello from moscow".to_string(),
                    reveal: None,
                    mismatch: MismatchReply::Fixed {
                        text: "Not interested.".to_string(),
                    },
                    non_text: "Not interested.".to_string(),
                },
            ],
            payload: Payload::File {
                path: PathBuf::from("video.mp4"),
            },
        }
    }
}
