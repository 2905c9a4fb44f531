//! Pure state transition function
//!
//! Given the same session, script and event, `transition` always produces
//! the same next session and actions, with no I/O side effects.

use super::{Action, Event, Session, Stage};
use crate::classifier::Rule;
use crate::normalize::normalize;
use crate::script::{GateStage, QuestionAnswer, QuizNonText, Script};

/// What a transition did, for logging and assertions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Restarted,
    /// No session and no restart command
    IdleHint,
    /// Correct answer, moved to the next question
    NextQuestion,
    /// Correct answer to the last question, first gate opened
    QuizCleared,
    WrongAnswer { special: bool },
    QuizNonText,
    /// Secret matched on a gate that is not the last one
    GateCleared,
    GateRejected { rule: Option<Rule> },
    GateNonText,
    /// Final secret matched, payload released and session cleared
    Completed,
}

/// Result of a state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionResult {
    /// `None` means the user ends up idle
    pub session: Option<Session>,
    pub actions: Vec<Action>,
    pub outcome: Outcome,
}

impl TransitionResult {
    #[must_use]
    pub fn new(session: Option<Session>, outcome: Outcome) -> Self {
        Self {
            session,
            actions: vec![],
            outcome,
        }
    }

    #[must_use]
    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    #[must_use]
    pub fn with_actions(mut self, actions: impl IntoIterator<Item = Action>) -> Self {
        self.actions.extend(actions);
        self
    }
}

/// Stored stage resolved against the script
enum Position<'a> {
    Quiz {
        index: usize,
        question: &'a QuestionAnswer,
    },
    Gate {
        index: usize,
        gate: &'a GateStage,
    },
}

/// Resolve a stored session, repairing what can be repaired.
///
/// A quiz index past the last question means the quiz is already done, so
/// the user is placed at the first gate. A gate index past the last gate
/// is corrupt and the session is dropped.
fn resolve<'a>(session: &Session, script: &'a Script) -> Option<Position<'a>> {
    match session.stage {
        Stage::Quiz { index } => match script.question(index) {
            Some(question) => Some(Position::Quiz { index, question }),
            None => script
                .gate(0)
                .map(|gate| Position::Gate { index: 0, gate }),
        },
        Stage::Gate { index } => script.gate(index).map(|gate| Position::Gate { index, gate }),
    }
}

/// Pure transition function
pub fn transition(session: Option<&Session>, script: &Script, event: Event) -> TransitionResult {
    let position = session.and_then(|s| resolve(s, script));

    match (position, event) {
        // Restart is destructive and works from anywhere
        (_, Event::Restart) => restart(script),

        (None, Event::Text(_) | Event::NonText) => {
            TransitionResult::new(None, Outcome::IdleHint)
                .with_action(Action::text(&script.idle_hint))
        }

        // ============================================================
        // Quiz
        // ============================================================
        (Some(Position::Quiz { index, question }), Event::Text(raw)) => {
            let answer = normalize(&raw);
            if question.answers.contains(&answer) {
                advance_quiz(script, index)
            } else {
                let special = script.special_reply(index, &answer);
                TransitionResult::new(
                    Some(Session::quiz(index)),
                    Outcome::WrongAnswer {
                        special: special.is_some(),
                    },
                )
                .with_action(Action::text(&script.wrong_answer))
                .with_actions(special.map(Action::text))
                .with_action(Action::text(&question.prompt))
            }
        }

        (Some(Position::Quiz { index, question }), Event::NonText) => {
            let reply = match &script.quiz_non_text {
                QuizNonText::Notice { text } => text,
                QuizNonText::RepeatPrompt => &question.prompt,
            };
            TransitionResult::new(Some(Session::quiz(index)), Outcome::QuizNonText)
                .with_action(Action::text(reply))
        }

        // ============================================================
        // Gates
        // ============================================================
        (Some(Position::Gate { index, gate }), Event::Text(raw)) => {
            // Secret check comes first and uses the canonical form; the
            // classifier only ever sees raw text that failed it
            if normalize(&raw) == gate.secret {
                clear_gate(script, index, gate)
            } else {
                let (rule, reply) = gate.mismatch.reply(&raw);
                TransitionResult::new(Some(Session::gate(index)), Outcome::GateRejected { rule })
                    .with_action(Action::text(reply))
            }
        }

        (Some(Position::Gate { index, gate }), Event::NonText) => {
            TransitionResult::new(Some(Session::gate(index)), Outcome::GateNonText)
                .with_action(Action::text(&gate.non_text))
        }
    }
}

fn restart(script: &Script) -> TransitionResult {
    TransitionResult::new(Some(Session::fresh()), Outcome::Restarted)
        .with_actions(script.welcome.iter().map(Action::text))
        .with_actions(script.question(0).map(|q| Action::text(&q.prompt)))
}

fn advance_quiz(script: &Script, index: usize) -> TransitionResult {
    let next = index + 1;
    match script.question(next) {
        Some(question) => TransitionResult::new(Some(Session::quiz(next)), Outcome::NextQuestion)
            .with_action(Action::text(&question.prompt)),
        None => TransitionResult::new(Some(Session::gate(0)), Outcome::QuizCleared)
            .with_action(Action::text(&script.quiz_complete)),
    }
}

fn clear_gate(script: &Script, index: usize, gate: &GateStage) -> TransitionResult {
    let reveal = gate.reveal.as_ref().map(Action::text);
    let next = index + 1;
    if next < script.gates.len() {
        TransitionResult::new(Some(Session::gate(next)), Outcome::GateCleared).with_actions(reveal)
    } else {
        TransitionResult::new(None, Outcome::Completed)
            .with_actions(reveal)
            .with_action(Action::payload(&script.payload))
    }
}
