//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::*;
use crate::classifier::Rule;
use crate::normalize::normalize;
use crate::script::Script;
use proptest::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

fn test_script() -> Script {
    Script::default().validated().unwrap()
}

fn texts(result: &TransitionResult) -> Vec<&str> {
    result.actions.iter().filter_map(Action::as_text).collect()
}

fn payload_count(result: &TransitionResult) -> usize {
    result
        .actions
        .iter()
        .filter(|a| matches!(a, Action::SendPayload { .. }))
        .count()
}

/// Random casing and surrounding/inner whitespace that normalization removes
fn decorate(canonical: &str, upper_mask: &[bool], pad: (usize, usize)) -> String {
    let cased: String = canonical
        .chars()
        .zip(upper_mask.iter().cycle())
        .map(|(c, &upper)| {
            if upper {
                c.to_uppercase().collect::<String>()
            } else {
                c.to_string()
            }
        })
        .collect();
    let spaced = cased.replace(' ', " \t ");
    format!("{}{}{}", " ".repeat(pad.0), spaced, "\n".repeat(pad.1))
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_upper_mask() -> impl Strategy<Value = Vec<bool>> {
    proptest::collection::vec(any::<bool>(), 1..8)
}

fn arb_pad() -> impl Strategy<Value = (usize, usize)> {
    (0usize..3, 0usize..3)
}

fn arb_session() -> impl Strategy<Value = Option<Session>> {
    prop_oneof![
        Just(None),
        (0usize..5).prop_map(|i| Some(Session::quiz(i))),
        (0usize..2).prop_map(|i| Some(Session::gate(i))),
    ]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        Just(Event::Restart),
        Just(Event::NonText),
        "[ a-zA-Z0-9.\\-]{0,20}".prop_map(Event::Text),
    ]
}

fn arb_binary() -> impl Strategy<Value = String> {
    "[01]{1,16}"
}

/// Digits-only with at least one digit outside 0/1
fn arb_non_binary_digits() -> impl Strategy<Value = String> {
    ("[0-9]{0,8}", "[2-9]", "[0-9]{0,8}").prop_map(|(a, b, c)| format!("{a}{b}{c}"))
}

/// Digits with at least one separator
fn arb_separated_digits() -> impl Strategy<Value = String> {
    ("[0-9]{1,6}", "[ .\\-]{1,3}", "[0-9 .\\-]{0,6}").prop_map(|(a, b, c)| format!("{a}{b}{c}"))
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_accepted_answer_advances(
        index in 0usize..5,
        mask in arb_upper_mask(),
        pad in arb_pad(),
        pick in any::<prop::sample::Index>(),
    ) {
        let script = test_script();
        let accepted: Vec<&String> = script.questions[index].answers.iter().collect();
        let answer = pick.get(&accepted);
        let result = transition(
            Some(&Session::quiz(index)),
            &script,
            Event::Text(decorate(answer, &mask, pad)),
        );

        if index + 1 < script.question_count() {
            prop_assert_eq!(result.session, Some(Session::quiz(index + 1)));
            prop_assert_eq!(
                texts(&result),
                vec![script.questions[index + 1].prompt.as_str()]
            );
        } else {
            prop_assert_eq!(result.session, Some(Session::gate(0)));
        }
    }

    #[test]
    fn prop_wrong_answer_keeps_index_and_repeats_prompt(
        index in 0usize..5,
        raw in "[ a-zA-Z0-9]{0,12}",
    ) {
        let script = test_script();
        prop_assume!(!script.questions[index].answers.contains(&normalize(&raw)));

        let result = transition(Some(&Session::quiz(index)), &script, Event::Text(raw));
        prop_assert_eq!(result.session, Some(Session::quiz(index)));

        let sent = texts(&result);
        prop_assert_eq!(sent.first().copied(), Some(script.wrong_answer.as_str()));
        prop_assert_eq!(sent.last().copied(), Some(script.questions[index].prompt.as_str()));
        prop_assert_eq!(payload_count(&result), 0);
    }

    #[test]
    fn prop_binary_input_gets_binary_reply(raw in arb_binary()) {
        let result = transition(Some(&Session::gate(0)), &test_script(), Event::Text(raw));
        prop_assert_eq!(result.outcome, Outcome::GateRejected { rule: Some(Rule::BinaryOnly) });
        prop_assert_eq!(result.session, Some(Session::gate(0)));
    }

    #[test]
    fn prop_digit_input_gets_digits_reply(raw in arb_non_binary_digits()) {
        // The first gate secret is itself all digits
        prop_assume!(raw != "238141264816");
        let result = transition(Some(&Session::gate(0)), &test_script(), Event::Text(raw));
        prop_assert_eq!(result.outcome, Outcome::GateRejected { rule: Some(Rule::DigitsOnly) });
    }

    #[test]
    fn prop_separated_digits_get_format_reply(raw in arb_separated_digits()) {
        prop_assume!(normalize(&raw) != "238141264816");
        let result = transition(Some(&Session::gate(0)), &test_script(), Event::Text(raw));
        prop_assert_eq!(
            result.outcome,
            Outcome::GateRejected { rule: Some(Rule::DigitsWithSeparators) }
        );
    }

    #[test]
    fn prop_gate_secret_always_passes(mask in arb_upper_mask(), pad in arb_pad()) {
        let script = test_script();
        let raw = decorate(&script.gates[0].secret, &mask, pad);
        let result = transition(Some(&Session::gate(0)), &script, Event::Text(raw));
        prop_assert_ne!(result.session, Some(Session::gate(0)));
        let rejected = matches!(result.outcome, Outcome::GateRejected { .. });
        prop_assert!(!rejected);
    }

    #[test]
    fn prop_final_secret_delivers_exactly_once(mask in arb_upper_mask(), pad in arb_pad()) {
        let script = test_script();
        let raw = decorate(&script.gates[1].secret, &mask, pad);
        let result = transition(Some(&Session::gate(1)), &script, Event::Text(raw));
        prop_assert_eq!(result.session, None);
        prop_assert_eq!(payload_count(&result), 1);
    }

    #[test]
    fn prop_final_gate_rejects_other_input(raw in "[ a-zA-Z0-9]{0,20}") {
        let script = test_script();
        prop_assume!(normalize(&raw) != script.gates[1].secret);
        let result = transition(Some(&Session::gate(1)), &script, Event::Text(raw));
        prop_assert_eq!(result.session, Some(Session::gate(1)));
        prop_assert_eq!(texts(&result), vec!["Not interested."]);
        prop_assert_eq!(payload_count(&result), 0);
    }

    #[test]
    fn prop_restart_from_anywhere(session in arb_session()) {
        let script = test_script();
        let result = transition(session.as_ref(), &script, Event::Restart);
        prop_assert_eq!(result.session, Some(Session::fresh()));
        prop_assert_eq!(
            texts(&result),
            vec!["Let's play a game.", "What year is it?"]
        );
    }

    #[test]
    fn prop_idle_always_hints(event in arb_event()) {
        prop_assume!(event != Event::Restart);
        let script = test_script();
        let result = transition(None, &script, event);
        prop_assert_eq!(result.session, None);
        prop_assert_eq!(texts(&result), vec![script.idle_hint.as_str()]);
    }

    #[test]
    fn prop_transition_is_deterministic(session in arb_session(), event in arb_event()) {
        let script = test_script();
        let first = transition(session.as_ref(), &script, event.clone());
        let second = transition(session.as_ref(), &script, event);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_quiz_index_stays_in_range(session in arb_session(), event in arb_event()) {
        let script = test_script();
        let result = transition(session.as_ref(), &script, event);
        match result.session.map(|s| s.stage) {
            Some(Stage::Quiz { index }) => prop_assert!(index < script.question_count()),
            Some(Stage::Gate { index }) => prop_assert!(index < script.gates.len()),
            None => {}
        }
    }

    #[test]
    fn prop_payload_only_on_completion(session in arb_session(), event in arb_event()) {
        let script = test_script();
        let result = transition(session.as_ref(), &script, event);
        let completed = result.outcome == Outcome::Completed;
        prop_assert_eq!(payload_count(&result), usize::from(completed));
        if completed {
            prop_assert_eq!(result.session, None);
        }
    }
}
