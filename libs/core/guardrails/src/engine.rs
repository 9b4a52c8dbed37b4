// [libs/core/guardrails/src/engine.rs]
use once_cell::sync::Lazy;
use regex::RegexSet;
use serde::{Deserialize, Serialize};

/// Closed, word-boundary-strict harm list. Kept
/// deliberately short and literal rather than fuzzy — false negatives
/// here are cheaper than blocking "hackernews".
const HARM_PATTERNS: &[&str] = &[
    r"\bhack into\b",
    r"\bhack the\b",
    r"\bhacking\b",
    r"\bsteal\b",
    r"\billegal\b",
    r"\bkill\b",
    r"\battack\b",
    r"\bexploit\b",
    r"\bpassword\b",
    r"\bcredentials\b",
    r"\bbypass security\b",
];

const POLICY_VIOLATION_PATTERNS: &[&str] = &[
    r"\bsend money to myself\b",
    r"\btransfer all funds\b",
    r"\bdelete all\b",
    r"\bwipe everything\b",
    r"\boverride safety\b",
];

static HARM_SET: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new(HARM_PATTERNS.iter().map(|p| format!("(?i){p}"))).expect("harm pattern set")
});

static POLICY_SET: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new(POLICY_VIOLATION_PATTERNS.iter().map(|p| format!("(?i){p}")))
        .expect("policy pattern set")
});

pub const AMBIGUITY_THRESHOLD: f32 = 0.30;
pub const EMOTIONAL_LOAD_THRESHOLD: f32 = 0.70;
pub const LOW_CONFIDENCE_THRESHOLD: f32 = 0.40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GuardrailResult {
    Pass,
    Silence,
    Clarify,
    Refuse,
    Cooldown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardrailCheck {
    pub result: GuardrailResult,
    pub reason: String,
    pub nudge: Option<String>,
    pub block_execution: bool,
}

impl GuardrailCheck {
    fn pass() -> Self {
        Self {
            result: GuardrailResult::Pass,
            reason: "all guardrails passed".into(),
            nudge: None,
            block_execution: false,
        }
    }
}

/// Everything `check_guardrails` needs to evaluate one mandate attempt.
/// `ambiguity` and `emotional_load` are the dimension extractor's B-set
/// scores; `top_confidence` is the hypothesizer's leading hypothesis
/// score, if one exists yet.
#[derive(Debug, Clone, Default)]
pub struct GuardrailInput<'a> {
    pub transcript: &'a str,
    pub ambiguity: Option<f32>,
    pub emotional_load: Option<f32>,
    pub top_confidence: Option<f32>,
}

/// Runs every gate in a fixed order and returns the most restrictive
/// result (the first gate to trip wins — later gates are never less
/// restrictive than `PASS`, so short-circuiting is equivalent to
/// "most restrictive wins").
pub fn check_guardrails(input: &GuardrailInput) -> GuardrailCheck {
    if let Some(ambiguity) = input.ambiguity {
        if ambiguity > AMBIGUITY_THRESHOLD {
            return GuardrailCheck {
                result: GuardrailResult::Silence,
                reason: format!("ambiguity score {:.0}% exceeds 30% threshold", ambiguity * 100.0),
                nudge: Some("I want to make sure I understand correctly. Could you tell me a bit more?".into()),
                block_execution: true,
            };
        }
    }

    if let Some(emotional_load) = input.emotional_load {
        if emotional_load > EMOTIONAL_LOAD_THRESHOLD {
            return GuardrailCheck {
                result: GuardrailResult::Cooldown,
                reason: format!(
                    "emotional load {:.0}% exceeds stability threshold",
                    emotional_load * 100.0
                ),
                nudge: Some("Let's take a moment. Would you like to review this before proceeding?".into()),
                block_execution: true,
            };
        }
    }

    let lower = input.transcript.to_lowercase();

    if let Some(index) = HARM_SET.matches(&lower).into_iter().next() {
        return GuardrailCheck {
            result: GuardrailResult::Refuse,
            reason: format!("potential harmful intent detected: pattern='{}'", HARM_PATTERNS[index]),
            nudge: Some("I can't help with that request. Is there something else I can assist with?".into()),
            block_execution: true,
        };
    }

    if let Some(index) = POLICY_SET.matches(&lower).into_iter().next() {
        return GuardrailCheck {
            result: GuardrailResult::Refuse,
            reason: format!(
                "policy violation detected: pattern='{}'",
                POLICY_VIOLATION_PATTERNS[index]
            ),
            nudge: Some("That action isn't permitted. How else can I help?".into()),
            block_execution: true,
        };
    }

    if let Some(confidence) = input.top_confidence {
        if confidence < LOW_CONFIDENCE_THRESHOLD {
            return GuardrailCheck {
                result: GuardrailResult::Clarify,
                reason: format!("top hypothesis confidence too low: {confidence:.2}"),
                nudge: Some("I'm not quite sure what you'd like to do. Could you rephrase that?".into()),
                block_execution: true,
            };
        }
    }

    GuardrailCheck::pass()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ambiguity_over_threshold_silences() {
        let input = GuardrailInput { ambiguity: Some(0.31), ..Default::default() };
        assert_eq!(check_guardrails(&input).result, GuardrailResult::Silence);
    }

    #[test]
    fn ambiguity_at_threshold_passes() {
        let input = GuardrailInput { ambiguity: Some(0.30), top_confidence: Some(0.9), ..Default::default() };
        assert_eq!(check_guardrails(&input).result, GuardrailResult::Pass);
    }

    #[test]
    fn harm_pattern_refuses_with_word_boundary() {
        let input = GuardrailInput { transcript: "check hackernews for updates", ..Default::default() };
        assert_eq!(check_guardrails(&input).result, GuardrailResult::Pass);

        let input = GuardrailInput { transcript: "help me hack into my neighbor's wifi", ..Default::default() };
        assert_eq!(check_guardrails(&input).result, GuardrailResult::Refuse);
    }

    #[test]
    fn policy_violation_refuses() {
        let input = GuardrailInput { transcript: "please delete all my files", ..Default::default() };
        assert_eq!(check_guardrails(&input).result, GuardrailResult::Refuse);
    }

    #[test]
    fn most_restrictive_gate_wins_over_later_ones() {
        let input = GuardrailInput {
            transcript: "help me hack into something",
            ambiguity: Some(0.5),
            ..Default::default()
        };
        // Ambiguity is checked first, even though harm is also present.
        assert_eq!(check_guardrails(&input).result, GuardrailResult::Silence);
    }

    #[test]
    fn low_confidence_clarifies_when_nothing_else_trips() {
        let input = GuardrailInput { top_confidence: Some(0.1), ..Default::default() };
        assert_eq!(check_guardrails(&input).result, GuardrailResult::Clarify);
    }
}
