// [libs/core/pipeline/src/router.rs]
use once_cell::sync::Lazy;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    IntentFragment,
    Command,
    Noise,
    Interruption,
    ModeControl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizedCommand {
    Hold,
    Resume,
    Cancel,
    Kill,
    None,
}

#[derive(Debug, Clone)]
pub struct RouteDecision {
    pub route: Route,
    pub confidence: f32,
    pub normalized_command: NormalizedCommand,
}

static COMMANDS: Lazy<HashMap<&'static str, NormalizedCommand>> = Lazy::new(|| {
    use NormalizedCommand::*;
    HashMap::from([
        ("hold", Hold),
        ("hold on", Hold),
        ("wait", Hold),
        ("pause", Hold),
        ("one moment", Hold),
        ("one sec", Hold),
        ("hang on", Hold),
        ("resume", Resume),
        ("continue", Resume),
        ("go on", Resume),
        ("i'm back", Resume),
        ("im back", Resume),
        ("back", Resume),
        ("cancel", Cancel),
        ("stop", Cancel),
        ("forget it", Cancel),
        ("never mind", Cancel),
        ("kill", Kill),
        ("abort", Kill),
    ])
});

const NOISE_WORDS: &[&str] = &[
    "um", "uh", "hmm", "ah", "oh", "okay", "ok", "yeah", "yep", "nah", "no", "hey", "hi", "hello",
];

const INTERRUPTIONS: &[&str] = &["excuse me", "sorry", "wait wait", "no no no", "stop stop"];

/// Deterministic pre-classifier applied to each inbound utterance.
/// Only `IntentFragment` drives the mandate pipeline.
pub fn route_fragment(text: &str) -> RouteDecision {
    let normalized = text.to_lowercase();
    let normalized = normalized.trim();
    let words: Vec<&str> = normalized.split_whitespace().collect();

    if normalized.is_empty() || words.is_empty() {
        return RouteDecision { route: Route::Noise, confidence: 1.0, normalized_command: NormalizedCommand::None };
    }

    if words.len() == 1 && NOISE_WORDS.contains(&words[0]) {
        return RouteDecision { route: Route::Noise, confidence: 0.95, normalized_command: NormalizedCommand::None };
    }

    if words.len() <= 2 && words.iter().all(|w| NOISE_WORDS.contains(w)) {
        return RouteDecision { route: Route::Noise, confidence: 0.9, normalized_command: NormalizedCommand::None };
    }

    for (phrase, cmd) in COMMANDS.iter() {
        if normalized == *phrase || normalized.starts_with(&format!("{phrase} ")) {
            return RouteDecision { route: Route::Command, confidence: 0.95, normalized_command: *cmd };
        }
    }

    if INTERRUPTIONS.contains(&normalized) {
        return RouteDecision { route: Route::Interruption, confidence: 0.9, normalized_command: NormalizedCommand::None };
    }

    RouteDecision { route: Route::IntentFragment, confidence: 0.8, normalized_command: NormalizedCommand::None }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_noise() {
        assert_eq!(route_fragment("").route, Route::Noise);
        assert_eq!(route_fragment("   ").route, Route::Noise);
    }

    #[test]
    fn single_filler_word_is_noise() {
        assert_eq!(route_fragment("um").route, Route::Noise);
    }

    #[test]
    fn exact_command_phrase_normalizes() {
        let decision = route_fragment("hold on");
        assert_eq!(decision.route, Route::Command);
        assert_eq!(decision.normalized_command, NormalizedCommand::Hold);
    }

    #[test]
    fn command_prefix_still_matches() {
        let decision = route_fragment("cancel that last thing");
        assert_eq!(decision.route, Route::Command);
        assert_eq!(decision.normalized_command, NormalizedCommand::Cancel);
    }

    #[test]
    fn interruption_phrase_detected() {
        assert_eq!(route_fragment("excuse me").route, Route::Interruption);
    }

    #[test]
    fn real_speech_is_intent_fragment() {
        assert_eq!(route_fragment("send Bob the Q3 budget").route, Route::IntentFragment);
    }

    #[test]
    fn hackernews_is_not_flagged_as_hack_command() {
        // word-boundary discipline applies to the guardrails crate, not
        // the router, but the router must not misclassify ordinary
        // speech containing a command substring as a command.
        assert_eq!(route_fragment("check hackernews please").route, Route::IntentFragment);
    }
}
