// [libs/core/pipeline/src/micro_question.rs]
//! Deterministic clarifying-question phrasing for unfilled checklist
//! dimensions. Pure and LLM-free by design: the conversation state
//! machine consults this *before* a question counts against its
//! 3-question cap, so the cap never pays for a network
//! call or an LLM parse failure.

/// Returns a short, user-facing clarifying question for an unfilled
/// mandate dimension. Falls back to a generic phrasing for dimensions
/// outside the known set rather than returning an empty string.
pub fn micro_question_for(dimension: &str) -> String {
    match dimension {
        "who" | "recipient" | "person" => "Who should this go to?".to_string(),
        "what" | "message" | "content" => "What would you like it to say?".to_string(),
        "when" | "time" | "timing" => "When should this happen?".to_string(),
        "where" | "location" => "Where should this take place?".to_string(),
        "why" | "reason" => "What's the reason for this?".to_string(),
        "how" | "method" | "channel" => "How would you like this sent?".to_string(),
        "priority" => "How urgent is this?".to_string(),
        other => format!("Could you clarify the {}?", other.replace('_', " ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_dimension_gets_specific_phrasing() {
        assert_eq!(micro_question_for("who"), "Who should this go to?");
        assert_eq!(micro_question_for("when"), "When should this happen?");
    }

    #[test]
    fn unknown_dimension_falls_back_to_generic_phrasing() {
        let question = micro_question_for("budget_amount");
        assert!(question.contains("budget amount"));
    }

    #[test]
    fn never_returns_empty() {
        assert!(!micro_question_for("").is_empty());
    }
}
