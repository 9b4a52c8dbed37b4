// [apps/gateway/src/services/skill_library.rs]
//! Seed skill candidates for `determine_skills`. The
//! scoring function itself lives in `myndlens_pipeline` and is
//! library-agnostic; the gateway is the one component that knows what
//! skills are actually installed.

use myndlens_pipeline::skill_determiner::SkillCandidate;

pub fn seed_library() -> Vec<SkillCandidate> {
    vec![
        SkillCandidate {
            name: "send_message".into(),
            category: "communication".into(),
            action_classes: vec!["COMM_SEND".into()],
            trigger_keywords: vec!["send".into(), "message".into(), "text".into(), "email".into()],
            profile: "low".into(),
            allow: vec!["messaging.send".into()],
        },
        SkillCandidate {
            name: "schedule_meeting".into(),
            category: "scheduling".into(),
            action_classes: vec!["SCHED_MODIFY".into()],
            trigger_keywords: vec!["schedule".into(), "meeting".into(), "calendar".into(), "appointment".into()],
            profile: "low".into(),
            allow: vec!["calendar.write".into()],
        },
        SkillCandidate {
            name: "reminder_set".into(),
            category: "scheduling".into(),
            action_classes: vec!["REMINDER_SET".into()],
            trigger_keywords: vec!["remind".into(), "reminder".into(), "alarm".into()],
            profile: "low".into(),
            allow: vec!["reminders.write".into()],
        },
        SkillCandidate {
            name: "draft_only".into(),
            category: "drafting".into(),
            action_classes: vec!["DRAFT_ONLY".into()],
            trigger_keywords: vec![],
            profile: "none".into(),
            allow: vec![],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_library_is_non_empty_and_covers_common_classes() {
        let library = seed_library();
        assert!(library.iter().any(|s| s.name == "send_message"));
        assert!(library.iter().any(|s| s.name == "schedule_meeting"));
    }
}
