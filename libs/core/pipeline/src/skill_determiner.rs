// [libs/core/pipeline/src/skill_determiner.rs]
use std::collections::HashSet;

/// A candidate skill in the library, carrying its tool-requirement
/// manifest.
#[derive(Debug, Clone)]
pub struct SkillCandidate {
    pub name: String,
    pub category: String,
    pub action_classes: Vec<String>,
    pub trigger_keywords: Vec<String>,
    pub profile: String,
    pub allow: Vec<String>,
}

/// One mandate action awaiting a skill assignment.
#[derive(Debug, Clone)]
pub struct MandateAction {
    pub action: String,
    pub action_class: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillDecision {
    UseExisting,
    Adapt,
    CreateNew,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coordination {
    Sequential,
    Parallel,
    Hybrid,
}

#[derive(Debug, Clone)]
pub struct SkillPlanEntry {
    pub action: String,
    pub decision: SkillDecision,
    pub skill_name: String,
    pub from_library: Option<String>,
    pub score: f32,
}

#[derive(Debug, Clone)]
pub struct SubAgentSpec {
    pub category: String,
    pub entries: Vec<SkillPlanEntry>,
}

#[derive(Debug, Clone)]
pub struct Topology {
    pub sub_agents: Vec<SubAgentSpec>,
    pub coordination: Coordination,
}

const USE_EXISTING_THRESHOLD: f32 = 0.75;
const ADAPT_THRESHOLD: f32 = 0.40;

fn score_candidate(action: &MandateAction, candidate: &SkillCandidate) -> f32 {
    let class_fit = if candidate.action_classes.iter().any(|c| c.eq_ignore_ascii_case(&action.action_class)) {
        0.5
    } else {
        0.0
    };

    let haystack = format!("{} {}", action.action, action.description).to_lowercase();
    let keyword_hits = candidate.trigger_keywords.iter().filter(|kw| haystack.contains(&kw.to_lowercase())).count();
    let keyword_score = if candidate.trigger_keywords.is_empty() {
        0.0
    } else {
        0.35 * (keyword_hits as f32 / candidate.trigger_keywords.len() as f32).min(1.0)
    };

    let action_tokens: HashSet<&str> = haystack.split_whitespace().collect();
    let skill_tokens: HashSet<String> = candidate.name.to_lowercase().split_whitespace().map(str::to_string).collect();
    let overlap = skill_tokens.iter().filter(|t| action_tokens.contains(t.as_str())).count();
    let overlap_score = if skill_tokens.is_empty() { 0.0 } else { 0.15 * (overlap as f32 / skill_tokens.len() as f32).min(1.0) };

    class_fit + keyword_score + overlap_score
}

/// For one action, finds the best-scoring candidate and classifies the
/// decision: `>= 0.75` uses the library skill as-is,
/// `>= 0.40` adapts it, otherwise a new skill is synthesized.
fn plan_for_action(action: &MandateAction, library: &[SkillCandidate]) -> SkillPlanEntry {
    let best = library.iter().map(|c| (c, score_candidate(action, c))).max_by(|a, b| a.1.total_cmp(&b.1));

    match best {
        Some((candidate, score)) if score >= USE_EXISTING_THRESHOLD => SkillPlanEntry {
            action: action.action.clone(),
            decision: SkillDecision::UseExisting,
            skill_name: candidate.name.clone(),
            from_library: Some(candidate.name.clone()),
            score,
        },
        Some((candidate, score)) if score >= ADAPT_THRESHOLD => SkillPlanEntry {
            action: action.action.clone(),
            decision: SkillDecision::Adapt,
            skill_name: format!("{}_adapted", candidate.name),
            from_library: Some(candidate.name.clone()),
            score,
        },
        Some((_, score)) => SkillPlanEntry {
            action: action.action.clone(),
            decision: SkillDecision::CreateNew,
            skill_name: format!("custom_{}", action.action.to_lowercase().replace(' ', "_")),
            from_library: None,
            score,
        },
        None => SkillPlanEntry {
            action: action.action.clone(),
            decision: SkillDecision::CreateNew,
            skill_name: format!("custom_{}", action.action.to_lowercase().replace(' ', "_")),
            from_library: None,
            score: 0.0,
        },
    }
}

fn category_for(entry: &SkillPlanEntry, library: &[SkillCandidate]) -> String {
    library
        .iter()
        .find(|c| entry.from_library.as_deref() == Some(c.name.as_str()))
        .map(|c| c.category.clone())
        .unwrap_or_else(|| "uncategorized".into())
}

/// Groups the skill plan into 1..N sub-agent specs by category and
/// picks a coordination mode: a single sub-agent is trivially
/// sequential; multiple sub-agents with no dependency markers between
/// them run in parallel; mixed decisions (any `create_new` alongside
/// `use_existing`) favor hybrid since a freshly synthesized skill
/// cannot be assumed safe to run unattended alongside established ones.
fn build_topology(entries: Vec<SkillPlanEntry>, library: &[SkillCandidate]) -> Topology {
    let mut by_category: Vec<(String, Vec<SkillPlanEntry>)> = Vec::new();
    for entry in entries {
        let category = category_for(&entry, library);
        match by_category.iter_mut().find(|(c, _)| *c == category) {
            Some((_, bucket)) => bucket.push(entry),
            None => by_category.push((category, vec![entry])),
        }
    }

    let sub_agents: Vec<SubAgentSpec> =
        by_category.into_iter().map(|(category, entries)| SubAgentSpec { category, entries }).collect();

    let has_new = sub_agents.iter().any(|s| s.entries.iter().any(|e| e.decision == SkillDecision::CreateNew));
    let coordination = if sub_agents.len() <= 1 {
        Coordination::Sequential
    } else if has_new {
        Coordination::Hybrid
    } else {
        Coordination::Parallel
    };

    Topology { sub_agents, coordination }
}

/// Deterministic skill determination and agent topology.
/// No LLM call: scoring is a fixed combination of action-class fit,
/// trigger-keyword hits, and skill-name/action-text overlap.
pub fn determine_skills(actions: &[MandateAction], library: &[SkillCandidate]) -> Topology {
    let entries: Vec<SkillPlanEntry> = actions.iter().map(|a| plan_for_action(a, library)).collect();
    build_topology(entries, library)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library() -> Vec<SkillCandidate> {
        vec![
            SkillCandidate {
                name: "send_message".into(),
                category: "communication".into(),
                action_classes: vec!["COMM_SEND".into()],
                trigger_keywords: vec!["send".into(), "message".into()],
                profile: "low".into(),
                allow: vec!["messaging.send".into()],
            },
            SkillCandidate {
                name: "schedule_meeting".into(),
                category: "scheduling".into(),
                action_classes: vec!["SCHED_MODIFY".into()],
                trigger_keywords: vec!["schedule".into(), "meeting".into()],
                profile: "low".into(),
                allow: vec!["calendar.write".into()],
            },
        ]
    }

    #[test]
    fn strong_match_uses_existing_skill() {
        let action = MandateAction {
            action: "send message".into(),
            action_class: "COMM_SEND".into(),
            description: "send a message to Bob".into(),
        };
        let plan = plan_for_action(&action, &library());
        assert_eq!(plan.decision, SkillDecision::UseExisting);
        assert_eq!(plan.skill_name, "send_message");
    }

    #[test]
    fn no_match_creates_new_skill() {
        let action = MandateAction {
            action: "launch rocket".into(),
            action_class: "UNKNOWN_CLASS".into(),
            description: "launch a rocket to orbit".into(),
        };
        let plan = plan_for_action(&action, &library());
        assert_eq!(plan.decision, SkillDecision::CreateNew);
    }

    #[test]
    fn single_category_topology_is_sequential() {
        let actions = vec![MandateAction {
            action: "send message".into(),
            action_class: "COMM_SEND".into(),
            description: "send a message".into(),
        }];
        let topology = determine_skills(&actions, &library());
        assert_eq!(topology.coordination, Coordination::Sequential);
        assert_eq!(topology.sub_agents.len(), 1);
    }

    #[test]
    fn mixed_categories_without_new_skills_run_parallel() {
        let actions = vec![
            MandateAction { action: "send message".into(), action_class: "COMM_SEND".into(), description: "send a message".into() },
            MandateAction { action: "schedule meeting".into(), action_class: "SCHED_MODIFY".into(), description: "schedule a meeting".into() },
        ];
        let topology = determine_skills(&actions, &library());
        assert_eq!(topology.coordination, Coordination::Parallel);
        assert_eq!(topology.sub_agents.len(), 2);
    }

    #[test]
    fn new_skill_alongside_existing_forces_hybrid() {
        let actions = vec![
            MandateAction { action: "send message".into(), action_class: "COMM_SEND".into(), description: "send a message".into() },
            MandateAction { action: "launch rocket".into(), action_class: "UNKNOWN".into(), description: "launch a rocket".into() },
        ];
        let topology = determine_skills(&actions, &library());
        assert_eq!(topology.coordination, Coordination::Hybrid);
    }
}
