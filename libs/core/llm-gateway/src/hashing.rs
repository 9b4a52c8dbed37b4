// [libs/core/llm-gateway/src/hashing.rs]
use crate::types::{CacheClass, SectionOutput};
use sha2::{Digest, Sha256};

/// SHA-256 over included sections of `target_class`, sorted by
/// priority. Stable sections never carry
/// timestamps, so equal inputs always hash identically.
fn compute_hash(sections: &[SectionOutput], target_class: CacheClass) -> String {
    let mut matching: Vec<&SectionOutput> = sections
        .iter()
        .filter(|s| s.included && s.cache_class == target_class)
        .collect();
    matching.sort_by_key(|s| s.priority);

    if matching.is_empty() {
        return "empty".to_string();
    }

    let combined = matching
        .iter()
        .map(|s| format!("{:?}:{}", s.section_id, s.content))
        .collect::<Vec<_>>()
        .join("\n---\n");

    let mut hasher = Sha256::new();
    hasher.update(combined.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn compute_stable_hash(sections: &[SectionOutput]) -> String {
    compute_hash(sections, CacheClass::Stable)
}

pub fn compute_volatile_hash(sections: &[SectionOutput]) -> String {
    compute_hash(sections, CacheClass::Volatile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SectionId;

    fn section(id: SectionId, priority: i32, class: CacheClass, included: bool) -> SectionOutput {
        SectionOutput {
            section_id: id,
            content: format!("content for {id:?}"),
            priority,
            cache_class: class,
            tokens_est: 10,
            included,
            gating_reason: None,
        }
    }

    #[test]
    fn stable_hash_is_order_independent_of_input_order() {
        let a = vec![
            section(SectionId::Identity, 1, CacheClass::Stable, true),
            section(SectionId::PurposeContract, 2, CacheClass::Stable, true),
        ];
        let b = vec![a[1].clone(), a[0].clone()];
        assert_eq!(compute_stable_hash(&a), compute_stable_hash(&b));
    }

    #[test]
    fn excluded_sections_do_not_affect_hash() {
        let with_extra = vec![
            section(SectionId::Identity, 1, CacheClass::Stable, true),
            section(SectionId::Tooling, 2, CacheClass::Stable, false),
        ];
        let without_extra = vec![section(SectionId::Identity, 1, CacheClass::Stable, true)];
        assert_eq!(compute_stable_hash(&with_extra), compute_stable_hash(&without_extra));
    }

    #[test]
    fn empty_input_hashes_to_sentinel() {
        assert_eq!(compute_stable_hash(&[]), "empty");
    }
}
