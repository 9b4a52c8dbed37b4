// [libs/core/pipeline/src/lib.rs]
/*!
 * =================================================================
 * APARATO: INFERENCE PIPELINE ROOT (V1.0)
 * CLASIFICACIÓN: COGNITIVE CASCADE (ESTRATO L2)
 * RESPONSABILIDAD: ENRUTAMIENTO DE INTENCIÓN Y DERIVACIÓN DE MANDATO
 *
 * Deterministic routing, a bounded fragment analyzer, the L1
 * hypothesizer, the L2 shadow verifier, the adversarial QC sentry, the
 * dimension extractor, and the deterministic skill determiner —
 * every stage a caller can wire independently of any live LLM
 * provider.
 * =================================================================
 */

pub mod dimension_extractor;
pub mod fragment_analyzer;
pub mod hypothesizer;
pub mod micro_question;
pub mod qc_sentry;
pub mod router;
pub mod skill_determiner;
pub mod verifier;

pub use dimension_extractor::{extract_mandate_dimensions, MandateDraft};
pub use fragment_analyzer::{analyze_fragment, FragmentAnalysis};
pub use hypothesizer::{run_l1_scout, Hypothesis, L1Draft};
pub use micro_question::micro_question_for;
pub use qc_sentry::{run_qc_sentry, QcPass, QcSeverity, QcVerdict};
pub use router::{route_fragment, NormalizedCommand, Route, RouteDecision};
pub use skill_determiner::{determine_skills, Coordination, SkillDecision, SkillPlanEntry, Topology};
pub use verifier::{check_l1_l2_agreement, run_l2_sentry, L2Verdict};
