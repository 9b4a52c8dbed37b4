// [libs/core/guardrails/src/lib.rs]
/*!
 * =================================================================
 * APARATO: GUARDRAILS ROOT (V1.0)
 * CLASIFICACIÓN: SAFETY PERIMETER (ESTRATO L2)
 * RESPONSABILIDAD: CONTENCIÓN DE AMBIGÜEDAD Y PROMPT INJECTION
 *
 * Safety gates that run alongside inference, and the prompt-injection
 * sanitizer applied to any user text before it is embedded in an LLM
 * prompt. Most restrictive gate always wins.
 * =================================================================
 */

mod engine;
mod sanitizer;

pub use engine::{check_guardrails, GuardrailCheck, GuardrailInput, GuardrailResult};
pub use sanitizer::sanitize_for_llm;
