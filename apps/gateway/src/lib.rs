// [apps/gateway/src/lib.rs]
/*!
 * =================================================================
 * APARATO: GATEWAY CRATE ROOT (V1.0)
 * CLASIFICACIÓN: APPLICATION SHELL (ESTRATO L4)
 * RESPONSABILIDAD: INGESTA DE SESIÓN Y ORQUESTACIÓN DE LA CASCADA
 *
 * Session ingress, the multi-stage inference cascade orchestration,
 * and MIO signing/dispatch. Every handler, service, and route in this
 * crate answers to one [`state::AppState`] handle.
 * =================================================================
 */

pub mod handlers;
pub mod kernel;
pub mod routes;
pub mod services;
pub mod settings;
pub mod state;

pub mod prelude {
    pub use crate::kernel::GatewayKernel;
    pub use crate::settings::Settings;
    pub use crate::state::AppState;
}
