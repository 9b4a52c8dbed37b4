// [apps/gateway/src/main.rs]
/*!
 * =================================================================
 * APARATO: GATEWAY MAIN ENTRY POINT (V1.0 - GOLD MASTER)
 * CLASIFICACIÓN: APPLICATION SHELL (ESTRATO L4)
 * RESPONSABILIDAD: IGNICIÓN SOBERANA DEL PLANO DE MANDO
 *
 * Punto de entrada único del binario de gateway: hidrata el entorno,
 * enciende la observabilidad, construye el runtime de Tokio con pila
 * reforzada, e invoca al kernel para escuchar conexiones duplex.
 * =================================================================
 */

use myndlens_gateway::prelude::*;
use myndlens_telemetry::init_tracing;
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. CARGA DE ENTORNO SOBERANO
    dotenvy::dotenv().ok();

    // 2. INICIALIZACIÓN DE OBSERVABILIDAD
    init_tracing("myndlens_gateway");

    // 3. CONFIGURACIÓN DEL RUNTIME CON PILA REFORZADA (4MB)
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_stack_size(4 * 1024 * 1024)
        .build()?;

    runtime.block_on(async {
        let settings = Settings::from_env();
        let port = settings.port;
        let state = AppState::new(settings);

        info!(port, "🛰️  gateway igniting");
        GatewayKernel::ignite(state).launch().await;
    });

    Ok(())
}
