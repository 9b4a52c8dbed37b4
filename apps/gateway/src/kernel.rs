// [apps/gateway/src/kernel.rs]
/*!
 * =================================================================
 * APARATO: GATEWAY SOVEREIGN KERNEL (V1.0)
 * CLASIFICACIÓN: COMPOSITION ROOT (ESTRATO L1-APP)
 * RESPONSABILIDAD: ENSAMBLAJE DE ESTADO, DAEMONS Y TRANSPORTE
 *
 * La placa base donde se conectan el estado compartido, el barrido de
 * retención en segundo plano, y el transporte HTTP/WebSocket. Una vez
 * encendido, bloquea sirviendo conexiones hasta que el proceso muere.
 * =================================================================
 */

use crate::routes::create_router;
use crate::state::AppState;
use std::net::{IpAddr, SocketAddr};
use tracing::{error, info};

pub struct GatewayKernel {
    port: u16,
    state: AppState,
}

impl GatewayKernel {
    pub fn ignite(state: AppState) -> Self {
        let port = state.settings.port;
        Self { port, state }
    }

    /// Spawns the retention sweeper and serves the router until the
    /// process is killed or the listener fails to bind.
    pub async fn launch(self) {
        myndlens_infra_store::spawn_retention_sweeper(self.state.store.clone());

        let router = create_router(self.state);
        let bind_address = SocketAddr::new("0.0.0.0".parse::<IpAddr>().unwrap(), self.port);

        info!(%bind_address, "🛰️  gateway listening");

        let listener = match tokio::net::TcpListener::bind(bind_address).await {
            Ok(listener) => listener,
            Err(e) => {
                error!(error = %e, "❌ failed to bind network port");
                std::process::exit(1);
            }
        };

        if let Err(e) = axum::serve(listener, router).await {
            error!(error = %e, "❌ server task failed");
            std::process::exit(1);
        }
    }
}
