pub mod api;

use self::api::AppState;
use std::error::Error;
use tokio::net::TcpListener;
use log::{ info, warn };

pub struct Server {
    addr: String,
    state: AppState,
}

impl Server {
    pub fn new(addr: String, state: AppState, api_key_configured: bool) -> Self {
        if api_key_configured {
            info!("Server configured with API Key authentication.");
        } else {
            warn!("Server configured WITHOUT API Key authentication. Endpoints are open.");
        }
        Self { addr, state }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let listener = TcpListener::bind(&self.addr).await.map_err(|e|
            format!("Failed to bind HTTP server to {}: {}", self.addr, e)
        )?;
        info!("HTTP server listening on: http://{}", self.addr);

        let app = api::router(self.state.clone());
        axum::serve(listener, app.into_make_service()).await?;
        Ok(())
    }
}
