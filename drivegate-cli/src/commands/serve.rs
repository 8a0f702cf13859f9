use super::{build_gateway, DriveSpec};
use anyhow::Result;
use drivegate_core::config::DrivegateConfig;
use drivegate_core::http::GatewayServer;
use drivegate_core::logging::init_logging;
use tokio::net::TcpListener;

pub async fn run(config: DrivegateConfig, drives: &[DriveSpec]) -> Result<()> {
    config.validate()?;
    init_logging(&config.logging);

    let (gateway, published) = build_gateway(&config, drives).await?;
    for (name, key) in &published {
        println!("{}  dat://{}", key, name);
    }

    let addr = config.server.bind_address();
    let listener = TcpListener::bind(&addr).await?;
    println!("Serving on http://{}", listener.local_addr()?);

    let shutdown = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            log::error!(target: "drivegate::cli", "failed to listen for ctrl-c: {}", err);
            std::future::pending::<()>().await;
        }
    };
    GatewayServer::new(gateway, config.server).serve_until(listener, shutdown).await
}
