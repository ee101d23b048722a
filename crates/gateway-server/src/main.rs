use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use application::PollScheduler;
use domain::driver::TransportFactory;
use gateway_server::{api, poller_settings, setup_app_state};
use infrastructure::{GatewayConfig, ModbusTransportFactory, SimulatorTransportFactory};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding default.toml / <RUN_MODE>.toml
    #[arg(long, default_value = "config")]
    config_dir: String,

    /// HTTP port (overrides configuration)
    #[arg(long)]
    http_port: Option<u16>,

    /// Serve simulated registers instead of polling real devices
    #[arg(long)]
    simulate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,gateway_server=debug,application=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    info!("Modbus Gateway Starting...");

    // 1. Configuration
    let mut config = GatewayConfig::load(&args.config_dir)
        .with_context(|| format!("Failed to load configuration from {}", args.config_dir))?;
    if let Some(port) = args.http_port {
        config.http.port = port;
    }
    config.simulate |= args.simulate;

    for device in &config.devices {
        info!(
            device_id = %device.id,
            addr = %device.authority(),
            start_address = device.start_address,
            count = device.count,
            unit_id = device.unit_id,
            one_based = device.one_based,
            "Device configured"
        );
    }

    // 2. Shared state and poller
    let state = setup_app_state(&config);

    let factory: Box<dyn TransportFactory> = if config.simulate {
        info!("Simulation mode: no network I/O to devices");
        Box::new(SimulatorTransportFactory::new(config.simulator.clone()))
    } else {
        Box::new(ModbusTransportFactory::new(config.poll.timeouts()))
    };

    let scheduler = PollScheduler::from_endpoints(
        &config.devices,
        factory.as_ref(),
        poller_settings(&config.poll),
        state.store.clone(),
        config.poll.interval(),
    )
    .context("Failed to create device pollers")?;

    let cancel_token = CancellationToken::new();
    let poll_handle = tokio::spawn(scheduler.run(cancel_token.clone()));

    // 3. HTTP API
    let app = api::create_router(state);
    let addr: SocketAddr = format!("{}:{}", config.http.host, config.http.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.http.host, config.http.port))?;

    info!("API Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel_token.clone()))
        .await?;

    cancel_token.cancel();
    poll_handle.await.context("Poll loop panicked")?;

    info!("Gateway stopped");
    Ok(())
}

/// Resolves on Ctrl-C and cancels the poll loop with it.
async fn shutdown_signal(cancel_token: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Ctrl-C received, shutting down"),
        Err(e) => {
            error!(error = %e, "Failed to listen for Ctrl-C");
            cancel_token.cancelled().await;
        }
    }
    cancel_token.cancel();
}
