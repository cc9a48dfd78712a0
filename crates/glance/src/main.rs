//! Glance host shim.
//!
//! Loads configuration, registers the bundled adapters, probes the host
//! version, binds the matching adapter and drives it on a tick loop until a
//! termination signal arrives.

mod adapters;
mod cli;
mod config;
mod logging;
mod signals;

use cli::CliArgs;
use config::AppConfig;
use glance_core::{
    global, CapabilityFacade, EnvProbe, Location, ModelKind, StaticProbe, TextSpec, VersionProbe, ViewerId,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

// ============================================================================
// Application
// ============================================================================

pub struct Application {
    config: AppConfig,
    probe: Box<dyn VersionProbe>,
}

impl Application {
    /// Loads configuration, applies CLI overrides and sets up logging.
    pub async fn new(args: CliArgs) -> Result<Self, Box<dyn std::error::Error>> {
        let mut config = AppConfig::load_from_file(&args.config_path).await?;

        if let Some(host_version) = args.host_version {
            config.host.version = Some(host_version);
        }
        if let Some(log_level) = args.log_level {
            config.logging.level = log_level;
        }
        if args.json_logs {
            config.logging.json_format = true;
        }

        if let Err(e) = config.validate() {
            return Err(format!("Configuration validation failed: {e}").into());
        }

        logging::setup_logging(&config.logging, args.json_logs)?;

        let probe: Box<dyn VersionProbe> = match &config.host.version {
            Some(version) => Box::new(StaticProbe::new(version.clone())),
            None => Box::new(EnvProbe::new(config.host.version_env.clone())),
        };

        info!("🚀 Glance v{}", env!("CARGO_PKG_VERSION"));
        info!(
            "📂 Config: {} | Probe: {}",
            args.config_path.display(),
            probe.describe()
        );

        Ok(Self { config, probe })
    }

    /// Binds an adapter and runs the tick loop until shutdown.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        adapters::register_bundled(&self.config.adapters.allow);

        let facade = match global::enable(self.probe.as_ref()) {
            Ok(facade) => facade,
            Err(e) => {
                error!("❌ No adapter bound: {}", e);
                for (label, range) in global::supported_ranges() {
                    info!("  - {} supports {}", label, range);
                }
                return Err(e.into());
            }
        };

        if let Some(binding) = global::bound_adapter() {
            info!(
                "✅ Bound {} for host {} (protocol {})",
                binding.label, binding.host_version, binding.protocol_version
            );
        }

        if let Some(text) = &self.config.host.demo_text {
            if let Err(e) = spawn_demo(facade.as_ref(), &self.config.host.world, text) {
                warn!("⚠️ Demo model failed: {}", e);
            }
        }

        let tick = Duration::from_millis(self.config.host.tick_interval_ms);
        let ticker = tick_loop(facade.clone(), tick);
        tokio::pin!(ticker);

        tokio::select! {
            result = signals::wait_for_shutdown() => match result {
                Ok(signal) => info!("📡 Received {}, shutting down", signal),
                Err(e) => error!("❌ Signal handling failed: {}", e),
            },
            _ = &mut ticker => {}
        }

        drop(facade);
        let state = global::disable();
        info!("🏁 Loader finished in state {}", state);
        Ok(())
    }
}

/// Spawns one text model in front of a placeholder viewer and flushes the packets.
fn spawn_demo(facade: &dyn CapabilityFacade, world: &str, text: &str) -> Result<(), Box<dyn std::error::Error>> {
    let id = facade.spawn_model(Location::new(world, 0.0, 80.0, 0.0), ModelKind::Text(TextSpec::new(text)))?;
    facade.track(id)?;
    facade.add_viewer(id, ViewerId::new())?;
    facade.render(id)?;

    for packet in facade.drain_outbound() {
        debug!("➡️ {}", serde_json::to_string(&packet)?);
    }
    info!("✨ Demo model {} rendered", id);
    Ok(())
}

/// Pushes dirty models to their viewers once per tick.
async fn tick_loop(facade: Arc<dyn CapabilityFacade>, tick: Duration) {
    let mut interval = tokio::time::interval(tick);
    loop {
        interval.tick().await;
        let updated = facade.update_all();
        let packets = facade.drain_outbound();
        if updated > 0 || !packets.is_empty() {
            debug!("🔄 Tick: {} models updated, {} packets out", updated, packets.len());
        }
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    if args.list_adapters {
        let config = AppConfig::read_if_present(&args.config_path).await?;
        let listings = adapters::listings(&config.adapters.allow);
        println!("{}", serde_json::to_string_pretty(&listings)?);
        return Ok(());
    }

    let app = match Application::new(args).await {
        Ok(app) => app,
        Err(e) => {
            eprintln!("❌ Failed to start Glance: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = app.run().await {
        error!("❌ Glance exited with error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
