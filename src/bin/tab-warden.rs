//! tab-warden
//!
//! Opens a page in Chrome and keeps the tab policy enforced until interrupted.

use anyhow::Context;
use clap::Parser;
use log::info;
use serde_json::Value;
use tab_warden::browser::{BrowserSession, CdpDocument, ConnectionOptions, LaunchOptions, PageHistory, SignalBridge, run_until};
use tab_warden::{Engine, History, NavigationWatcher, WardenConfig};
use tokio::sync::mpsc::unbounded_channel;

#[derive(Parser)]
#[command(name = "tab-warden")]
#[command(version)]
#[command(about = "Keep a tab hidden and another selected in a single-page application", long_about = None)]
struct Cli {
    /// Page to open
    #[arg(long, value_name = "URL")]
    url: String,

    /// In-app route to switch to after the page loads, without a reload
    #[arg(long, value_name = "PATH")]
    route: Option<String>,

    /// Launch browser in headed mode (default: headless)
    #[arg(long, short = 'H')]
    headed: bool,

    /// Path to custom browser executable
    #[arg(long, value_name = "PATH")]
    executable_path: Option<String>,

    /// WebSocket endpoint URL for remote browser connection
    #[arg(long, value_name = "URL")]
    ws_endpoint: Option<String>,

    /// Persistent browser profile directory
    #[arg(long, value_name = "DIR")]
    user_data_dir: Option<String>,

    /// JSON configuration file (missing fields take defaults)
    #[arg(long, short = 'c', value_name = "FILE")]
    config: Option<String>,

    /// Coalescing quantum in milliseconds
    #[arg(long, value_name = "MS")]
    frame_ms: Option<u64>,

    /// Redirect guard cooldown in milliseconds
    #[arg(long, value_name = "MS")]
    guard_ms: Option<u64>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut config = match &cli.config {
        Some(path) => WardenConfig::from_file(path).with_context(|| format!("Failed to load config {}", path))?,
        None => WardenConfig::default(),
    };
    if let Some(ms) = cli.frame_ms {
        config.frame_interval_ms = ms;
    }
    if let Some(ms) = cli.guard_ms {
        config.guard_cooldown_ms = ms;
    }
    config.validate()?;

    let session = match &cli.ws_endpoint {
        Some(endpoint) => {
            info!("Connecting to {}", endpoint);
            BrowserSession::connect(ConnectionOptions::new(endpoint.clone()))?
        }
        None => {
            let mut options = LaunchOptions::new().headless(!cli.headed);
            if let Some(path) = &cli.executable_path {
                options = options.chrome_path(path);
            }
            if let Some(dir) = &cli.user_data_dir {
                options = options.user_data_dir(dir);
            }
            info!("Launching browser ({})", if options.headless { "headless" } else { "headed" });
            BrowserSession::launch(options)?
        }
    };

    session.navigate(&cli.url)?;
    info!("Loaded {}", cli.url);

    let (tx, mut rx) = unbounded_channel();
    let mut bridge = SignalBridge::install(session.tab(), tx.clone())?;

    if let Some(route) = &cli.route {
        let mut history = NavigationWatcher::new(PageHistory::new(session.tab()), tx.clone());
        history.push_state(&Value::Null, Some(route))?;
    }
    drop(tx);

    let document = CdpDocument::new(session.tab(), &config).with_signal_binding(SignalBridge::BINDING_NAME);
    let mut engine = Engine::new(document, config)?;

    run_until(&mut engine, &mut rx, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    })
    .await?;

    bridge.uninstall();
    let stats = engine.stats();
    info!(
        "Stopped after {} ticks ({} signals, {} coalesced, {} failed)",
        stats.ticks, stats.notifications, stats.coalesced, stats.failures
    );
    Ok(())
}
