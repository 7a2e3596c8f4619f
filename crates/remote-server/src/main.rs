//! Remote control server: entry point.
//!
//! Lets a phone on the local network move this computer's pointer, click,
//! type single keys and view downscaled screenshots.  The phone pairs by
//! scanning the QR code on the pairing page (or by typing the code shown in
//! the log) and then talks JSON over UDP.
//!
//! # Usage
//!
//! ```text
//! remote-server [OPTIONS]
//!
//! Options:
//!   --config <PATH>            TOML configuration file
//!   --bind <IP>                Address every listener binds to
//!   --udp-port <PORT>          Datagram port [default: 8080]
//!   --http-port <PORT>         Pairing page port [default: 8081]
//!   --no-pairing-page          Do not serve the pairing page
//!   --pairing-code <CODE>      Fixed pairing code instead of a random one
//!   --session-policy <POLICY>  reject | replace [default: reject]
//!   --headless                 Use the virtual input and screen backends
//!   --log-level <LEVEL>        Used when RUST_LOG is unset [default: info]
//! ```
//!
//! # Configuration layering
//!
//! 1. Built-in defaults.
//! 2. The TOML file (`--config`, or the platform config directory).
//! 3. Command-line flags and their `REMOTE_*` environment variables.
//!
//! # What happens at startup
//!
//! 1. Arguments are parsed and the configuration is loaded and validated.
//! 2. `tracing_subscriber` is initialised; `RUST_LOG` wins over `log_level`.
//! 3. The pairing code is generated (or taken from the configuration).
//! 4. Native input/capture backends are opened, falling back to the headless
//!    ones when unavailable.
//! 5. The UDP socket is bound.  Failure here is fatal.
//! 6. The pairing page is started.  Failure here is only logged.
//! 7. A Ctrl+C handler clears the shared `running` flag, which stops both the
//!    UDP loop and the pairing page.

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use remote_core::{PairingPayload, PairingSecret, ScreenSize, SessionPolicy};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use remote_server::application::{
    Dispatcher, FrameProducer, InjectInputUseCase, InputInjector, ScreenCapturer,
};
use remote_server::domain::ServerConfig;
use remote_server::infrastructure::input_injection::{
    native_input_injector, HeadlessInputInjector,
};
use remote_server::infrastructure::network::{detect_lan_ip, UdpServer};
use remote_server::infrastructure::pairing_page::PairingPage;
use remote_server::infrastructure::screen_capture::{
    native_screen_capturer, HeadlessScreenCapturer,
};
use remote_server::infrastructure::storage::config::{load_config, AppConfig};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Phone-driven pointer, keyboard and screen-view server.
///
/// Every option left unset keeps the value from the configuration file.
#[derive(Debug, Parser)]
#[command(
    name = "remote-server",
    about = "Control this computer's pointer and keyboard from a phone on the local network",
    version
)]
struct Cli {
    /// TOML configuration file.  Must exist when given.
    #[arg(long, env = "REMOTE_CONFIG")]
    config: Option<PathBuf>,

    /// IP address the UDP socket and the pairing page bind to.
    #[arg(long, env = "REMOTE_BIND")]
    bind: Option<IpAddr>,

    /// UDP port for client datagrams.
    #[arg(long, env = "REMOTE_UDP_PORT")]
    udp_port: Option<u16>,

    /// TCP port for the pairing page.
    #[arg(long, env = "REMOTE_HTTP_PORT")]
    http_port: Option<u16>,

    /// Do not serve the pairing page.
    #[arg(long)]
    no_pairing_page: bool,

    /// Fixed pairing code (A-Z, 0-9) instead of a random one.
    #[arg(long, env = "REMOTE_PAIRING_CODE")]
    pairing_code: Option<String>,

    /// What a second client's valid auth does: `reject` or `replace`.
    #[arg(long, env = "REMOTE_SESSION_POLICY")]
    session_policy: Option<SessionPolicy>,

    /// Use the virtual input and screen backends instead of the desktop.
    #[arg(long)]
    headless: bool,

    /// Log level used when `RUST_LOG` is not set.
    #[arg(long, env = "REMOTE_LOG_LEVEL")]
    log_level: Option<String>,
}

impl Cli {
    /// Overlays the flags that were given onto `config`.
    fn apply_to(&self, config: &mut AppConfig) {
        if let Some(ip) = self.bind {
            config.network.bind_address = ip;
        }
        if let Some(port) = self.udp_port {
            config.network.udp_port = port;
        }
        if let Some(port) = self.http_port {
            config.network.http_port = port;
        }
        if self.no_pairing_page {
            config.network.pairing_page = false;
        }
        if let Some(code) = &self.pairing_code {
            config.server.pairing_code = Some(code.clone());
        }
        if let Some(policy) = self.session_policy {
            config.session.policy = policy;
        }
        if self.headless {
            config.server.headless = true;
        }
        if let Some(level) = &self.log_level {
            config.server.log_level = level.clone();
        }
    }
}

// ── Startup helpers ───────────────────────────────────────────────────────────

/// Opens the native backends, or the headless ones when `headless` is set or
/// a native backend is unavailable.
fn select_backends(headless: bool) -> (Arc<dyn InputInjector>, Arc<dyn ScreenCapturer>) {
    if headless {
        info!("headless mode: using virtual input and screen");
        return (
            Arc::new(HeadlessInputInjector::default()),
            Arc::new(HeadlessScreenCapturer::default()),
        );
    }

    let injector: Arc<dyn InputInjector> = match native_input_injector() {
        Ok(injector) => injector,
        Err(e) => {
            warn!("{e}; falling back to headless input");
            Arc::new(HeadlessInputInjector::default())
        }
    };

    let capturer: Arc<dyn ScreenCapturer> = match native_screen_capturer() {
        Ok(capturer) => capturer,
        Err(e) => {
            warn!("{e}; falling back to a synthetic screen");
            let size = injector
                .screen_size()
                .unwrap_or_else(|_| ScreenSize::new(1920, 1080));
            Arc::new(HeadlessScreenCapturer::new(size.width, size.height))
        }
    };

    (injector, capturer)
}

/// Uses the fixed code when one is configured, otherwise generates one of
/// `config.pairing_code_length` characters.
fn pairing_secret(fixed: Option<&str>, config: &ServerConfig) -> anyhow::Result<PairingSecret> {
    match fixed {
        Some(code) => PairingSecret::new(code.to_string())
            .with_context(|| format!("invalid pairing code '{code}'")),
        None => Ok(PairingSecret::generate(config.pairing_code_length)),
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut app_config =
        load_config(cli.config.as_deref()).context("failed to load configuration")?;
    cli.apply_to(&mut app_config);

    // ── Logging setup ─────────────────────────────────────────────────────────
    //
    // `RUST_LOG` wins when present; otherwise the configured level applies.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&app_config.server.log_level)),
        )
        .init();

    app_config.validate()?;
    let config = app_config.to_server_config();
    let secret = pairing_secret(app_config.server.pairing_code.as_deref(), &config)?;

    // ── Wire the use cases ────────────────────────────────────────────────────
    let (injector, capturer) = select_backends(app_config.server.headless);
    let input = InjectInputUseCase::new(injector, config.motion);
    let dispatcher = Dispatcher::new(secret.clone(), config.session_policy, input);
    let frames = FrameProducer::new(capturer, config.capture);

    let server = UdpServer::bind(&config, dispatcher, frames)
        .await
        .with_context(|| format!("failed to bind UDP socket on {}", config.udp_bind_addr))?;
    let udp_addr = server.local_addr()?;

    let host_ip = if config.udp_bind_addr.ip().is_unspecified() {
        detect_lan_ip()
    } else {
        config.udp_bind_addr.ip()
    };

    // ── Graceful shutdown flag ────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));

    // ── Pairing page (optional) ───────────────────────────────────────────────
    let page_task = match config.http_bind_addr {
        Some(http_addr) => {
            let payload = PairingPayload::new(&secret, udp_addr.port(), host_ip);
            match PairingPage::bind(http_addr, payload).await {
                Ok(page) => Some(tokio::spawn(page.serve(Arc::clone(&running)))),
                Err(e) => {
                    error!("pairing page unavailable: {e}");
                    None
                }
            }
        }
        None => None,
    };

    info!(
        code = secret.as_str(),
        host = %host_ip,
        udp_port = udp_addr.port(),
        "ready to pair; enter the connection code on the phone"
    );

    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C, shutting down");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => error!("failed to listen for Ctrl+C signal: {e}"),
        }
    });

    // ── Main server loop ──────────────────────────────────────────────────────
    let result = server.run(Arc::clone(&running)).await;
    running.store(false, Ordering::Relaxed);

    if let Some(task) = page_task {
        match task.await {
            Ok(Err(e)) => error!("{e}"),
            Err(e) => error!("pairing page task failed: {e}"),
            Ok(Ok(())) => {}
        }
    }

    result.context("UDP server failed")?;
    info!("remote server stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
