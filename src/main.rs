//! Wiring & DI. Entry point: open the store, build services, then serve, seed or prompt.
//! No business logic here.
//!
//! `tutor-match serve | seed [N] | create-admin`; without a subcommand the console menu runs.

use dotenv::dotenv;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal::ctrl_c;
#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use tutor_match::adapters::http::{self, AppState};
use tutor_match::adapters::persistence::SqliteRepo;
use tutor_match::adapters::security::Argon2Hasher;
use tutor_match::adapters::ui::tui::ConsoleMenu;
use tutor_match::ports::{ConsoleOutcome, InputPort, PasswordHasher, SessionStore};
use tutor_match::shared::config::AppConfig;
use tutor_match::usecases::Services;

/// How often expired sessions are swept while serving.
const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

enum Command {
    Serve,
    Seed(Option<u64>),
    CreateAdmin,
    Menu,
}

fn parse_command(args: &[String]) -> anyhow::Result<Command> {
    match args.first().map(String::as_str) {
        None => Ok(Command::Menu),
        Some("serve") => Ok(Command::Serve),
        Some("create-admin") => Ok(Command::CreateAdmin),
        Some("seed") => {
            let target = args
                .get(1)
                .map(|n| n.parse::<u64>())
                .transpose()
                .map_err(|e| anyhow::anyhow!("seed target must be a number: {e}"))?;
            Ok(Command::Seed(target))
        }
        Some(other) => anyhow::bail!("unknown command `{other}` (expected serve, seed or create-admin)"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let env_loaded = dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!(cwd = %cwd.display(), "no .env found (check CWD)"),
    }

    tutor_match::adapters::ui::init_ui();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = parse_command(&args)?;

    let cfg = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "config could not be read, using defaults");
        AppConfig::default()
    });

    let data_path = cfg.data_dir_or_default();
    tokio::fs::create_dir_all(&data_path)
        .await
        .map_err(|e| anyhow::anyhow!("create data dir: {}", e))?;
    let data_dir_abs = data_path
        .canonicalize()
        .unwrap_or_else(|_| data_path.clone());
    info!(path = %data_dir_abs.display(), "data directory");

    let repo = Arc::new(
        SqliteRepo::connect(&data_path)
            .await
            .map_err(|e| anyhow::anyhow!("SQLite connect failed: {}", e))?,
    );
    let hasher: Arc<dyn PasswordHasher> = Arc::new(Argon2Hasher::new());
    let services = Arc::new(Services::new(Arc::clone(&repo), hasher));
    let sessions: Arc<dyn SessionStore> = Arc::clone(&repo) as Arc<dyn SessionStore>;

    let seed_target = cfg.seed_user_count_or_default();
    let console = ConsoleMenu::new(Arc::clone(&services), seed_target);

    match command {
        Command::Serve => {}
        Command::Seed(target) => {
            console
                .seed(target.unwrap_or(seed_target))
                .await
                .map_err(|e| anyhow::anyhow!("{}", e))?;
            return Ok(());
        }
        Command::CreateAdmin => {
            console
                .create_admin()
                .await
                .map_err(|e| anyhow::anyhow!("{}", e))?;
            return Ok(());
        }
        Command::Menu => {
            let outcome = console.run().await.map_err(|e| anyhow::anyhow!("{}", e))?;
            if outcome == ConsoleOutcome::Exit {
                return Ok(());
            }
        }
    }

    let state = AppState::new(
        services,
        Arc::clone(&sessions),
        cfg.session_ttl(),
        cfg.cookie_secure(),
    );
    tokio::spawn(purge_sessions(sessions));

    let bind_addr = cfg.bind_addr_or_default();
    let listener = TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("bind {}: {}", bind_addr, e))?;
    info!(addr = %bind_addr, "listening");

    axum::serve(listener, http::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

/// Sweeps expired sessions once at startup and then on a fixed interval.
async fn purge_sessions(sessions: Arc<dyn SessionStore>) {
    let mut tick = tokio::time::interval(SESSION_PURGE_INTERVAL);
    loop {
        tick.tick().await;
        match sessions.purge_expired(chrono::Utc::now()).await {
            Ok(0) => {}
            Ok(removed) => info!(removed, "expired sessions removed"),
            Err(e) => warn!(error = %e, "session purge failed"),
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("received Ctrl+C, shutting down"),
            Err(e) => {
                warn!(error = %e, "Ctrl+C handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
                info!("received terminate signal, shutting down");
            }
            Err(e) => {
                warn!(error = %e, "terminate handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
