use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use medal_core::{BotEvent, ChatClient, Clock, SystemClock};
use medal_discord::{spawn_gateway, GatewayConfig, RestClient};
use medal_engine::{spawn_ticker, Bot, BotConfig, Scheduler};
use medal_server::ServerConfig;
use medal_settings::BotSettings;
use medal_store::{JsonFileStore, PersistentLedger};
use medal_telemetry::{init_telemetry, TelemetryConfig};

mod dry_run;

const EVENT_BUFFER: usize = 256;
const TOKEN_VAR: &str = "BOT_TOKEN";

#[derive(Debug, Parser)]
#[command(name = "medalbot", version, about = "Elite reminders and medal tracking for a Discord guild")]
struct Args {
    /// Settings file. Missing files fall back to defaults.
    #[arg(long, env = "MEDALBOT_SETTINGS")]
    settings: Option<PathBuf>,

    /// Ledger file, overriding `storage.dataFile`.
    #[arg(long)]
    data_file: Option<PathBuf>,

    /// Run the scheduler without connecting to Discord; messages are only logged.
    #[arg(long)]
    no_gateway: bool,
}

enum Stop {
    Signal,
    Gateway(anyhow::Result<()>),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let settings_path = args.settings.clone().unwrap_or_else(medal_settings::settings_path);
    let mut settings = medal_settings::load_settings_from_path(&settings_path)
        .with_context(|| format!("loading settings from {}", settings_path.display()))?;
    if let Some(path) = &args.data_file {
        settings.storage.data_file = path.clone();
    }

    let telemetry = TelemetryConfig::from_names(
        &settings.logging.level,
        &settings.logging.modules,
        settings.logging.json,
    )?;
    init_telemetry(&telemetry)?;

    info!(
        settings = %settings_path.display(),
        data_file = %settings.storage.data_file.display(),
        "starting medalbot"
    );

    let book = PersistentLedger::open(JsonFileStore::new(&settings.storage.data_file))
        .with_context(|| format!("opening ledger {}", settings.storage.data_file.display()))?;
    let scheduler = Scheduler::new(settings.schedule.schedule()?, settings.schedule.time_zone()?);

    let cancel = CancellationToken::new();
    let (tx, rx) = mpsc::channel::<BotEvent>(EVENT_BUFFER);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let mut gateway = None;
    let client: Arc<dyn ChatClient> = if args.no_gateway {
        warn!("gateway disabled, outgoing messages are only logged");
        Arc::new(dry_run::LoggingClient)
    } else {
        let token = read_token()?;
        let rest = RestClient::new(settings.discord.api_base.clone(), SecretString::from(token.expose_secret()))?;
        let config = GatewayConfig::new(settings.discord.gateway_url.clone(), token);
        gateway = Some(spawn_gateway(config, tx.clone(), cancel.clone()));
        Arc::new(rest)
    };

    let server = if settings.server.enabled {
        let config = ServerConfig {
            host: settings.server.host.clone(),
            port: settings.server.port,
        };
        let handle = medal_server::start(config, cancel.clone())
            .await
            .context("starting liveness server")?;
        info!(port = handle.port, "liveness endpoint ready");
        Some(handle)
    } else {
        None
    };

    let ticker = spawn_ticker(tx, Arc::clone(&clock), cancel.clone());
    let bot = Bot::new(bot_config(&settings), book, scheduler, client, clock);
    let actor = tokio::spawn(bot.run(rx, cancel.clone()));

    let gateway_done = async {
        match gateway.as_mut() {
            Some(handle) => match handle.await {
                Ok(result) => result.context("gateway stopped"),
                Err(e) => Err(anyhow::Error::new(e).context("gateway task failed")),
            },
            None => std::future::pending().await,
        }
    };

    let stop = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("listening for ctrl-c")?;
            info!("shutdown requested");
            Stop::Signal
        }
        result = gateway_done => Stop::Gateway(result),
    };

    cancel.cancel();
    if let (Stop::Signal, Some(handle)) = (&stop, gateway) {
        if let Ok(Err(e)) = handle.await {
            warn!(error = %e, "gateway ended with an error during shutdown");
        }
    }
    let _ = ticker.await;
    let _ = actor.await;
    if let Some(server) = server {
        server.join().await;
    }

    match stop {
        Stop::Gateway(Err(e)) => {
            let reason = format!("{e:#}");
            error!(error = %reason, "medalbot stopped");
            Err(e)
        }
        _ => {
            info!("medalbot stopped");
            Ok(())
        }
    }
}

fn read_token() -> anyhow::Result<SecretString> {
    match std::env::var(TOKEN_VAR) {
        Ok(raw) if !raw.trim().is_empty() => Ok(SecretString::from(raw.trim().to_string())),
        _ => bail!("{TOKEN_VAR} is not set"),
    }
}

fn bot_config(settings: &BotSettings) -> BotConfig {
    BotConfig {
        channel_id: settings.discord.channel_id,
        guild_id: settings.discord.guild_id,
        elite_role: settings.discord.elite_role_id,
        leader_role: settings.discord.leader_role_id,
        prefix: settings.discord.command_prefix.clone(),
        session_ttl: settings.schedule.session_ttl(),
    }
}
