//! Gateway connection: hello, identify or resume, heartbeats, dispatch.
//!
//! The reader owns no bot state. It converts the dispatches the bot cares
//! about into [`BotEvent`]s and pushes them into the actor's channel.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use rand::Rng;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use medal_core::events::BotEvent;
use medal_core::ids::MemberId;

use crate::backoff::Backoff;
use crate::error::DiscordError;
use crate::payload::{self, opcode, GatewayFrame, Hello, InteractionCreate, MessageCreate, Ready};

const GUILDS: u64 = 1 << 0;
const GUILD_MEMBERS: u64 = 1 << 1;
const GUILD_MESSAGES: u64 = 1 << 9;
const MESSAGE_CONTENT: u64 = 1 << 15;

pub const INTENTS: u64 = GUILDS | GUILD_MEMBERS | GUILD_MESSAGES | MESSAGE_CONTENT;

const HELLO_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug)]
pub struct GatewayConfig {
    pub url: String,
    pub token: SecretString,
    pub intents: u64,
}

impl GatewayConfig {
    pub fn new(url: impl Into<String>, token: SecretString) -> Self {
        Self {
            url: url.into(),
            token,
            intents: INTENTS,
        }
    }
}

/// What the connection loop should do after a frame.
#[derive(Debug)]
pub(crate) enum FrameAction {
    Nothing,
    Emit(BotEvent),
    HeartbeatNow,
    Reconnect,
}

/// Per-session bookkeeping that survives reconnects for resuming.
#[derive(Debug, Default)]
pub(crate) struct SessionState {
    seq: Option<u64>,
    session_id: Option<String>,
    resume_url: Option<String>,
    bot_user: Option<MemberId>,
    heartbeat_acked: bool,
    established: bool,
}

impl SessionState {
    fn can_resume(&self) -> bool {
        self.session_id.is_some() && self.resume_url.is_some()
    }

    fn forget_session(&mut self) {
        self.seq = None;
        self.session_id = None;
        self.resume_url = None;
    }

    pub(crate) fn apply(&mut self, frame: GatewayFrame) -> Result<FrameAction, DiscordError> {
        match frame.op {
            opcode::DISPATCH => {
                if frame.s.is_some() {
                    self.seq = frame.s;
                }
                self.dispatch(frame.t.as_deref().unwrap_or_default(), frame.d)
            }
            opcode::HEARTBEAT => Ok(FrameAction::HeartbeatNow),
            opcode::HEARTBEAT_ACK => {
                self.heartbeat_acked = true;
                Ok(FrameAction::Nothing)
            }
            opcode::RECONNECT => {
                info!("gateway requested reconnect");
                Ok(FrameAction::Reconnect)
            }
            opcode::INVALID_SESSION => {
                let resumable = frame.d.as_bool().unwrap_or(false);
                warn!(resumable, "gateway invalidated session");
                if !resumable {
                    self.forget_session();
                }
                Ok(FrameAction::Reconnect)
            }
            other => {
                debug!(op = other, "ignoring gateway opcode");
                Ok(FrameAction::Nothing)
            }
        }
    }

    fn dispatch(&mut self, kind: &str, data: serde_json::Value) -> Result<FrameAction, DiscordError> {
        match kind {
            "READY" => {
                let ready: Ready = serde_json::from_value(data)?;
                info!(user = %ready.user.username, user_id = %ready.user.id, "gateway ready");
                self.session_id = Some(ready.session_id);
                self.resume_url = Some(ready.resume_gateway_url);
                self.bot_user = Some(ready.user.id);
                self.established = true;
                Ok(FrameAction::Nothing)
            }
            "RESUMED" => {
                info!("gateway session resumed");
                self.established = true;
                Ok(FrameAction::Nothing)
            }
            "MESSAGE_CREATE" => {
                let message: MessageCreate = serde_json::from_value(data)?;
                if Some(message.author.id) == self.bot_user {
                    return Ok(FrameAction::Nothing);
                }
                Ok(FrameAction::Emit(BotEvent::Message(message.into_event())))
            }
            "INTERACTION_CREATE" => {
                let interaction: InteractionCreate = serde_json::from_value(data)?;
                Ok(interaction
                    .into_event()
                    .map_or(FrameAction::Nothing, |i| FrameAction::Emit(BotEvent::Interaction(i))))
            }
            _ => Ok(FrameAction::Nothing),
        }
    }
}

enum SessionEnd {
    Cancelled,
    Reconnect,
}

/// Run the gateway until cancelled. Returns `Err` only for fatal errors.
pub fn spawn_gateway(
    config: GatewayConfig,
    events: mpsc::Sender<BotEvent>,
    cancel: CancellationToken,
) -> JoinHandle<Result<(), DiscordError>> {
    tokio::spawn(async move {
        let mut state = SessionState::default();
        let mut backoff = Backoff::default();

        loop {
            state.established = false;
            let result = run_session(&config, &mut state, &events, &cancel).await;
            if state.established {
                backoff.reset();
            }
            let delay = match result {
                Ok(SessionEnd::Cancelled) => break,
                Ok(SessionEnd::Reconnect) => backoff.next_delay(),
                Err(e) if e.is_fatal() => {
                    error!(error = %e, kind = e.error_kind(), "gateway stopped");
                    return Err(e);
                }
                Err(e) => {
                    let delay = backoff.next_delay();
                    warn!(error = %e, kind = e.error_kind(), attempt = backoff.attempt(), ?delay, "gateway connection lost");
                    delay
                }
            };
            tokio::select! {
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(delay) => {}
            }
        }
        info!("gateway stopped");
        Ok(())
    })
}

async fn run_session(
    config: &GatewayConfig,
    state: &mut SessionState,
    events: &mpsc::Sender<BotEvent>,
    cancel: &CancellationToken,
) -> Result<SessionEnd, DiscordError> {
    let resuming = state.can_resume();
    let url = match (&state.resume_url, resuming) {
        (Some(resume), true) => with_query(resume, &config.url),
        _ => config.url.clone(),
    };
    debug!(%url, resuming, "connecting to gateway");
    let (socket, _) = tokio_tungstenite::connect_async(url.as_str())
        .await
        .map_err(|e| DiscordError::NetworkError(e.to_string()))?;
    let (mut sink, mut stream) = socket.split();

    let hello = tokio::time::timeout(HELLO_TIMEOUT, stream.next())
        .await
        .map_err(|_| DiscordError::NetworkError("no hello from gateway".into()))?;
    let interval = match hello {
        Some(Ok(Message::Text(text))) => {
            let frame: GatewayFrame = serde_json::from_str(&text)?;
            if frame.op != opcode::HELLO {
                return Err(DiscordError::Payload(format!("expected hello, got op {}", frame.op)));
            }
            let hello: Hello = serde_json::from_value(frame.d)?;
            Duration::from_millis(hello.heartbeat_interval)
        }
        Some(Ok(other)) => return Err(DiscordError::Payload(format!("expected hello, got {other:?}"))),
        Some(Err(e)) => return Err(DiscordError::NetworkError(e.to_string())),
        None => return Err(DiscordError::NetworkError("gateway closed before hello".into())),
    };

    let token = config.token.expose_secret();
    let opening = match (&state.session_id, resuming) {
        (Some(session_id), true) => payload::resume(token, session_id, state.seq),
        _ => payload::identify(token, config.intents),
    };
    send_json(&mut sink, &opening).await?;

    let first_beat = interval.mul_f64(rand::thread_rng().gen_range(0.0..1.0));
    let mut heartbeat = interval_at(Instant::now() + first_beat, interval);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
    state.heartbeat_acked = true;

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                let _ = sink.send(Message::Close(None)).await;
                return Ok(SessionEnd::Cancelled);
            }
            _ = heartbeat.tick() => {
                if !state.heartbeat_acked {
                    warn!("heartbeat not acknowledged, reconnecting");
                    return Ok(SessionEnd::Reconnect);
                }
                state.heartbeat_acked = false;
                send_json(&mut sink, &payload::heartbeat(state.seq)).await?;
            }
            incoming = stream.next() => {
                let text = match incoming {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(frame))) => {
                        let (code, reason) = frame
                            .map(|f| (Some(u16::from(f.code)), f.reason.to_string()))
                            .unwrap_or((None, String::new()));
                        return Err(DiscordError::from_close_code(code, reason));
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => return Err(DiscordError::NetworkError(e.to_string())),
                    None => return Err(DiscordError::GatewayClosed { code: None, reason: "stream ended".into() }),
                };
                let frame: GatewayFrame = match serde_json::from_str(&text) {
                    Ok(frame) => frame,
                    Err(e) => {
                        warn!(error = %e, "undecodable gateway frame");
                        continue;
                    }
                };
                match state.apply(frame) {
                    Ok(FrameAction::Nothing) => {}
                    Ok(FrameAction::Emit(event)) => {
                        if events.send(event).await.is_err() {
                            return Ok(SessionEnd::Cancelled);
                        }
                    }
                    Ok(FrameAction::HeartbeatNow) => {
                        send_json(&mut sink, &payload::heartbeat(state.seq)).await?;
                    }
                    Ok(FrameAction::Reconnect) => return Ok(SessionEnd::Reconnect),
                    Err(e) => warn!(error = %e, "skipping malformed dispatch"),
                }
            }
        }
    }
}

async fn send_json<S>(sink: &mut S, value: &serde_json::Value) -> Result<(), DiscordError>
where
    S: futures::Sink<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    sink.send(Message::Text(value.to_string().into()))
        .await
        .map_err(|e| DiscordError::NetworkError(e.to_string()))
}

/// The resume URL comes without query parameters; carry over the configured
/// ones (version and encoding).
fn with_query(resume_url: &str, configured: &str) -> String {
    match configured.split_once('?') {
        Some((_, query)) if !resume_url.contains('?') => {
            format!("{}/?{query}", resume_url.trim_end_matches('/'))
        }
        _ => resume_url.to_string(),
    }
}
