use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use medal_core::chat::{ChatClient, ChatError, InteractionReply, OutgoingMessage};
use medal_core::events::InteractionHandle;
use medal_core::ids::{ChannelId, GuildId, MemberId};

use crate::components;
use crate::error::DiscordError;
use crate::payload::GuildMember;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const NAME_TTL: Duration = Duration::from_secs(15 * 60);
/// Longest rate-limit wait honoured before giving up on a request.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(30);

/// REST side of the bot: sends messages, answers interactions, and looks up
/// member display names (cached).
pub struct RestClient {
    http: Client,
    api_base: String,
    token: SecretString,
    name_ttl: Duration,
    names: parking_lot::Mutex<HashMap<(GuildId, MemberId), (String, Instant)>>,
}

impl RestClient {
    pub fn new(api_base: impl Into<String>, token: SecretString) -> Result<Self, DiscordError> {
        let http = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("DiscordBot (medalbot, ", env!("CARGO_PKG_VERSION"), ")"))
            .build()?;
        Ok(Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token,
            name_ttl: NAME_TTL,
            names: parking_lot::Mutex::new(HashMap::new()),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{path}", self.api_base))
            .header("Authorization", format!("Bot {}", self.token.expose_secret()))
    }

    /// Send, waiting out one rate limit if Discord asks for it.
    async fn execute(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Response, DiscordError> {
        let build = || {
            let req = self.request(method.clone(), path);
            match body {
                Some(body) => req.json(body),
                None => req,
            }
        };

        let resp = build().send().await?;
        let resp = match check(resp).await {
            Err(DiscordError::RateLimited { retry_after }) => {
                let wait = retry_after.unwrap_or(Duration::from_secs(1)).min(MAX_RETRY_AFTER);
                warn!(path, ?wait, "rate limited, retrying once");
                tokio::time::sleep(wait).await;
                check(build().send().await?).await?
            }
            other => other?,
        };
        Ok(resp)
    }

    #[instrument(skip(self, message), fields(channel_id = %channel))]
    pub async fn create_message(&self, channel: ChannelId, message: &OutgoingMessage) -> Result<(), DiscordError> {
        let body = components::message_body(message);
        let _ = self
            .execute(Method::POST, &format!("/channels/{channel}/messages"), Some(&body))
            .await?;
        debug!("message sent");
        Ok(())
    }

    #[instrument(skip_all, fields(interaction_id = %handle.id))]
    pub async fn interaction_callback(
        &self,
        handle: &InteractionHandle,
        reply: &InteractionReply,
    ) -> Result<(), DiscordError> {
        let body = components::interaction_body(reply);
        let path = format!("/interactions/{}/{}/callback", handle.id, handle.token);
        let _ = self.execute(Method::POST, &path, Some(&body)).await?;
        Ok(())
    }

    pub async fn guild_member(&self, guild: GuildId, member: MemberId) -> Result<GuildMember, DiscordError> {
        let resp = self
            .execute(Method::GET, &format!("/guilds/{guild}/members/{member}"), None)
            .await?;
        Ok(resp.json().await?)
    }

    fn cached_name(&self, key: (GuildId, MemberId)) -> Option<String> {
        let mut names = self.names.lock();
        let fresh = names
            .get(&key)
            .map(|(name, at)| (at.elapsed() < self.name_ttl).then(|| name.clone()));
        match fresh {
            Some(Some(name)) => Some(name),
            Some(None) => {
                let _ = names.remove(&key);
                None
            }
            None => None,
        }
    }

    /// Insert a fresh name and drop every entry past its TTL.
    fn remember_name(&self, key: (GuildId, MemberId), name: String) {
        let mut names = self.names.lock();
        names.retain(|_, (_, at)| at.elapsed() < self.name_ttl);
        let _ = names.insert(key, (name, Instant::now()));
    }
}

/// Map a non-success response to an error. For 429 the wait comes from the
/// JSON body, falling back to the `Retry-After` header.
async fn check(resp: Response) -> Result<Response, DiscordError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let header_wait = resp
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<f64>().ok())
        .and_then(seconds);
    let body = resp.text().await.unwrap_or_default();
    if status.as_u16() == 429 {
        return Err(DiscordError::RateLimited {
            retry_after: retry_after_from_body(&body).or(header_wait),
        });
    }
    Err(DiscordError::from_status(status.as_u16(), body))
}

fn seconds(secs: f64) -> Option<Duration> {
    (secs.is_finite() && secs >= 0.0).then(|| Duration::from_secs_f64(secs))
}

/// `retry_after` is in seconds, possibly fractional.
pub fn retry_after_from_body(body: &str) -> Option<Duration> {
    let value: Value = serde_json::from_str(body).ok()?;
    seconds(value.get("retry_after")?.as_f64()?)
}

#[async_trait]
impl ChatClient for RestClient {
    async fn send_message(&self, channel: ChannelId, message: OutgoingMessage) -> Result<(), ChatError> {
        Ok(self.create_message(channel, &message).await?)
    }

    async fn reply_interaction(
        &self,
        interaction: &InteractionHandle,
        reply: InteractionReply,
    ) -> Result<(), ChatError> {
        Ok(self.interaction_callback(interaction, &reply).await?)
    }

    async fn display_name(&self, guild: GuildId, member: MemberId) -> Option<String> {
        if let Some(name) = self.cached_name((guild, member)) {
            return Some(name);
        }
        match self.guild_member(guild, member).await {
            Ok(found) => {
                let name = found.display_name()?;
                self.remember_name((guild, member), name.clone());
                Some(name)
            }
            Err(e) => {
                debug!(guild_id = %guild, member_id = %member, error = %e, "member lookup failed");
                None
            }
        }
    }
}
