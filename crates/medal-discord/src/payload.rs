//! Gateway and REST payload shapes, limited to the fields the bot reads.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use medal_core::events::{Caller, IncomingInteraction, IncomingMessage, InteractionHandle};
use medal_core::ids::{ChannelId, GuildId, InteractionId, MemberId, RoleId};

pub mod opcode {
    pub const DISPATCH: u8 = 0;
    pub const HEARTBEAT: u8 = 1;
    pub const IDENTIFY: u8 = 2;
    pub const RESUME: u8 = 6;
    pub const RECONNECT: u8 = 7;
    pub const INVALID_SESSION: u8 = 9;
    pub const HELLO: u8 = 10;
    pub const HEARTBEAT_ACK: u8 = 11;
}

/// Interaction type for button presses and other component interactions.
const MESSAGE_COMPONENT: u8 = 3;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GatewayFrame {
    pub op: u8,
    #[serde(default)]
    pub d: Value,
    #[serde(default)]
    pub s: Option<u64>,
    #[serde(default)]
    pub t: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Hello {
    pub heartbeat_interval: u64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Ready {
    pub session_id: String,
    pub resume_gateway_url: String,
    pub user: User,
}

#[derive(Clone, Debug, Deserialize)]
pub struct User {
    pub id: MemberId,
    pub username: String,
    #[serde(default)]
    pub global_name: Option<String>,
    #[serde(default)]
    pub bot: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct GuildMember {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub nick: Option<String>,
    #[serde(default)]
    pub roles: Vec<RoleId>,
}

impl GuildMember {
    /// Guild nickname, then global display name, then username.
    pub fn display_name(&self) -> Option<String> {
        self.nick.clone().or_else(|| {
            self.user
                .as_ref()
                .map(|u| u.global_name.clone().unwrap_or_else(|| u.username.clone()))
        })
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct MessageCreate {
    pub channel_id: ChannelId,
    #[serde(default)]
    pub guild_id: Option<GuildId>,
    pub author: User,
    #[serde(default)]
    pub member: Option<GuildMember>,
    #[serde(default)]
    pub content: String,
}

impl MessageCreate {
    pub fn into_event(self) -> IncomingMessage {
        IncomingMessage {
            channel_id: self.channel_id,
            guild_id: self.guild_id,
            author: Caller {
                id: self.author.id,
                roles: self.member.map(|m| m.roles).unwrap_or_default(),
                is_bot: self.author.bot,
            },
            content: self.content,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ComponentData {
    #[serde(default)]
    pub custom_id: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct InteractionCreate {
    pub id: InteractionId,
    pub token: String,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub channel_id: Option<ChannelId>,
    #[serde(default)]
    pub guild_id: Option<GuildId>,
    #[serde(default)]
    pub member: Option<GuildMember>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub data: Option<ComponentData>,
}

impl InteractionCreate {
    /// Button presses only; slash commands and the like yield `None`.
    pub fn into_event(self) -> Option<IncomingInteraction> {
        if self.kind != MESSAGE_COMPONENT {
            return None;
        }
        let custom_id = self.data?.custom_id?;
        let member = self
            .member
            .and_then(|m| m.user)
            .or(self.user)
            .map(|u| u.id)?;
        Some(IncomingInteraction {
            handle: InteractionHandle {
                id: self.id,
                token: self.token,
            },
            channel_id: self.channel_id?,
            guild_id: self.guild_id,
            member,
            custom_id,
        })
    }
}

pub fn identify(token: &str, intents: u64) -> Value {
    json!({
        "op": opcode::IDENTIFY,
        "d": {
            "token": token,
            "intents": intents,
            "properties": {
                "os": std::env::consts::OS,
                "browser": "medalbot",
                "device": "medalbot",
            },
        },
    })
}

pub fn resume(token: &str, session_id: &str, seq: Option<u64>) -> Value {
    json!({
        "op": opcode::RESUME,
        "d": { "token": token, "session_id": session_id, "seq": seq },
    })
}

pub fn heartbeat(seq: Option<u64>) -> Value {
    json!({ "op": opcode::HEARTBEAT, "d": seq })
}
