use chrono::{DateTime, Utc};

use crate::ids::{ChannelId, GuildId, InteractionId, MemberId, RoleId};

/// Everything the bot actor reacts to. Producers (the minute ticker and the
/// gateway reader) only ever send these; they never touch the ledger.
#[derive(Clone, Debug)]
pub enum BotEvent {
    Tick { now: DateTime<Utc> },
    Message(IncomingMessage),
    Interaction(IncomingInteraction),
}

/// The member who issued a command, with the roles they hold in the guild.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Caller {
    pub id: MemberId,
    pub roles: Vec<RoleId>,
    pub is_bot: bool,
}

impl Caller {
    pub fn has_role(&self, role: RoleId) -> bool {
        self.roles.contains(&role)
    }
}

#[derive(Clone, Debug)]
pub struct IncomingMessage {
    pub channel_id: ChannelId,
    pub guild_id: Option<GuildId>,
    pub author: Caller,
    pub content: String,
}

/// What is needed to answer an interaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InteractionHandle {
    pub id: InteractionId,
    pub token: String,
}

/// A button press.
#[derive(Clone, Debug)]
pub struct IncomingInteraction {
    pub handle: InteractionHandle,
    pub channel_id: ChannelId,
    pub guild_id: Option<GuildId>,
    pub member: MemberId,
    pub custom_id: String,
}
