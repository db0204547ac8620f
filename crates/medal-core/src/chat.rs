use async_trait::async_trait;

use crate::events::InteractionHandle;
use crate::ids::{ChannelId, GuildId, MemberId, RoleId};

/// Visual style of a panel button.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonStyle {
    Primary,
    Secondary,
    Success,
    Danger,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Button {
    pub custom_id: String,
    pub label: String,
    pub style: ButtonStyle,
}

/// Which mentions in the content are allowed to notify. Anything not listed
/// renders as a mention but pings nobody.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AllowedMentions {
    pub roles: Vec<RoleId>,
    pub users: Vec<MemberId>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub content: String,
    pub buttons: Vec<Button>,
    pub mentions: AllowedMentions,
}

impl OutgoingMessage {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_buttons(mut self, buttons: Vec<Button>) -> Self {
        self.buttons = buttons;
        self
    }

    pub fn pinging_role(mut self, role: RoleId) -> Self {
        self.mentions.roles.push(role);
        self
    }

    pub fn pinging_user(mut self, member: MemberId) -> Self {
        self.mentions.users.push(member);
        self
    }
}

/// Answer to a button press.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InteractionReply {
    pub content: String,
    pub ephemeral: bool,
}

impl InteractionReply {
    pub fn ephemeral(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: true,
        }
    }
}

#[derive(Clone, Debug, thiserror::Error)]
pub enum ChatError {
    #[error("delivery failed: {0}")]
    Delivery(String),
    #[error("rejected by platform ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Outbound side of the chat platform. The engine talks only to this trait.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn send_message(&self, channel: ChannelId, message: OutgoingMessage) -> Result<(), ChatError>;

    async fn reply_interaction(
        &self,
        interaction: &InteractionHandle,
        reply: InteractionReply,
    ) -> Result<(), ChatError>;

    /// Guild display name, or `None` when the member cannot be resolved.
    async fn display_name(&self, guild: GuildId, member: MemberId) -> Option<String>;
}
