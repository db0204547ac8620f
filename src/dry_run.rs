use async_trait::async_trait;
use tracing::info;

use medal_core::{ChannelId, ChatClient, ChatError, GuildId, InteractionHandle, InteractionReply, MemberId, OutgoingMessage};

/// Stand-in client for `--no-gateway`: outgoing traffic is logged, never sent.
pub struct LoggingClient;

#[async_trait]
impl ChatClient for LoggingClient {
    async fn send_message(&self, channel: ChannelId, message: OutgoingMessage) -> Result<(), ChatError> {
        info!(
            channel_id = %channel,
            buttons = message.buttons.len(),
            content = %message.content,
            "dry run: message"
        );
        Ok(())
    }

    async fn reply_interaction(
        &self,
        interaction: &InteractionHandle,
        reply: InteractionReply,
    ) -> Result<(), ChatError> {
        info!(
            interaction_id = %interaction.id,
            ephemeral = reply.ephemeral,
            content = %reply.content,
            "dry run: reply"
        );
        Ok(())
    }

    async fn display_name(&self, _guild: GuildId, _member: MemberId) -> Option<String> {
        None
    }
}
