//! In-process chat client and clock for exercising the engine without a
//! network connection.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use medal_core::chat::{ChatClient, ChatError, InteractionReply, OutgoingMessage};
use medal_core::clock::Clock;
use medal_core::events::InteractionHandle;
use medal_core::ids::{ChannelId, GuildId, MemberId};

/// Records every outgoing message and interaction reply.
#[derive(Debug, Default)]
pub struct RecordingClient {
    sent: Mutex<Vec<(ChannelId, OutgoingMessage)>>,
    replies: Mutex<Vec<(InteractionHandle, InteractionReply)>>,
    names: Mutex<HashMap<MemberId, String>>,
    name_delay: Option<Duration>,
    fail_sends: AtomicBool,
}

impl RecordingClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(self, member: MemberId, name: impl Into<String>) -> Self {
        let _ = self.names.lock().insert(member, name.into());
        self
    }

    /// Make every name lookup take `delay`, like a slow member fetch.
    pub fn with_name_delay(mut self, delay: Duration) -> Self {
        self.name_delay = Some(delay);
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_sends.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<(ChannelId, OutgoingMessage)> {
        self.sent.lock().clone()
    }

    pub fn replies(&self) -> Vec<(InteractionHandle, InteractionReply)> {
        self.replies.lock().clone()
    }

    /// Content of the most recent message, if any.
    pub fn last_content(&self) -> Option<String> {
        self.sent.lock().last().map(|(_, m)| m.content.clone())
    }

    pub fn last_reply(&self) -> Option<InteractionReply> {
        self.replies.lock().last().map(|(_, r)| r.clone())
    }

    pub fn clear(&self) {
        self.sent.lock().clear();
        self.replies.lock().clear();
    }
}

#[async_trait]
impl ChatClient for RecordingClient {
    async fn send_message(&self, channel: ChannelId, message: OutgoingMessage) -> Result<(), ChatError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(ChatError::Delivery("recording client set to fail".into()));
        }
        self.sent.lock().push((channel, message));
        Ok(())
    }

    async fn reply_interaction(
        &self,
        interaction: &InteractionHandle,
        reply: InteractionReply,
    ) -> Result<(), ChatError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(ChatError::Delivery("recording client set to fail".into()));
        }
        self.replies.lock().push((interaction.clone(), reply));
        Ok(())
    }

    async fn display_name(&self, _guild: GuildId, member: MemberId) -> Option<String> {
        if let Some(delay) = self.name_delay {
            tokio::time::sleep(delay).await;
        }
        self.names.lock().get(&member).cloned()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}
