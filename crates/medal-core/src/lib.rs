pub mod chat;
pub mod clock;
pub mod errors;
pub mod events;
pub mod ids;
pub mod schedule;
pub mod scoring;
pub mod stats;

pub use chat::{AllowedMentions, Button, ButtonStyle, ChatClient, ChatError, InteractionReply, OutgoingMessage};
pub use clock::{Clock, SystemClock};
pub use errors::CommandError;
pub use events::{BotEvent, Caller, IncomingInteraction, IncomingMessage, InteractionHandle};
pub use ids::{ChannelId, GuildId, InteractionId, MemberId, RoleId, SessionId};
pub use schedule::{Schedule, ScheduleError, TickAction};
pub use scoring::{Outcome, Rank};
pub use stats::{ManualChange, MemberStats};
