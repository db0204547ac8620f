pub mod adjust;
pub mod bot;
pub mod commands;
pub mod reporting;
pub mod scheduler;
pub mod session;
pub mod texts;
pub mod ticker;

pub mod mock;

pub use bot::{Bot, BotConfig};
pub use commands::{Command, ParseError};
pub use scheduler::Scheduler;
pub use session::{PanelToken, SelectionReceipt, SelectionSession, SessionBoard, SessionKind, SessionState};
pub use ticker::spawn_ticker;
