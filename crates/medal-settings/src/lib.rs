//! # medal-settings
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`BotSettings::default()`]
//! 2. **Settings file**: `medalbot.json` or `$MEDALBOT_SETTINGS`, deep-merged over defaults
//! 3. **Environment variables**: `MEDALBOT_*` overrides (highest priority)
//!
//! The bot token is not a setting; the binary reads it from `BOT_TOKEN`.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;
