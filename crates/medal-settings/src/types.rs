//! Settings type definitions.
//!
//! Every section uses camelCase keys and `#[serde(default)]`, so a settings
//! file only needs the values it changes.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use medal_core::ids::{ChannelId, GuildId, RoleId};
use medal_core::schedule::{
    Schedule, DEFAULT_ANNOUNCE_MINUTE, DEFAULT_EVENT_HOURS, DEFAULT_QUIET_HOURS, DEFAULT_SESSION_MINUTE,
};

use crate::errors::{Result, SettingsError};

/// Root settings type.
///
/// ```json
/// {
///   "discord": { "channelId": "1333099958286549106" },
///   "schedule": { "quietHours": [0, 6, 22] }
/// }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BotSettings {
    pub discord: DiscordSettings,
    pub schedule: ScheduleSettings,
    pub storage: StorageSettings,
    pub server: ServerSettings,
    pub logging: LoggingSettings,
}

impl BotSettings {
    /// Cross-field checks that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        let _ = self.schedule.schedule()?;
        let _ = self.schedule.time_zone()?;
        if self.schedule.session_ttl_secs == 0 {
            return Err(SettingsError::InvalidValue("sessionTtlSecs must be positive".into()));
        }
        if self.discord.command_prefix.trim().is_empty() {
            return Err(SettingsError::InvalidValue("commandPrefix must not be empty".into()));
        }
        Ok(())
    }
}

/// Chat platform wiring.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiscordSettings {
    /// Only messages from this guild are handled. `None` accepts any guild.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<GuildId>,
    /// Channel that receives announcements and selection panels.
    pub channel_id: ChannelId,
    /// Role mentioned in non-quiet announcements.
    pub elite_role_id: RoleId,
    /// Role allowed to run `setmanual` and `elitereset`.
    pub leader_role_id: RoleId,
    pub command_prefix: String,
    pub api_base: String,
    pub gateway_url: String,
}

impl Default for DiscordSettings {
    fn default() -> Self {
        Self {
            guild_id: None,
            channel_id: ChannelId::new(1_333_099_958_286_549_106),
            elite_role_id: RoleId::new(1_444_804_570_680_398_006),
            leader_role_id: RoleId::new(1_333_093_607_791_657_031),
            command_prefix: "!".to_string(),
            api_base: "https://discord.com/api/v10".to_string(),
            gateway_url: "wss://gateway.discord.gg/?v=10&encoding=json".to_string(),
        }
    }
}

/// Event hours, quiet hours and session timing.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScheduleSettings {
    pub event_hours: Vec<u8>,
    /// Must be a subset of `event_hours`.
    pub quiet_hours: Vec<u8>,
    /// IANA zone name.
    pub timezone: String,
    pub announce_minute: u8,
    pub session_minute: u8,
    pub session_ttl_secs: u64,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            event_hours: DEFAULT_EVENT_HOURS.to_vec(),
            quiet_hours: DEFAULT_QUIET_HOURS.to_vec(),
            timezone: "Europe/Vienna".to_string(),
            announce_minute: DEFAULT_ANNOUNCE_MINUTE,
            session_minute: DEFAULT_SESSION_MINUTE,
            session_ttl_secs: 3600,
        }
    }
}

impl ScheduleSettings {
    pub fn schedule(&self) -> Result<Schedule> {
        Schedule::new(
            self.event_hours.iter().copied(),
            self.quiet_hours.iter().copied(),
            self.announce_minute,
            self.session_minute,
        )
        .map_err(|e| SettingsError::InvalidValue(e.to_string()))
    }

    pub fn time_zone(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| SettingsError::InvalidValue(format!("unknown time zone: {}", self.timezone)))
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageSettings {
    /// Ledger JSON file.
    pub data_file: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("elite_data.json"),
        }
    }
}

/// Liveness endpoint.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default level. `RUST_LOG` takes precedence when set.
    pub level: String,
    /// JSON lines on stdout; `false` gives human-readable output.
    pub json: bool,
    /// Per-module overrides, e.g. `{"medal_discord": "debug"}`.
    pub modules: BTreeMap<String, String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
            modules: BTreeMap::new(),
        }
    }
}
