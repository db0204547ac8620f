//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`BotSettings::default()`]
//! 2. If the settings file exists, deep-merge its values over the defaults
//! 3. Apply `MEDALBOT_*` environment variable overrides (highest priority)
//! 4. Validate cross-field rules (quiet hours, time zone)

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::BotSettings;

/// Resolve the settings file path: `MEDALBOT_SETTINGS`, else `medalbot.json`
/// in the working directory.
pub fn settings_path() -> PathBuf {
    read_env_string("MEDALBOT_SETTINGS")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("medalbot.json"))
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<BotSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON or invalid values, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<BotSettings> {
    let mut settings = read_settings_file(path)?;
    apply_env_overrides(&mut settings);
    settings.validate()?;
    Ok(settings)
}

/// File + defaults only, no environment.
pub fn read_settings_file(path: &Path) -> Result<BotSettings> {
    let defaults = serde_json::to_value(BotSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to loaded settings.
///
/// Invalid values are logged and ignored (fall back to file/default).
pub fn apply_env_overrides(settings: &mut BotSettings) {
    // ── Discord ─────────────────────────────────────────────────────
    if let Some(v) = read_env_parsed("MEDALBOT_GUILD_ID") {
        settings.discord.guild_id = Some(v);
    }
    if let Some(v) = read_env_parsed("MEDALBOT_CHANNEL_ID") {
        settings.discord.channel_id = v;
    }
    if let Some(v) = read_env_parsed("MEDALBOT_ELITE_ROLE_ID") {
        settings.discord.elite_role_id = v;
    }
    if let Some(v) = read_env_parsed("MEDALBOT_LEADER_ROLE_ID") {
        settings.discord.leader_role_id = v;
    }
    if let Some(v) = read_env_string("MEDALBOT_PREFIX") {
        settings.discord.command_prefix = v;
    }

    // ── Schedule / storage ──────────────────────────────────────────
    if let Some(v) = read_env_string("MEDALBOT_TIMEZONE") {
        settings.schedule.timezone = v;
    }
    if let Some(v) = read_env_string("MEDALBOT_DATA_FILE") {
        settings.storage.data_file = PathBuf::from(v);
    }

    // ── Liveness server ─────────────────────────────────────────────
    if let Some(v) = read_env_string("MEDALBOT_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = read_env_u16("MEDALBOT_PORT", 1, 65535) {
        settings.server.port = v;
    }

    // ── Logging ─────────────────────────────────────────────────────
    if let Some(v) = read_env_string("MEDALBOT_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = read_env_bool("MEDALBOT_LOG_JSON") {
        settings.logging.json = v;
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u16` within a range.
pub fn parse_u16_range(val: &str, min: u16, max: u16) -> Option<u16> {
    let n: u16 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ── Env var readers (thin wrappers) ─────────────────────────────────────────

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn read_env_bool(name: &str) -> Option<bool> {
    let val = std::env::var(name).ok()?;
    let result = parse_bool(&val);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid boolean env var, ignoring");
    }
    result
}

fn read_env_u16(name: &str, min: u16, max: u16) -> Option<u16> {
    let val = std::env::var(name).ok()?;
    let result = parse_u16_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid u16 env var, ignoring");
    }
    result
}

fn read_env_parsed<T: FromStr>(name: &str) -> Option<T> {
    let val = read_env_string(name)?;
    let result = val.parse().ok();
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid id env var, ignoring");
    }
    result
}
