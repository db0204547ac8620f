use std::time::Duration;

use medal_core::chat::ChatError;

/// Discord transport errors, classified as fatal (stop), retryable, or
/// neither.
#[derive(Clone, Debug, thiserror::Error)]
pub enum DiscordError {
    // Fatal
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),
    #[error("gateway refused session (close code {code}): {reason}")]
    GatewayRefused { code: u16, reason: String },

    // Retryable
    #[error("rate limited")]
    RateLimited { retry_after: Option<Duration> },
    #[error("server error {status}: {body}")]
    ServerError { status: u16, body: String },
    #[error("network error: {0}")]
    NetworkError(String),
    #[error("gateway closed (close code {code:?}): {reason}")]
    GatewayClosed { code: Option<u16>, reason: String },

    // Request-level
    #[error("request rejected {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("unexpected payload: {0}")]
    Payload(String),
}

impl DiscordError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. }
                | Self::ServerError { .. }
                | Self::NetworkError(_)
                | Self::GatewayClosed { .. }
        )
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::AuthenticationFailed(_) | Self::GatewayRefused { .. })
    }

    pub fn suggested_delay(&self) -> Option<Duration> {
        if let Self::RateLimited { retry_after } = self {
            *retry_after
        } else {
            None
        }
    }

    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed(_) => "authentication_failed",
            Self::GatewayRefused { .. } => "gateway_refused",
            Self::RateLimited { .. } => "rate_limited",
            Self::ServerError { .. } => "server_error",
            Self::NetworkError(_) => "network_error",
            Self::GatewayClosed { .. } => "gateway_closed",
            Self::Rejected { .. } => "rejected",
            Self::Payload(_) => "payload",
        }
    }

    /// Classify a REST status code.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 => Self::AuthenticationFailed(body),
            429 => Self::RateLimited { retry_after: None },
            500..=599 => Self::ServerError { status, body },
            _ => Self::Rejected { status, body },
        }
    }

    /// Classify a gateway close frame. Codes that mean the configuration is
    /// wrong (bad token, intents, version) stop the bot; everything else is a
    /// reconnect.
    pub fn from_close_code(code: Option<u16>, reason: String) -> Self {
        match code {
            Some(4004) => Self::AuthenticationFailed(reason),
            Some(code @ (4010..=4014)) => Self::GatewayRefused { code, reason },
            code => Self::GatewayClosed { code, reason },
        }
    }
}

impl From<serde_json::Error> for DiscordError {
    fn from(e: serde_json::Error) -> Self {
        Self::Payload(e.to_string())
    }
}

impl From<reqwest::Error> for DiscordError {
    fn from(e: reqwest::Error) -> Self {
        Self::NetworkError(e.to_string())
    }
}

impl From<DiscordError> for ChatError {
    fn from(e: DiscordError) -> Self {
        match e {
            DiscordError::ServerError { status, body } | DiscordError::Rejected { status, body } => {
                ChatError::Rejected { status, body }
            }
            other => ChatError::Delivery(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert!(DiscordError::from_status(401, "unauthorized".into()).is_fatal());
        assert!(DiscordError::from_status(429, "slow down".into()).is_retryable());
        assert!(DiscordError::from_status(502, "bad gateway".into()).is_retryable());

        let forbidden = DiscordError::from_status(403, "missing access".into());
        assert!(!forbidden.is_fatal());
        assert!(!forbidden.is_retryable());
        assert_eq!(forbidden.error_kind(), "rejected");
    }

    #[test]
    fn close_code_mapping() {
        let auth = DiscordError::from_close_code(Some(4004), "Authentication failed.".into());
        assert!(matches!(auth, DiscordError::AuthenticationFailed(_)));
        assert!(auth.is_fatal());

        for code in [4010, 4011, 4012, 4013, 4014] {
            assert!(DiscordError::from_close_code(Some(code), String::new()).is_fatal(), "{code}");
        }
        for code in [Some(1000), Some(1006), Some(4000), Some(4009), None] {
            let err = DiscordError::from_close_code(code, String::new());
            assert!(err.is_retryable(), "{code:?}");
            assert!(!err.is_fatal());
        }
    }

    #[test]
    fn suggested_delay_only_for_rate_limit() {
        let rl = DiscordError::RateLimited {
            retry_after: Some(Duration::from_millis(1500)),
        };
        assert_eq!(rl.suggested_delay(), Some(Duration::from_millis(1500)));
        assert_eq!(DiscordError::NetworkError("x".into()).suggested_delay(), None);
    }

    #[test]
    fn chat_error_conversion_keeps_status() {
        let chat: ChatError = DiscordError::from_status(403, "nope".into()).into();
        assert!(matches!(chat, ChatError::Rejected { status: 403, .. }));
        let chat: ChatError = DiscordError::NetworkError("reset".into()).into();
        assert!(matches!(chat, ChatError::Delivery(_)));
    }
}
