//! User-facing error taxonomy.

/// Coarse error classes surfaced to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The request timed out or was aborted.
    Timeout,
    /// A rate limit or quota was hit.
    RateLimit,
    /// Credentials were rejected.
    Auth,
    /// The provider could not be reached.
    Network,
    /// Anything else.
    Generic,
}

impl ErrorKind {
    /// Classify an error message by substring, case-insensitively.
    pub fn classify(text: &str) -> Self {
        let text = text.to_lowercase();
        let has = |needles: &[&str]| needles.iter().any(|n| text.contains(n));
        if has(&["timeout", "timed out", "aborted"]) {
            Self::Timeout
        } else if has(&["rate limit", "quota", "429"]) {
            Self::RateLimit
        } else if has(&["authentication", "unauthorized", "forbidden", "401", "403"]) {
            Self::Auth
        } else if has(&["network", "fetch", "connect"]) {
            Self::Network
        } else {
            Self::Generic
        }
    }

    /// Classify an error by its full context chain.
    pub fn of(error: &anyhow::Error) -> Self {
        Self::classify(&format!("{error:#}"))
    }

    /// The message shown to the user.
    pub fn user_message(self) -> &'static str {
        match self {
            Self::Timeout => "The request timed out. Please try again with a shorter question.",
            Self::RateLimit => "Rate limit exceeded. Please wait a moment and try again.",
            Self::Auth => "Authentication error. Please check your API keys.",
            Self::Network => "Network error. Please check your internet connection.",
            Self::Generic => "An error occurred while processing your request.",
        }
    }
}
