use rocket::http::Status;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, KidVidError>;

#[derive(Debug, Error)]
pub enum KidVidError {
    /// No API key survived config loading. Only ever raised at boot.
    #[error("no YouTube API keys configured (set YT_API_KEYS or YT_API_KEY_1..3)")]
    NoCredentialsConfigured,

    /// Every key hit a quota/auth denial within one logical call.
    #[error("all {attempts} YouTube API keys were denied (quota or permission)")]
    AllCredentialsExhausted { attempts: usize },

    /// Non-quota failure: bad status, transport error or timeout (`status` is `None`).
    #[error("YouTube API error {}: {message}", display_status(.status))]
    Upstream { status: Option<u16>, message: String },

    #[error("failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("cache directory unavailable: {0}")]
    CacheDir(#[from] std::io::Error),
}

fn display_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "(no status)".to_string(),
    }
}

impl KidVidError {
    pub fn upstream(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            message: message.into(),
        }
    }

    pub fn http_status(&self) -> Status {
        match self {
            KidVidError::AllCredentialsExhausted { .. } => Status::ServiceUnavailable,
            KidVidError::Upstream { .. } => Status::BadGateway,
            KidVidError::NoCredentialsConfigured
            | KidVidError::Encode(_)
            | KidVidError::CacheDir(_) => Status::InternalServerError,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            KidVidError::NoCredentialsConfigured => "no_credentials",
            KidVidError::AllCredentialsExhausted { .. } => "credentials_exhausted",
            KidVidError::Upstream { .. } => "upstream_error",
            KidVidError::Encode(_) => "encode_error",
            KidVidError::CacheDir(_) => "cache_error",
        }
    }
}

impl From<reqwest::Error> for KidVidError {
    fn from(e: reqwest::Error) -> Self {
        let message = if e.is_timeout() {
            format!("request timed out: {e}")
        } else {
            e.to_string()
        };
        KidVidError::upstream(e.status().map(|s| s.as_u16()), message)
    }
}
