use std::fmt;

/// Errors surfaced by feature and descriptor fetches.
#[derive(Debug)]
pub enum FetchError {
    /// The request never produced a response.
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
    /// Non-2xx upstream response, with the application error code when the
    /// body carried a well-formed envelope.
    Upstream {
        status: u16,
        code: Option<String>,
        message: String,
    },
    /// The resource exists but cannot back a map source (e.g. a descriptor
    /// with an empty tile list).
    Unavailable { message: String },
}

impl FetchError {
    pub fn transport(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        FetchError::Transport {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            FetchError::Upstream { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Transport { message, .. } => write!(f, "{message}"),
            FetchError::Upstream {
                status,
                code,
                message,
            } => match code {
                Some(code) => write!(f, "{message} ({code}, HTTP {status})"),
                None => write!(f, "{message} (HTTP {status})"),
            },
            FetchError::Unavailable { message } => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Transport { source, .. } => source.as_ref().map(|e| e.as_ref() as _),
            _ => None,
        }
    }
}
