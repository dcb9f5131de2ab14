// Pipeline error kinds and user-facing redaction
use thiserror::Error;

/// Everything that can go wrong between an inbound request and its summary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("Signing failed: {0}")]
    SigningError(String),

    #[error("No directions found for the specified route! Try including more details such as city, state and zip code.")]
    NoRouteFound,

    #[error("{0}")]
    ProviderError(String),

    #[error("Snapshot request failed: {0}")]
    SnapshotError(String),

    #[error("Image upload failed: {0}")]
    UploadError(String),
}

impl PipelineError {
    /// Geometry and signing failures abort the request; the rest degrade the payload.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InvalidCoordinate(_) | Self::SigningError(_))
    }

    /// Message safe to show in a chat channel.
    pub fn user_message(&self) -> String {
        redact_urls(&self.to_string())
    }
}

const REDACTED: &str = "[redacted]";

/// Replace every `http://` or `https://` URL (up to the next whitespace)
/// with a placeholder.
pub fn redact_urls(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find("http") {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        if !(tail.starts_with("http://") || tail.starts_with("https://")) {
            out.push_str("http");
            rest = &tail["http".len()..];
            continue;
        }
        let end = tail.find(char::is_whitespace).unwrap_or(tail.len());
        out.push_str(REDACTED);
        rest = &tail[end..];
    }

    out.push_str(rest);
    out
}
