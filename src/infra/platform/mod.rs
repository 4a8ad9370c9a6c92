pub mod history_pages;
pub mod serenity_platform;

pub use serenity_platform::{PlatformSettings, SerenityPlatform, DEFAULT_UPLOAD_LIMIT_BYTES};

use crate::core::ports::PlatformError;
use poise::serenity_prelude as serenity;

/// Reduce a serenity error to what the core reacts to: the HTTP status and
/// Discord's message, or the error text.
pub(crate) fn platform_error(err: serenity::Error) -> PlatformError {
    if let serenity::Error::Http(http_err) = &err {
        if let Some(status) = http_err.status_code() {
            return PlatformError::Http {
                status: status.as_u16(),
                message: http_err.to_string(),
            };
        }
    }
    PlatformError::Other(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_http_errors_keep_their_text() {
        let err = serenity::Error::Other("gateway closed");
        assert!(matches!(
            platform_error(err),
            PlatformError::Other(text) if text == "gateway closed"
        ));
    }
}
