use async_trait::async_trait;
use thiserror::Error;

use crate::models::MessageRecord;

pub mod gmail_api;

pub use gmail_api::GmailApiClient;

pub const DEFAULT_MAX_RESULTS: usize = 50;

/// Any failure talking to the mail provider. A single failed request fails
/// the whole fetch; there is no partial result.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Message ID is null or undefined")]
    MissingMessageId,

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("gmail api request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("gmail api response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

impl FetchError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(error) => error.status().map(|status| status.as_u16()),
            _ => None,
        }
    }
}

/// Source of recent inbox messages for one delegated access token.
#[async_trait]
pub trait MailGateway: Send + Sync {
    fn name(&self) -> &str;

    async fn list_recent_messages(
        &self,
        access_token: &str,
        max_results: usize,
    ) -> Result<Vec<MessageRecord>, FetchError>;
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::{FetchError, MailGateway};
    use crate::models::MessageRecord;

    struct EmptyGateway;

    #[async_trait]
    impl MailGateway for EmptyGateway {
        fn name(&self) -> &str {
            "empty"
        }

        async fn list_recent_messages(
            &self,
            _access_token: &str,
            _max_results: usize,
        ) -> Result<Vec<MessageRecord>, FetchError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn gateway_trait_is_object_safe() {
        let gateway: Box<dyn MailGateway> = Box::new(EmptyGateway);
        assert_eq!(gateway.name(), "empty");
    }

    #[test]
    fn api_error_displays_provider_message() {
        let error = FetchError::Api {
            status: 401,
            message: "Invalid Credentials".to_string(),
        };
        assert_eq!(error.to_string(), "Invalid Credentials");
        assert_eq!(error.status(), Some(401));
        assert_eq!(FetchError::MissingMessageId.status(), None);
    }
}
