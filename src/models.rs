use serde::{Deserialize, Serialize};

pub const UNKNOWN_SENDER: &str = "Unknown Sender";
pub const NO_SUBJECT: &str = "No Subject";
pub const UNKNOWN_USER: &str = "Unknown User";

/// Delegated credentials for one signed-in browser session.
///
/// Sealed into the session cookie at the login callback and opened again on
/// every request. `refresh_token` and `expires_at` are kept as the provider
/// returned them but nothing reads them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Epoch seconds.
    pub expires_at: Option<i64>,
    pub email: Option<String>,
    pub name: Option<String>,
}

impl Session {
    pub fn display_email(&self) -> &str {
        self.email
            .as_deref()
            .filter(|email| !email.is_empty())
            .unwrap_or(UNKNOWN_USER)
    }
}

/// One inbox message flattened out of a Gmail detail response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageRecord {
    pub id: String,
    pub snippet: String,
    /// Raw `From` header, either `Name <addr>` or a bare address.
    pub sender: String,
    pub subject: String,
    /// Locale-formatted receive time, see [`crate::summary::DISPLAY_TIME_FORMAT`].
    pub time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SenderCount {
    pub sender: String,
    pub count: usize,
}
