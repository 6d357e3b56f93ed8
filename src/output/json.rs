use anyhow::Result;
use serde_json::json;

use crate::models::MessageRecord;
use crate::summary::Summary;

/// Same envelope as `GET /api/emails`.
pub fn format_messages(records: &[MessageRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(&json!({ "emails": records }))?)
}

pub fn format_summary(summary: &Summary) -> Result<String> {
    Ok(serde_json::to_string_pretty(summary)?)
}
