pub mod html;
pub mod json;
pub mod table;

use anyhow::Result;

use crate::models::MessageRecord;
use crate::summary::Summary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl OutputFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            Self::Json
        } else {
            Self::Table
        }
    }
}

pub fn format_messages(format: OutputFormat, records: &[MessageRecord]) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(table::format_messages(records)),
        OutputFormat::Json => json::format_messages(records),
    }
}

pub fn format_summary(format: OutputFormat, summary: &Summary) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(table::format_summary(summary)),
        OutputFormat::Json => json::format_summary(summary),
    }
}
