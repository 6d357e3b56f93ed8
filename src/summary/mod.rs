pub mod range;

use std::collections::HashMap;

use chrono::{DateTime, Local, TimeZone};
use serde::Serialize;

use crate::models::{MessageRecord, SenderCount};

pub use range::{format_display_time, parse_display_time, DateRange, DISPLAY_TIME_FORMAT};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub range: DateRange,
    pub senders: Vec<SenderCount>,
    pub total_count: usize,
}

impl Summary {
    pub fn sender_total(&self) -> usize {
        self.senders.iter().map(|entry| entry.count).sum()
    }
}

/// Summarize against the current local day.
pub fn summarize_now(records: &[MessageRecord], range: DateRange) -> Summary {
    summarize(records, range, &Local::now())
}

/// Count the records received inside `range` (relative to `now`) per sender,
/// most frequent sender first.
pub fn summarize<Tz: TimeZone>(
    records: &[MessageRecord],
    range: DateRange,
    now: &DateTime<Tz>,
) -> Summary {
    let tz = now.timezone();
    let (start, end) = range.bounds(now);

    let mut senders: Vec<SenderCount> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut total_count = 0usize;

    for record in records {
        let Some(received) = parse_display_time(&record.time, &tz) else {
            continue;
        };
        if received < start || received >= end {
            continue;
        }

        total_count += 1;
        let key = sender_key(&record.sender);
        match positions.get(key) {
            Some(&idx) => senders[idx].count += 1,
            None => {
                positions.insert(key.to_string(), senders.len());
                senders.push(SenderCount {
                    sender: key.to_string(),
                    count: 1,
                });
            }
        }
    }

    // slice::sort_by is stable, ties stay in encounter order
    senders.sort_by(|a, b| b.count.cmp(&a.count));

    Summary {
        range,
        senders,
        total_count,
    }
}

/// Display-name part of a `From` value: the text before the first `<`,
/// trimmed. Falls back to the whole value when that part is empty.
pub fn sender_key(sender: &str) -> &str {
    let name = sender.split('<').next().unwrap_or_default().trim();
    if name.is_empty() {
        sender
    } else {
        name
    }
}
