use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::models::MessageRecord;
use crate::summary::Summary;

const FROM_WIDTH: usize = 28;
const SUBJECT_WIDTH: usize = 48;
const TIME_WIDTH: usize = 24;
const SENDER_WIDTH: usize = 40;
const COUNT_WIDTH: usize = 16;

pub fn format_messages(records: &[MessageRecord]) -> String {
    if records.is_empty() {
        return "No emails found".to_string();
    }

    let mut out = String::new();
    out.push_str(&format!(
        "{:<from$}  {:<subject$}  {:<time$}\n",
        "From",
        "Subject",
        "Time",
        from = FROM_WIDTH,
        subject = SUBJECT_WIDTH,
        time = TIME_WIDTH
    ));
    out.push_str(&format!(
        "{}  {}  {}\n",
        "-".repeat(FROM_WIDTH),
        "-".repeat(SUBJECT_WIDTH),
        "-".repeat(TIME_WIDTH)
    ));

    for record in records {
        out.push_str(&format!(
            "{}  {}  {}\n",
            pad_to_width(&truncate_for_width(&record.sender, FROM_WIDTH), FROM_WIDTH),
            pad_to_width(&truncate_for_width(&record.subject, SUBJECT_WIDTH), SUBJECT_WIDTH),
            truncate_for_width(&record.time, TIME_WIDTH)
        ));
    }

    out
}

pub fn format_summary(summary: &Summary) -> String {
    let day = summary.range.label();
    if summary.senders.is_empty() {
        return format!("No emails received {day}");
    }

    let mut out = String::new();
    out.push_str(&format!(
        "You received {} {} {day} from {} {}\n\n",
        summary.total_count,
        plural(summary.total_count, "email"),
        summary.senders.len(),
        plural(summary.senders.len(), "sender"),
    ));
    out.push_str(&format!(
        "{:<sender$}  {:>count$}\n",
        "Sender",
        "Number of Emails",
        sender = SENDER_WIDTH,
        count = COUNT_WIDTH
    ));
    out.push_str(&format!(
        "{}  {}\n",
        "-".repeat(SENDER_WIDTH),
        "-".repeat(COUNT_WIDTH)
    ));
    for entry in &summary.senders {
        out.push_str(&format!(
            "{}  {:>count$}\n",
            pad_to_width(&truncate_for_width(&entry.sender, SENDER_WIDTH), SENDER_WIDTH),
            entry.count,
            count = COUNT_WIDTH
        ));
    }
    out
}

pub(crate) fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        noun.to_string()
    } else {
        format!("{noun}s")
    }
}

fn pad_to_width(value: &str, width: usize) -> String {
    let used = UnicodeWidthStr::width(value);
    format!("{value}{}", " ".repeat(width.saturating_sub(used)))
}

fn truncate_for_width(value: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(value) <= max_width {
        return value.to_string();
    }

    if max_width <= 1 {
        return "…".to_string();
    }

    let mut out = String::new();
    let mut width = 0usize;
    for c in value.chars() {
        let cw = UnicodeWidthChar::width(c).unwrap_or(0);
        if width + cw + 1 > max_width {
            break;
        }
        out.push(c);
        width += cw;
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::{format_messages, format_summary, truncate_for_width};
    use crate::models::{MessageRecord, SenderCount};
    use crate::summary::{DateRange, Summary};

    fn record() -> MessageRecord {
        MessageRecord {
            id: "m-1".to_string(),
            snippet: "Preview".to_string(),
            sender: "Sender Name <sender@example.com>".to_string(),
            subject: "A very long subject line that should be truncated in table output because it exceeds width".to_string(),
            time: "10/14/2026, 9:00:00 AM".to_string(),
        }
    }

    #[test]
    fn message_table_has_headers_and_truncates() {
        let rendered = format_messages(&[record()]);
        assert!(rendered.contains("From"));
        assert!(rendered.contains("Subject"));
        assert!(rendered.contains("Time"));
        assert!(rendered.contains('…'));
        assert_eq!(format_messages(&[]), "No emails found");
    }

    #[test]
    fn summary_table_pluralizes_banner() {
        let summary = Summary {
            range: DateRange::Today,
            senders: vec![SenderCount {
                sender: "Bob".to_string(),
                count: 1,
            }],
            total_count: 1,
        };
        let rendered = format_summary(&summary);
        assert!(rendered.starts_with("You received 1 email today from 1 sender"));
        assert!(rendered.contains("Bob"));

        let empty = Summary {
            range: DateRange::Yesterday,
            senders: vec![],
            total_count: 0,
        };
        assert_eq!(format_summary(&empty), "No emails received yesterday");
    }

    #[test]
    fn truncation_respects_wide_characters() {
        assert_eq!(truncate_for_width("短い", 10), "短い");
        assert_eq!(truncate_for_width("日本語のテキスト", 5), "日本…");
    }
}
