//! Server-rendered pages for the browser routes.
//!
//! Rendering is pure: callers decide what to show (signed out, error,
//! empty, populated) and these functions only bind it to markup.

use html_escape::{decode_html_entities, encode_double_quoted_attribute, encode_text};

use crate::models::{MessageRecord, Session};
use crate::output::table::plural;
use crate::summary::{DateRange, Summary};

const APP_TITLE: &str = "Gmail Summary App";

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0; background: #f9fafb; color: #111827; }
main { min-height: 100vh; padding: 2rem; }
.container { max-width: 56rem; margin: 0 auto; }
h1 { font-size: 1.875rem; margin-bottom: 1.5rem; }
h2 { font-size: 1.25rem; margin-bottom: 1rem; }
a { color: #3b82f6; text-decoration: none; }
a:hover { text-decoration: underline; }
.btn { display: inline-block; border: 0; border-radius: 0.25rem; padding: 0.5rem 1rem; font-weight: 700; color: #fff; background: #3b82f6; cursor: pointer; }
.btn:disabled { background: #d1d5db; color: #6b7280; cursor: not-allowed; }
.btn-danger { background: #ef4444; }
.btn-toggle { background: #fff; color: #374151; border: 1px solid #d1d5db; font-weight: 500; }
.btn-toggle.active { background: #2563eb; color: #fff; border-color: #2563eb; }
.error { background: #fee2e2; border: 1px solid #f87171; color: #b91c1c; padding: 0.75rem 1rem; border-radius: 0.25rem; margin-bottom: 1rem; }
.banner { background: #dbeafe; padding: 1rem; border-radius: 0.25rem; margin-bottom: 1.5rem; font-weight: 700; }
.emails { list-style: none; padding: 0; }
.emails li { border: 1px solid #e5e7eb; background: #fff; padding: 1rem; border-radius: 0.25rem; margin-bottom: 1rem; box-shadow: 0 1px 2px rgba(0,0,0,0.05); }
.meta { font-size: 0.875rem; color: #4b5563; margin: 0.25rem 0; }
.toolbar { display: flex; gap: 1rem; align-items: center; margin-bottom: 1rem; }
table { width: 100%; border-collapse: collapse; background: #fff; }
th, td { padding: 0.75rem 1rem; text-align: left; }
th.count, td.count { text-align: right; }
thead tr { background: #f3f4f6; }
tbody tr:nth-child(even) { background: #f9fafb; }
"#;

/// Disables the submit button and swaps its label while the page reloads.
const LOADING_ONSUBMIT: &str =
    "var b=this.querySelector('button[type=submit]');if(b){b.disabled=true;b.textContent='Loading...';}";

/// What the inbox section of `/` shows.
#[derive(Debug, Clone, Copy)]
pub enum InboxView<'a> {
    SignedOut,
    Failed(&'a str),
    Loaded(&'a [MessageRecord]),
}

/// What the body of `/summary` shows.
#[derive(Debug, Clone, Copy)]
pub enum SummaryView<'a> {
    Failed(&'a str),
    Loaded(&'a Summary),
}

pub fn render_home(session: Option<&Session>, inbox: InboxView<'_>, notice: Option<&str>) -> String {
    let mut body = String::new();
    body.push_str(&format!("<h1>{}</h1>\n", encode_text(APP_TITLE)));

    if let Some(notice) = notice {
        body.push_str(&error_box(notice));
    }

    body.push_str("<div style=\"margin-bottom:2rem\">");
    body.push_str(&login_button(session));
    body.push_str("</div>\n");

    body.push_str(
        "<div style=\"margin-top:1rem\"><a href=\"/summary\">View Today's Email Summary</a></div>\n",
    );

    body.push_str("<div>");
    body.push_str(&email_list(inbox));
    body.push_str("</div>\n");

    page(APP_TITLE, &body)
}

pub fn render_summary(range: DateRange, view: SummaryView<'_>) -> String {
    let day = range.label();
    let mut body = String::new();
    body.push_str("<h1 style=\"margin-bottom:0.5rem\">Email Summary</h1>\n");
    body.push_str("<div style=\"margin-bottom:2rem\"><a href=\"/\">&larr; Back to Home</a></div>\n");

    if let SummaryView::Failed(message) = view {
        body.push_str(&error_box(message));
    }

    body.push_str("<div class=\"toolbar\">");
    body.push_str("<div role=\"group\">");
    for (option, label) in [
        (DateRange::Today, "Today's Emails"),
        (DateRange::Yesterday, "Yesterday's Emails"),
    ] {
        let class = if option == range {
            "btn btn-toggle active"
        } else {
            "btn btn-toggle"
        };
        body.push_str(&format!(
            "<a class=\"{class}\" href=\"/summary?range={}\">{label}</a>",
            option.label()
        ));
    }
    body.push_str("</div>");
    body.push_str(&format!(
        "<form method=\"get\" action=\"/summary\" onsubmit=\"{}\">\
         <input type=\"hidden\" name=\"range\" value=\"{}\">\
         <button class=\"btn\" type=\"submit\">Refresh</button></form>",
        encode_double_quoted_attribute(LOADING_ONSUBMIT),
        range.label()
    ));
    body.push_str("</div>\n");

    match view {
        SummaryView::Loaded(summary) if !summary.senders.is_empty() => {
            body.push_str(&format!(
                "<div class=\"banner\"><p>You received {} {} {day} from {} {}</p></div>\n",
                summary.total_count,
                plural(summary.total_count, "email"),
                summary.senders.len(),
                plural(summary.senders.len(), "sender"),
            ));
            body.push_str("<table>\n<thead><tr><th>Sender</th><th class=\"count\">Number of Emails</th></tr></thead>\n<tbody>\n");
            for entry in &summary.senders {
                body.push_str(&format!(
                    "<tr><td>{}</td><td class=\"count\">{}</td></tr>\n",
                    encode_text(&entry.sender),
                    entry.count
                ));
            }
            body.push_str("</tbody>\n</table>\n");
        }
        _ => body.push_str(&format!("<p>No emails received {day}</p>\n")),
    }

    page("Email Summary", &body)
}

fn login_button(session: Option<&Session>) -> String {
    match session {
        Some(session) => format!(
            "<form method=\"post\" action=\"/auth/signout\">\
             <button class=\"btn btn-danger\" type=\"submit\">Sign Out ({})</button></form>",
            encode_text(session.display_email())
        ),
        None => "<a class=\"btn\" href=\"/auth/signin\"><span>Sign in with Google</span></a>"
            .to_string(),
    }
}

fn email_list(inbox: InboxView<'_>) -> String {
    let records = match inbox {
        InboxView::SignedOut => return "<p>Please sign in to view your emails</p>".to_string(),
        InboxView::Failed(_) => &[][..],
        InboxView::Loaded(records) => records,
    };

    let mut out = String::from("<h2>Your Emails</h2>\n");
    if let InboxView::Failed(message) = inbox {
        out.push_str(&error_box(message));
    }

    out.push_str(&format!(
        "<form method=\"get\" action=\"/\" onsubmit=\"{}\" style=\"margin-bottom:1rem\">\
         <button class=\"btn\" type=\"submit\">Refresh Emails</button></form>\n",
        encode_double_quoted_attribute(LOADING_ONSUBMIT)
    ));

    if records.is_empty() {
        out.push_str("<p>No emails found</p>\n");
        return out;
    }

    out.push_str("<ul class=\"emails\">\n");
    for record in records {
        out.push_str(&format!(
            "<li id=\"email-{}\"><p><strong>Subject: {}</strong></p>\
             <p class=\"meta\">From: {}</p><p class=\"meta\">Time: {}</p><p>{}</p></li>\n",
            encode_double_quoted_attribute(&record.id),
            encode_text(&record.subject),
            encode_text(&record.sender),
            encode_text(&record.time),
            encode_text(&decode_html_entities(&record.snippet)),
        ));
    }
    out.push_str("</ul>\n");
    out
}

fn error_box(message: &str) -> String {
    format!("<div class=\"error\">Error: {}</div>\n", encode_text(message))
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n<main>\n\
         <div class=\"container\">\n{body}</div>\n</main>\n</body>\n</html>\n",
        encode_text(title)
    )
}
