//! The single HTML page served by the device.

use std::fmt::Write;

use crate::{
    calendar::TargetDate,
    form::{FormSubmission, FormVariant, FIELD_DATE, FIELD_DAY, FIELD_MONTH, FIELD_YEAR},
};

/// Result of the last exchange, shown under the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Banner {
    None,
    /// A countdown computed from an earlier submission this session.
    LastKnown(i64),
    /// The submission that was just accepted.
    Accepted(i64),
    /// The submission that was just rejected, with the reason.
    Rejected(String),
}

/// Values the form inputs are pre-filled with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prefill {
    Target(TargetDate),
    Raw(FormSubmission),
}

pub fn render_page(variant: FormVariant, prefill: &Prefill, banner: &Banner) -> String {
    let mut html = String::with_capacity(1024);

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n<title>Countdown</title>\n</head>\n<body>\n");

    match variant {
        FormVariant::Split => {
            let (year, month, day) = match prefill {
                Prefill::Target(target) => (
                    target.year().to_string(),
                    format!("{:02}", target.month()),
                    format!("{:02}", target.day()),
                ),
                Prefill::Raw(FormSubmission::Split { year, month, day }) => {
                    (year.clone(), month.clone(), day.clone())
                }
                Prefill::Raw(FormSubmission::Iso { .. }) => Default::default(),
            };

            html.push_str("<h2>Type in end date (integers only).</h2>\n");
            html.push_str("<form action=\"/\" method=\"post\">\n");
            html.push_str("<label for=\"fyear\">End date:</label>\n");
            push_input(&mut html, FIELD_YEAR, "text", &year);
            push_input(&mut html, FIELD_MONTH, "text", &month);
            push_input(&mut html, FIELD_DAY, "text", &day);
        }
        FormVariant::Iso => {
            let date = match prefill {
                Prefill::Target(target) => target.to_string(),
                Prefill::Raw(FormSubmission::Iso { date }) => date.clone(),
                Prefill::Raw(FormSubmission::Split { .. }) => String::new(),
            };

            html.push_str("<h2>Pick the end date.</h2>\n");
            html.push_str("<form action=\"/\" method=\"post\">\n");
            html.push_str("<label for=\"fdate\">End date:</label>\n");
            push_input(&mut html, FIELD_DATE, "date", &date);
        }
    }

    html.push_str("<input type=\"submit\" value=\"Submit\">\n</form>\n");

    match banner {
        Banner::None => {}
        Banner::LastKnown(remaining) => {
            let _ = writeln!(html, "<h3>Last submitted. Time remaining = {remaining}</h3>");
        }
        Banner::Accepted(remaining) => {
            let _ = writeln!(html, "<h3>Submitted form. Time remaining = {remaining}</h3>");
        }
        Banner::Rejected(reason) => {
            let _ = writeln!(
                html,
                "<h3 class=\"error\">Submission rejected: {}</h3>",
                escape_html(reason)
            );
        }
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn push_input(html: &mut String, name: &str, kind: &str, value: &str) {
    let _ = writeln!(
        html,
        "<input type=\"{kind}\" id=\"{name}\" name=\"{name}\" value=\"{}\"><br>",
        escape_html(value)
    );
}

pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
