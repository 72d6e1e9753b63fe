//! Delimited-format writer for history export.
//!
//! Fields containing the delimiter, a quote, or a line break are quoted
//! with embedded quotes doubled, so a hostile or odd float rendering can
//! never corrupt row structure.

use chrono::{DateTime, SecondsFormat};
use std::borrow::Cow;
use storage::Sample;

pub(crate) const EXPORT_HEADER: &str = "timestamp,temperature,output\n";

fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        let mut quoted = String::with_capacity(field.len() + 2);
        quoted.push('"');
        for ch in field.chars() {
            if ch == '"' {
                quoted.push('"');
            }
            quoted.push(ch);
        }
        quoted.push('"');
        Cow::Owned(quoted)
    } else {
        Cow::Borrowed(field)
    }
}

fn write_record(out: &mut String, fields: &[&str]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&escape_field(field));
    }
    out.push('\n');
}

fn format_timestamp(ms: i64) -> String {
    match DateTime::from_timestamp_millis(ms) {
        Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Millis, true),
        // Out-of-range clock value; export the raw milliseconds.
        None => ms.to_string(),
    }
}

/// One export row: `timestamp,temperature,output`.
pub(crate) fn sample_row(sample: &Sample) -> String {
    let mut row = String::new();
    write_record(
        &mut row,
        &[
            &format_timestamp(sample.created_at),
            &sample.temperature.to_string(),
            &sample.output.to_string(),
        ],
    );
    row
}
