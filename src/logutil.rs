//! Helpers for echoing raw CLI output into single-line log records.

use std::fmt::Write;

const MAX_PREVIEW: usize = 300;

/// Escape control characters so multi-line tool output stays on one log line,
/// truncating past 300 characters with an ellipsis.
pub fn escape_log(s: &str) -> String {
    escape_log_limited(s, MAX_PREVIEW)
}

/// [`escape_log`] with an explicit character budget.
pub fn escape_log_limited(s: &str, max_chars: usize) -> String {
    let mut out = String::with_capacity(s.len().min(max_chars) + 8);
    for (count, ch) in s.chars().enumerate() {
        if count >= max_chars {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(&mut out, "\\x{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

/// The first `lines` lines of `text`, escaped, for context on parse failures.
pub fn head_preview(text: &str, lines: usize) -> String {
    let head: Vec<&str> = text.lines().take(lines).collect();
    escape_log(&head.join("\n"))
}
