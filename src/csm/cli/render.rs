//! # Rendering
//!
//! Turns command results into terminal text. Every `render_*` function has an
//! `_internal` twin taking an explicit colour switch so the layout can be
//! tested without ANSI codes; the public ones colour only when stdout is a
//! terminal.
//!
//! Secrets are shown sparingly: list views print only essential fields, the
//! full view prints every field.

use colored::{ColoredString, Colorize};
use csm::commands::{CmdMessage, MessageLevel};
use csm::model::AccountRecord;
use std::io::IsTerminal;

const INDENT: &str = "    ";

fn use_color() -> bool {
    std::io::stdout().is_terminal()
}

fn paint(text: &str, use_color: bool, style: fn(&str) -> ColoredString) -> String {
    if use_color {
        style(text).to_string()
    } else {
        text.to_string()
    }
}

pub fn render_record_list(records: &[AccountRecord], all_fields: bool) -> String {
    render_record_list_internal(records, all_fields, use_color())
}

fn render_record_list_internal(records: &[AccountRecord], all_fields: bool, color: bool) -> String {
    if records.is_empty() {
        return "No accounts found.\n".to_string();
    }

    let mut out = String::new();
    for record in records {
        let id = format!("{:>4}.", record.account_id());
        out.push_str(&paint(&id, color, |s| s.yellow()));
        out.push(' ');
        out.push_str(&paint(record.account_name(), color, |s| s.bold()));
        if !record.labels().is_empty() {
            let labels = format!("[{}]", record.labels().join(", "));
            out.push(' ');
            out.push_str(&paint(&labels, color, |s| s.dimmed()));
        }
        out.push('\n');

        let fields: Vec<_> = if all_fields {
            record.fields().iter().collect()
        } else {
            record.essential_fields().collect()
        };
        for field in fields {
            push_field(&mut out, &field.title, &field.value, color);
        }
    }
    out
}

fn push_field(out: &mut String, title: &str, value: &str, color: bool) {
    let mut lines = value.split('\n');
    let first = lines.next().unwrap_or_default();
    out.push_str(INDENT);
    out.push_str(&paint(&format!("{}:", title), color, |s| s.cyan()));
    out.push(' ');
    out.push_str(first);
    out.push('\n');
    let continuation = " ".repeat(INDENT.len() + title.len() + 2);
    for line in lines {
        out.push_str(&continuation);
        out.push_str(line);
        out.push('\n');
    }
}

pub fn render_full_records(records: &[AccountRecord]) -> String {
    render_full_records_internal(records, use_color())
}

fn render_full_records_internal(records: &[AccountRecord], color: bool) -> String {
    let mut out = String::new();
    for (i, record) in records.iter().enumerate() {
        if i > 0 {
            out.push_str("\n================================\n\n");
        }
        out.push_str(&render_record_list_internal(
            std::slice::from_ref(record),
            true,
            color,
        ));
        if !record.essentials().is_empty() {
            out.push_str(INDENT);
            out.push_str(&paint(
                &format!("essentials: {}", record.essentials().join(", ")),
                color,
                |s| s.dimmed(),
            ));
            out.push('\n');
        }
        let dates = format!(
            "created {}, modified {}",
            record.creation_time_str(),
            record.modification_time_str()
        );
        out.push_str(INDENT);
        out.push_str(&paint(&dates, color, |s| s.dimmed()));
        out.push('\n');
    }
    out
}

pub fn render_text_list(lines: &[String], empty_message: &str) -> String {
    if lines.is_empty() {
        return format!("{}\n", empty_message);
    }
    let mut out = String::new();
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
    out
}

pub fn render_messages(messages: &[CmdMessage]) -> String {
    render_messages_internal(messages, use_color())
}

fn render_messages_internal(messages: &[CmdMessage], color: bool) -> String {
    let mut out = String::new();
    for message in messages {
        let style: fn(&str) -> ColoredString = match message.level {
            MessageLevel::Info => |s| s.dimmed(),
            MessageLevel::Success => |s| s.green(),
            MessageLevel::Warning => |s| s.yellow(),
            MessageLevel::Error => |s| s.red(),
        };
        out.push_str(&paint(&message.content, color, style));
        out.push('\n');
    }
    out
}

pub fn print_messages(messages: &[CmdMessage]) {
    print!("{}", render_messages(messages));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gmail() -> AccountRecord {
        let mut rec = AccountRecord::new("Gmail");
        rec.add_field("User", "alice");
        rec.add_field("Pass", "line one\nline two");
        rec.add_label("mail");
        rec.add_essential("User", false);
        rec
    }

    #[test]
    fn test_render_empty_list() {
        assert_eq!(render_record_list_internal(&[], false, false), "No accounts found.\n");
    }

    #[test]
    fn test_list_shows_only_essentials() {
        let out = render_record_list_internal(&[gmail()], false, false);
        assert!(out.contains("Gmail [mail]"));
        assert!(out.contains("User: alice"));
        assert!(!out.contains("line one"));
    }

    #[test]
    fn test_all_fields_indent_continuation_lines() {
        let out = render_record_list_internal(&[gmail()], true, false);
        assert!(out.contains("    Pass: line one\n          line two\n"));
    }

    #[test]
    fn test_full_view_has_dates_and_essentials() {
        let out = render_full_records_internal(&[gmail(), gmail()], false);
        assert!(out.contains("essentials: User"));
        assert!(out.contains("created "));
        assert!(out.contains("================================"));
    }

    #[test]
    fn test_render_messages_plain() {
        let messages = vec![CmdMessage::success("Done"), CmdMessage::error("Bad")];
        assert_eq!(render_messages_internal(&messages, false), "Done\nBad\n");
    }

    #[test]
    fn test_render_with_color_includes_ansi() {
        colored::control::set_override(true);
        let out = render_messages_internal(&[CmdMessage::error("Bad")], true);
        assert!(out.contains("\u{1b}["));
    }

    #[test]
    fn test_text_list_empty_message() {
        assert_eq!(render_text_list(&[], "No labels."), "No labels.\n");
        assert_eq!(render_text_list(&["a".to_string()], "x"), "a\n");
    }
}
