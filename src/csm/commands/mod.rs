use crate::error::StatusCode;
use crate::model::AccountRecord;
use std::path::PathBuf;

pub mod add;
pub mod create;
pub mod export;
pub mod find;
pub mod labels;
pub mod list;
pub mod open;
pub mod remove;
pub mod show;
pub mod update;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

/// What a command produced. Records are unlocked copies of the live ones.
#[derive(Debug, Default)]
pub struct CmdResult {
    pub records: Vec<AccountRecord>,
    pub labels: Vec<String>,
    pub sources: Vec<String>,
    pub affected_ids: Vec<u64>,
    pub output_path: Option<PathBuf>,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_records<'a>(mut self, records: impl IntoIterator<Item = &'a AccountRecord>) -> Self {
        self.records = records.into_iter().cloned().collect();
        self
    }

    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_sources(mut self, sources: Vec<String>) -> Self {
        self.sources = sources;
        self
    }

    pub fn with_affected_ids(mut self, ids: Vec<u64>) -> Self {
        self.affected_ids = ids;
        self
    }

    pub fn with_output_path(mut self, path: PathBuf) -> Self {
        self.output_path = Some(path);
        self
    }
}

/// Changes applied to a record by `add` and `update`.
#[derive(Debug, Clone, Default)]
pub struct RecordEdit {
    pub name: Option<String>,
    /// Title/value pairs; an existing title is overwritten.
    pub fields: Vec<(String, String)>,
    pub remove_fields: Vec<String>,
    pub labels: Vec<String>,
    pub essentials: Vec<String>,
}

impl RecordEdit {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.fields.is_empty()
            && self.remove_fields.is_empty()
            && self.labels.is_empty()
            && self.essentials.is_empty()
    }

    /// Applies the edit to an unlocked record, collecting a message for
    /// every change that was refused or degraded.
    pub fn apply(&self, record: &mut AccountRecord, messages: &mut Vec<CmdMessage>) {
        let mut note = |code: StatusCode, what: String| match code {
            StatusCode::Ok => {}
            StatusCode::Warning => messages.push(CmdMessage::warning(what)),
            _ => messages.push(CmdMessage::error(what)),
        };

        if let Some(name) = &self.name {
            note(record.set_account_name(name), format!("Invalid account name '{}'", name));
        }
        for (title, value) in &self.fields {
            note(record.set_field(title, value), format!("Could not set field '{}'", title));
        }
        for title in &self.remove_fields {
            note(record.remove_field(title), format!("No field '{}' to remove", title));
        }
        for label in &self.labels {
            note(record.add_label(label), format!("Ignored label '{}'", label));
        }
        for title in &self.essentials {
            note(
                record.add_essential(title, false),
                format!("Cannot mark missing field '{}' as essential", title),
            );
        }
    }
}

/// Parses `Title=value` pairs. Only the first `=` splits.
pub fn parse_field_pairs<I, S>(pairs: I) -> crate::error::Result<Vec<(String, String)>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    pairs
        .into_iter()
        .map(|pair| {
            let pair = pair.as_ref();
            pair.split_once('=')
                .map(|(t, v)| (t.trim().to_string(), v.to_string()))
                .ok_or_else(|| {
                    crate::error::CsmError::Api(format!("expected Title=value, got '{}'", pair))
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_field_pairs() {
        let pairs = parse_field_pairs(["User=alice", "Url=https://x?a=b"]).unwrap();
        assert_eq!(pairs[0], ("User".to_string(), "alice".to_string()));
        assert_eq!(pairs[1].1, "https://x?a=b");
        assert!(parse_field_pairs(["novalue"]).is_err());
    }

    #[test]
    fn edit_reports_refused_changes() {
        let mut rec = AccountRecord::new("Login");
        rec.add_field("User", "alice");
        let edit = RecordEdit {
            fields: vec![("Pass".into(), "x".into())],
            remove_fields: vec!["Nope".into()],
            essentials: vec!["Pass".into(), "Missing".into()],
            ..Default::default()
        };
        let mut messages = Vec::new();
        edit.apply(&mut rec, &mut messages);

        assert_eq!(rec.field("Pass"), Some("x"));
        assert!(rec.has_essential("Pass"));
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].level, MessageLevel::Warning);
        assert_eq!(messages[1].level, MessageLevel::Error);
    }
}
