//! # Plain Text Format
//!
//! Line-oriented, one blob per source:
//!
//! ```text
//! ---->>CSM_PLAIN_TEXT_FORMATTER Version 1.0
//! ---->>Login
//! @@LABELS
//! work
//! @@ESSENTIALS
//! Pass
//! @@User
//! alice
//! @@Pass
//! first line
//! second line
//! ---->>Card
//! ...
//! ```
//!
//! The record separator (`---->>`) and field separator (`@@`) are
//! configurable line prefixes; the header line is fixed. No label, essential,
//! field title or value line may start with either separator.
//!
//! Decoding is an explicit state machine, one state per position inside a
//! record:
//!
//! ```text
//! Header -> RecordStart -> LabelsMarker -> Labels -> EssentialsMarker -> Essentials -> Fields
//!              ^                                                                         |
//!              +--------------------------- next record ---------------------------------+
//! ```
//!
//! | Situation                                 | strict | brute force                         |
//! |-------------------------------------------|--------|-------------------------------------|
//! | header mismatch                           | error  | error                               |
//! | text before the first record              | error  | line skipped, warning               |
//! | missing `LABELS` / `ESSENTIALS` marker    | error  | section empty, line reprocessed     |
//! | new record inside labels or essentials    | error  | partial record kept, warning        |
//! | value line with no field title            | error  | titled `csmRecoveredField`, warning |
//! | input ends before labels and essentials   | error  | record kept, warning                |
//!
//! Field value scratch space is allocated once per decode and scrubbed after
//! every field, and the encoder writes into a buffer sized up front so the
//! clear text is never left behind by a reallocation.

use super::{Codec, Decoded, Encoded};
use crate::error::{CsmError, Result, Status};
use crate::model::AccountRecord;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use zeroize::{Zeroize, Zeroizing};

pub const HEADER: &str = "---->>CSM_PLAIN_TEXT_FORMATTER Version 1.0";
pub const LABELS_MARKER: &str = "LABELS";
pub const ESSENTIALS_MARKER: &str = "ESSENTIALS";

/// Title given to a value whose field line was lost.
pub const RECOVERED_FIELD: &str = "csmRecoveredField";
/// Name given to a record whose name line was empty.
pub const RECOVERED_ACCOUNT: &str = "csmRecoveredAccount";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Separators {
    pub record: String,
    pub field: String,
}

impl Default for Separators {
    fn default() -> Self {
        Self {
            record: "---->>".to_string(),
            field: "@@".to_string(),
        }
    }
}

impl Separators {
    pub fn validate(&self) -> Result<()> {
        for (what, sep) in [("record", &self.record), ("field", &self.field)] {
            if sep.is_empty() || sep.contains('\n') {
                return Err(CsmError::Format(format!(
                    "{} separator must be a non-empty single line",
                    what
                )));
            }
        }
        // A line starting with the longer one would also match the shorter.
        let (record, field) = (self.record.as_str(), self.field.as_str());
        if record.starts_with(field) || field.starts_with(record) {
            return Err(CsmError::Format(
                "record and field separators must differ and neither may prefix the other"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct PlainTextCodec {
    format: String,
    seps: Separators,
    labels_line: String,
    essentials_line: String,
}

impl Default for PlainTextCodec {
    fn default() -> Self {
        Self::build("t".to_string(), Separators::default())
    }
}

impl PlainTextCodec {
    pub fn new(format: impl Into<String>, seps: Separators) -> Result<Self> {
        seps.validate()?;
        Ok(Self::build(format.into(), seps))
    }

    fn build(format: String, seps: Separators) -> Self {
        let labels_line = format!("{}{}", seps.field, LABELS_MARKER);
        let essentials_line = format!("{}{}", seps.field, ESSENTIALS_MARKER);
        Self {
            format,
            seps,
            labels_line,
            essentials_line,
        }
    }

    pub fn separators(&self) -> &Separators {
        &self.seps
    }

    fn clashes(&self, line: &str) -> bool {
        line.starts_with(self.seps.record.as_str()) || line.starts_with(self.seps.field.as_str())
    }

    fn strip_separators<'t>(&self, mut line: &'t str) -> &'t str {
        loop {
            if let Some(rest) = line.strip_prefix(self.seps.record.as_str()) {
                line = rest;
            } else if let Some(rest) = line.strip_prefix(self.seps.field.as_str()) {
                line = rest;
            } else {
                return line;
            }
        }
    }

    /// Upper bound of the encoded size. Repairs only ever shrink the output.
    fn encoded_capacity(&self, records: &[AccountRecord]) -> usize {
        let rec = self.seps.record.len();
        let field = self.seps.field.len();
        let markers = self.labels_line.len() + self.essentials_line.len() + 2;

        HEADER.len()
            + 1
            + records
                .iter()
                .map(|r| {
                    rec + r.account_name().len()
                        + 1
                        + markers
                        + r.labels().iter().map(|l| l.len() + 1).sum::<usize>()
                        + r.essentials().iter().map(|e| e.len() + 1).sum::<usize>()
                        + r.fields()
                            .iter()
                            .map(|f| field + f.title.len() + 1 + f.value.len() + 1)
                            .sum::<usize>()
                })
                .sum::<usize>()
    }
}

impl Codec for PlainTextCodec {
    fn format(&self) -> &str {
        &self.format
    }

    fn encode(&self, records: &[AccountRecord], brute_force: bool) -> Result<Encoded> {
        let mut enc = Encoder {
            codec: self,
            brute_force,
            out: Zeroizing::new(String::with_capacity(self.encoded_capacity(records))),
            status: Status::Ok,
        };

        enc.out.push_str(HEADER);
        enc.out.push('\n');
        for record in records {
            enc.record(record)?;
        }

        debug!(records = records.len(), "Encoded plain text blob");
        Ok(Encoded {
            text: enc.out,
            status: enc.status,
        })
    }

    fn decode(&self, text: &str, brute_force: bool) -> Result<Decoded> {
        let body = text.strip_suffix('\n').unwrap_or(text);
        let mut dec = Decoder::new(self, brute_force, text.len());

        for (idx, line) in body.split('\n').enumerate() {
            dec.line_no = idx + 1;
            while let Step::Reprocess = dec.feed(line)? {}
        }
        dec.finish()
    }
}

/// Lines compare byte for byte; only a CRLF line ending is tolerated.
fn without_cr(line: &str) -> &str {
    line.strip_suffix('\r').unwrap_or(line)
}

// -- encoding ---------------------------------------------------------------

struct Encoder<'c> {
    codec: &'c PlainTextCodec,
    brute_force: bool,
    out: Zeroizing<String>,
    status: Status,
}

impl Encoder<'_> {
    fn repair(&mut self, account: &str, problem: &str) -> Result<()> {
        if !self.brute_force {
            return Err(CsmError::Format(format!(
                "account '{}': {}",
                account, problem
            )));
        }
        warn!(account, "Repairing on encode: {}", problem);
        self.status = Status::Warning;
        Ok(())
    }

    /// Checks a single-line element and returns the text to write. Newlines
    /// are replaced at write time.
    fn single_line<'t>(
        &mut self,
        account: &str,
        what: &str,
        text: &'t str,
        check_prefix: bool,
    ) -> Result<&'t str> {
        let mut body = text;
        if check_prefix && self.codec.clashes(body) {
            self.repair(account, &format!("{} starts with a separator", what))?;
            body = self.codec.strip_separators(body);
        }
        if body.contains('\n') {
            self.repair(account, &format!("{} spans several lines", what))?;
        }
        Ok(body)
    }

    fn write_line(&mut self, prefix: &str, text: &str) {
        self.out.push_str(prefix);
        for c in text.chars() {
            self.out.push(if c == '\n' { ' ' } else { c });
        }
        self.out.push('\n');
    }

    fn record(&mut self, record: &AccountRecord) -> Result<()> {
        let codec = self.codec;
        let account = record.account_name();

        let mut name = self.single_line(account, "account name", account, false)?;
        if name.trim().is_empty() {
            self.repair(account, "account name is empty")?;
            name = RECOVERED_ACCOUNT;
        }
        self.write_line(&codec.seps.record, name);

        self.out.push_str(&codec.labels_line);
        self.out.push('\n');
        for label in record.labels() {
            let body = self.single_line(account, "label", label, true)?;
            if body.trim().is_empty() {
                warn!(account, "Dropping a label that was only separators");
                continue;
            }
            self.write_line("", body);
        }

        self.out.push_str(&codec.essentials_line);
        self.out.push('\n');
        for essential in record.essentials() {
            let body = self.single_line(account, "essential", essential, true)?;
            if body.trim().is_empty() {
                warn!(account, "Dropping an essential that was only separators");
                continue;
            }
            self.write_line("", body);
        }

        for field in record.fields() {
            let title = self.single_line(account, "field title", &field.title, true)?;
            if title.trim().is_empty() {
                return Err(CsmError::Format(format!(
                    "account '{}': field title cannot be repaired",
                    account
                )));
            }
            self.write_line(&codec.seps.field, title);

            for line in field.value.split('\n') {
                let line = if codec.clashes(line) {
                    self.repair(account, "field value line starts with a separator")?;
                    codec.strip_separators(line)
                } else {
                    line
                };
                self.out.push_str(line);
                self.out.push('\n');
            }
        }
        Ok(())
    }
}

// -- decoding ---------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Header,
    RecordStart,
    LabelsMarker,
    Labels,
    EssentialsMarker,
    Essentials,
    Fields,
}

enum Step {
    Next,
    Reprocess,
}

struct PartialRecord {
    record: AccountRecord,
    saw_labels: bool,
    saw_essentials: bool,
}

struct Decoder<'c> {
    codec: &'c PlainTextCodec,
    brute_force: bool,
    state: ScanState,
    line_no: usize,
    current: Option<PartialRecord>,
    title: Option<String>,
    value: Zeroizing<String>,
    value_lines: usize,
    records: Vec<AccountRecord>,
    status: Status,
}

impl<'c> Decoder<'c> {
    fn new(codec: &'c PlainTextCodec, brute_force: bool, capacity: usize) -> Self {
        Self {
            codec,
            brute_force,
            state: ScanState::Header,
            line_no: 0,
            current: None,
            title: None,
            value: Zeroizing::new(String::with_capacity(capacity)),
            value_lines: 0,
            records: Vec::new(),
            status: Status::Ok,
        }
    }

    /// Strict mode turns a format violation into an error; brute force logs
    /// it and degrades the overall status.
    fn fault(&mut self, problem: &str) -> Result<()> {
        if !self.brute_force {
            return Err(CsmError::Format(format!(
                "line {}: {}",
                self.line_no, problem
            )));
        }
        warn!(line = self.line_no, "Recovering from malformed input: {}", problem);
        self.status = Status::Warning;
        Ok(())
    }

    fn feed(&mut self, line: &str) -> Result<Step> {
        let codec = self.codec;
        let seps = &codec.seps;
        let is_record = line.starts_with(seps.record.as_str());
        let is_field = !is_record && line.starts_with(seps.field.as_str());

        match self.state {
            ScanState::Header => {
                if without_cr(line) != HEADER {
                    return Err(CsmError::Format(
                        "missing or unsupported format header".to_string(),
                    ));
                }
                self.state = ScanState::RecordStart;
            }
            ScanState::RecordStart => {
                if is_record {
                    self.begin_record(&line[seps.record.len()..])?;
                    self.state = ScanState::LabelsMarker;
                } else if !line.trim().is_empty() {
                    self.fault("text outside of any record")?;
                }
            }
            ScanState::LabelsMarker => {
                if without_cr(line) == codec.labels_line {
                    self.with_current(|p| p.saw_labels = true);
                    self.state = ScanState::Labels;
                } else if is_record {
                    self.interrupted()?;
                    return Ok(Step::Reprocess);
                } else {
                    self.fault("missing LABELS marker")?;
                    self.state = ScanState::EssentialsMarker;
                    return Ok(Step::Reprocess);
                }
            }
            ScanState::Labels => {
                if is_record {
                    self.interrupted()?;
                    return Ok(Step::Reprocess);
                } else if is_field {
                    self.state = ScanState::EssentialsMarker;
                    return Ok(Step::Reprocess);
                }
                self.with_current(|p| {
                    p.record.add_label(line);
                });
            }
            ScanState::EssentialsMarker => {
                if without_cr(line) == codec.essentials_line {
                    self.with_current(|p| p.saw_essentials = true);
                    self.state = ScanState::Essentials;
                } else if is_record {
                    self.interrupted()?;
                    return Ok(Step::Reprocess);
                } else {
                    self.fault("missing ESSENTIALS marker")?;
                    self.state = ScanState::Fields;
                    return Ok(Step::Reprocess);
                }
            }
            ScanState::Essentials => {
                if is_record || is_field {
                    self.state = ScanState::Fields;
                    return Ok(Step::Reprocess);
                }
                // Fields are not read yet, so the title cannot be checked.
                self.with_current(|p| {
                    p.record.add_essential(line, true);
                });
            }
            ScanState::Fields => {
                if is_record {
                    self.finish_record()?;
                    self.state = ScanState::RecordStart;
                    return Ok(Step::Reprocess);
                } else if is_field {
                    self.flush_field()?;
                    let title = line[seps.field.len()..].trim().to_string();
                    if title.is_empty() {
                        self.fault("field without a title")?;
                        self.title = Some(RECOVERED_FIELD.to_string());
                    } else {
                        self.title = Some(title);
                    }
                } else {
                    if self.title.is_none() {
                        self.fault("value without a field title")?;
                        self.title = Some(RECOVERED_FIELD.to_string());
                    }
                    if self.value_lines > 0 {
                        self.value.push('\n');
                    }
                    self.value.push_str(line);
                    self.value_lines += 1;
                }
            }
        }
        Ok(Step::Next)
    }

    fn with_current(&mut self, f: impl FnOnce(&mut PartialRecord)) {
        if let Some(partial) = self.current.as_mut() {
            f(partial);
        }
    }

    fn begin_record(&mut self, name: &str) -> Result<()> {
        let name = name.trim();
        let name = if name.is_empty() {
            self.fault("record without a name")?;
            RECOVERED_ACCOUNT
        } else {
            name
        };
        self.current = Some(PartialRecord {
            record: AccountRecord::new(name),
            saw_labels: false,
            saw_essentials: false,
        });
        Ok(())
    }

    /// A new record started where labels or essentials were expected. The
    /// partial record is kept without fields.
    fn interrupted(&mut self) -> Result<()> {
        self.fault("record ends before its labels and essentials")?;
        if let Some(partial) = self.current.take() {
            self.records.push(partial.record);
        }
        self.state = ScanState::RecordStart;
        Ok(())
    }

    fn flush_field(&mut self) -> Result<()> {
        let title = self.title.take();
        let lines = self.value_lines;
        self.value_lines = 0;
        if let Some(title) = title {
            if lines > 0 {
                if let Some(partial) = self.current.as_mut() {
                    partial.record.add_field(&title, &self.value);
                }
            } else {
                self.value.zeroize();
                self.fault(&format!("field '{}' has no value", title))?;
                warn!(line = self.line_no, field = %title, "Dropping field without a value");
            }
        }
        self.value.zeroize();
        Ok(())
    }

    fn finish_record(&mut self) -> Result<()> {
        self.flush_field()?;
        if let Some(partial) = self.current.take() {
            if !(partial.saw_labels && partial.saw_essentials) {
                self.fault(&format!(
                    "record '{}' is incomplete",
                    partial.record.account_name()
                ))?;
            }
            self.records.push(partial.record);
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Decoded> {
        match self.state {
            ScanState::Header => {
                return Err(CsmError::Format(
                    "missing or unsupported format header".to_string(),
                ))
            }
            ScanState::RecordStart => {}
            _ => self.finish_record()?,
        }
        debug!(records = self.records.len(), status = ?self.status, "Decoded plain text blob");
        Ok(Decoded {
            records: std::mem::take(&mut self.records),
            status: self.status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StatusCode;

    fn codec() -> PlainTextCodec {
        PlainTextCodec::default()
    }

    fn login() -> AccountRecord {
        let mut rec = AccountRecord::new("Login");
        rec.add_field("User", "alice");
        rec.add_field("Pass", "x");
        rec.add_essential("Pass", false);
        rec
    }

    fn card() -> AccountRecord {
        let mut rec = AccountRecord::new("Card");
        rec.add_field("Number", "4111");
        rec.add_label("finance");
        rec
    }

    fn assert_same(a: &AccountRecord, b: &AccountRecord) {
        assert_eq!(a.account_name(), b.account_name());
        assert_eq!(a.fields(), b.fields());
        assert_eq!(a.labels(), b.labels());
        assert_eq!(a.essentials(), b.essentials());
    }

    #[test]
    fn encodes_documented_layout() {
        let enc = codec().encode(&[login()], false).unwrap();
        let expected = "---->>CSM_PLAIN_TEXT_FORMATTER Version 1.0\n\
                        ---->>Login\n\
                        @@LABELS\n\
                        @@ESSENTIALS\n\
                        Pass\n\
                        @@User\n\
                        alice\n\
                        @@Pass\n\
                        x\n";
        assert_eq!(enc.text.as_str(), expected);
        assert_eq!(enc.status, Status::Ok);
    }

    #[test]
    fn two_records_round_trip_strictly() {
        let records = vec![login(), card()];
        let enc = codec().encode(&records, false).unwrap();
        let dec = codec().decode(&enc.text, false).unwrap();
        assert_eq!(dec.status, Status::Ok);
        assert_eq!(dec.records.len(), 2);
        assert_same(&dec.records[0], &records[0]);
        assert_same(&dec.records[1], &records[1]);
        assert_eq!(dec.records[0].account_id(), 0);
        assert!(!dec.records[0].is_locked());
    }

    #[test]
    fn multi_line_and_empty_values_round_trip() {
        let mut rec = AccountRecord::new("Notes");
        rec.add_field("Body", "line one\nline two\n");
        rec.add_field("Empty", "");
        rec.add_field("Tail", "end");
        let enc = codec().encode(std::slice::from_ref(&rec), false).unwrap();
        let dec = codec().decode(&enc.text, false).unwrap();
        assert_same(&dec.records[0], &rec);
    }

    #[test]
    fn empty_list_is_header_only() {
        let enc = codec().encode(&[], false).unwrap();
        assert_eq!(enc.text.as_str(), format!("{}\n", HEADER));
        let dec = codec().decode(&enc.text, false).unwrap();
        assert!(dec.records.is_empty());
        assert_eq!(dec.status, Status::Ok);
    }

    #[test]
    fn wrong_header_fails_in_both_modes() {
        let text = "CSM Version 2\n---->>Login\n@@LABELS\n@@ESSENTIALS\n";
        for brute in [false, true] {
            let err = codec().decode(text, brute).unwrap_err();
            assert_eq!(err.code(), StatusCode::Error);
        }
        assert!(codec().decode("", true).is_err());
    }

    #[test]
    fn missing_essentials_marker() {
        let text = format!("{}\n---->>Login\n@@LABELS\nweb\n@@User\nalice\n", HEADER);
        assert!(codec().decode(&text, false).is_err());

        let dec = codec().decode(&text, true).unwrap();
        assert_eq!(dec.status, Status::Warning);
        assert_eq!(dec.records.len(), 1);
        let rec = &dec.records[0];
        assert!(rec.essentials().is_empty());
        assert_eq!(rec.labels(), &["web".to_string()]);
        assert_eq!(rec.field("User"), Some("alice"));
    }

    #[test]
    fn missing_labels_marker() {
        let text = format!("{}\n---->>Login\n@@ESSENTIALS\nUser\n@@User\nalice\n", HEADER);
        assert!(codec().decode(&text, false).is_err());

        let dec = codec().decode(&text, true).unwrap();
        assert_eq!(dec.status, Status::Warning);
        let rec = &dec.records[0];
        assert!(rec.labels().is_empty());
        assert_eq!(rec.essentials(), &["User".to_string()]);
        assert_eq!(rec.field("User"), Some("alice"));
    }

    #[test]
    fn missing_both_markers_goes_straight_to_fields() {
        let text = format!("{}\n---->>Login\n@@User\nalice\n", HEADER);
        let dec = codec().decode(&text, true).unwrap();
        assert_eq!(dec.status, Status::Warning);
        assert_eq!(dec.records[0].field("User"), Some("alice"));
    }

    #[test]
    fn new_record_inside_labels() {
        let text = format!(
            "{}\n---->>Broken\n@@LABELS\nx\n---->>Card\n@@LABELS\n@@ESSENTIALS\n@@Number\n4111\n",
            HEADER
        );
        assert!(codec().decode(&text, false).is_err());

        let dec = codec().decode(&text, true).unwrap();
        assert_eq!(dec.status, Status::Warning);
        assert_eq!(dec.records.len(), 2);
        assert_eq!(dec.records[0].account_name(), "Broken");
        assert_eq!(dec.records[0].num_fields(), 0);
        assert_eq!(dec.records[1].field("Number"), Some("4111"));
    }

    #[test]
    fn record_with_no_fields_is_complete() {
        let text = format!(
            "{}\n---->>A\n@@LABELS\n@@ESSENTIALS\n---->>B\n@@LABELS\n@@ESSENTIALS\n",
            HEADER
        );
        let dec = codec().decode(&text, false).unwrap();
        assert_eq!(dec.status, Status::Ok);
        assert_eq!(dec.records.len(), 2);
    }

    #[test]
    fn plain_lines_after_essentials_marker_are_essentials() {
        let text = format!(
            "{}\n---->>Login\n@@LABELS\n@@ESSENTIALS\nUser\n@@User\nalice\n",
            HEADER
        );
        let dec = codec().decode(&text, false).unwrap();
        assert_eq!(dec.status, Status::Ok);
        assert_eq!(dec.records[0].essentials(), &["User".to_string()]);
        assert_eq!(dec.records[0].field("User"), Some("alice"));
    }

    #[test]
    fn multi_line_value_after_missing_markers() {
        let text = format!("{}\n---->>Login\n@@User\nalice\nbob\n", HEADER);
        let dec = codec().decode(&text, true).unwrap();
        assert_eq!(dec.status, Status::Warning);
        assert_eq!(dec.records[0].field("User"), Some("alice\nbob"));
    }

    #[test]
    fn value_without_title_is_recovered() {
        let text = format!("{}\n---->>Login\nsecret\n", HEADER);
        assert!(codec().decode(&text, false).is_err());

        let dec = codec().decode(&text, true).unwrap();
        assert_eq!(dec.status, Status::Warning);
        assert_eq!(dec.records[0].field(RECOVERED_FIELD), Some("secret"));
    }

    #[test]
    fn empty_record_name_is_recovered() {
        let text = format!("{}\n---->>  \n@@LABELS\n@@ESSENTIALS\n", HEADER);
        assert!(codec().decode(&text, false).is_err());
        let dec = codec().decode(&text, true).unwrap();
        assert_eq!(dec.records[0].account_name(), RECOVERED_ACCOUNT);
    }

    #[test]
    fn incomplete_last_record() {
        let text = format!("{}\n---->>Login\n", HEADER);
        assert!(codec().decode(&text, false).is_err());
        let dec = codec().decode(&text, true).unwrap();
        assert_eq!(dec.status, Status::Warning);
        assert_eq!(dec.records.len(), 1);
        assert_eq!(dec.records[0].account_name(), "Login");
    }

    #[test]
    fn text_before_first_record() {
        let text = format!("{}\njunk\n---->>A\n@@LABELS\n@@ESSENTIALS\n", HEADER);
        assert!(codec().decode(&text, false).is_err());
        let dec = codec().decode(&text, true).unwrap();
        assert_eq!(dec.status, Status::Warning);
        assert_eq!(dec.records.len(), 1);
    }

    #[test]
    fn field_title_without_value_is_dropped() {
        let text = format!(
            "{}\n---->>A\n@@LABELS\n@@ESSENTIALS\n@@Ghost\n@@User\nbob\n",
            HEADER
        );
        assert!(codec().decode(&text, false).is_err());

        let dec = codec().decode(&text, true).unwrap();
        assert_eq!(dec.status, Status::Warning);
        assert_eq!(dec.records[0].field_names(), vec!["User"]);
    }

    #[test]
    fn trailing_field_title_without_value() {
        let text = format!("{}\n---->>A\n@@LABELS\n@@ESSENTIALS\n@@User\nbob\n@@Ghost\n", HEADER);
        assert!(codec().decode(&text, false).is_err());

        let dec = codec().decode(&text, true).unwrap();
        assert_eq!(dec.status, Status::Warning);
        assert_eq!(dec.records[0].field_names(), vec!["User"]);
    }

    #[test]
    fn crlf_header_is_accepted() {
        let text = format!("{}\r\n---->>A\r\n@@LABELS\r\n@@ESSENTIALS\r\n", HEADER);
        let dec = codec().decode(&text, false).unwrap();
        assert_eq!(dec.records[0].account_name(), "A");
    }

    #[test]
    fn header_with_trailing_spaces_is_rejected() {
        let text = format!("{}  \n---->>A\n@@LABELS\n@@ESSENTIALS\n", HEADER);
        for brute in [false, true] {
            assert!(codec().decode(&text, brute).is_err());
        }
        let text = format!("{}\r\r\n---->>A\n@@LABELS\n@@ESSENTIALS\n", HEADER);
        assert!(codec().decode(&text, true).is_err());
    }

    #[test]
    fn markers_with_trailing_spaces_are_not_markers() {
        let text = format!("{}\n---->>A\n@@LABELS \n@@ESSENTIALS\n", HEADER);
        assert!(codec().decode(&text, false).is_err());

        let text = format!("{}\n---->>A\n@@LABELS\n@@ESSENTIALS\t\n@@User\nbob\n", HEADER);
        assert!(codec().decode(&text, false).is_err());
        let dec = codec().decode(&text, true).unwrap();
        assert_eq!(dec.status, Status::Warning);
        assert!(dec.records[0].labels().is_empty());
        assert_eq!(dec.records[0].field_names(), vec!["User"]);
    }

    #[test]
    fn record_after_essentials_marker_ends_a_field_less_record() {
        for essentials in ["", "Pass\n"] {
            let text = format!(
                "{}\n---->>Cut\n@@LABELS\nweb\n@@ESSENTIALS\n{}---->>Card\n@@LABELS\n@@ESSENTIALS\n@@Number\n4111\n",
                HEADER, essentials
            );
            for brute in [false, true] {
                let dec = codec().decode(&text, brute).unwrap();
                assert_eq!(dec.status, Status::Ok);
                assert_eq!(dec.records.len(), 2);
                assert_eq!(dec.records[0].account_name(), "Cut");
                assert_eq!(dec.records[0].num_fields(), 0);
                assert_eq!(dec.records[0].labels(), &["web".to_string()]);
                assert_eq!(dec.records[1].field("Number"), Some("4111"));
            }
        }
    }

    #[test]
    fn field_less_record_round_trips_between_others() {
        let mut bare = AccountRecord::new("Bare");
        bare.add_label("web");
        let records = vec![login(), bare, card()];
        let enc = codec().encode(&records, false).unwrap();
        assert!(enc.text.contains("---->>Bare\n@@LABELS\nweb\n@@ESSENTIALS\n---->>Card\n"));
        let dec = codec().decode(&enc.text, false).unwrap();
        assert_eq!(dec.status, Status::Ok);
        for (back, orig) in dec.records.iter().zip(&records) {
            assert_same(back, orig);
        }
    }

    #[test]
    fn record_where_labels_marker_was_expected() {
        let text = format!(
            "{}\n---->>Cut\n---->>Card\n@@LABELS\n@@ESSENTIALS\n@@Number\n4111\n",
            HEADER
        );
        assert!(codec().decode(&text, false).is_err());

        let dec = codec().decode(&text, true).unwrap();
        assert_eq!(dec.status, Status::Warning);
        assert_eq!(dec.records.len(), 2);
        assert_eq!(dec.records[0].account_name(), "Cut");
        assert_eq!(dec.records[0].num_fields(), 0);
        assert_eq!(dec.records[1].field("Number"), Some("4111"));
    }

    #[test]
    fn empty_account_name_is_not_encoded_strictly() {
        let mut rec = AccountRecord::new("");
        rec.add_field("User", "alice");
        assert!(codec().encode(std::slice::from_ref(&rec), false).is_err());

        let enc = codec().encode(std::slice::from_ref(&rec), true).unwrap();
        assert_eq!(enc.status, Status::Warning);
        let dec = codec().decode(&enc.text, false).unwrap();
        assert_eq!(dec.records[0].account_name(), RECOVERED_ACCOUNT);
        assert_eq!(dec.records[0].field("User"), Some("alice"));
    }

    #[test]
    fn strict_encode_rejects_separator_prefixes() {
        let mut rec = AccountRecord::new("Login");
        rec.add_field("Pass", "@@sneaky");
        assert!(codec().encode(std::slice::from_ref(&rec), false).is_err());

        let mut rec = AccountRecord::new("Login");
        rec.add_label("---->>label");
        assert!(codec().encode(std::slice::from_ref(&rec), false).is_err());
    }

    #[test]
    fn brute_encode_strips_prefixes() {
        let mut rec = AccountRecord::new("Login");
        rec.add_label("@@work");
        rec.add_field("@@Pass", "ok\n---->>@@sneaky");
        let enc = codec().encode(std::slice::from_ref(&rec), true).unwrap();
        assert_eq!(enc.status, Status::Warning);

        let dec = codec().decode(&enc.text, false).unwrap();
        let back = &dec.records[0];
        assert_eq!(back.labels(), &["work".to_string()]);
        assert_eq!(back.field("Pass"), Some("ok\nsneaky"));
    }

    #[test]
    fn newlines_in_single_line_elements() {
        let mut rec = AccountRecord::new("Login");
        rec.add_label("two\nlines");
        assert!(codec().encode(std::slice::from_ref(&rec), false).is_err());

        let enc = codec().encode(std::slice::from_ref(&rec), true).unwrap();
        assert_eq!(enc.status, Status::Warning);
        let dec = codec().decode(&enc.text, false).unwrap();
        assert_eq!(dec.records[0].labels(), &["two lines".to_string()]);
    }

    #[test]
    fn unrepairable_title_fails_even_in_brute_mode() {
        let mut rec = AccountRecord::new("Login");
        rec.add_field("@@", "v");
        assert!(codec().encode(std::slice::from_ref(&rec), true).is_err());
    }

    #[test]
    fn custom_separators() {
        let seps = Separators {
            record: "##".to_string(),
            field: "%%".to_string(),
        };
        let codec = PlainTextCodec::new("t", seps).unwrap();
        let enc = codec.encode(&[login()], false).unwrap();
        assert!(enc.text.contains("##Login\n%%LABELS\n"));
        let dec = codec.decode(&enc.text, false).unwrap();
        assert_same(&dec.records[0], &login());
    }

    #[test]
    fn invalid_separators_are_rejected() {
        let same = Separators {
            record: "@@".to_string(),
            field: "@@".to_string(),
        };
        assert!(PlainTextCodec::new("t", same).is_err());
        let empty = Separators {
            record: String::new(),
            field: "@@".to_string(),
        };
        assert!(PlainTextCodec::new("t", empty).is_err());
        let nested = Separators {
            record: "@@@".to_string(),
            field: "@@".to_string(),
        };
        assert!(PlainTextCodec::new("t", nested).is_err());
        let nested = Separators {
            record: "##".to_string(),
            field: "##>".to_string(),
        };
        assert!(PlainTextCodec::new("t", nested).is_err());
    }

    #[test]
    fn encode_buffer_never_grows() {
        let records = vec![login(), card()];
        let codec = codec();
        let capacity = codec.encoded_capacity(&records);
        let enc = codec.encode(&records, false).unwrap();
        assert!(enc.text.len() <= capacity);
    }
}
