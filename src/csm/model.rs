use crate::error::StatusCode;
use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;
use tracing::{error, warn};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Display form used for creation and modification times.
pub const DATE_FORMAT: &str = "%-d/%-m/%Y";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockStatus {
    #[default]
    Unlocked,
    Locked,
}

/// A titled value inside an account record. The value is scrubbed when the
/// field is dropped and never shows up in `Debug` output.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Field {
    pub title: String,
    pub value: String,
}

impl Field {
    pub fn new(title: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            value: value.into(),
        }
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("title", &self.title)
            .field("value", &"[REDACTED]")
            .finish()
    }
}

/// One set of credentials: a name, ordered fields, labels and the titles of
/// the fields that should always be displayed.
///
/// Records become [`LockStatus::Locked`] once a source service accepts them.
/// Every mutator on a locked record is rejected, logged and reported through
/// the returned [`StatusCode`]; reads are always allowed. Cloning yields an
/// unlocked copy that keeps the account id, which is how callers stage an
/// update to a stored record.
#[derive(Debug)]
pub struct AccountRecord {
    name: String,
    fields: Vec<Field>,
    labels: Vec<String>,
    essentials: Vec<String>,
    account_id: u64,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
    lock: LockStatus,
}

impl Default for AccountRecord {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            name: String::new(),
            fields: Vec::new(),
            labels: Vec::new(),
            essentials: Vec::new(),
            account_id: 0,
            created_at: now,
            modified_at: now,
            lock: LockStatus::Unlocked,
        }
    }
}

impl Clone for AccountRecord {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            fields: self.fields.clone(),
            labels: self.labels.clone(),
            essentials: self.essentials.clone(),
            account_id: self.account_id,
            created_at: self.created_at,
            modified_at: self.modified_at,
            lock: LockStatus::Unlocked,
        }
    }
}

impl AccountRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().trim().to_string(),
            ..Self::default()
        }
    }

    /// Builds a record from a field list such as `"User*,Password*,Host"`.
    /// Every field starts empty; a trailing `*` marks the title as essential.
    pub fn from_template(name: impl Into<String>, template: &str, delim: char) -> Self {
        let mut record = Self::new(name);
        for entry in template.split(delim) {
            let entry = entry.trim();
            let (title, essential) = match entry.strip_suffix('*') {
                Some(title) => (title.trim(), true),
                None => (entry, false),
            };
            if title.is_empty() {
                continue;
            }
            record.fields.push(Field::new(title, ""));
            if essential {
                record.essentials.push(title.to_string());
            }
        }
        record
    }

    fn check_unlocked(&self, operation: &str) -> bool {
        if self.lock == LockStatus::Locked {
            error!(
                account = %self.name,
                "Record is locked, refusing to {}; modify a copy instead",
                operation
            );
            return false;
        }
        true
    }

    // -- name ---------------------------------------------------------------

    pub fn account_name(&self) -> &str {
        &self.name
    }

    pub fn set_account_name(&mut self, name: &str) -> StatusCode {
        if !self.check_unlocked("rename") {
            return StatusCode::Error;
        }
        let name = name.trim();
        if name.is_empty() {
            error!("Account name cannot be empty");
            return StatusCode::Error;
        }
        self.name = name.to_string();
        StatusCode::Ok
    }

    // -- fields -------------------------------------------------------------

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.title.as_str()).collect()
    }

    /// Value of the first field with this title.
    pub fn field(&self, title: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.title == title)
            .map(|f| f.value.as_str())
    }

    pub fn has_field(&self, title: &str) -> bool {
        self.fields.iter().any(|f| f.title == title)
    }

    /// Appends a field. The title is trimmed, the value is kept verbatim.
    pub fn add_field(&mut self, title: &str, value: &str) -> StatusCode {
        if !self.check_unlocked("add a field") {
            return StatusCode::Error;
        }
        let title = title.trim();
        if title.is_empty() {
            warn!(account = %self.name, "Ignoring field without a title");
            return StatusCode::Warning;
        }
        self.fields.push(Field::new(title, value));
        StatusCode::Ok
    }

    /// Replaces the value of the first field with this title, appending the
    /// field when it does not exist yet.
    pub fn set_field(&mut self, title: &str, value: &str) -> StatusCode {
        if !self.check_unlocked("set a field") {
            return StatusCode::Error;
        }
        let key = title.trim();
        match self.fields.iter_mut().find(|f| f.title == key) {
            Some(field) => {
                field.value.zeroize();
                field.value = value.to_string();
                StatusCode::Ok
            }
            None => self.add_field(title, value),
        }
    }

    /// Removes every field with this title. Essentials naming it are kept.
    pub fn remove_field(&mut self, title: &str) -> StatusCode {
        if !self.check_unlocked("remove a field") {
            return StatusCode::Error;
        }
        let before = self.fields.len();
        self.fields.retain(|f| f.title != title);
        if self.fields.len() == before {
            warn!(account = %self.name, field = title, "No such field");
            return StatusCode::Warning;
        }
        StatusCode::Ok
    }

    pub fn clear_fields(&mut self) -> StatusCode {
        if !self.check_unlocked("clear fields") {
            return StatusCode::Error;
        }
        self.fields.clear();
        StatusCode::Ok
    }

    // -- labels -------------------------------------------------------------

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    pub fn add_label(&mut self, label: &str) -> StatusCode {
        if !self.check_unlocked("add a label") {
            return StatusCode::Error;
        }
        let label = label.trim();
        if label.is_empty() {
            return StatusCode::Warning;
        }
        self.labels.push(label.to_string());
        StatusCode::Ok
    }

    pub fn add_labels<I, S>(&mut self, labels: I) -> StatusCode
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        labels
            .into_iter()
            .map(|l| self.add_label(l.as_ref()))
            .max()
            .unwrap_or(StatusCode::Ok)
    }

    pub fn clear_labels(&mut self) -> StatusCode {
        if !self.check_unlocked("clear labels") {
            return StatusCode::Error;
        }
        self.labels.clear();
        StatusCode::Ok
    }

    // -- essentials ---------------------------------------------------------

    pub fn essentials(&self) -> &[String] {
        &self.essentials
    }

    pub fn has_essential(&self, title: &str) -> bool {
        self.essentials.iter().any(|e| e == title)
    }

    /// Marks a field title as essential. Unless `force` is set the field must
    /// already exist on the record.
    pub fn add_essential(&mut self, title: &str, force: bool) -> StatusCode {
        if !self.check_unlocked("add an essential") {
            return StatusCode::Error;
        }
        let title = title.trim();
        if title.is_empty() {
            return StatusCode::Warning;
        }
        if !force && !self.has_field(title) {
            error!(
                account = %self.name,
                field = title,
                "Essential must name an existing field"
            );
            return StatusCode::Error;
        }
        self.essentials.push(title.to_string());
        StatusCode::Ok
    }

    pub fn add_essentials<I, S>(&mut self, titles: I, force: bool) -> StatusCode
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        titles
            .into_iter()
            .map(|t| self.add_essential(t.as_ref(), force))
            .max()
            .unwrap_or(StatusCode::Ok)
    }

    pub fn clear_essentials(&mut self) -> StatusCode {
        if !self.check_unlocked("clear essentials") {
            return StatusCode::Error;
        }
        self.essentials.clear();
        StatusCode::Ok
    }

    /// Fields flagged as essential, in field order.
    pub fn essential_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| self.has_essential(&f.title))
    }

    // -- identity and lock --------------------------------------------------

    pub fn account_id(&self) -> u64 {
        self.account_id
    }

    /// Id 0 means "unassigned" and is rejected.
    pub fn set_account_id(&mut self, id: u64) -> StatusCode {
        if !self.check_unlocked("change the account id") {
            return StatusCode::Error;
        }
        if id == 0 {
            error!(account = %self.name, "Account id 0 is reserved");
            return StatusCode::Error;
        }
        self.account_id = id;
        StatusCode::Ok
    }

    pub fn lock_status(&self) -> LockStatus {
        self.lock
    }

    pub fn is_locked(&self) -> bool {
        self.lock == LockStatus::Locked
    }

    /// Stamps the id handed out by the registry and locks the record.
    pub(crate) fn accept(&mut self, id: u64) {
        self.account_id = id;
        self.lock = LockStatus::Locked;
    }

    // -- timestamps ---------------------------------------------------------

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn modified_at(&self) -> DateTime<Utc> {
        self.modified_at
    }

    pub fn creation_time_str(&self) -> String {
        self.created_at.format(DATE_FORMAT).to_string()
    }

    pub fn modification_time_str(&self) -> String {
        self.modified_at.format(DATE_FORMAT).to_string()
    }

    /// Accepts `d/m/y`, `d-m-y` or `m/y`; anything else means "now".
    pub fn set_creation_time(&mut self, date: &str) -> StatusCode {
        if !self.check_unlocked("change the creation time") {
            return StatusCode::Error;
        }
        self.created_at = parse_date(date).unwrap_or_else(Utc::now);
        StatusCode::Ok
    }

    pub fn set_modification_time(&mut self, date: &str) -> StatusCode {
        if !self.check_unlocked("change the modification time") {
            return StatusCode::Error;
        }
        self.modified_at = parse_date(date).unwrap_or_else(Utc::now);
        StatusCode::Ok
    }

    pub(crate) fn touch(&mut self) {
        self.modified_at = Utc::now();
    }
}

/// Parses `day/month/year`, `day-month-year` or `month/year`.
pub fn parse_date(input: &str) -> Option<DateTime<Utc>> {
    let parts: Vec<&str> = input.trim().split(['/', '-']).collect();
    let nums: Vec<u32> = parts
        .iter()
        .map(|p| p.trim().parse::<u32>())
        .collect::<std::result::Result<_, _>>()
        .ok()?;

    let (day, month, year) = match nums.as_slice() {
        [d, m, y] => (*d, *m, *y),
        [m, y] => (1, *m, *y),
        _ => return None,
    };

    let date = NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, day)?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc())
}
