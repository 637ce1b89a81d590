use crate::commands::{CmdMessage, CmdResult, RecordEdit};
use crate::error::{CsmError, Result};
use crate::model::AccountRecord;
use crate::service::MultiSourceService;

pub const TEMPLATE_DELIMITER: char = ',';

/// Adds a new record to the default source. `template` is a field list such
/// as `User*,Password*,Host`; edit fields fill in or extend it.
pub fn run(
    svc: &mut MultiSourceService,
    name: &str,
    template: Option<&str>,
    edit: &RecordEdit,
) -> Result<CmdResult> {
    if name.trim().is_empty() {
        return Err(CsmError::Api("account name cannot be empty".to_string()));
    }

    let mut record = match template {
        Some(spec) => AccountRecord::from_template(name, spec, TEMPLATE_DELIMITER),
        None => AccountRecord::new(name),
    };

    let mut result = CmdResult::default();
    edit.apply(&mut record, &mut result.messages);

    let id = svc.add(record)?;
    result.add_message(CmdMessage::success(format!(
        "Added account {} with id {}",
        name.trim(),
        id
    )));
    Ok(result.with_affected_ids(vec![id]))
}
