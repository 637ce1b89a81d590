use crate::commands::{CmdMessage, CmdResult, RecordEdit};
use crate::error::Result;
use crate::service::MultiSourceService;

/// Edits a copy of record `id` and hands it back to the source owning it.
/// The record gets a new id.
pub fn run(svc: &mut MultiSourceService, id: u64, edit: &RecordEdit) -> Result<CmdResult> {
    svc.ensure_loaded()?;

    let mut result = CmdResult::default();
    if edit.is_empty() {
        result.add_message(CmdMessage::info("Nothing to update"));
        return Ok(result);
    }

    let mut copy = svc.record_copy(id)?;
    edit.apply(&mut copy, &mut result.messages);
    let new_id = svc.add(copy)?;

    result.add_message(CmdMessage::success(format!(
        "Updated account {} (now id {})",
        id, new_id
    )));
    Ok(result.with_affected_ids(vec![new_id]))
}
