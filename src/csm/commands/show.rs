use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::service::MultiSourceService;

/// Full records for the given ids; unknown ids are reported, not fatal.
pub fn run(svc: &mut MultiSourceService, ids: &[u64]) -> Result<CmdResult> {
    svc.ensure_loaded()?;

    let mut result = CmdResult::default();
    for &id in ids {
        match svc.find_by_account_id(id) {
            Some(record) => result.records.push(record.clone()),
            None => result.add_message(CmdMessage::error(format!("No account with id {}", id))),
        }
    }
    Ok(result)
}
