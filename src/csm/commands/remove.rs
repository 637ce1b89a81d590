use crate::commands::{CmdMessage, CmdResult};
use crate::error::{CsmError, Result};
use crate::service::MultiSourceService;

pub fn run(svc: &mut MultiSourceService, ids: &[u64]) -> Result<CmdResult> {
    svc.ensure_loaded()?;

    let mut result = CmdResult::default();
    let mut removed = Vec::new();
    for &id in ids {
        let name = svc
            .find_by_account_id(id)
            .map(|r| r.account_name().to_string());
        match svc.remove(id) {
            Ok(_) => {
                result.add_message(CmdMessage::success(format!(
                    "Removed {} ({})",
                    name.unwrap_or_default(),
                    id
                )));
                removed.push(id);
            }
            Err(CsmError::NotFound(_)) => {
                result.add_message(CmdMessage::error(format!("No account with id {}", id)));
            }
            Err(e) => return Err(e),
        }
    }
    Ok(result.with_affected_ids(removed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AccountRecord;
    use crate::search::AccountSorting;
    use crate::service::tools::fixtures::*;

    #[test]
    fn removes_and_reports_unknown() {
        let mut svc = mem_router("mem://a.t");
        let a = svc.add(AccountRecord::new("one")).unwrap();
        svc.add(AccountRecord::new("two")).unwrap();

        let result = run(&mut svc, &[a, 77]).unwrap();
        assert_eq!(result.affected_ids, vec![a]);
        assert_eq!(result.messages.len(), 2);
        assert_eq!(svc.all_accounts(AccountSorting::NoSort).unwrap().len(), 1);
    }
}
