use crate::commands::CmdResult;
use crate::error::Result;
use crate::search::AccountSorting;
use crate::service::MultiSourceService;

pub fn run(svc: &mut MultiSourceService, sorting: AccountSorting) -> Result<CmdResult> {
    let all = svc.all_accounts(sorting)?;
    Ok(CmdResult::default().with_records(all))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AccountRecord;
    use crate::service::tools::fixtures::*;

    #[test]
    fn lists_sorted_by_name() {
        let mut svc = mem_router("mem://a.t");
        svc.add(AccountRecord::new("zulu")).unwrap();
        svc.add(AccountRecord::new("Alpha")).unwrap();

        let result = run(&mut svc, AccountSorting::ByName).unwrap();
        let names: Vec<&str> = result.records.iter().map(|r| r.account_name()).collect();
        assert_eq!(names, vec!["Alpha", "zulu"]);

        let result = run(&mut svc, AccountSorting::NoSort).unwrap();
        assert_eq!(result.records[0].account_name(), "zulu");
    }
}
