use crate::commands::CmdResult;
use crate::error::Result;
use crate::search::SearchType;
use crate::service::MultiSourceService;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FindScope {
    /// Name, labels, field titles and values.
    #[default]
    All,
    Name,
    Label,
}

pub fn run(
    svc: &mut MultiSourceService,
    pattern: &str,
    kind: SearchType,
    scope: FindScope,
) -> Result<CmdResult> {
    let found = match scope {
        FindScope::All => svc.find(pattern, kind)?,
        FindScope::Name => svc.find_by_account_name(pattern, kind)?,
        FindScope::Label => svc.find_by_label(pattern, kind)?,
    };
    Ok(CmdResult::default().with_records(found))
}
