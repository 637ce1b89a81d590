use crate::commands::{CmdMessage, CmdResult};
use crate::error::{CsmError, Result};
use crate::locator::SourceLocator;
use crate::service::MultiSourceService;

/// Creates an empty source and makes it the default one.
pub fn run(
    svc: &mut MultiSourceService,
    locator: SourceLocator,
    key: Option<&str>,
) -> Result<CmdResult> {
    if svc.source_exists(&locator)? {
        return Err(CsmError::Source(format!("source {} already exists", locator)));
    }

    svc.new_source(locator.clone(), None, key)?;
    svc.store_source(&locator)?;

    let mut result = CmdResult::default().with_sources(vec![locator.full()]);
    result.add_message(CmdMessage::success(format!("Created source {}", locator)));
    Ok(result)
}
