use crate::commands::{CmdMessage, CmdResult};
use crate::error::{Result, Status};
use crate::locator::SourceLocator;
use crate::service::MultiSourceService;

/// Loads a source and makes it the default one.
pub fn run(svc: &mut MultiSourceService, locator: &SourceLocator) -> Result<CmdResult> {
    let status = svc.load(locator)?;
    let count = svc.service(locator).map(|s| s.len()).unwrap_or(0);

    let mut result = CmdResult::default().with_sources(source_list(svc));
    if status == Status::Warning {
        result.add_message(CmdMessage::warning(format!(
            "Source {} was damaged, recovered what could be read",
            locator
        )));
    }
    result.add_message(CmdMessage::success(format!(
        "Opened {} ({} accounts)",
        locator, count
    )));
    Ok(result)
}

/// Managed sources, the default one marked with `*`.
pub fn source_list(svc: &MultiSourceService) -> Vec<String> {
    let default = svc.default_source();
    svc.managed_sources()
        .into_iter()
        .map(|l| {
            if Some(l) == default {
                format!("* {}", l.full())
            } else {
                format!("  {}", l.full())
            }
        })
        .collect()
}
