use crate::commands::CmdResult;
use crate::error::Result;
use crate::service::MultiSourceService;

pub fn run(svc: &mut MultiSourceService) -> Result<CmdResult> {
    Ok(CmdResult::default().with_labels(svc.labels()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AccountRecord;
    use crate::service::tools::fixtures::*;

    #[test]
    fn union_across_sources() {
        let mut svc = mem_router("mem://a.t");
        let mut rec = AccountRecord::new("x");
        rec.add_labels(["work", "mail"]);
        svc.add(rec).unwrap();
        svc.new_source(loc("mem://b.t"), None, None).unwrap();
        let mut rec = AccountRecord::new("y");
        rec.add_label("mail");
        svc.add(rec).unwrap();

        let result = run(&mut svc).unwrap();
        assert_eq!(result.labels, vec!["mail", "work"]);
    }
}
