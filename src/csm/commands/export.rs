use crate::commands::{CmdMessage, CmdResult};
use crate::error::{CsmError, Result};
use crate::model::AccountRecord;
use crate::search::AccountSorting;
use crate::service::MultiSourceService;
use std::fs;
use std::io::Write;
use std::path::Path;

const FIXED_COLUMNS: [&str; 3] = ["Name", "Date", "Labels"];

/// Writes every account, sorted by name, to `out` as CSV. The file holds
/// secrets in clear text and is created readable by the owner only.
pub fn run(svc: &mut MultiSourceService, out: &Path) -> Result<CmdResult> {
    let records = svc.all_accounts(AccountSorting::ByName)?;
    let count = records.len();
    let csv = zeroize::Zeroizing::new(to_csv(&records));

    write_private(out, csv.as_bytes())?;

    let mut result = CmdResult::default().with_output_path(out.to_path_buf());
    result.add_message(CmdMessage::warning(
        "Exported file is not encrypted, delete it when done",
    ));
    result.add_message(CmdMessage::success(format!(
        "Exported {} accounts to {}",
        count,
        out.display()
    )));
    Ok(result)
}

fn write_private(path: &Path, data: &[u8]) -> Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path).map_err(CsmError::Io)?;
    file.write_all(data).map_err(CsmError::Io)?;
    Ok(())
}

/// Columns are `Name, Date, Labels` then every field title in first-seen
/// order. Labels are joined with `;`. Repeated titles in one record keep the
/// first value.
pub fn to_csv(records: &[&AccountRecord]) -> String {
    let mut titles: Vec<&str> = Vec::new();
    for record in records {
        for field in record.fields() {
            if !titles.contains(&field.title.as_str()) {
                titles.push(&field.title);
            }
        }
    }

    let mut out = String::new();
    let header: Vec<&str> = FIXED_COLUMNS.iter().copied().chain(titles.iter().copied()).collect();
    push_row(&mut out, header.iter().copied());

    for record in records {
        let labels = record.labels().join(";");
        let date = record.creation_time_str();
        let fixed = [record.account_name(), date.as_str(), labels.as_str()];
        let values = titles.iter().map(|t| record.field(t).unwrap_or(""));
        push_row(&mut out, fixed.into_iter().chain(values));
    }
    out
}

fn push_row<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>) {
    for (i, cell) in cells.enumerate() {
        if i > 0 {
            out.push(',');
        }
        push_cell(out, cell);
    }
    out.push('\n');
}

fn push_cell(out: &mut String, cell: &str) {
    if cell.contains([',', '"', '\n', '\r']) {
        out.push('"');
        out.push_str(&cell.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(cell);
    }
}
