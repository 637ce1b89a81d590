use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use csm::search::{AccountSorting, SearchType};
use std::path::PathBuf;

/// Returns the version string, including git hash and commit date for non-release builds.
/// Format: "0.3.0" for releases, "0.3.0@abc1234 2024-01-15 14:30" for dev builds
fn get_version() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("GIT_HASH");
    const GIT_COMMIT_DATE: &str = env!("GIT_COMMIT_DATE");
    const IS_RELEASE: &str = env!("IS_RELEASE");

    use std::sync::OnceLock;
    static VERSION_STRING: OnceLock<String> = OnceLock::new();

    VERSION_STRING.get_or_init(|| {
        if IS_RELEASE == "true" || GIT_HASH.is_empty() {
            VERSION.to_string()
        } else {
            format!("{}@{} {}", VERSION, GIT_HASH, GIT_COMMIT_DATE)
        }
    })
}

#[derive(Parser, Debug)]
#[command(
    name = "csm",
    bin_name = "csm",
    version = get_version()
)]
#[command(about = "Local store for accounts and secrets", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Quick search across every source
    pub pattern: Option<String>,

    /// Source to use, as [type://]name[.format] (repeatable, last one is the default)
    #[arg(short = 's', long = "source", global = true, value_name = "LOCATOR")]
    pub sources: Vec<String>,

    /// Recover what can be read from damaged sources
    #[arg(short, long, global = true)]
    pub force: bool,

    /// Configuration directory
    #[arg(short, long, global = true, value_name = "DIR")]
    pub config: Option<PathBuf>,

    /// Key id used to encrypt sources
    #[arg(short, long, global = true)]
    pub key: Option<String>,

    /// User name
    #[arg(short, long, global = true)]
    pub user: Option<String>,

    /// Verbose output (repeat for more)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum SortArg {
    None,
    #[default]
    Name,
    Date,
}

impl From<SortArg> for AccountSorting {
    fn from(sort: SortArg) -> Self {
        match sort {
            SortArg::None => AccountSorting::NoSort,
            SortArg::Name => AccountSorting::ByName,
            SortArg::Date => AccountSorting::ByDate,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new, empty source
    #[command(display_order = 1)]
    Create {
        /// Locator of the new source
        locator: String,
    },

    /// Load a source and make it the default
    #[command(display_order = 2)]
    Open {
        locator: String,
    },

    /// List the sources in use
    #[command(display_order = 3)]
    Sources,

    /// Search accounts by name, label, field title or value
    #[command(alias = "f", display_order = 10)]
    Find {
        pattern: String,

        /// Search type: txt, exact or regex
        #[arg(short = 't', long = "type")]
        kind: Option<SearchType>,

        /// Only match account names
        #[arg(long, conflicts_with = "label")]
        name: bool,

        /// Only match labels
        #[arg(long)]
        label: bool,
    },

    /// List every account
    #[command(alias = "ls", display_order = 11)]
    List {
        #[arg(long, value_enum, default_value_t = SortArg::Name)]
        sort: SortArg,
    },

    /// Show accounts in full
    #[command(alias = "v", display_order = 12)]
    Show {
        /// Account ids, as printed by list and find
        #[arg(required = true, num_args = 1..)]
        ids: Vec<u64>,
    },

    /// Add an account to the default source
    #[command(alias = "a", display_order = 20)]
    Add {
        name: String,

        /// Start from a configured template (e.g. login)
        #[arg(short, long)]
        template: Option<String>,

        /// Field as Title=value (repeatable)
        #[arg(short = 'F', long = "field", value_name = "TITLE=VALUE")]
        fields: Vec<String>,

        /// Label (repeatable)
        #[arg(short, long = "label")]
        labels: Vec<String>,

        /// Essential field title (repeatable)
        #[arg(short, long = "essential")]
        essentials: Vec<String>,
    },

    /// Change an account
    #[command(alias = "e", display_order = 21)]
    Update {
        id: u64,

        /// New account name
        #[arg(short, long)]
        name: Option<String>,

        /// Field as Title=value (repeatable)
        #[arg(short = 'F', long = "field", value_name = "TITLE=VALUE")]
        fields: Vec<String>,

        /// Field title to remove (repeatable)
        #[arg(short, long = "remove-field")]
        remove_fields: Vec<String>,

        /// Label (repeatable)
        #[arg(short, long = "label")]
        labels: Vec<String>,

        /// Essential field title (repeatable)
        #[arg(short, long = "essential")]
        essentials: Vec<String>,
    },

    /// Remove accounts
    #[command(alias = "rm", display_order = 22)]
    Remove {
        #[arg(required = true, num_args = 1..)]
        ids: Vec<u64>,
    },

    /// List every label in use
    #[command(display_order = 30)]
    Labels,

    /// Export every account to a CSV file (not encrypted)
    #[command(display_order = 31)]
    Export {
        path: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn bare_pattern_is_quick_search() {
        let cli = parse(&["csm", "gmail"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.pattern.as_deref(), Some("gmail"));
    }

    #[test]
    fn subcommand_wins_over_pattern() {
        let cli = parse(&["csm", "list"]);
        assert!(matches!(cli.command, Some(Commands::List { sort: SortArg::Name })));
    }

    #[test]
    fn global_options_after_subcommand() {
        let cli = parse(&["csm", "find", "mail", "-s", "work.t", "-s", "home", "-f", "-vv"]);
        assert_eq!(cli.sources, vec!["work.t", "home"]);
        assert!(cli.force);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn add_collects_repeated_options() {
        let cli = parse(&[
            "csm", "add", "Gmail", "-t", "login", "-F", "User=alice", "-F", "Pass=x", "-l", "mail",
        ]);
        match cli.command {
            Some(Commands::Add {
                name,
                template,
                fields,
                labels,
                ..
            }) => {
                assert_eq!(name, "Gmail");
                assert_eq!(template.as_deref(), Some("login"));
                assert_eq!(fields, vec!["User=alice", "Pass=x"]);
                assert_eq!(labels, vec!["mail"]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn find_parses_search_type() {
        let cli = parse(&["csm", "find", "x", "--type", "exact", "--label"]);
        match cli.command {
            Some(Commands::Find { kind, label, .. }) => {
                assert_eq!(kind, Some(SearchType::Exact));
                assert!(label);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(Cli::try_parse_from(["csm", "find", "x", "--name", "--label"]).is_err());
    }
}
