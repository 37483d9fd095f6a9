use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::collapse::CollapsedSubmodels;
use crate::debounce::SEARCH_DEBOUNCE;
use crate::sort::{SortColumn, SortDirection, TreeSort};
use crate::source::{TreeScope, DEFAULT_DATASET_GLOB};
use crate::tree::ViewOptions;

const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Browse a product model tree as a searchable, sortable, collapsible table
#[derive(Parser, Debug)]
#[command(name = "modeltree")]
#[command(version)]
#[command(about = "Browse a product model tree as a searchable, sortable, collapsible table")]
pub struct Cli {
    /// Dataset JSON file, or a directory of dataset files
    pub path: Option<PathBuf>,

    /// Fetch the tree from a PIM instance at this base URL instead of a file
    #[arg(long = "url", conflicts_with = "path", requires = "technical_id")]
    pub url: Option<String>,

    /// Whether the technical id refers to a product model or a product
    #[arg(long = "scope", value_enum, default_value_t = TreeScope::Model)]
    pub scope: TreeScope,

    /// Technical id of the current product; fetched with --url and
    /// highlighted in the table
    #[arg(short = 't', long = "technical-id")]
    pub technical_id: Option<String>,

    /// File name pattern for datasets when PATH is a directory
    #[arg(long = "pattern", default_value = DEFAULT_DATASET_GLOB)]
    pub pattern: String,

    /// Base URL rows are opened under (defaults to --url)
    #[arg(long = "base-url")]
    pub base_url: Option<String>,

    /// File holding the per-tree view state
    #[arg(long = "state-file")]
    pub state_file: Option<PathBuf>,

    /// Keep view state in memory only
    #[arg(long = "no-persist")]
    pub no_persist: bool,

    /// Delay in milliseconds before a typed search is applied
    #[arg(long = "debounce-ms", default_value_t = SEARCH_DEBOUNCE.as_millis() as u64)]
    pub debounce_ms: u64,

    /// Do not reload when the dataset file changes
    #[arg(long = "no-watch")]
    pub no_watch: bool,

    /// Log file (default: modeltree_<date>.log in the temp directory)
    #[arg(long = "log-file")]
    pub log_file: Option<PathBuf>,

    /// Print the final rows to stdout instead of opening the table
    #[arg(short = 'p', long = "print")]
    pub print: bool,

    /// Initial search query
    #[arg(short = 'q', long = "query", default_value = "")]
    pub query: String,

    /// Initial sort column
    #[arg(short = 's', long = "sort", value_enum, default_value_t = SortColumn::Identifier)]
    pub sort: SortColumn,

    /// Sort descending
    #[arg(long = "desc")]
    pub desc: bool,

    /// Keep rows that do not match the query
    #[arg(short = 'a', long = "show-hidden")]
    pub show_hidden: bool,

    /// Collapse this submodel (repeatable)
    #[arg(short = 'c', long = "collapse")]
    pub collapse: Vec<String>,
}

/// Where rows come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Input {
    File(PathBuf),
    Directory { dir: PathBuf, pattern: String },
    Remote {
        base_url: String,
        scope: TreeScope,
        technical_id: String,
    },
}

/// Settings the rest of the program runs on, resolved from the CLI.
#[derive(Clone, Debug)]
pub struct Config {
    pub input: Input,
    pub highlight_technical_id: Option<String>,
    pub base_url: String,
    /// `None` keeps view state in memory.
    pub state_file: Option<PathBuf>,
    pub search_debounce: Duration,
    pub watch: bool,
    pub log_file: Option<PathBuf>,
    pub print: bool,
    pub initial_view: ViewOptions,
}

impl Cli {
    pub fn config(&self) -> anyhow::Result<Config> {
        let input = match (&self.url, &self.path) {
            (Some(url), _) => Input::Remote {
                base_url: url.clone(),
                scope: self.scope,
                technical_id: self.technical_id.clone().unwrap_or_default(),
            },
            (None, Some(path)) if path.is_dir() => Input::Directory {
                dir: path.clone(),
                pattern: self.pattern.clone(),
            },
            (None, Some(path)) => Input::File(path.clone()),
            (None, None) => anyhow::bail!("Provide a dataset PATH or --url"),
        };

        let base_url = self
            .base_url
            .clone()
            .or_else(|| self.url.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let state_file = if self.no_persist {
            None
        } else {
            Some(
                self.state_file
                    .clone()
                    .unwrap_or_else(|| std::env::temp_dir().join("modeltree-session.json")),
            )
        };

        Ok(Config {
            input,
            highlight_technical_id: self.technical_id.clone(),
            base_url,
            state_file,
            search_debounce: Duration::from_millis(self.debounce_ms),
            watch: !self.no_watch,
            log_file: self.log_file.clone(),
            print: self.print,
            initial_view: self.view_options(),
        })
    }

    fn view_options(&self) -> ViewOptions {
        let direction = if self.desc {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };
        ViewOptions {
            sort: TreeSort::new(self.sort, direction),
            query: self.query.clone(),
            show_hidden: self.show_hidden,
            collapsed: CollapsedSubmodels::from_ids(self.collapse.iter().cloned()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_input_with_view_flags() {
        let cli = Cli::parse_from([
            "modeltree",
            "rows.json",
            "--print",
            "-q",
            "red",
            "--sort",
            "variant",
            "--desc",
            "-c",
            "sub_a",
            "-c",
            "sub_b",
        ]);
        let config = cli.config().unwrap();
        assert_eq!(config.input, Input::File(PathBuf::from("rows.json")));
        assert!(config.print);
        assert_eq!(config.initial_view.query, "red");
        assert_eq!(
            config.initial_view.sort,
            TreeSort::new(SortColumn::Variant, SortDirection::Desc)
        );
        assert_eq!(config.initial_view.collapsed.ids(), ["sub_a", "sub_b"]);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.search_debounce, Duration::from_millis(300));
    }

    #[test]
    fn test_remote_input_defaults_base_url() {
        let cli = Cli::parse_from([
            "modeltree",
            "--url",
            "https://pim.example.com",
            "-t",
            "42",
            "--no-persist",
        ]);
        let config = cli.config().unwrap();
        assert_eq!(
            config.input,
            Input::Remote {
                base_url: "https://pim.example.com".to_string(),
                scope: TreeScope::Model,
                technical_id: "42".to_string(),
            }
        );
        assert_eq!(config.base_url, "https://pim.example.com");
        assert_eq!(config.highlight_technical_id.as_deref(), Some("42"));
        assert!(config.state_file.is_none());
    }

    #[test]
    fn test_directory_input() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::parse_from([std::ffi::OsStr::new("modeltree"), dir.path().as_os_str()]);
        let config = cli.config().unwrap();
        assert!(matches!(config.input, Input::Directory { .. }));
    }

    #[test]
    fn test_missing_input_is_an_error() {
        let cli = Cli::parse_from(["modeltree"]);
        assert!(cli.config().is_err());
    }

    #[test]
    fn test_url_requires_technical_id() {
        assert!(Cli::try_parse_from(["modeltree", "--url", "http://pim"]).is_err());
    }
}
