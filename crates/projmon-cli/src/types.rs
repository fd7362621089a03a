//! Command types shared between main and library

use std::path::PathBuf;

use clap::{Subcommand, ValueEnum};
use projmon_core::ChangeType;

/// How listing commands print their results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan one project, or every registered project
    Scan {
        /// Job identifier of the project to scan
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        job: Option<String>,

        /// Scan every registered project
        #[arg(long)]
        all: bool,
    },
    /// Poll one project in the background until interrupted
    Watch {
        /// Job identifier of the project to poll
        job: String,
    },
    /// List changes awaiting review for a project
    Changes {
        job: String,

        /// Include acknowledged and deleted events from the full ledger
        #[arg(long)]
        all: bool,
    },
    /// List every tracked file of a project with its review status
    Files { job: String },
    /// Acknowledge pending changes
    Ack {
        /// Job identifier; omit together with --everything
        #[arg(required_unless_present = "everything")]
        job: Option<String>,

        /// Relative path of one file; omit to acknowledge the whole job
        path: Option<String>,

        /// Only acknowledge events of this type
        #[arg(long = "type", value_parser = parse_change_type, requires = "path")]
        change_type: Option<ChangeType>,

        /// Acknowledge every pending change of every project
        #[arg(long, conflicts_with_all = ["job", "path"])]
        everything: bool,
    },
    /// List registered projects, unread first
    Projects,
    /// Show recent scans of a project
    History {
        job: String,

        /// Number of scans to show
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Collapse duplicate pending changes
    Maintain {
        /// Also acknowledge every pending change to reset the baseline
        #[arg(long)]
        reset: bool,
    },
    /// Show store row counts
    Stats,
}

/// Options shared by every command once the service is open
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub config: Option<PathBuf>,
    pub db: Option<PathBuf>,
    pub format: OutputFormat,
}

fn parse_change_type(value: &str) -> Result<ChangeType, String> {
    value.parse()
}
