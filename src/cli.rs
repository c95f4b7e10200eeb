use clap::{Parser, Subcommand};
use fri_verdict_common::AqlLevel;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fri-verdict")]
#[command(about = "Validate FRI inspection extractions and compare with the laboratory verdict", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Table overrides shared by the subcommands
#[derive(clap::Args, Clone, Debug, Default)]
pub struct TableArgs {
    /// AQL table for general levels (CSV/XLSX)
    #[arg(long)]
    pub aql_general: Option<PathBuf>,

    /// AQL table for special levels (CSV/XLSX)
    #[arg(long)]
    pub aql_special: Option<PathBuf>,

    /// Non-conformity rule table (CSV/XLSX)
    #[arg(long)]
    pub nc_rules: Option<PathBuf>,

    /// Extra remark rules (JSON)
    #[arg(long)]
    pub catalog: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Evaluate extraction JSON files (a file or a folder)
    Evaluate {
        /// Extraction JSON, raw model response, or a folder of them
        #[arg(required = true)]
        input: PathBuf,

        /// Output file (single input) or folder
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        tables: TableArgs,

        /// Worker threads (0 = one per core)
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Also scan sub-folders
        #[arg(short = 'r', long)]
        recursive: bool,

        /// Compact JSON output
        #[arg(long)]
        compact: bool,
    },

    /// Show the AQL plan used for a level and lot size
    Tables {
        #[command(flatten)]
        tables: TableArgs,

        /// Inspection level (I, II, III, S1-S4)
        #[arg(short, long)]
        level: Option<AqlLevel>,

        /// Lot size (presented quantity)
        #[arg(short = 'n', long)]
        lot_size: Option<u32>,
    },

    /// Show or edit the settings
    Config {
        /// Show the settings
        #[arg(long)]
        show: bool,

        #[arg(long)]
        set_aql_general: Option<PathBuf>,

        #[arg(long)]
        set_aql_special: Option<PathBuf>,

        #[arg(long)]
        set_nc_rules: Option<PathBuf>,

        #[arg(long)]
        set_catalog: Option<PathBuf>,

        #[arg(long)]
        set_jobs: Option<usize>,

        /// Forget every table path
        #[arg(long)]
        clear_tables: bool,
    },
}

/// Log filter: `--verbose` forces debug, otherwise `RUST_LOG` when it
/// parses, otherwise info
pub fn log_filter(verbose: bool, rust_log: Option<&str>) -> EnvFilter {
    if verbose {
        return EnvFilter::new("debug");
    }
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_evaluate() {
        let cli = Cli::parse_from([
            "fri-verdict",
            "evaluate",
            "reports/",
            "-o",
            "out/",
            "--nc-rules",
            "nc.xlsx",
            "-j",
            "4",
        ]);
        match cli.command {
            Commands::Evaluate { input, output, tables, jobs, recursive, compact } => {
                assert_eq!(input, PathBuf::from("reports/"));
                assert_eq!(output, Some(PathBuf::from("out/")));
                assert_eq!(tables.nc_rules, Some(PathBuf::from("nc.xlsx")));
                assert_eq!(jobs, Some(4));
                assert!(!recursive);
                assert!(!compact);
            }
            _ => panic!("expected evaluate"),
        }
    }

    #[test]
    fn test_parse_tables_level() {
        let cli = Cli::parse_from(["fri-verdict", "-v", "tables", "--level", "S3", "-n", "5000"]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Tables { level, lot_size, .. } => {
                assert_eq!(level, Some(AqlLevel::S3));
                assert_eq!(lot_size, Some(5000));
            }
            _ => panic!("expected tables"),
        }
    }

    #[test]
    fn test_log_filter_respects_rust_log() {
        use tracing_subscriber::filter::LevelFilter;

        assert_eq!(log_filter(false, Some("warn")).max_level_hint(), Some(LevelFilter::WARN));
        assert_eq!(log_filter(false, Some("trace")).max_level_hint(), Some(LevelFilter::TRACE));
        assert_eq!(log_filter(false, None).max_level_hint(), Some(LevelFilter::INFO));
        assert_eq!(log_filter(false, Some("")).max_level_hint(), Some(LevelFilter::INFO));
        assert_eq!(log_filter(true, Some("warn")).max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn test_unknown_level_rejected() {
        assert!(Cli::try_parse_from(["fri-verdict", "tables", "--level", "IV"]).is_err());
    }
}
