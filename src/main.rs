use clap::Parser;
use fri_verdict::{batch, cli, config, error, export, scanner, tables};
use batch::BatchOptions;
use cli::{Cli, Commands};
use config::Config;
use error::Result;
use export::OutputTarget;
use std::path::Path;
use tables::TableSources;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let rust_log = std::env::var("RUST_LOG").ok();
    tracing_subscriber::fmt()
        .with_env_filter(cli::log_filter(cli.verbose, rust_log.as_deref()))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load()?;

    match cli.command {
        Commands::Evaluate { input, output, tables: table_args, jobs, recursive, compact } => {
            println!("fri-verdict - evaluation\n");

            // 1. Inputs
            println!("[1/4] Scanning inputs...");
            let files = scanner::scan_inputs(&input, recursive)?;
            if files.is_empty() {
                return Err(error::FriError::NoInputFound(input.display().to_string()));
            }
            let (records, load_failures) = batch::load_inputs(&files);
            println!(
                "✔ {} record(s) in {} file(s){}\n",
                records.len(),
                files.len(),
                if load_failures.is_empty() {
                    String::new()
                } else {
                    format!(", {} unreadable", load_failures.len())
                }
            );

            // 2. Tables
            println!("[2/4] Loading tables...");
            let sources = TableSources::resolve(&table_args, &config);
            let aql = tables::load_aql(&sources)?;
            let catalog = tables::load_catalog(&sources)?;
            println!("✔ {} AQL rows, {} remark rules\n", aql.len(), catalog.len());

            // 3. Evaluate
            println!("[3/4] Evaluating...");
            let options = BatchOptions {
                jobs: jobs.unwrap_or(config.jobs),
                progress: records.len() > 1,
            };
            let report = batch::evaluate_all(&records, &aql, &catalog, options)?;
            let summary = report.summary(&load_failures);
            for outcome in &report.outcomes {
                let verdict = &outcome.evaluation.verdict;
                println!(
                    "  {}: {} (lab {}, automated {}){}",
                    outcome.label(),
                    verdict.verdict_type,
                    verdict.lab_result,
                    verdict.automated_result,
                    if verdict.requires_human_review { " - review" } else { "" }
                );
            }
            for failure in &summary.failures {
                println!("  ✘ {}: {}", failure.source.display(), failure.error);
            }
            println!();

            // 4. Write
            println!("[4/4] Writing results...");
            let output = output.unwrap_or_else(|| default_output(&input));
            let target = OutputTarget::resolve(&output, report.outcomes.len());
            let written = export::export_results(&report, &summary, &target, config.pretty && !compact)?;
            println!("✔ {} file(s) written to {}", written.len(), output.display());

            println!(
                "\n✅ {} evaluated, {} failed, {} to review",
                summary.evaluated,
                summary.failed,
                summary.requires_human_review.len()
            );
        }

        Commands::Tables { tables: table_args, level, lot_size } => {
            let sources = TableSources::resolve(&table_args, &config);
            let aql = tables::load_aql(&sources)?;

            println!("AQL table:");
            println!(
                "  General: {}",
                sources
                    .aql_general
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "built-in ISO 2859-1".into())
            );
            println!(
                "  Special: {}",
                sources
                    .aql_special
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "built-in ISO 2859-1".into())
            );
            println!("  Rows: {}", aql.len());
            let levels: Vec<String> = aql.levels().iter().map(|l| l.to_string()).collect();
            println!("  Levels: {}", levels.join(", "));

            match (level, lot_size) {
                (Some(level), Some(lot_size)) => match aql.find(level, lot_size) {
                    Some(plan) => {
                        println!("\nLevel {}, lot size {}:", level, lot_size);
                        if let Some(letter) = plan.code_letter {
                            println!("  Code letter: {}", letter);
                        }
                        println!("  Sample size: {}", plan.sample_size);
                        println!("  Critical (AQL 0): {}", accept(plan.critical));
                        println!("  Major (AQL 1.5): {}", accept(plan.major_1_5));
                        println!("  Major (AQL 2.5): {}", accept(plan.major_2_5));
                        println!("  Minor (AQL 4.0): {}", accept(plan.minor_4_0));
                    }
                    None => println!("\nNo plan for level {} and lot size {}", level, lot_size),
                },
                (None, None) => {}
                _ => println!("\n--level and --lot-size must be given together"),
            }
        }

        Commands::Config {
            show,
            set_aql_general,
            set_aql_special,
            set_nc_rules,
            set_catalog,
            set_jobs,
            clear_tables,
        } => {
            let mut config = config;
            let mut changed = false;

            if clear_tables {
                config.aql_general = None;
                config.aql_special = None;
                config.nc_rules = None;
                config.catalog = None;
                changed = true;
            }
            if let Some(path) = set_aql_general {
                config.aql_general = Some(path);
                changed = true;
            }
            if let Some(path) = set_aql_special {
                config.aql_special = Some(path);
                changed = true;
            }
            if let Some(path) = set_nc_rules {
                config.nc_rules = Some(path);
                changed = true;
            }
            if let Some(path) = set_catalog {
                config.catalog = Some(path);
                changed = true;
            }
            if let Some(jobs) = set_jobs {
                config.jobs = jobs;
                changed = true;
            }

            if changed {
                config.save()?;
                println!("✔ Settings saved: {}", Config::config_path()?.display());
            }

            if show || !changed {
                let path = |p: &Option<std::path::PathBuf>| {
                    p.as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "(not set)".into())
                };
                println!("Settings:");
                println!("  AQL general: {}", path(&config.aql_general));
                println!("  AQL special: {}", path(&config.aql_special));
                println!("  NC rules: {}", path(&config.nc_rules));
                println!("  Remark catalog: {}", path(&config.catalog));
                println!(
                    "  Jobs: {}",
                    if config.jobs == 0 { "auto".to_string() } else { config.jobs.to_string() }
                );
                println!("  Pretty JSON: {}", config.pretty);
            }
        }
    }

    Ok(())
}

/// The input folder, or the folder of the input file
fn default_output(input: &Path) -> std::path::PathBuf {
    if input.is_dir() {
        input.to_path_buf()
    } else {
        input
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf()
    }
}

fn accept(value: Option<u32>) -> String {
    value.map(|n| n.to_string()).unwrap_or_else(|| "-".into())
}
