//! Reference tables (AQL plans, remark rules) resolved from the command
//! line, the settings file and `FRI_VERDICT_AQL_DIR`, in that order.

use crate::cli::TableArgs;
use crate::config::Config;
use crate::error::{FriError, Result};
use fri_verdict_common::{AqlTable, RemarkCatalog};
use std::path::{Path, PathBuf};

/// Table paths after merging the command line over the settings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableSources {
    pub aql_general: Option<PathBuf>,
    pub aql_special: Option<PathBuf>,
    pub nc_rules: Option<PathBuf>,
    pub catalog: Option<PathBuf>,
}

impl TableSources {
    pub fn resolve(args: &TableArgs, config: &Config) -> Self {
        let (aql_general, aql_special) = config.aql_tables();
        Self {
            aql_general: args.aql_general.clone().or(aql_general),
            aql_special: args.aql_special.clone().or(aql_special),
            nc_rules: args.nc_rules.clone().or_else(|| config.nc_rules.clone()),
            catalog: args.catalog.clone().or_else(|| config.catalog.clone()),
        }
    }
}

/// The AQL table to evaluate with
///
/// Custom sheets take precedence. Levels none of them cover keep the
/// built-in ISO 2859-1 plans.
pub fn load_aql(sources: &TableSources) -> Result<AqlTable> {
    let mut custom = AqlTable::default();
    for path in [&sources.aql_general, &sources.aql_special].into_iter().flatten() {
        let table = AqlTable::from_path(path).map_err(|e| FriError::table(path, e))?;
        tracing::info!(path = %path.display(), rows = table.len(), "AQL table loaded");
        custom = custom.merge(table);
    }

    if custom.is_empty() {
        return Ok(AqlTable::standard());
    }

    Ok(with_standard_fallback(custom))
}

fn with_standard_fallback(custom: AqlTable) -> AqlTable {
    let covered = custom.levels();
    let fallback: Vec<_> = AqlTable::standard()
        .rows()
        .iter()
        .filter(|row| !covered.contains(&row.level))
        .cloned()
        .collect();

    if !fallback.is_empty() {
        tracing::debug!(
            covered = ?covered,
            "levels missing from the custom AQL tables use the built-in plans"
        );
    }
    custom.merge(AqlTable::new(fallback))
}

/// Remark rules: a user catalog, then the NC rule table, then the
/// built-in rules. The first matching rule wins, so earlier sources
/// take precedence.
pub fn load_catalog(sources: &TableSources) -> Result<RemarkCatalog> {
    let mut catalog = RemarkCatalog::default();

    if let Some(path) = &sources.catalog {
        catalog = catalog.merge(load_with(path, RemarkCatalog::from_file)?);
    }
    if let Some(path) = &sources.nc_rules {
        catalog = catalog.merge(load_with(path, RemarkCatalog::from_nc_rules_path)?);
    }

    Ok(catalog.merge(RemarkCatalog::builtin()))
}

fn load_with(
    path: &Path,
    load: impl Fn(&Path) -> fri_verdict_common::Result<RemarkCatalog>,
) -> Result<RemarkCatalog> {
    if !path.exists() {
        return Err(FriError::FileNotFound(path.display().to_string()));
    }
    let catalog = load(path).map_err(|e| FriError::table(path, e))?;
    tracing::info!(path = %path.display(), rules = catalog.len(), "remark rules loaded");
    Ok(catalog)
}
