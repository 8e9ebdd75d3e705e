//! Shared helper functions for CLI commands

use chrono::{Local, NaiveDate};
use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::time::Duration;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{Config, Project};
use crate::entities::rnc::RncRecord;
use crate::store::{LoadSource, LocalCache, RncRepository, SqliteStore};

/// Find the project from `--project` or the current directory
pub fn open_project(global: &GlobalOpts) -> Result<Project> {
    let project = match &global.project {
        Some(path) => Project::discover_from(path),
        None => Project::discover(),
    };
    project.map_err(|e| miette::miette!("{}", e))
}

/// Load layered configuration for a project
pub fn load_config(project: &Project) -> Result<Config> {
    Config::load(Some(project)).map_err(|e| miette::miette!("{}", e))
}

/// Project, config and repository in one step
pub fn open_workspace(global: &GlobalOpts) -> Result<(Project, Config, RncRepository)> {
    let project = open_project(global)?;
    let config = load_config(&project)?;
    let repo = open_repository(&project, &config);
    Ok((project, config, repo))
}

/// Build the repository. A store that cannot be opened degrades to the
/// local cache alone.
pub fn open_repository(project: &Project, config: &Config) -> RncRepository {
    let cache = LocalCache::new(project.cache_path());
    if !config.store.enabled {
        tracing::debug!("document store disabled by configuration");
        return RncRepository::local_only(cache);
    }

    let path = config.store_path(project);
    match SqliteStore::open(&path, &config.store.collection) {
        Ok(store) => {
            tracing::debug!(path = %path.display(), collection = %config.store.collection, "opened document store");
            let store = store.with_batch_size(config.store.batch_size);
            RncRepository::new(Some(Box::new(store)), cache)
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "document store unavailable, working offline");
            RncRepository::local_only(cache)
        }
    }
}

/// Load the working set, noting on stderr when it came from the cache
/// while a store is configured
pub fn load_records(repo: &RncRepository, global: &GlobalOpts) -> Result<Vec<RncRecord>> {
    let loaded = repo.load().map_err(|e| miette::miette!("{}", e))?;
    if loaded.source == LoadSource::Cache && repo.has_remote() && !global.quiet {
        eprintln!(
            "{} showing {} record(s) from the {}",
            style("!").yellow(),
            loaded.records.len(),
            loaded.source
        );
    }
    Ok(loaded.records)
}

/// Print `value` as JSON or YAML. Returns false for other formats.
pub fn print_structured<T: Serialize + ?Sized>(value: &T, format: OutputFormat) -> Result<bool> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
            Ok(true)
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(value).into_diagnostic()?);
            Ok(true)
        }
        _ => Ok(false),
    }
}

/// Watch polling interval from config
pub fn poll_interval(config: &Config) -> Duration {
    Duration::from_millis(config.store.poll_interval_ms)
}

/// Local calendar date
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Format an optional date as dd/mm/yyyy, "-" when absent
pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Truncate a string to `max_len` characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Escape a string for CSV output
///
/// Handles commas, quotes, and newlines according to RFC 4180.
pub fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hi", 2), "hi");
    }

    #[test]
    fn test_truncate_str_multibyte() {
        assert_eq!(truncate_str("Manutenção", 10), "Manutenção");
        assert_eq!(truncate_str("Manutenção elétrica", 9), "Manute...");
    }

    #[test]
    fn test_escape_csv() {
        assert_eq!(escape_csv("simple"), "simple");
        assert_eq!(escape_csv("with,comma"), "\"with,comma\"");
        assert_eq!(escape_csv("with\"quote"), "\"with\"\"quote\"");
        assert_eq!(escape_csv("with\nnewline"), "\"with\nnewline\"");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(NaiveDate::from_ymd_opt(2024, 1, 9)), "09/01/2024");
        assert_eq!(format_date(None), "-");
    }

    #[test]
    fn test_open_repository_disabled_store_is_local_only() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        let mut config = Config::default();
        config.store.enabled = false;
        let repo = open_repository(&project, &config);
        assert!(!repo.has_remote());
    }

    #[test]
    fn test_open_workspace_with_project_flag() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path()).unwrap();
        let global = GlobalOpts {
            format: OutputFormat::Auto,
            quiet: false,
            verbose: false,
            project: Some(tmp.path().to_path_buf()),
        };
        let (project, config, repo) = open_workspace(&global).unwrap();
        assert_eq!(project.root(), tmp.path().canonicalize().unwrap());
        assert!(config.store.enabled);
        assert!(repo.has_remote());
    }
}
