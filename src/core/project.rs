//! Project discovery and structure

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the project metadata directory
pub const PROJECT_DIR: &str = ".sgq";

/// Local cache of the working record set
const CACHE_FILE: &str = "cache.json";

/// Default SQLite document store
const STORE_FILE: &str = "store.db";

const CONFIG_FILE: &str = "config.yaml";

/// Represents an SGQ project
#[derive(Debug, Clone)]
pub struct Project {
    /// Root directory of the project (parent of .sgq/)
    root: PathBuf,
}

impl Project {
    /// Find project root by walking up from the current directory
    pub fn discover() -> Result<Self, ProjectError> {
        let current =
            std::env::current_dir().map_err(|e| ProjectError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find project root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        loop {
            if current.join(PROJECT_DIR).is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(ProjectError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Create a new project at the given path
    pub fn init(path: &Path) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        if root.join(PROJECT_DIR).exists() {
            return Err(ProjectError::AlreadyExists(root));
        }

        Self::write_skeleton(root)
    }

    /// Initialize even if .sgq/ exists (rewrites the default config, keeps data)
    pub fn init_force(path: &Path) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        Self::write_skeleton(root)
    }

    fn write_skeleton(root: PathBuf) -> Result<Self, ProjectError> {
        let sgq_dir = root.join(PROJECT_DIR);
        std::fs::create_dir_all(&sgq_dir).map_err(|e| ProjectError::IoError(e.to_string()))?;

        std::fs::write(sgq_dir.join(CONFIG_FILE), Self::default_config())
            .map_err(|e| ProjectError::IoError(e.to_string()))?;
        std::fs::write(sgq_dir.join(".gitignore"), "cache.json\nstore.db*\n")
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        Ok(Self { root })
    }

    fn default_config() -> &'static str {
        r#"# SGQ project configuration

# Document store used for sync (SQLite file, relative to the project root)
store:
  # enabled: true
  # path: .sgq/store.db
  # collection: qpl_rncs
  # batch_size: 450
  # poll_interval_ms: 2000

# Default output format (auto, table, json, csv)
# default_format: auto
"#
    }

    /// Get the project root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .sgq metadata directory
    pub fn sgq_dir(&self) -> PathBuf {
        self.root.join(PROJECT_DIR)
    }

    pub fn config_path(&self) -> PathBuf {
        self.sgq_dir().join(CONFIG_FILE)
    }

    /// Path of the local JSON cache
    pub fn cache_path(&self) -> PathBuf {
        self.sgq_dir().join(CACHE_FILE)
    }

    /// Default path of the SQLite document store
    pub fn default_store_path(&self) -> PathBuf {
        self.sgq_dir().join(STORE_FILE)
    }

    /// Resolve a configured path against the project root
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

/// Errors that can occur during project operations
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("not an SGQ project (searched from {searched_from:?}). Run 'sgq init' to create one.")]
    NotFound { searched_from: PathBuf },

    #[error("SGQ project already exists at {0:?}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    IoError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_project_init_creates_structure() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();

        assert!(project.sgq_dir().is_dir());
        assert!(project.config_path().exists());
        assert!(project.sgq_dir().join(".gitignore").exists());
        assert!(!project.cache_path().exists());
        assert_eq!(project.default_store_path(), project.sgq_dir().join("store.db"));
    }

    #[test]
    fn test_project_init_fails_if_exists() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path()).unwrap();

        let err = Project::init(tmp.path()).unwrap_err();
        assert!(matches!(err, ProjectError::AlreadyExists(_)));
        assert!(Project::init_force(tmp.path()).is_ok());
    }

    #[test]
    fn test_project_discover_finds_sgq_dir() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path()).unwrap();

        let subdir = tmp.path().join("planilhas/2024");
        std::fs::create_dir_all(&subdir).unwrap();

        let project = Project::discover_from(&subdir).unwrap();
        assert_eq!(
            project.root().canonicalize().unwrap(),
            tmp.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_project_discover_fails_without_sgq_dir() {
        let tmp = tempdir().unwrap();
        let err = Project::discover_from(tmp.path()).unwrap_err();
        assert!(matches!(err, ProjectError::NotFound { .. }));
    }

    #[test]
    fn test_resolve_relative_paths() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        assert_eq!(
            project.resolve(Path::new("data/store.db")),
            project.root().join("data/store.db")
        );
        assert_eq!(project.resolve(Path::new("/tmp/x.db")), PathBuf::from("/tmp/x.db"));
    }
}
