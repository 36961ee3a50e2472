//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "mindloop";
const PROJECT_FILES: [&str; 2] = ["mindloop.toml", ".mindloop.toml"];
const ENV_PREFIX: &str = "MINDLOOP_";

/// Configuration loader that handles file discovery and merging
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    global: Option<PathBuf>,
    project: Option<PathBuf>,
    explicit: Option<PathBuf>,
    env_prefix: Option<String>,
}

impl ConfigLoader {
    /// Load configuration from all standard sources.
    pub fn load(config_path: Option<&PathBuf>) -> Result<FileConfig, Box<figment::Error>> {
        let mut loader = Self::default().with_env_prefix(ENV_PREFIX);
        if let Some(global) = Self::global_config_path() {
            loader = loader.with_global(global);
        }
        if let Some(project) = Self::project_config_path() {
            loader = loader.with_project(project);
        }
        if let Some(path) = config_path {
            loader = loader.with_explicit(path.clone());
        }
        loader.extract()
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    // ==================== Builder Methods ====================

    pub fn with_global(mut self, path: impl Into<PathBuf>) -> Self {
        self.global = Some(path.into());
        self
    }

    pub fn with_project(mut self, path: impl Into<PathBuf>) -> Self {
        self.project = Some(path.into());
        self
    }

    pub fn with_explicit(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit = Some(path.into());
        self
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// The merged figment, before extraction.
    pub fn figment(&self) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        for path in [&self.global, &self.project].into_iter().flatten() {
            if path.exists() {
                figment = figment.merge(Toml::file(path));
            }
        }
        // An explicit path must exist; figment reports it otherwise.
        if let Some(path) = &self.explicit {
            figment = figment.merge(Toml::file_exact(path));
        }
        if let Some(prefix) = &self.env_prefix {
            figment = figment.merge(Env::prefixed(prefix).split("__"));
        }
        figment
    }

    pub fn extract(&self) -> Result<FileConfig, Box<figment::Error>> {
        self.figment().extract().map_err(Box::new)
    }

    /// `$XDG_CONFIG_HOME/mindloop/config.toml`, falling back to
    /// `~/.config/mindloop/config.toml`.
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
    }

    /// The first project-level config file in the working directory.
    pub fn project_config_path() -> Option<PathBuf> {
        Self::project_config_in(Path::new("."))
    }

    fn project_config_in(dir: &Path) -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.exists())
    }

    /// Describe the config file locations being used (for `--show-config`).
    pub fn describe_sources(explicit: Option<&PathBuf>) -> Vec<String> {
        let mut lines = vec!["Configuration sources (later wins):".to_string()];
        lines.push("  [  ok ] Default: built-in defaults".to_string());

        if let Some(path) = Self::global_config_path() {
            let mark = if path.exists() { "FOUND" } else { "     " };
            lines.push(format!("  [{}] Global:  {}", mark, path.display()));
        }
        match Self::project_config_path() {
            Some(path) => lines.push(format!("  [FOUND] Project: {}", path.display())),
            None => lines.push(format!("  [     ] Project: ./{} or ./{}", PROJECT_FILES[0], PROJECT_FILES[1])),
        }
        if let Some(path) = explicit {
            let mark = if path.exists() { "FOUND" } else { "MISSING" };
            lines.push(format!("  [{}] Explicit: {}", mark, path.display()));
        }
        lines.push(format!("  [  env] {}<SECTION>__<KEY>", ENV_PREFIX));
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::load_defaults();
        assert!(config.registry.providers.is_empty());
        assert!(config.judgment.ethical);
    }

    #[test]
    fn test_global_config_path_names_app_dir() {
        if let Some(path) = ConfigLoader::global_config_path() {
            assert!(path.to_string_lossy().contains(APP_DIR));
        }
    }

    #[test]
    fn test_later_files_override_earlier_ones() {
        let dir = tempfile::tempdir().unwrap();
        let global = dir.path().join("global.toml");
        let project = dir.path().join("mindloop.toml");
        fs::write(&global, "[scheduler]\nmax_active_tasks = 3\nqueue_capacity = 7\n").unwrap();
        fs::write(&project, "[scheduler]\nmax_active_tasks = 4\n").unwrap();

        let config = ConfigLoader::default()
            .with_global(&global)
            .with_project(&project)
            .extract()
            .unwrap();
        assert_eq!(config.scheduler.max_active_tasks, 4);
        assert_eq!(config.scheduler.queue_capacity, 7);
        assert_eq!(config.scheduler.batch_concurrency, 5);
    }

    #[test]
    fn test_missing_optional_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigLoader::default()
            .with_global(dir.path().join("absent.toml"))
            .extract()
            .unwrap();
        assert_eq!(config, FileConfig::default());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = ConfigLoader::default()
            .with_explicit(dir.path().join("absent.toml"))
            .extract();
        assert!(result.is_err());
    }

    #[test]
    fn test_project_file_discovery_prefers_plain_name() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ConfigLoader::project_config_in(dir.path()).is_none());

        fs::write(dir.path().join(".mindloop.toml"), "").unwrap();
        fs::write(dir.path().join("mindloop.toml"), "").unwrap();
        let found = ConfigLoader::project_config_in(dir.path()).unwrap();
        assert!(found.ends_with("mindloop.toml"));
        assert!(!found.to_string_lossy().ends_with(".mindloop.toml"));
    }

    #[test]
    fn test_invalid_value_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[scheduler]\nmax_active_tasks = \"many\"\n").unwrap();
        let err = ConfigLoader::default().with_explicit(&path).extract().unwrap_err();
        assert!(err.to_string().contains("max_active_tasks"));
    }
}
