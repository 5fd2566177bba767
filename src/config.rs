use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Process-wide configuration, loaded once and passed by reference into each
/// component. There are no ambient globals; every path a service touches
/// comes from here.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub ingestion: IngestionConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub test_data: TestDataConfig,
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
    #[serde(default)]
    pub logbook: LogbookConfig,
}

impl MonitorConfig {
    /// Load `config.toml` from the working root, falling back to defaults
    /// when the file does not exist.
    pub fn load(root: &Path) -> Result<Self> {
        Self::load_from(root, None)
    }

    /// Load from an explicit config file instead of `root/config.toml`.
    /// Relative paths in the file still resolve against the working root.
    pub fn load_from(root: &Path, config_path: Option<&Path>) -> Result<Self> {
        let path = match config_path {
            Some(p) => p.to_path_buf(),
            None => root.join("config.toml"),
        };
        let mut cfg = if path.exists() {
            let text = fs::read_to_string(&path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            toml::from_str::<MonitorConfig>(&text)
                .with_context(|| format!("parsing config file {}", path.display()))?
        } else if config_path.is_some() {
            // An explicitly named config file must exist.
            anyhow::bail!("config file {} not found", path.display());
        } else {
            tracing::info!(
                "No config file found at {}. Using MonitorConfig::default().",
                path.display()
            );
            MonitorConfig::default()
        };
        cfg.resolve_paths(root);
        Ok(cfg)
    }

    fn resolve_paths(&mut self, root: &Path) {
        self.storage.ledger_path = absolutize(root, &self.storage.ledger_path);
        self.ingestion.source_dir = absolutize(root, &self.ingestion.source_dir);
        self.ingestion.staging_dir = absolutize(root, &self.ingestion.staging_dir);
        self.model.staging_dir = absolutize(root, &self.model.staging_dir);
        self.model.deploy_dir = absolutize(root, &self.model.deploy_dir);
        self.test_data.dir = absolutize(root, &self.test_data.dir);
        self.diagnostics.lockfile_path = absolutize(root, &self.diagnostics.lockfile_path);
        self.logbook.path = absolutize(root, &self.logbook.path);
    }

    /// Canonical path of the merged dataset owned by ingestion.
    pub fn merged_dataset_path(&self) -> PathBuf {
        self.ingestion
            .staging_dir
            .join(&self.ingestion.merged_filename)
    }

    /// Ingestion lineage snapshot written alongside the merged dataset.
    pub fn ingestion_snapshot_path(&self) -> PathBuf {
        self.ingestion
            .staging_dir
            .join(&self.ingestion.snapshot_filename)
    }

    /// Freshly trained (not yet deployed) model artifact.
    pub fn staged_model_path(&self) -> PathBuf {
        self.model.staging_dir.join(&self.model.model_filename)
    }

    /// The single production model artifact.
    pub fn deployed_model_path(&self) -> PathBuf {
        self.model.deploy_dir.join(&self.model.model_filename)
    }

    pub fn score_snapshot_path(&self) -> PathBuf {
        self.model.staging_dir.join(&self.model.score_filename)
    }

    pub fn report_path(&self) -> PathBuf {
        self.model.staging_dir.join(&self.model.report_filename)
    }

    pub fn diagnostics_path(&self) -> PathBuf {
        self.model
            .staging_dir
            .join(&self.diagnostics.snapshot_filename)
    }

    pub fn test_dataset_path(&self) -> PathBuf {
        self.test_data.dir.join(&self.test_data.filename)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            ingestion: IngestionConfig::default(),
            model: ModelConfig::default(),
            test_data: TestDataConfig::default(),
            diagnostics: DiagnosticsConfig::default(),
            logbook: LogbookConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "StorageConfig::default_ledger_path")]
    pub ledger_path: PathBuf,
}

impl StorageConfig {
    fn default_ledger_path() -> PathBuf {
        PathBuf::from("db/monitoring.sqlite")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            ledger_path: Self::default_ledger_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngestionConfig {
    #[serde(default = "IngestionConfig::default_source_dir")]
    pub source_dir: PathBuf,
    #[serde(default = "IngestionConfig::default_staging_dir")]
    pub staging_dir: PathBuf,
    #[serde(default = "IngestionConfig::default_merged_filename")]
    pub merged_filename: String,
    #[serde(default = "IngestionConfig::default_snapshot_filename")]
    pub snapshot_filename: String,
}

impl IngestionConfig {
    fn default_source_dir() -> PathBuf {
        PathBuf::from("data/source")
    }

    fn default_staging_dir() -> PathBuf {
        PathBuf::from("data/ingested")
    }

    fn default_merged_filename() -> String {
        "final_data.csv".to_string()
    }

    fn default_snapshot_filename() -> String {
        "ingested_files.csv".to_string()
    }
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            source_dir: Self::default_source_dir(),
            staging_dir: Self::default_staging_dir(),
            merged_filename: Self::default_merged_filename(),
            snapshot_filename: Self::default_snapshot_filename(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "ModelConfig::default_staging_dir")]
    pub staging_dir: PathBuf,
    #[serde(default = "ModelConfig::default_deploy_dir")]
    pub deploy_dir: PathBuf,
    #[serde(default = "ModelConfig::default_model_filename")]
    pub model_filename: String,
    #[serde(default = "ModelConfig::default_score_filename")]
    pub score_filename: String,
    #[serde(default = "ModelConfig::default_report_filename")]
    pub report_filename: String,
    #[serde(default = "ModelConfig::default_version")]
    pub version: String,
    #[serde(default = "ModelConfig::default_features")]
    pub features: Vec<String>,
    #[serde(default = "ModelConfig::default_target")]
    pub target: String,
    #[serde(default = "ModelConfig::default_random_seed")]
    pub random_seed: u64,
    #[serde(default = "ModelConfig::default_test_size")]
    pub test_size: f64,
}

impl ModelConfig {
    fn default_staging_dir() -> PathBuf {
        PathBuf::from("models/development")
    }

    fn default_deploy_dir() -> PathBuf {
        PathBuf::from("models/production")
    }

    fn default_model_filename() -> String {
        "trained_model.json".to_string()
    }

    fn default_score_filename() -> String {
        "latest_score.csv".to_string()
    }

    fn default_report_filename() -> String {
        "confusion_matrix.json".to_string()
    }

    fn default_version() -> String {
        "0.1".to_string()
    }

    fn default_features() -> Vec<String> {
        vec![
            "lastmonth_activity".to_string(),
            "lastyear_activity".to_string(),
            "number_of_employees".to_string(),
        ]
    }

    fn default_target() -> String {
        "exited".to_string()
    }

    fn default_random_seed() -> u64 {
        0
    }

    fn default_test_size() -> f64 {
        0.2
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            staging_dir: Self::default_staging_dir(),
            deploy_dir: Self::default_deploy_dir(),
            model_filename: Self::default_model_filename(),
            score_filename: Self::default_score_filename(),
            report_filename: Self::default_report_filename(),
            version: Self::default_version(),
            features: Self::default_features(),
            target: Self::default_target(),
            random_seed: Self::default_random_seed(),
            test_size: Self::default_test_size(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TestDataConfig {
    #[serde(default = "TestDataConfig::default_dir")]
    pub dir: PathBuf,
    #[serde(default = "TestDataConfig::default_filename")]
    pub filename: String,
}

impl TestDataConfig {
    fn default_dir() -> PathBuf {
        PathBuf::from("data/test")
    }

    fn default_filename() -> String {
        "test_data.csv".to_string()
    }
}

impl Default for TestDataConfig {
    fn default() -> Self {
        Self {
            dir: Self::default_dir(),
            filename: Self::default_filename(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiagnosticsConfig {
    #[serde(default = "DiagnosticsConfig::default_snapshot_filename")]
    pub snapshot_filename: String,
    #[serde(default = "DiagnosticsConfig::default_lockfile_path")]
    pub lockfile_path: PathBuf,
    /// Expected package versions for the dependency audit, package -> version.
    #[serde(default)]
    pub expected_packages: BTreeMap<String, String>,
}

impl DiagnosticsConfig {
    fn default_snapshot_filename() -> String {
        "diagnostics.json".to_string()
    }

    fn default_lockfile_path() -> PathBuf {
        PathBuf::from("Cargo.lock")
    }
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            snapshot_filename: Self::default_snapshot_filename(),
            lockfile_path: Self::default_lockfile_path(),
            expected_packages: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogbookConfig {
    #[serde(default = "LogbookConfig::default_path")]
    pub path: PathBuf,
}

impl LogbookConfig {
    fn default_path() -> PathBuf {
        PathBuf::from("logbook/monitoring.jsonl")
    }
}

impl Default for LogbookConfig {
    fn default() -> Self {
        Self {
            path: Self::default_path(),
        }
    }
}

fn absolutize(root: &Path, value: &Path) -> PathBuf {
    if value.is_absolute() {
        value.to_path_buf()
    } else {
        root.join(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_resolve_against_root() {
        let mut cfg = MonitorConfig::default();
        cfg.resolve_paths(Path::new("/srv/monitor"));
        assert_eq!(
            cfg.storage.ledger_path,
            PathBuf::from("/srv/monitor/db/monitoring.sqlite")
        );
        assert_eq!(
            cfg.merged_dataset_path(),
            PathBuf::from("/srv/monitor/data/ingested/final_data.csv")
        );
        assert_eq!(
            cfg.deployed_model_path(),
            PathBuf::from("/srv/monitor/models/production/trained_model.json")
        );
    }

    #[test]
    fn explicit_config_file_overrides_root_default() {
        let dir = tempfile::tempdir().unwrap();
        let custom = dir.path().join("alt.toml");
        fs::write(&custom, "[model]\nversion = \"0.3\"\n").unwrap();

        let cfg = MonitorConfig::load_from(Path::new("/srv/monitor"), Some(&custom)).unwrap();
        assert_eq!(cfg.model.version, "0.3");
        // Relative paths still resolve against the working root.
        assert_eq!(
            cfg.storage.ledger_path,
            PathBuf::from("/srv/monitor/db/monitoring.sqlite")
        );

        let missing = dir.path().join("nope.toml");
        assert!(MonitorConfig::load_from(Path::new("/srv/monitor"), Some(&missing)).is_err());
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let text = r#"
            [model]
            version = "0.2"
            features = ["a", "b"]

            [diagnostics]
            [diagnostics.expected_packages]
            serde = "1.0"
        "#;
        let cfg: MonitorConfig = toml::from_str(text).unwrap();
        assert_eq!(cfg.model.version, "0.2");
        assert_eq!(cfg.model.target, "exited");
        assert_eq!(cfg.ingestion.merged_filename, "final_data.csv");
        assert_eq!(cfg.diagnostics.expected_packages["serde"], "1.0");
    }
}
