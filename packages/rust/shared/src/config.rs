//! Application configuration for frontcheck.
//!
//! Project config lives at `./frontcheck.toml`, with a user-level fallback at
//! `~/.frontcheck/frontcheck.toml`. CLI flags override config file values,
//! which override defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FrontcheckError, Result};
use crate::types::Domain;

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "frontcheck.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".frontcheck";

// ---------------------------------------------------------------------------
// Config structs (matching frontcheck.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Where the domain files live.
    #[serde(default)]
    pub data: DataConfig,

    /// Schema catalog sources.
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Optional rule groups.
    #[serde(default)]
    pub checks: ChecksConfig,
}

/// `[data]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory the domain file paths are resolved against.
    #[serde(default = "default_data_root")]
    pub root: String,

    #[serde(default = "default_materials_file")]
    pub materials: String,

    #[serde(default = "default_contaminants_file")]
    pub contaminants: String,

    #[serde(default = "default_compounds_file")]
    pub compounds: String,

    #[serde(default = "default_settings_file")]
    pub settings: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            root: default_data_root(),
            materials: default_materials_file(),
            contaminants: default_contaminants_file(),
            compounds: default_compounds_file(),
            settings: default_settings_file(),
        }
    }
}

impl DataConfig {
    /// Relative file path configured for `domain`.
    pub fn file_for(&self, domain: Domain) -> &str {
        match domain {
            Domain::Materials => &self.materials,
            Domain::Contaminants => &self.contaminants,
            Domain::Compounds => &self.compounds,
            Domain::Settings => &self.settings,
        }
    }
}

fn default_data_root() -> String {
    "data".into()
}
fn default_materials_file() -> String {
    "materials/Materials.yaml".into()
}
fn default_contaminants_file() -> String {
    "contaminants/Contaminants.yaml".into()
}
fn default_compounds_file() -> String {
    "compounds/Compounds.yaml".into()
}
fn default_settings_file() -> String {
    "settings/Settings.yaml".into()
}

/// `[catalog]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Catalog files (YAML or JSON), merged in order. Empty means the built-in catalog.
    #[serde(default)]
    pub paths: Vec<String>,
}

/// `[checks]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChecksConfig {
    /// Run the machine-parameter checks on the settings domain.
    #[serde(default)]
    pub settings_data: bool,
}

// ---------------------------------------------------------------------------
// Validate config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime validation configuration, merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct ValidateConfig {
    /// Resolved path of each domain file.
    pub domain_files: BTreeMap<Domain, PathBuf>,
    /// Catalog files; empty selects the built-in catalog.
    pub catalog_paths: Vec<PathBuf>,
    /// Restrict record checks to one domain.
    pub only_domain: Option<Domain>,
    /// Run the settings machine-parameter checks.
    pub check_settings_data: bool,
}

impl ValidateConfig {
    /// Replace the data root, re-resolving every domain file under it.
    pub fn with_data_root(mut self, config: &DataConfig, root: &Path) -> Self {
        self.domain_files = resolve_domain_files(config, root);
        self
    }
}

impl From<&AppConfig> for ValidateConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            domain_files: resolve_domain_files(&config.data, Path::new(&config.data.root)),
            catalog_paths: config.catalog.paths.iter().map(PathBuf::from).collect(),
            only_domain: None,
            check_settings_data: config.checks.settings_data,
        }
    }
}

fn resolve_domain_files(config: &DataConfig, root: &Path) -> BTreeMap<Domain, PathBuf> {
    Domain::ALL
        .iter()
        .map(|d| (*d, root.join(config.file_for(*d))))
        .collect()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the user config directory (`~/.frontcheck/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| FrontcheckError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the user config file (`~/.frontcheck/frontcheck.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config.
///
/// Lookup order: `explicit` (must exist), `./frontcheck.toml`, the user
/// config file, then defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = explicit {
        return load_config_from(path);
    }

    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return load_config_from(&local);
    }

    match config_file_path() {
        Ok(path) if path.exists() => load_config_from(&path),
        _ => {
            tracing::debug!("config file not found, using defaults");
            Ok(AppConfig::default())
        }
    }
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        FrontcheckError::config(format!("failed to read {}: {e}", path.display()))
    })?;

    toml::from_str(&content).map_err(|e| {
        FrontcheckError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Write a default config file into `dir`. Returns the path to the created file.
pub fn init_config(dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).map_err(|e| FrontcheckError::io(dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    if path.exists() {
        return Err(FrontcheckError::config(format!(
            "{} already exists",
            path.display()
        )));
    }

    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| FrontcheckError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| FrontcheckError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("Materials.yaml"));
        assert!(toml_str.contains("settings_data"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.data.root, "data");
        assert!(parsed.catalog.paths.is_empty());
        assert!(!parsed.checks.settings_data);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[data]
root = "/srv/site/data"
settings = "Settings.yaml"

[catalog]
paths = ["schema/catalog.yaml", "schema/units.json"]
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.data.settings, "Settings.yaml");
        assert_eq!(config.data.materials, "materials/Materials.yaml");
        assert_eq!(config.catalog.paths.len(), 2);
    }

    #[test]
    fn validate_config_resolves_files_under_root() {
        let mut app = AppConfig::default();
        app.data.root = "/srv/data".into();
        app.checks.settings_data = true;

        let validate = ValidateConfig::from(&app);
        assert_eq!(
            validate.domain_files[&Domain::Contaminants],
            PathBuf::from("/srv/data/contaminants/Contaminants.yaml")
        );
        assert!(validate.check_settings_data);
        assert!(validate.only_domain.is_none());

        let moved = validate.with_data_root(&app.data, Path::new("fixtures"));
        assert_eq!(
            moved.domain_files[&Domain::Settings],
            PathBuf::from("fixtures/settings/Settings.yaml")
        );
    }

    #[test]
    fn missing_explicit_config_is_config_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = load_config(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn init_config_writes_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = init_config(dir.path()).expect("init");
        let loaded = load_config_from(&path).expect("load");
        assert_eq!(loaded.data.compounds, "compounds/Compounds.yaml");

        assert!(init_config(dir.path()).is_err());
    }
}
