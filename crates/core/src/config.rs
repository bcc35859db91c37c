//! Typed configuration for a single indexing session. Loaded from a TOML
//! file, then overlaid with `JARSCOPE_*` environment variables — the same
//! two-stage load the base spec describes at contract level (base spec §4.6).

use crate::error::{CoreError, Result};
use jarscope_api::VersionStrategy;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawConfig {
    maven_repo: Option<PathBuf>,
    gradle_repo: Option<PathBuf>,
    included_packages: Vec<String>,
    decompiler_path: Option<PathBuf>,
    version_strategy: Option<String>,
    store_path: Option<PathBuf>,
    javap_tool: Option<PathBuf>,
}

/// Fully resolved configuration the rest of the crate operates on.
#[derive(Debug, Clone)]
pub struct Config {
    pub maven_repo: PathBuf,
    pub gradle_repo: PathBuf,
    pub included_packages: Vec<String>,
    pub decompiler_path: Option<PathBuf>,
    pub version_strategy: VersionStrategy,
    pub store_path: PathBuf,
    pub javap_tool: PathBuf,
}

impl Config {
    /// Built-in defaults, matching a stock local Maven/Gradle install.
    pub fn defaults() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            maven_repo: home.join(".m2/repository"),
            gradle_repo: home.join(".gradle/caches/modules-2/files-2.1"),
            included_packages: Vec::new(),
            decompiler_path: None,
            version_strategy: VersionStrategy::default(),
            store_path: home.join(".jarscope/store"),
            javap_tool: PathBuf::from("javap"),
        }
    }

    /// Load a config file, falling back to defaults for anything unset,
    /// then apply the `JARSCOPE_*` environment overlay.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::defaults();

        if let Some(path) = path {
            let content = std::fs::read_to_string(path)?;
            let raw: RawConfig = toml::from_str(&content)
                .map_err(|e| CoreError::Configuration(format!("{}: {e}", path.display())))?;
            config.apply_raw(raw)?;
        }

        config.apply_env()?;
        Ok(config)
    }

    fn apply_raw(&mut self, raw: RawConfig) -> Result<()> {
        if let Some(v) = raw.maven_repo {
            self.maven_repo = v;
        }
        if let Some(v) = raw.gradle_repo {
            self.gradle_repo = v;
        }
        if !raw.included_packages.is_empty() {
            self.included_packages = raw.included_packages;
        }
        if let Some(v) = raw.decompiler_path {
            self.decompiler_path = Some(v);
        }
        if let Some(v) = raw.version_strategy {
            self.version_strategy = VersionStrategy::from_str(&v)
                .map_err(|e| CoreError::Configuration(e.to_string()))?;
        }
        if let Some(v) = raw.store_path {
            self.store_path = v;
        }
        if let Some(v) = raw.javap_tool {
            self.javap_tool = v;
        }
        Ok(())
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(v) = std::env::var("JARSCOPE_MAVEN_REPO") {
            self.maven_repo = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("JARSCOPE_GRADLE_REPO") {
            self.gradle_repo = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("JARSCOPE_INCLUDED_PACKAGES") {
            self.included_packages = v.split(',').map(str::to_string).collect();
        }
        if let Ok(v) = std::env::var("JARSCOPE_DECOMPILER_PATH") {
            self.decompiler_path = Some(PathBuf::from(v));
        }
        if let Ok(v) = std::env::var("JARSCOPE_VERSION_STRATEGY") {
            self.version_strategy =
                VersionStrategy::from_str(&v).map_err(|e| CoreError::Configuration(e.to_string()))?;
        }
        if let Ok(v) = std::env::var("JARSCOPE_STORE_PATH") {
            self.store_path = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("JARSCOPE_JAVAP_TOOL") {
            self.javap_tool = PathBuf::from(v);
        }
        Ok(())
    }

    /// The normalized include-prefix list, ready for scanner/query use.
    pub fn normalized_prefixes(&self) -> Vec<String> {
        jarscope_api::naming::normalize_prefixes(self.included_packages.iter())
    }
}
