use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::engine::NormalizeOptions;

/// Sentra configuration (loaded from .sentra.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SentraConfig {
    #[serde(default)]
    pub normalize: NormalizeConfig,

    #[serde(default)]
    pub correlate: CorrelateConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizeConfig {
    /// Merge redundant static findings
    #[serde(default = "default_true")]
    pub merge_static: bool,

    /// Attach runtime evidence to static findings
    #[serde(default = "default_true")]
    pub correlate_dynamic: bool,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        NormalizeConfig {
            merge_static: true,
            correlate_dynamic: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorrelateConfig {
    /// Extra path fragments treated as non-application traceback frames
    #[serde(default)]
    pub noise_paths: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl SentraConfig {
    /// Try to load .sentra.toml from the given directory or its parents
    pub fn load(start: &Path) -> Option<Self> {
        let config_path = find_config_file(start)?;
        debug!("Found config: {}", config_path.display());

        match std::fs::read_to_string(&config_path) {
            Ok(content) => match toml::from_str::<SentraConfig>(&content) {
                Ok(config) => {
                    info!("Loaded config from {}", config_path.display());
                    Some(config)
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}", config_path.display(), e);
                    None
                }
            },
            Err(e) => {
                debug!("Could not read {}: {}", config_path.display(), e);
                None
            }
        }
    }

    pub fn to_options(&self) -> NormalizeOptions {
        NormalizeOptions {
            merge_static: self.normalize.merge_static,
            correlate_dynamic: self.normalize.correlate_dynamic,
            noise_paths: self.correlate.noise_paths.clone(),
        }
    }
}

/// Walk up from the start path to find .sentra.toml
fn find_config_file(start: &Path) -> Option<std::path::PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        let config = current.join(".sentra.toml");
        if config.exists() {
            return Some(config);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Create a default .sentra.toml in the current directory
pub fn init_config() -> Result<()> {
    let config_path = std::env::current_dir()?.join(".sentra.toml");

    if config_path.exists() {
        println!("⚠️  .sentra.toml already exists in this directory");
        return Ok(());
    }

    let default_config = r#"# Sentra report normalization configuration

[normalize]
# Merge redundant static findings reported by different tools
merge_static = true

# Attach dynamic (runtime) evidence to matching static findings
correlate_dynamic = true

[correlate]
# Extra path fragments to skip when picking the application frame
# from a traceback (library and test paths are skipped by default)
# noise_paths = ["generated/", "migrations/"]
"#;

    std::fs::write(&config_path, default_config)?;
    println!("✅ Created .sentra.toml");
    println!("   Edit it to customize normalization settings.");

    Ok(())
}
