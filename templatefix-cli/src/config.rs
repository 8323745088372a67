use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::MigrateError;

/// Main configuration structure for a migration run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Directory that relative target paths resolve against
    #[serde(default = "default_root")]
    pub root: PathBuf,

    #[serde(default)]
    pub names: TemplateNames,

    /// Files and the functions to migrate in each, in processing order
    #[serde(default = "default_targets")]
    pub targets: Vec<BatchTarget>,
}

/// Identifiers the rules look for and emit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateNames {
    /// Destructured field holding the image list
    #[serde(default = "default_image_field")]
    pub image_field: String,

    /// Destructured field holding the image captions
    #[serde(default = "default_descriptions_field")]
    pub descriptions_field: String,

    /// Local that always holds a caption per image
    #[serde(default = "default_descriptions_alias")]
    pub descriptions_alias: String,

    /// Callback parameter the unmigrated templates use for each entry
    #[serde(default = "default_placeholder_var")]
    pub placeholder_var: String,

    /// Callback parameter each entry is bound to after migration
    #[serde(default = "default_url_var")]
    pub url_var: String,

    /// Index name introduced when a callback has none
    #[serde(default = "default_index_var")]
    pub index_var: String,

    /// Helper that resolved a placeholder query to an image address
    #[serde(default = "default_fetch_fn")]
    pub fetch_fn: String,

    /// Placeholder image address; the item index is appended
    #[serde(default = "default_fallback_base")]
    pub fallback_base: String,

    /// Prefix of the generated captions ("Item 1", "Item 2", ...)
    #[serde(default = "default_label_prefix")]
    pub label_prefix: String,
}

/// One file of the batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchTarget {
    pub file: PathBuf,
    pub functions: Vec<String>,
}

impl BatchTarget {
    pub fn new(file: impl Into<PathBuf>, functions: &[&str]) -> Self {
        Self {
            file: file.into(),
            functions: functions.iter().map(|f| f.to_string()).collect(),
        }
    }
}

// Default value functions
fn default_root() -> PathBuf {
    PathBuf::from("app/lib/templates")
}

fn default_image_field() -> String {
    "pics".to_string()
}

fn default_descriptions_field() -> String {
    "picDescriptions".to_string()
}

fn default_descriptions_alias() -> String {
    "descriptions".to_string()
}

fn default_placeholder_var() -> String {
    "query".to_string()
}

fn default_url_var() -> String {
    "url".to_string()
}

fn default_index_var() -> String {
    "i".to_string()
}

fn default_fetch_fn() -> String {
    "getPexelsImage".to_string()
}

fn default_fallback_base() -> String {
    "https://picsum.photos/900/900?random=".to_string()
}

fn default_label_prefix() -> String {
    "Item".to_string()
}

fn default_targets() -> Vec<BatchTarget> {
    vec![
        BatchTarget::new(
            "additional-templates.ts",
            &[
                "generateSalonLuxuryLayout",
                "generateSalonChicLayout",
                "generateCafeModernLayout",
                "generateCafeMinimalLayout",
            ],
        ),
        BatchTarget::new(
            "advanced-templates.ts",
            &["generateGymBoldLayout", "generatePortfolioGridLayout"],
        ),
        BatchTarget::new(
            "default-variations.ts",
            &[
                "generateDefaultCreativeLayout",
                "generateDefaultProfessionalLayout",
                "generateDefaultBoldLayout",
            ],
        ),
        BatchTarget::new("premium-professional.ts", &["generatePremiumBusinessLayout"]),
        BatchTarget::new(
            "unique-templates.ts",
            &[
                "generateRestaurantFineDiningLayout",
                "generateBakerySweetLayout",
                "generateYogaZenLayout",
                "generatePhotographyProLayout",
                "generateRealEstateLuxuryLayout",
            ],
        ),
        BatchTarget::new(
            "unique-templates-part2.ts",
            &[
                "generateTravelAdventureLayout",
                "generateLawFirmLayout",
                "generateSpaWellnessLayout",
                "generateTechStartupLayout",
            ],
        ),
    ]
}

impl Default for TemplateNames {
    fn default() -> Self {
        Self {
            image_field: default_image_field(),
            descriptions_field: default_descriptions_field(),
            descriptions_alias: default_descriptions_alias(),
            placeholder_var: default_placeholder_var(),
            url_var: default_url_var(),
            index_var: default_index_var(),
            fetch_fn: default_fetch_fn(),
            fallback_base: default_fallback_base(),
            label_prefix: default_label_prefix(),
        }
    }
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            names: TemplateNames::default(),
            targets: default_targets(),
        }
    }
}

impl MigrationConfig {
    /// Load configuration
    ///
    /// **Lookup order (first hit wins):**
    /// 1. `explicit` (from `--config`)
    /// 2. `./templatefix.toml`
    /// 3. `~/.config/templatefix/config.toml`
    /// 4. Built-in defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let config = if let Some(path) = explicit {
            tracing::info!("Loading config from: {}", path.display());
            Self::load_from_file(path)?
        } else if Self::project_config_path().exists() {
            let path = Self::project_config_path();
            tracing::info!("Loading project config from: {}", path.display());
            Self::load_from_file(&path)?
        } else if let Some(path) = Self::global_config_path().filter(|p| p.exists()) {
            tracing::info!("Loading global config from: {}", path.display());
            Self::load_from_file(&path)?
        } else {
            tracing::debug!("No config file found, using built-in targets");
            Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    /// Load config from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn validate(&self) -> Result<(), MigrateError> {
        let names = &self.names;
        let required = [
            ("image_field", &names.image_field),
            ("descriptions_field", &names.descriptions_field),
            ("descriptions_alias", &names.descriptions_alias),
            ("placeholder_var", &names.placeholder_var),
            ("url_var", &names.url_var),
            ("index_var", &names.index_var),
            ("fetch_fn", &names.fetch_fn),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(MigrateError::ConfigError(format!("names.{} must not be empty", key)));
            }
        }

        if names.image_field == names.descriptions_field {
            return Err(MigrateError::ConfigError(
                "names.image_field and names.descriptions_field must differ".to_string(),
            ));
        }

        for target in &self.targets {
            if target.functions.is_empty() {
                return Err(MigrateError::ConfigError(format!(
                    "target {} lists no functions",
                    target.file.display()
                )));
            }
        }

        Ok(())
    }

    /// Resolve a target path against the configured root
    pub fn resolve(&self, target: &BatchTarget) -> PathBuf {
        if target.file.is_absolute() {
            target.file.clone()
        } else {
            self.root.join(&target.file)
        }
    }

    fn project_config_path() -> PathBuf {
        PathBuf::from("templatefix.toml")
    }

    /// Get the global config path (~/.config/templatefix/config.toml)
    fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config").join("templatefix").join("config.toml"))
    }
}
