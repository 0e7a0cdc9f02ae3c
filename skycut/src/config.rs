use crate::error::{CutoutError, Result};
use serde::{Deserialize, Serialize};
use skycut_wcs::fit::SolverConfig;
use std::path::{Path, PathBuf};

/// How a batch of cutouts is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CutoutOptions {
    /// All cutouts in one multi-extension file, or one file per image.
    pub single_outfile: bool,
    /// Source header keywords after this one are not copied to the cutouts.
    pub drop_after: Option<String>,
    pub output_dir: PathBuf,
    pub parallel: bool,
    /// Value for cutout pixels outside the source image.
    #[serde(skip_serializing_if = "is_nan")]
    pub fill_value: f64,
}

fn is_nan(value: &f64) -> bool {
    value.is_nan()
}

impl Default for CutoutOptions {
    fn default() -> Self {
        Self {
            single_outfile: true,
            drop_after: None,
            output_dir: PathBuf::from("."),
            parallel: false,
            fill_value: f64::NAN,
        }
    }
}

impl CutoutOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_single_outfile(mut self, single: bool) -> Self {
        self.single_outfile = single;
        self
    }

    pub fn with_drop_after(mut self, keyword: impl Into<String>) -> Self {
        self.drop_after = Some(keyword.into());
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_fill_value(mut self, fill: f64) -> Self {
        self.fill_value = fill;
        self
    }
}

/// Contents of a `skycut` TOML configuration file.
///
/// ```toml
/// [cutout]
/// single_outfile = false
/// output_dir = "cutouts"
///
/// [solver]
/// max_iterations = 500
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cutout: CutoutOptions,
    pub solver: SolverConfig,
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| CutoutError::config(e.to_string()))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| CutoutError::config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| CutoutError::config(e.to_string()))
    }
}
