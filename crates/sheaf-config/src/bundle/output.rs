use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::bundle::helpers::{default_chunk_filename, default_filename, default_output_path};

/// The single output root and the filename templates used inside it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputOptions {
    /// Output directory, relative to the project context
    #[serde(default = "default_output_path")]
    pub path: PathBuf,

    /// Template for entry bundles (`[name]`, `[id]`, `[contenthash]`)
    #[serde(default = "default_filename")]
    pub filename: String,

    /// Template for chunks created by dynamic imports
    #[serde(default = "default_chunk_filename")]
    pub chunk_filename: String,

    /// Prefix for asset references at runtime (e.g. `../`)
    ///
    /// When unset, references are computed relative to the referencing file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_path: Option<String>,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            filename: default_filename(),
            chunk_filename: default_chunk_filename(),
            public_path: None,
        }
    }
}
