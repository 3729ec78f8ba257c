use std::path::PathBuf;

use super::{BuildPlugin, Compilation, PluginPhase};
use crate::Result;

/// Empties the output root before the build is written
pub struct CleanPlugin {
    keep: Vec<PathBuf>,
}

impl CleanPlugin {
    pub fn new(keep: Vec<PathBuf>) -> Self {
        Self { keep }
    }
}

impl BuildPlugin for CleanPlugin {
    fn name(&self) -> &'static str {
        "clean"
    }

    fn phase(&self) -> PluginPhase {
        PluginPhase::Emit
    }

    fn process_assets(&self, compilation: &mut Compilation<'_>) -> Result<()> {
        compilation.reset = Some(self.keep.clone());
        Ok(())
    }
}
