use std::fmt;

use serde::{Deserialize, Serialize};

/// Build mode
///
/// Every stage that can minify consults the mode: extracted stylesheets,
/// generated pages and bundle comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Unminified output with per-module comments (default)
    #[default]
    Development,
    /// Minified stylesheets and pages
    Production,
}

impl Mode {
    pub fn is_production(self) -> bool {
        matches!(self, Mode::Production)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Development => "development",
            Mode::Production => "production",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
