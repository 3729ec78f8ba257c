pub mod bundle;
pub mod config;
pub mod dev;
pub mod discovery;
pub mod error;
pub mod reconcile;
pub mod template;
pub mod validation;

// Re-export main types
pub use bundle::*;
pub use config::*;
pub use dev::*;
pub use error::*;

// Re-export discovery, validation and reconciliation
pub use discovery::{CONFIG_FILE_NAME, ConfigDiscovery, PACKAGE_JSON_FIELD, load_from, load_value};
pub use reconcile::{Conflict, Preference, ReconcilePolicy, Reconciliation, Resolution, reconcile};
pub use template::{TemplateVars, check_template, render_template};
pub use validation::{
    ConfigValidator, ConfigWarning, FsValidator, SchemaValidator, lint, validate_fs,
    validate_schema,
};
