//! `sheaf reconcile`: merge two drifting manifests into one.
//!
//! The conflict report goes to stderr; the canonical manifest goes to stdout
//! or to `--write`.

use sheaf_config::{
    Conflict, ReconcilePolicy, Reconciliation, Resolution, load_value, reconcile, validate_schema,
};

use crate::cli::ReconcileArgs;
use crate::error::{Result, ResultExt};
use crate::ui;

/// Execute the reconcile command.
pub async fn execute(args: ReconcileArgs) -> Result<()> {
    let primary = load_value(&args.primary)?;
    let secondary = load_value(&args.secondary)?;

    let policy = args
        .drop
        .iter()
        .fold(ReconcilePolicy::prefer(args.prefer.into()), |policy, path| {
            policy.dropping(path.as_str())
        });
    let result = reconcile(&primary, &secondary, &policy);

    print_report(&result, &args);

    let config = result.config()?;
    validate_schema(&config)?;

    let manifest = result.to_toml_string()?;
    match &args.write {
        Some(path) => {
            std::fs::write(path, &manifest).with_path(path)?;
            ui::success(&format!("Wrote canonical manifest to {}", path.display()));
        }
        None => print!("{manifest}"),
    }
    Ok(())
}

fn print_report(result: &Reconciliation, args: &ReconcileArgs) {
    if result.is_clean() {
        ui::success(&format!(
            "{} and {} agree",
            args.primary.display(),
            args.secondary.display()
        ));
        return;
    }

    ui::info(&format!(
        "{} conflict(s) between {} and {}",
        result.conflicts.len(),
        args.primary.display(),
        args.secondary.display()
    ));
    for conflict in &result.conflicts {
        let line = format_conflict(conflict);
        match conflict.resolution {
            Resolution::Dropped => ui::warning(&line),
            _ => eprintln!("  {line}"),
        }
    }
}

/// One report line: `path: primary -> secondary => resolution`.
pub(crate) fn format_conflict(conflict: &Conflict) -> String {
    let show = |value: &Option<serde_json::Value>| match value {
        Some(value) => value.to_string(),
        None => "(unset)".to_string(),
    };
    format!(
        "{}: {} | {} => {}",
        conflict.path,
        show(&conflict.primary),
        show(&conflict.secondary),
        conflict.resolution
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn conflict_line_shows_both_sides() {
        let conflict = Conflict {
            path: "output.public_path".to_string(),
            primary: Some(json!("../")),
            secondary: None,
            resolution: Resolution::KeptOnlyInPrimary,
        };
        assert_eq!(
            format_conflict(&conflict),
            r#"output.public_path: "../" | (unset) => kept (primary only)"#
        );
    }
}
