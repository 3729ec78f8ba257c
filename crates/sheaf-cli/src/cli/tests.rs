#[cfg(test)]
mod tests {
    use crate::cli::{Cli, Command, ModeArg, PreferArg};
    use clap::Parser;
    use std::path::PathBuf;

    #[test]
    fn build_defaults() {
        let cli = Cli::try_parse_from(["sheaf", "build"]).unwrap();
        let Command::Build(args) = cli.command else {
            panic!("expected build");
        };
        assert!(args.config.config.is_none());
        assert!(args.mode.is_none());
        assert!(args.out_dir.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn build_with_overrides() {
        let cli = Cli::try_parse_from([
            "sheaf",
            "build",
            "--config",
            "sheaf.legacy.toml",
            "--mode",
            "production",
            "--profile",
            "ci",
            "--out-dir",
            "build",
        ])
        .unwrap();
        let Command::Build(args) = cli.command else {
            panic!("expected build");
        };
        assert_eq!(args.config.config, Some(PathBuf::from("sheaf.legacy.toml")));
        assert_eq!(args.mode, Some(ModeArg::Production));
        assert_eq!(args.config.profile.as_deref(), Some("ci"));
        assert_eq!(args.out_dir, Some(PathBuf::from("build")));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["sheaf", "check", "--warnings", "--verbose"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Check(ref args) if args.warnings));
    }

    #[test]
    fn verbose_conflicts_with_quiet() {
        assert!(Cli::try_parse_from(["sheaf", "-v", "-q", "build"]).is_err());
    }

    #[test]
    fn invalid_mode_is_rejected() {
        assert!(Cli::try_parse_from(["sheaf", "build", "--mode", "staging"]).is_err());
    }

    #[test]
    fn dev_args() {
        let cli = Cli::try_parse_from(["sheaf", "dev", "--port", "3000", "--hot"]).unwrap();
        let Command::Dev(args) = cli.command else {
            panic!("expected dev");
        };
        assert_eq!(args.port, Some(3000));
        assert!(args.hot);
        assert!(args.host.is_none());
    }

    #[test]
    fn reconcile_args() {
        let cli = Cli::try_parse_from([
            "sheaf",
            "reconcile",
            "sheaf.toml",
            "sheaf.legacy.toml",
            "--prefer",
            "secondary",
            "--drop",
            "dev_server",
            "--drop",
            "resolve",
            "--write",
            "sheaf.merged.toml",
        ])
        .unwrap();
        let Command::Reconcile(args) = cli.command else {
            panic!("expected reconcile");
        };
        assert_eq!(args.primary, PathBuf::from("sheaf.toml"));
        assert_eq!(args.secondary, PathBuf::from("sheaf.legacy.toml"));
        assert_eq!(args.prefer, PreferArg::Secondary);
        assert_eq!(args.drop, ["dev_server", "resolve"]);
        assert_eq!(args.write, Some(PathBuf::from("sheaf.merged.toml")));
    }

    #[test]
    fn reconcile_requires_two_manifests() {
        assert!(Cli::try_parse_from(["sheaf", "reconcile", "sheaf.toml"]).is_err());
    }
}
