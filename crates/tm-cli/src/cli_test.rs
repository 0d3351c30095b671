use super::*;
use clap::CommandFactory;

#[test]
fn verify_cli_args() {
    // Validates the entire command tree: short flag conflicts,
    // duplicate args, and other clap definition errors.
    Cli::command().debug_assert();
}

#[test]
fn global_args_after_subcommand() {
    let cli = Cli::try_parse_from([
        "tm",
        "migrate",
        "--verbose",
        "-p",
        "project",
        "--database",
        "app.duckdb",
    ])
    .unwrap();

    assert!(matches!(cli.command, Commands::Migrate));
    assert!(cli.global.verbose);
    assert_eq!(cli.global.project_dir, "project");
    assert_eq!(cli.global.database.as_deref(), Some("app.duckdb"));
    assert!(cli.global.config.is_none());
}

#[test]
fn status_pending_flag() {
    let cli = Cli::try_parse_from(["tm", "status", "--pending"]).unwrap();
    match cli.command {
        Commands::Status(args) => assert!(args.pending),
        other => panic!("unexpected command: {other:?}"),
    }
    assert_eq!(cli.global.project_dir, ".");
}

#[test]
fn subcommand_is_required() {
    assert!(Cli::try_parse_from(["tm"]).is_err());
}
