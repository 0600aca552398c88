use super::*;
use clap::CommandFactory;

#[test]
fn verify_cli_args() {
    // Validates the entire command tree: short flag conflicts,
    // duplicate args, and other clap definition errors.
    Cli::command().debug_assert();
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from([
        "sqllineage",
        "summary",
        "query.sql",
        "--dialect",
        "snowflake",
        "--output",
        "json",
        "-v",
    ])
    .unwrap();
    assert!(cli.global.verbose);
    assert_eq!(cli.global.dialect.as_deref(), Some("snowflake"));
    match cli.command {
        Commands::Summary(args) => {
            assert_eq!(args.input, "query.sql");
            assert_eq!(args.output, Some(OutputFormat::Json));
        }
        other => panic!("unexpected command: {:?}", other),
    }
}

#[test]
fn test_input_defaults_to_stdin() {
    let cli = Cli::try_parse_from(["sqllineage", "clean"]).unwrap();
    match cli.command {
        Commands::Clean(args) => assert_eq!(args.input, "-"),
        other => panic!("unexpected command: {:?}", other),
    }
}

#[test]
fn test_unknown_output_format_rejected() {
    assert!(Cli::try_parse_from(["sqllineage", "tables", "-", "--output", "yaml"]).is_err());
}
