//! Argument parsing and configuration building for the CLI.

use super::*;
use crate::links::ReferenceKind;
use clap::Parser;

#[test]
fn test_cli_parsing() {
    let cli = Cli::try_parse_from(["armlink", "--help"]);
    assert!(cli.is_err());

    let cli = Cli::try_parse_from(["armlink", "params", "child.json"]);
    assert!(cli.is_ok());
}

#[test]
fn test_verbose_and_quiet_conflict() {
    let cli = Cli::try_parse_from(["armlink", "-v", "-q", "params", "child.json"]);
    assert!(cli.is_err());
}

#[test]
fn test_build_config_log_levels() {
    let cli = Cli::try_parse_from(["armlink", "--verbose", "params", "a.json"]).unwrap();
    assert_eq!(cli.build_config().log_level.as_deref(), Some("debug"));

    let cli = Cli::try_parse_from(["armlink", "--quiet", "params", "a.json"]).unwrap();
    assert_eq!(cli.build_config().log_level, None);

    let cli = Cli::try_parse_from(["armlink", "params", "a.json"]).unwrap();
    assert_eq!(cli.build_config().log_level.as_deref(), Some("info"));
}

#[test]
fn test_config_option() {
    let cli =
        Cli::try_parse_from(["armlink", "--config", "/etc/armlink.toml", "params", "a.json"]).unwrap();
    assert_eq!(
        cli.build_config().config_path,
        Some(PathBuf::from("/etc/armlink.toml"))
    );
}

#[test]
fn test_open_kind_values() {
    let cli = Cli::try_parse_from([
        "armlink",
        "open",
        "file:///t/main.json",
        "file:///t/params.json",
        "--kind",
        "parameters-link",
    ])
    .unwrap();

    match cli.command {
        Commands::Open(cmd) => {
            assert_eq!(cmd.kind, ReferenceKind::ParametersLink);
            assert_eq!(cmd.original, None);
        }
        _ => panic!("expected open"),
    }
}

#[test]
fn test_open_kind_defaults_to_template_link() {
    let cli = Cli::try_parse_from(["armlink", "open", "file:///t/a.json", "file:///t/b.json"]).unwrap();
    match cli.command {
        Commands::Open(cmd) => assert_eq!(cmd.kind, ReferenceKind::TemplateLink),
        _ => panic!("expected open"),
    }
}

#[test]
fn test_sync_requires_both_inputs() {
    assert!(Cli::try_parse_from(["armlink", "sync", "--tree", "tree.json"]).is_err());
    assert!(
        Cli::try_parse_from(["armlink", "sync", "--tree", "t.json", "--notification", "n.json"]).is_ok()
    );
}

#[test]
fn test_uri_argument_accepts_uris_and_paths() {
    let uri = uri_argument("file:///t/main.json").unwrap();
    assert_eq!(uri.as_str(), "file:///t/main.json");

    let uri = uri_argument("https://example.com/child.json").unwrap();
    assert_eq!(uri.scheme(), "https");

    let uri = uri_argument("templates/child.json").unwrap();
    assert!(uri.is_file());
    assert!(uri.as_str().ends_with("/templates/child.json"));
}
