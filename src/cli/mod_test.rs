use std::net::IpAddr;
use std::path::PathBuf;

use clap::Parser;

use super::{Cli, Commands, Transport, default_filter};

#[test]
fn test_no_command_parses() {
    let cli = Cli::try_parse_from(["vikunja-mcp"]).unwrap();
    assert!(cli.command.is_none());
    assert_eq!(cli.verbose, 0);
}

#[test]
fn test_serve_defaults_to_stdio() {
    let cli = Cli::try_parse_from(["vikunja-mcp", "serve"]).unwrap();
    match cli.command {
        Some(Commands::Serve {
            transport,
            host,
            port,
        }) => {
            assert_eq!(transport, Transport::Stdio);
            assert_eq!(host, IpAddr::from([127, 0, 0, 1]));
            assert_eq!(port, 8000);
        }
        _ => panic!("Expected serve"),
    }
}

#[test]
fn test_serve_http_options() {
    let cli = Cli::try_parse_from([
        "vikunja-mcp",
        "serve",
        "--transport",
        "http",
        "--host",
        "0.0.0.0",
        "-p",
        "9100",
    ])
    .unwrap();
    match cli.command {
        Some(Commands::Serve {
            transport, port, ..
        }) => {
            assert_eq!(transport, Transport::Http);
            assert_eq!(port, 9100);
        }
        _ => panic!("Expected serve"),
    }
}

#[test]
fn test_unknown_transport_rejected() {
    assert!(Cli::try_parse_from(["vikunja-mcp", "serve", "--transport", "sse"]).is_err());
}

#[test]
fn test_focus_options_and_global_flags() {
    let cli = Cli::try_parse_from([
        "vikunja-mcp",
        "focus",
        "--instance",
        "work",
        "--limit",
        "0",
        "--config",
        "/tmp/vikunja.yaml",
        "-vv",
    ])
    .unwrap();

    assert_eq!(cli.config, Some(PathBuf::from("/tmp/vikunja.yaml")));
    assert_eq!(cli.verbose, 2);
    match cli.command {
        Some(Commands::Focus {
            instance,
            limit,
            format,
        }) => {
            assert_eq!(instance.as_deref(), Some("work"));
            assert_eq!(limit, 0);
            assert_eq!(format, "table");
        }
        _ => panic!("Expected focus"),
    }
}

#[test]
fn test_focus_limit_defaults_to_ten() {
    let cli = Cli::try_parse_from(["vikunja-mcp", "focus"]).unwrap();
    match cli.command {
        Some(Commands::Focus { limit, .. }) => assert_eq!(limit, 10),
        _ => panic!("Expected focus"),
    }
}

#[test]
fn test_summary_json_format() {
    let cli = Cli::try_parse_from(["vikunja-mcp", "summary", "--format", "json"]).unwrap();
    match cli.command {
        Some(Commands::Summary { instance, format }) => {
            assert!(instance.is_none());
            assert_eq!(format, "json");
        }
        _ => panic!("Expected summary"),
    }
}

#[test]
fn test_default_filter_levels() {
    assert_eq!(default_filter(0, false), "vikunja_mcp=info");
    assert_eq!(default_filter(0, true), "vikunja_mcp=debug");
    assert_eq!(default_filter(1, false), "vikunja_mcp=debug");
    assert!(default_filter(2, false).starts_with("vikunja_mcp=trace"));
}
