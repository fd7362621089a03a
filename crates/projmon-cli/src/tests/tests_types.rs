//! Tests for command-line parsing

use clap::Parser;
use projmon_core::ChangeType;

use crate::types::Commands;

#[derive(Parser)]
struct TestCli {
    #[command(subcommand)]
    command: Commands,
}

fn parse(args: &[&str]) -> Result<Commands, clap::Error> {
    TestCli::try_parse_from(std::iter::once("projmon").chain(args.iter().copied()))
        .map(|cli| cli.command)
}

#[test]
fn test_scan_single_job() {
    let Ok(Commands::Scan { job, all }) = parse(&["scan", "J100"]) else {
        unreachable!("scan should parse");
    };
    assert_eq!(job.as_deref(), Some("J100"));
    assert!(!all);
}

#[test]
fn test_scan_all_rejects_job() {
    assert!(matches!(
        parse(&["scan", "--all"]),
        Ok(Commands::Scan { job: None, all: true })
    ));
    assert!(parse(&["scan", "J100", "--all"]).is_err());
    assert!(parse(&["scan"]).is_err());
}

#[test]
fn test_ack_with_type() {
    let Ok(Commands::Ack {
        job,
        path,
        change_type,
        everything,
    }) = parse(&["ack", "J100", "plans/a.dwg", "--type", "deleted"])
    else {
        unreachable!("ack should parse");
    };
    assert_eq!(job.as_deref(), Some("J100"));
    assert_eq!(path.as_deref(), Some("plans/a.dwg"));
    assert_eq!(change_type, Some(ChangeType::Deleted));
    assert!(!everything);
}

#[test]
fn test_ack_argument_rules() {
    assert!(parse(&["ack", "J100", "a.txt", "--type", "renamed"]).is_err());
    assert!(parse(&["ack", "J100", "--type", "new"]).is_err());
    assert!(parse(&["ack"]).is_err());
    assert!(matches!(
        parse(&["ack", "--everything"]),
        Ok(Commands::Ack { everything: true, .. })
    ));
    assert!(parse(&["ack", "J100", "--everything"]).is_err());
}

#[test]
fn test_history_default_limit() {
    assert!(matches!(
        parse(&["history", "J100"]),
        Ok(Commands::History { limit: 20, .. })
    ));
}
