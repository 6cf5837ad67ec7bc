use std::path::PathBuf;

use shopgrab_core::{Region, ScraperConfig, SiteKind};

use super::*;
use crate::export::ExportFormat;
use crate::scrape::{apply_overrides, collect_ids};

fn scrape_args(args: &[&str]) -> ScrapeArgs {
    let argv = ["shopgrab", "scrape"].iter().chain(args).copied();
    match Cli::try_parse_from(argv).expect("expected valid cli args").command {
        Some(Commands::Scrape(args)) => args,
        None => panic!("expected scrape command"),
    }
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["shopgrab"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn parses_minimal_scrape_command() {
    let args = scrape_args(&["--site", "amazon", "B08N5WRWNW"]);
    assert_eq!(args.site, SiteKind::Amazon);
    assert_eq!(args.ids, vec!["B08N5WRWNW"]);
    assert!(args.region.is_none());
    assert_eq!(args.format, ExportFormat::Json);
    assert!(args.output.is_none());
    assert!(!args.use_proxies);
    assert!(!args.no_warm_up);
}

#[test]
fn parses_every_scrape_option() {
    let args = scrape_args(&[
        "--site",
        "Myntra",
        "--region",
        "in",
        "--ids-file",
        "ids.txt",
        "--format",
        "both",
        "--output",
        "out/myntra",
        "--use-proxies",
        "--proxy-file",
        "proxies.txt",
        "--no-warm-up",
        "1234567",
        "7654321",
    ]);
    assert_eq!(args.site, SiteKind::Myntra);
    assert_eq!(args.region, Some(Region::In));
    assert_eq!(args.ids_file, Some(PathBuf::from("ids.txt")));
    assert_eq!(args.format, ExportFormat::Both);
    assert_eq!(args.output, Some(PathBuf::from("out/myntra")));
    assert!(args.use_proxies);
    assert_eq!(args.proxy_file, Some(PathBuf::from("proxies.txt")));
    assert!(args.no_warm_up);
    assert_eq!(args.ids, vec!["1234567", "7654321"]);
}

#[test]
fn rejects_unknown_site() {
    assert!(Cli::try_parse_from(["shopgrab", "scrape", "--site", "ajio", "X"]).is_err());
}

#[test]
fn rejects_unknown_region() {
    let argv = ["shopgrab", "scrape", "--site", "amazon", "--region", "fr", "X"];
    assert!(Cli::try_parse_from(argv).is_err());
}

#[test]
fn site_is_required() {
    assert!(Cli::try_parse_from(["shopgrab", "scrape", "B08N5WRWNW"]).is_err());
}

#[test]
fn ids_from_args_and_file_are_merged() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ids.txt");
    std::fs::write(&path, "# wishlist\nB000000002\n\n  B000000003  \n").unwrap();

    let ids = collect_ids(&["B000000001".to_string(), " ".to_string()], Some(&path)).unwrap();
    assert_eq!(ids, vec!["B000000001", "B000000002", "B000000003"]);
}

#[test]
fn missing_ids_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(collect_ids(&[], Some(&dir.path().join("absent.txt"))).is_err());
}

#[test]
fn cli_flags_override_environment_config() {
    let args = scrape_args(&[
        "--site",
        "amazon",
        "--region",
        "uk",
        "--use-proxies",
        "--proxy-file",
        "/tmp/p.txt",
        "B08N5WRWNW",
    ]);
    let config = apply_overrides(ScraperConfig::default(), &args);
    assert_eq!(config.region, Region::Uk);
    assert!(config.use_proxies);
    assert_eq!(config.proxy_file, PathBuf::from("/tmp/p.txt"));
}

#[test]
fn absent_flags_keep_environment_config() {
    let base = ScraperConfig {
        region: Region::De,
        use_proxies: true,
        ..ScraperConfig::default()
    };
    let args = scrape_args(&["--site", "flipkart", "MOBFWQ6BXGJCEYNY"]);
    assert_eq!(apply_overrides(base.clone(), &args), base);
}

fn rejected_env() -> Result<ScraperConfig, shopgrab_core::ConfigError> {
    Err(shopgrab_core::ConfigError::InvalidEnvVar {
        var: "SHOPGRAB_MAX_RETRIES".to_string(),
        reason: "invalid digit found in string".to_string(),
    })
}

#[test]
fn help_parses_without_touching_environment_config() {
    let err = Cli::try_parse_from(["shopgrab", "scrape", "--help"]).unwrap_err();
    assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
}

#[tokio::test]
async fn no_command_skips_environment_config() {
    let cli = Cli::try_parse_from(["shopgrab"]).expect("expected valid cli args");
    run(cli, || panic!("config must not be loaded without a command"))
        .await
        .expect("no command succeeds");
}

#[tokio::test]
async fn invalid_environment_config_fails_a_command() {
    let cli = Cli::try_parse_from(["shopgrab", "scrape", "--site", "amazon", "B08N5WRWNW"])
        .expect("expected valid cli args");
    let err = run(cli, rejected_env).await.unwrap_err();
    assert!(err.to_string().contains("SHOPGRAB_MAX_RETRIES"), "{err}");
}
