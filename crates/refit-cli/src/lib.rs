//! refit-cli: attach to a running host client and customize it.
//!
//! Bootstrap sequence: parse args, load + validate the configuration tree,
//! resolve logging (CLI flags override the file), discover the host-document
//! target, open the debugging channel, evaluate the bridge once, run the
//! engine, then keep the supervisor tasks alive until ctrl-c.

use std::sync::Arc;
use std::time::Duration;

use refit_cdp::{CdpDocument, ChannelConfig, DebugChannel, DiscoveryClient};
use refit_core::{config, Logger, LoggingConfig};
use refit_dom::HostDocument;
use refit_engine::{Engine, WaitOptions};

/// Default discovery endpoint for a host client started with remote
/// debugging enabled.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:9222";

/// Build information injected at compile time or defaulting to "dev".
#[derive(Debug, Clone)]
pub struct VersionInfo {
    pub version: String,
    pub commit: String,
}

impl Default for VersionInfo {
    fn default() -> Self {
        Self {
            version: option_env!("REFIT_VERSION")
                .unwrap_or(env!("CARGO_PKG_VERSION"))
                .to_string(),
            commit: option_env!("REFIT_COMMIT").unwrap_or("none").to_string(),
        }
    }
}

/// Fragment the host page's URL must contain to be picked as the target.
pub const DEFAULT_URL_FRAGMENT: &str = "app";

/// Parsed CLI arguments.
#[derive(Debug, Clone)]
pub struct Args {
    pub endpoint: String,
    pub url_fragment: String,
    pub config_file: String,
    pub log_level: String,
    pub log_format: String,
    /// Optional bound on every engine wait; absent preserves the
    /// wait-forever default.
    pub timeout_secs: Option<u64>,
    /// Verify discovery and the channel, evaluate a no-op, then exit.
    pub dry_run: bool,
    pub show_help: bool,
    pub show_version: bool,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.into(),
            url_fragment: DEFAULT_URL_FRAGMENT.into(),
            config_file: String::new(),
            log_level: String::new(),
            log_format: String::new(),
            timeout_secs: None,
            dry_run: false,
            show_help: false,
            show_version: false,
        }
    }
}

impl Args {
    /// Parse `--flag value` style arguments. Unknown flags are an error so a
    /// typo never silently becomes a default.
    pub fn parse(argv: &[String]) -> Result<Self, String> {
        let mut args = Self::default();
        let mut iter = argv.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--help" | "-h" => args.show_help = true,
                "--version" | "-V" => args.show_version = true,
                "--dry-run" => args.dry_run = true,
                "--endpoint" => args.endpoint = take_value(&mut iter, arg)?,
                "--url-fragment" => args.url_fragment = take_value(&mut iter, arg)?,
                "--config" => args.config_file = take_value(&mut iter, arg)?,
                "--log-level" => args.log_level = take_value(&mut iter, arg)?,
                "--log-format" => args.log_format = take_value(&mut iter, arg)?,
                "--timeout-secs" => {
                    let value = take_value(&mut iter, arg)?;
                    let secs: u64 = value
                        .parse()
                        .map_err(|_| format!("--timeout-secs expects a number, got {value:?}"))?;
                    args.timeout_secs = Some(secs);
                }
                other => return Err(format!("unknown argument {other:?}")),
            }
        }
        Ok(args)
    }
}

fn take_value<'a>(
    iter: &mut std::slice::Iter<'a, String>,
    flag: &str,
) -> Result<String, String> {
    iter.next()
        .map(String::clone)
        .ok_or_else(|| format!("{flag} expects a value"))
}

pub const USAGE: &str = "\
refit — retrofit a running chat-workspace client's interface

USAGE:
    refit [--endpoint URL] [--url-fragment TEXT] [--config FILE]
          [--log-level LEVEL] [--log-format console|json]
          [--timeout-secs N] [--dry-run] [--version]

The host client must be running with remote debugging enabled.
Without --timeout-secs the engine waits forever for host elements,
matching the host-is-eventually-ready assumption.
";

/// Entry point for the binary: parse std::env args, run, map to exit code.
pub fn run_from_env() -> i32 {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let args = match Args::parse(&argv) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("refit: {err}");
            eprintln!("{USAGE}");
            return 2;
        }
    };
    if args.show_help {
        println!("{USAGE}");
        return 0;
    }
    if args.show_version {
        let info = VersionInfo::default();
        println!("refit {} ({})", info.version, info.commit);
        return 0;
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("refit: failed to start runtime: {err}");
            return 1;
        }
    };

    match runtime.block_on(run(args)) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("refit: {err}");
            1
        }
    }
}

async fn run(args: Args) -> Result<(), String> {
    let (cfg, config_path) = config::load_config(if args.config_file.is_empty() {
        None
    } else {
        Some(&args.config_file)
    })?;

    let log_cfg = LoggingConfig::resolve(&cfg.logging, &args.log_level, &args.log_format);
    let logger = Logger::new(&log_cfg).component("refit");
    match &config_path {
        Some(path) => logger.info_with("config loaded", &[("path", &path.display().to_string())]),
        None => logger.info("no config file found, all features off"),
    }

    let discovery = DiscoveryClient::new(&args.endpoint);
    let (target, ws_url) = discovery
        .find_host_target(&args.url_fragment)
        .await
        .map_err(|err| err.to_string())?;
    logger.info_with(
        "host document found",
        &[("title", &target.title), ("url", &target.url)],
    );

    let channel = DebugChannel::connect(&ws_url, ChannelConfig::default())
        .await
        .map_err(|err| err.to_string())?;

    if args.dry_run {
        let outcome = refit_cdp::inject::evaluate_once(&channel, "'refit-dry-run'")
            .await
            .map_err(|err| err.to_string())?;
        logger.info_with("dry run ok", &[("result", &outcome)]);
        return Ok(());
    }

    let doc = CdpDocument::attach(channel, logger.component("bridge"))
        .await
        .map_err(|err| err.to_string())?;
    let doc: Arc<dyn HostDocument> = doc;

    let wait = match args.timeout_secs {
        Some(secs) => WaitOptions::with_timeout(Duration::from_secs(secs)),
        None => WaitOptions::forever(),
    };

    let engine = Engine::new(doc, cfg, logger.component("engine")).with_wait_options(wait);
    let run = engine.run().await.map_err(|err| err.to_string())?;
    logger.info_with(
        "customization active",
        &[
            ("workspaces", &run.workspace_count.to_string()),
            ("tabs_hidden", &run.tabs.hidden.to_string()),
            ("tabs_mirrored", &run.tabs.mirrored.len().to_string()),
            ("tasks", &run.tasks.len().to_string()),
        ],
    );

    // The supervisors re-assert until the page (or this process) goes away.
    tokio::signal::ctrl_c()
        .await
        .map_err(|err| format!("signal wait failed: {err}"))?;
    logger.info("stopping");
    run.shutdown().await;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parse_defaults() {
        let args = Args::parse(&[]).unwrap();
        assert_eq!(args.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(args.url_fragment, DEFAULT_URL_FRAGMENT);
        assert!(args.timeout_secs.is_none());
        assert!(!args.dry_run);
    }

    #[test]
    fn parse_flags() {
        let args = Args::parse(&argv(&[
            "--endpoint",
            "http://127.0.0.1:8315",
            "--config",
            "refit.yaml",
            "--log-level",
            "debug",
            "--timeout-secs",
            "30",
            "--dry-run",
        ]))
        .unwrap();
        assert_eq!(args.endpoint, "http://127.0.0.1:8315");
        assert_eq!(args.config_file, "refit.yaml");
        assert_eq!(args.log_level, "debug");
        assert_eq!(args.timeout_secs, Some(30));
        assert!(args.dry_run);
    }

    #[test]
    fn parse_rejects_unknown_flags() {
        let err = match Args::parse(&argv(&["--bogus"])) {
            Ok(args) => panic!("unexpected parse: {args:?}"),
            Err(err) => err,
        };
        assert!(err.contains("--bogus"), "err={err}");
    }

    #[test]
    fn parse_rejects_missing_values() {
        let err = match Args::parse(&argv(&["--endpoint"])) {
            Ok(args) => panic!("unexpected parse: {args:?}"),
            Err(err) => err,
        };
        assert!(err.contains("expects a value"), "err={err}");
    }

    #[test]
    fn version_info_defaults_are_populated() {
        let info = VersionInfo::default();
        assert!(!info.version.is_empty());
        assert!(!info.commit.is_empty());
    }

    #[test]
    fn parse_rejects_bad_timeout() {
        let err = match Args::parse(&argv(&["--timeout-secs", "soon"])) {
            Ok(args) => panic!("unexpected parse: {args:?}"),
            Err(err) => err,
        };
        assert!(err.contains("--timeout-secs"), "err={err}");
    }
}
