//! routemark - Main Entry Point
//!
//! Parses the CLI, loads configuration, then keeps the route and its arrows
//! refreshed until interrupted, serving them over HTTP.

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use routemark::{
    api::ApiServer,
    config::{CliArgs, Settings},
    geo::HeadingScale,
    refresh::RefreshService,
    routing::OsrmRouteFetcher,
    NAME, VERSION,
};

/// ANSI color codes for terminal output
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
}

/// Print the startup banner with version
fn print_banner() {
    println!(
        r#"
{cyan}{bold}  routemark  ---->  ---->  ---->{reset}
{dim}  Direction arrows along a driving route{reset}
{dim}  Version: {version}{reset}
"#,
        cyan = colors::CYAN,
        bold = colors::BOLD,
        reset = colors::RESET,
        dim = colors::DIM,
        version = VERSION
    );
}

fn on_off(enabled: bool, on: &str) -> String {
    if enabled {
        format!("{green}{on}{reset}", green = colors::GREEN, reset = colors::RESET)
    } else {
        format!("{yellow}disabled{reset}", yellow = colors::YELLOW, reset = colors::RESET)
    }
}

/// Print configuration summary
fn print_config_summary(settings: &Settings) {
    println!(
        "{bold}{blue}Configuration:{reset}",
        bold = colors::BOLD,
        blue = colors::BLUE,
        reset = colors::RESET
    );
    println!(
        "  {dim}Start:{reset}          {} ({})",
        settings.start.coordinate(),
        settings.start.label,
        dim = colors::DIM,
        reset = colors::RESET
    );
    println!(
        "  {dim}End:{reset}            {} ({})",
        settings.end.coordinate(),
        settings.end.label,
        dim = colors::DIM,
        reset = colors::RESET
    );
    println!(
        "  {dim}Arrow Spacing:{reset}  {}m, heading {}",
        settings.spacing_meters,
        settings.heading_scale,
        dim = colors::DIM,
        reset = colors::RESET
    );
    println!(
        "  {dim}Refresh:{reset}        every {}s",
        settings.refresh_interval_ms / 1000,
        dim = colors::DIM,
        reset = colors::RESET
    );
    println!(
        "  {dim}Jitter:{reset}         {}",
        on_off(
            settings.jitter_enabled,
            &format!(
                "every {}s, span {} deg",
                settings.jitter_interval_ms / 1000,
                settings.jitter_span_degrees
            )
        ),
        dim = colors::DIM,
        reset = colors::RESET
    );
    println!(
        "  {dim}Routing:{reset}        {}",
        settings.osrm_base_url,
        dim = colors::DIM,
        reset = colors::RESET
    );
    println!(
        "  {dim}API Server:{reset}     {}",
        on_off(
            settings.api_enabled,
            &format!("http://127.0.0.1:{}", settings.api_port)
        ),
        dim = colors::DIM,
        reset = colors::RESET
    );

    println!();
}

/// Parse a `LAT,LON` pair
fn parse_lat_lon(value: &str) -> Result<(f64, f64), String> {
    let (lat, lon) = value
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LON, got '{}'", value))?;

    let lat = lat
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid latitude '{}': {}", lat.trim(), e))?;
    let lon = lon
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid longitude '{}': {}", lon.trim(), e))?;

    Ok((lat, lon))
}

/// Build the CLI command parser
fn build_cli() -> Command {
    Command::new(NAME)
        .version(VERSION)
        .about("Places direction arrows along a periodically refreshed driving route")
        .long_about(
            "routemark fetches a driving route between two points and features:\n\
             - Haversine-spaced direction arrows along the route\n\
             - Periodic refresh and optional endpoint jitter\n\
             - REST API for the latest route snapshot\n\
             - WebSocket event streaming",
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Path to configuration file (TOML or JSON)")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .help("API server port (default: 8088)")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("no-api")
                .long("no-api")
                .help("Disable the REST API server")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("start")
                .long("start")
                .value_name("LAT,LON")
                .help("Route start coordinate")
                .allow_hyphen_values(true)
                .value_parser(parse_lat_lon),
        )
        .arg(
            Arg::new("end")
                .long("end")
                .value_name("LAT,LON")
                .help("Route end coordinate")
                .allow_hyphen_values(true)
                .value_parser(parse_lat_lon),
        )
        .arg(
            Arg::new("spacing")
                .long("spacing")
                .value_name("METERS")
                .help("Distance between arrows (default: 2500)")
                .value_parser(clap::value_parser!(f64)),
        )
        .arg(
            Arg::new("heading-scale")
                .long("heading-scale")
                .value_name("SCALE")
                .help("Heading conversion: degrees or legacy")
                .value_parser(["degrees", "legacy"]),
        )
        .arg(
            Arg::new("osrm-url")
                .long("osrm-url")
                .value_name("URL")
                .help("OSRM route service base URL"),
        )
        .arg(
            Arg::new("refresh-interval")
                .long("refresh-interval")
                .value_name("MS")
                .help("Route refresh interval in milliseconds")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("no-jitter")
                .long("no-jitter")
                .help("Keep the endpoints fixed")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("once")
                .long("once")
                .help("Fetch the route once, print the snapshot as JSON and exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(ArgAction::Count),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Suppress output except errors")
                .action(ArgAction::SetTrue)
                .conflicts_with("verbose"),
        )
}

/// Parse CLI arguments into CliArgs struct
fn parse_cli_args(matches: &clap::ArgMatches) -> CliArgs {
    let mut args = CliArgs::default();

    args.config_file = matches.get_one::<PathBuf>("config").cloned();
    args.api_port = matches.get_one::<u16>("port").copied();
    args.start = matches.get_one::<(f64, f64)>("start").copied();
    args.end = matches.get_one::<(f64, f64)>("end").copied();
    args.spacing_meters = matches.get_one::<f64>("spacing").copied();
    args.refresh_interval_ms = matches.get_one::<u64>("refresh-interval").copied();
    args.osrm_base_url = matches.get_one::<String>("osrm-url").cloned();
    args.heading_scale = matches
        .get_one::<String>("heading-scale")
        .and_then(|s| s.parse::<HeadingScale>().ok());

    if matches.get_flag("no-api") {
        args.api_enabled = Some(false);
    }

    if matches.get_flag("no-jitter") {
        args.jitter_enabled = Some(false);
    }

    args
}

/// Initialize the tracing/logging subsystem
fn init_tracing(verbosity: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbosity {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let mut filter = EnvFilter::from_default_env().add_directive(level.into());
    for directive in ["hyper=warn", "reqwest=warn", "tower_http=info"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(filter)
        .init();
}

/// Main application entry point
#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let matches = build_cli().get_matches();

    // Get verbosity settings before loading config
    let verbosity = matches.get_count("verbose");
    let quiet = matches.get_flag("quiet");
    let once = matches.get_flag("once");

    // Initialize logging
    init_tracing(verbosity, quiet);

    // Convert matches to CliArgs
    let cli_args = parse_cli_args(&matches);

    // Load configuration with full precedence chain
    let settings = cli_args
        .load_settings()
        .context("Failed to load configuration")?;

    let fetcher = OsrmRouteFetcher::with_timeout(
        &settings.osrm_base_url,
        Duration::from_millis(settings.request_timeout_ms),
    )
    .context("Failed to create route fetcher")?;

    let mut service = RefreshService::from_settings(Arc::new(fetcher), &settings);

    if once {
        let snapshot = service
            .refresh_once()
            .await
            .context("Failed to fetch route")?;
        let json = serde_json::to_string_pretty(snapshot.as_ref())
            .context("Failed to encode route snapshot")?;
        println!("{}", json);
        return Ok(());
    }

    // Print banner unless quiet mode
    if !quiet {
        print_banner();
        print_config_summary(&settings);
    }

    service.start();

    // Start API server if enabled
    let mut api_server = if settings.api_enabled {
        info!("Starting API server on port {}...", settings.api_port);

        let mut server = ApiServer::new(
            settings.api_port,
            service.handle(),
            settings.arrow_planner(),
        );

        server
            .start()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to start API server: {}", e))?;

        println!(
            "{green}{bold}API Server started:{reset} http://127.0.0.1:{}",
            settings.api_port,
            green = colors::GREEN,
            bold = colors::BOLD,
            reset = colors::RESET
        );
        println!(
            "{dim}Press Ctrl+C to stop{reset}",
            dim = colors::DIM,
            reset = colors::RESET
        );
        println!();

        Some(server)
    } else {
        info!("API server disabled");
        None
    };

    // Wait for shutdown signal
    info!("routemark is running. Press Ctrl+C to stop.");

    match signal::ctrl_c().await {
        Ok(()) => {
            println!();
            info!("Received shutdown signal, stopping gracefully...");
        }
        Err(e) => {
            error!("Failed to listen for shutdown signal: {}", e);
        }
    }

    // Graceful shutdown
    if let Some(ref mut server) = api_server {
        server.stop().await;
    }

    service.stop().await;

    println!(
        "{green}routemark stopped successfully.{reset}",
        green = colors::GREEN,
        reset = colors::RESET
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_port_parsing() {
        let cmd = build_cli();

        let matches = cmd
            .clone()
            .try_get_matches_from(["routemark", "--port", "8080"])
            .unwrap();

        assert_eq!(matches.get_one::<u16>("port"), Some(&8080));
    }

    #[test]
    fn test_cli_conflicts() {
        let cmd = build_cli();

        // verbose and quiet should conflict
        let result = cmd
            .clone()
            .try_get_matches_from(["routemark", "-v", "--quiet"]);

        assert!(result.is_err());
    }

    #[test]
    fn test_parse_lat_lon() {
        assert_eq!(parse_lat_lon("28.6139,77.2090"), Ok((28.6139, 77.2090)));
        assert_eq!(parse_lat_lon(" -33.9 , 18.4 "), Ok((-33.9, 18.4)));
        assert!(parse_lat_lon("28.6139").is_err());
        assert!(parse_lat_lon("north,77.2").is_err());
    }

    #[test]
    fn test_cli_rejects_bad_coordinate() {
        let result = build_cli().try_get_matches_from(["routemark", "--start", "28.6"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_cli_args() {
        let cmd = build_cli();
        let matches = cmd
            .try_get_matches_from([
                "routemark",
                "--port",
                "9000",
                "--start",
                "28.60,77.20",
                "--end",
                "-33.9,18.4",
                "--spacing",
                "1000",
                "--heading-scale",
                "legacy",
                "--no-jitter",
                "--no-api",
            ])
            .unwrap();

        let args = parse_cli_args(&matches);

        assert_eq!(args.api_port, Some(9000));
        assert_eq!(args.start, Some((28.60, 77.20)));
        assert_eq!(args.end, Some((-33.9, 18.4)));
        assert_eq!(args.spacing_meters, Some(1000.0));
        assert_eq!(args.heading_scale, Some(HeadingScale::Legacy));
        assert_eq!(args.jitter_enabled, Some(false));
        assert_eq!(args.api_enabled, Some(false));
        assert!(args.refresh_interval_ms.is_none());
    }

    #[test]
    fn test_once_flag() {
        let matches = build_cli()
            .try_get_matches_from(["routemark", "--once"])
            .unwrap();
        assert!(matches.get_flag("once"));
    }
}
