//! Velador: command-line driver for the careers verification suite.
//!
//! ## Usage
//!
//! ```bash
//! velador                         # headless chromium, default targets
//! velador --browser chrome --headed
//! velador --report-dir ./reports
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use tracing_subscriber::EnvFilter;
use velar::{
    careers_cases, BrowserKind, CdpSession, RunConfig, Runner, SuiteTargets, VelarResult,
};

mod output;

/// Browser-driven verification of the careers-listing flow
#[derive(Debug, Parser)]
#[command(name = "velador", version, about)]
struct Cli {
    /// Browser to drive (chrome | firefox)
    #[arg(long, default_value = "chrome", env = "VELAR_BROWSER")]
    browser: String,

    /// Run with a visible browser window
    #[arg(long)]
    headed: bool,

    /// Directory the HTML and JSON reports are written into
    #[arg(long, default_value = "target/velar-report")]
    report_dir: PathBuf,

    /// Home page address override
    #[arg(long)]
    home_url: Option<String>,

    /// Careers page address override
    #[arg(long)]
    careers_url: Option<String>,

    /// Increase log verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(all_passed) => {
            if all_passed {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbosity: u8) {
    let default = match verbosity {
        0 => "velar=info,velador=info",
        1 => "velar=debug,velador=debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> VelarResult<bool> {
    // unknown browser names fail here, before any session is created
    let browser = BrowserKind::from_str(&cli.browser)?;
    let config = RunConfig::new()
        .with_browser(browser)
        .with_headless(!cli.headed)
        .with_report_dir(cli.report_dir.clone());

    let mut targets = SuiteTargets::new();
    if let Some(home_url) = &cli.home_url {
        targets.home_url = home_url.clone();
    }
    if let Some(careers_url) = &cli.careers_url {
        targets.careers_url = careers_url.clone();
    }

    let factory_config = config.clone();
    let mut runner = Runner::new("Careers Verification", move || {
        CdpSession::launch(&factory_config)
    });
    let report = runner.run(careers_cases(&targets));

    std::fs::create_dir_all(&config.report_dir)?;
    let html_path = config.report_dir.join("report.html");
    let json_path = config.report_dir.join("report.json");
    report.write_html(&html_path)?;
    report.write_json(&json_path)?;
    tracing::info!("Report written to {}", html_path.display());

    output::print_report(&report);
    Ok(report.all_passed())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["velador"]);
        assert_eq!(cli.browser, "chrome");
        assert!(!cli.headed);
        assert_eq!(cli.report_dir, PathBuf::from("target/velar-report"));
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "velador",
            "--browser",
            "firefox",
            "--headed",
            "--report-dir",
            "out",
            "-vv",
        ]);
        assert_eq!(cli.browser, "firefox");
        assert!(cli.headed);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_unknown_browser_is_rejected_before_any_session() {
        let cli = Cli::parse_from(["velador", "--browser", "safari"]);
        let err = run(&cli).unwrap_err();
        assert!(matches!(
            err,
            velar::VelarError::UnsupportedConfiguration { .. }
        ));
    }
}
