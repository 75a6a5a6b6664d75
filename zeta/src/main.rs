use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use zeta::cli::Cli;
use zeta::config::{AppConfig, CONFIG_PATH};
use zeta::export::{dedupe_subdomains, export_subdomains};
use zeta::logger::{ScanLogger, VerbosityLevel};
use zeta::render::render_tree;
use zeta::runner::{build_sources, run_sources};

fn display_banner() {
    let banner = format!(
        r"
     _____        __
    /__  /  ___  / /_____ _
      / /  / _ \/ __/ __ `/
     / /__/  __/ /_/ /_/ /
    /____/\___/\__/\__,_/    v{}",
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", banner.green());
    println!("            {}\n", "Subdomain Discovery Tool".italic());
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if !cli.color_enabled() {
        colored::control::set_override(false);
    }

    if !cli.quiet {
        display_banner();
    }

    // Handle --init flag first (before any other processing)
    if cli.init {
        let path = cli.config.clone().unwrap_or_else(|| PathBuf::from(CONFIG_PATH));
        match AppConfig::create_default_config(&path) {
            Ok(path) => {
                println!("✅ Created default configuration file at: {}", path.display());
                std::process::exit(0);
            }
            Err(e) => {
                eprintln!("❌ Failed to create configuration file: {}", e);
                std::process::exit(1);
            }
        }
    }

    if let Err(e) = cli.validate() {
        eprintln!("❌ Invalid arguments: {}", e);
        std::process::exit(1);
    }

    let Some(domain) = cli.domain() else {
        println!("No search term provided. Use -s or --search to specify a search term.");
        return Ok(());
    };

    let config = match AppConfig::load_or_default(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("❌ Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let verbosity = if cli.quiet {
        VerbosityLevel::Silent
    } else {
        VerbosityLevel::from_verbose_count(cli.verbose)
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.tracing_directive()));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(cli.color_enabled())
        .init();

    let logger = match &cli.log_file {
        Some(log_file_path) => ScanLogger::with_log_file(verbosity, log_file_path.clone()),
        None => ScanLogger::new(verbosity),
    };

    ctrlc::set_handler(|| {
        eprintln!("\nProcess interrupted by user. Exiting...");
        std::process::exit(0);
    })
    .unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to set Ctrl-C handler: {}. Interrupt signals may not be handled gracefully.", e);
    });

    let sources = build_sources(&config, cli.source_selection());
    if sources.is_empty() {
        logger.error("No discovery sources enabled (check [cert_log] and [web_scan] in the configuration)");
        std::process::exit(1);
    }

    println!("Searching for subdomain for: {}\n", domain);
    logger.record_run_start(domain);

    let run = run_sources(domain, &sources, &logger, |tree| {
        println!("{}", render_tree(tree));
    })
    .await;

    logger.record_run_end();

    if run.all_failed() {
        logger.info(&format!(
            "All {} discovery sources failed; nothing was found for {}",
            run.failed_sources(),
            domain
        ));
    }

    let mut subdomains = run.subdomains;
    if cli.dedupe || config.export.dedupe {
        let before = subdomains.len();
        subdomains = dedupe_subdomains(subdomains);
        logger.debug(&format!("Cross-source dedup removed {} entries", before - subdomains.len()));
    }

    if let Some(output) = &cli.output {
        match export_subdomains(output, &subdomains) {
            Ok(path) => logger.log_export_success(&path.to_string_lossy(), subdomains.len()),
            Err(e) => {
                logger.error(&format!("Export failed: {:#}", e));
                std::process::exit(1);
            }
        }
    }

    logger.print_final_summary();

    if logger.is_log_export_enabled() {
        if let Err(e) = logger.export_logs() {
            eprintln!("⚠️  Failed to write log file: {}", e);
        }
    }

    Ok(())
}
