use clap::Parser;
use std::path::PathBuf;

use crate::runner::SourceSelection;

#[derive(Parser, Debug)]
#[command(name = "zeta")]
#[command(about = "Zeta - A tool for find subdomains.")]
#[command(version)]
pub struct Cli {
    /// Domain to search subdomains for
    #[arg(short, long, value_name = "DOMAIN")]
    pub search: Option<String>,

    /// Write discovered subdomains to this file, one per line (directories are created)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Verbose logging (use -v for INFO, -vv for DEBUG)
    #[arg(short, long, action = clap::ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only print the report trees
    #[arg(short, long)]
    pub quiet: bool,

    /// Configuration file (defaults to ./config/zeta.toml, then built-in defaults)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write the default configuration file and exit
    #[arg(long)]
    pub init: bool,

    /// Disable colored output (also respects NO_COLOR environment variable)
    #[arg(long)]
    pub no_color: bool,

    /// Skip the certificate transparency (crt.sh) search
    #[arg(long)]
    pub disable_cert_log: bool,

    /// Skip the browser-driven subdomainfinder scan
    #[arg(long)]
    pub disable_web_scan: bool,

    /// Remove subdomains reported by more than one source before export (overrides config)
    #[arg(long)]
    pub dedupe: bool,

    /// Export execution logs to a file (specify file path)
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<String>,
}

impl Cli {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(domain) = &self.search {
            let domain = domain.trim();
            if domain.is_empty() {
                return Err("Search term cannot be empty".to_string());
            }
            if domain.contains(char::is_whitespace) || domain.contains('/') {
                return Err(format!("'{}' is not a valid domain", domain));
            }
        }
        if self.disable_cert_log && self.disable_web_scan {
            return Err("Both discovery sources are disabled; nothing to scan".to_string());
        }
        Ok(())
    }

    /// The search domain, trimmed, if one was given.
    pub fn domain(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim)
    }

    pub fn source_selection(&self) -> SourceSelection {
        SourceSelection {
            disable_cert_log: self.disable_cert_log,
            disable_web_scan: self.disable_web_scan,
        }
    }

    pub fn color_enabled(&self) -> bool {
        !self.no_color && std::env::var_os("NO_COLOR").is_none()
    }
}
