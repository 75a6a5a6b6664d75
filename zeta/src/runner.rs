//! Sequential scan across all enabled discovery sources.

use tracing::debug;

use crate::config::AppConfig;
use crate::discovery::{CertLogExtractor, SubdomainSource, WebScanExtractor};
use crate::logger::ScanLogger;
use crate::report::ReportTree;

/// Everything one run produced, in source order.
#[derive(Debug, Default)]
pub struct ScanRun {
    /// Concatenation of every source's list; no cross-source dedup
    pub subdomains: Vec<String>,
    pub trees: Vec<ReportTree>,
}

impl ScanRun {
    pub fn failed_sources(&self) -> usize {
        self.trees.iter().filter(|t| t.is_failed()).count()
    }

    /// At least one source ran and none of them succeeded.
    pub fn all_failed(&self) -> bool {
        !self.trees.is_empty() && self.failed_sources() == self.trees.len()
    }
}

/// Which sources to build; CLI switches can only turn configured sources off.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceSelection {
    pub disable_cert_log: bool,
    pub disable_web_scan: bool,
}

pub fn build_sources(config: &AppConfig, selection: SourceSelection) -> Vec<Box<dyn SubdomainSource>> {
    let mut sources: Vec<Box<dyn SubdomainSource>> = Vec::new();

    if config.cert_log.enabled && !selection.disable_cert_log {
        sources.push(Box::new(CertLogExtractor::new(&config.cert_log, &config.http)));
    }
    if config.web_scan.enabled && !selection.disable_web_scan {
        sources.push(Box::new(WebScanExtractor::new(&config.web_scan, &config.browser)));
    }

    debug!("{} discovery sources enabled", sources.len());
    sources
}

/// Run each source in turn against `domain`. `on_tree` is called with each
/// report as soon as its source finishes.
pub async fn run_sources<F>(
    domain: &str,
    sources: &[Box<dyn SubdomainSource>],
    logger: &ScanLogger,
    mut on_tree: F,
) -> ScanRun
where
    F: FnMut(&ReportTree),
{
    let mut run = ScanRun::default();

    for source in sources {
        let title = format!("📂 {}", source.label());

        logger.log_source_start(source.label(), domain);
        logger.start_spinner(&title).await;
        let outcome = source.scan(domain, &title).await;
        logger.finish_spinner().await;

        logger.log_source_complete(source.label(), outcome.tree.subdomain_count(), outcome.tree.is_failed());
        on_tree(&outcome.tree);

        run.subdomains.extend(outcome.subdomains);
        run.trees.push(outcome.tree);
    }

    run
}
