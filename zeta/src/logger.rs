use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::RwLock;

#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub enum VerbosityLevel {
    Silent = 0,    // Only the report trees
    Summary = 1,   // Per-source progress (default)
    Detailed = 2,  // Warnings and per-source counts
    Debug = 3,     // Everything
}

impl VerbosityLevel {
    pub fn from_verbose_count(count: u8) -> Self {
        match count {
            0 => VerbosityLevel::Summary,
            1 => VerbosityLevel::Detailed,
            2.. => VerbosityLevel::Debug,
        }
    }

    /// Default `tracing` filter directive for this level.
    pub fn tracing_directive(&self) -> &'static str {
        match self {
            VerbosityLevel::Silent | VerbosityLevel::Summary => "error",
            VerbosityLevel::Detailed => "zeta=info",
            VerbosityLevel::Debug => "zeta=debug",
        }
    }
}

#[derive(Clone)]
pub struct ScanLogger {
    verbosity: VerbosityLevel,
    spinner: Arc<RwLock<Option<ProgressBar>>>,
    run_metadata: Arc<Mutex<RunMetadata>>,
    log_buffer: Arc<Mutex<Vec<String>>>,
    log_file_path: Option<String>,
}

#[derive(Default, Clone)]
struct RunMetadata {
    start_time: Option<SystemTime>,
    end_time: Option<SystemTime>,
    target_domain: String,
    sources_scanned: usize,
    sources_failed: usize,
    subdomains_found: usize,
    output_file: String,
}

impl ScanLogger {
    pub fn new(verbosity: VerbosityLevel) -> Self {
        Self {
            verbosity,
            spinner: Arc::new(RwLock::new(None)),
            run_metadata: Arc::new(Mutex::new(RunMetadata::default())),
            log_buffer: Arc::new(Mutex::new(Vec::new())),
            log_file_path: None,
        }
    }

    pub fn with_log_file(verbosity: VerbosityLevel, log_file_path: String) -> Self {
        Self {
            log_file_path: Some(log_file_path),
            ..Self::new(verbosity)
        }
    }

    pub fn info(&self, message: &str) {
        if self.verbosity >= VerbosityLevel::Summary {
            self.print_message("INFO", message);
        }
    }

    pub fn warn(&self, message: &str) {
        if self.verbosity >= VerbosityLevel::Detailed {
            self.print_message("WARN", message);
        }
    }

    pub fn error(&self, message: &str) {
        // Errors are shown regardless of verbosity
        self.print_message("ERROR", message);
    }

    pub fn debug(&self, message: &str) {
        if self.verbosity >= VerbosityLevel::Debug {
            self.print_message("DEBUG", message);
        }
    }

    fn print_message(&self, level: &str, message: &str) {
        let msg = format!("[{}] {}: {}", self.get_timestamp(), level, message);

        if self.log_file_path.is_some() {
            if let Ok(mut buffer) = self.log_buffer.lock() {
                buffer.push(msg.clone());
            }
        }

        // Print above an active spinner instead of through it
        if let Ok(guard) = self.spinner.try_read() {
            if let Some(pb) = guard.as_ref() {
                pb.println(msg);
                return;
            }
        }

        eprintln!("{}", msg);
    }

    fn get_timestamp(&self) -> String {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        let secs = now.as_secs();
        let millis = now.subsec_millis();

        let hours = (secs / 3600) % 24;
        let minutes = (secs % 3600) / 60;
        let seconds = secs % 60;

        format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
    }

    /// Show a transient spinner labelled `message` while a source runs.
    pub async fn start_spinner(&self, message: &str) {
        if self.verbosity == VerbosityLevel::Silent {
            return;
        }
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        let mut spinner_guard = self.spinner.write().await;
        if let Some(previous) = spinner_guard.replace(pb) {
            previous.finish_and_clear();
        }
    }

    pub async fn finish_spinner(&self) {
        let mut spinner_guard = self.spinner.write().await;
        if let Some(pb) = spinner_guard.take() {
            pb.finish_and_clear();
        }
    }

    pub fn record_run_start(&self, domain: &str) {
        if let Ok(mut metadata) = self.run_metadata.lock() {
            metadata.start_time = Some(SystemTime::now());
            metadata.target_domain = domain.to_string();
        }
    }

    pub fn record_run_end(&self) {
        if let Ok(mut metadata) = self.run_metadata.lock() {
            metadata.end_time = Some(SystemTime::now());
        }
    }

    pub fn record_source_result(&self, subdomain_count: usize, failed: bool) {
        if let Ok(mut metadata) = self.run_metadata.lock() {
            metadata.sources_scanned += 1;
            metadata.subdomains_found += subdomain_count;
            if failed {
                metadata.sources_failed += 1;
            }
        }
    }

    pub fn record_output_file(&self, path: &str) {
        if let Ok(mut metadata) = self.run_metadata.lock() {
            metadata.output_file = path.to_string();
        }
    }

    pub fn log_source_start(&self, label: &str, domain: &str) {
        self.debug(&format!("Starting {} scan for {}", label, domain));
    }

    pub fn log_source_complete(&self, label: &str, subdomain_count: usize, failed: bool) {
        self.record_source_result(subdomain_count, failed);
        if failed {
            self.warn(&format!("{} scan failed; see report for details", label));
        } else {
            self.debug(&format!("{} scan completed: {} subdomains", label, subdomain_count));
        }
    }

    pub fn log_export_success(&self, path: &str, count: usize) {
        self.record_output_file(path);
        self.info(&format!("Exported {} subdomains to {}", count, path));
    }

    pub fn print_final_summary(&self) {
        if self.verbosity < VerbosityLevel::Summary {
            return;
        }
        let Ok(metadata) = self.run_metadata.lock() else {
            return;
        };

        // Clear any remaining spinner artifacts
        print!("\x1b[2K\r");
        let _ = io::stdout().flush();

        println!("=== SCAN SUMMARY ===");
        println!("Target Domain: {}", metadata.target_domain);
        if let (Some(start), Some(end)) = (metadata.start_time, metadata.end_time) {
            let duration = end.duration_since(start).unwrap_or_default();
            println!("Scan Duration: {:.2}s", duration.as_secs_f64());
        }
        println!("Sources Scanned: {}", metadata.sources_scanned);
        println!("Sources Failed: {}", metadata.sources_failed);
        println!("Subdomains Found: {}", metadata.subdomains_found);
        if !metadata.output_file.is_empty() {
            println!("Results Exported: {}", metadata.output_file);
        }
        println!("====================\n");
    }

    /// Export all collected logs to the log file, if one was configured.
    pub fn export_logs(&self) -> io::Result<()> {
        let Some(ref log_file_path) = self.log_file_path else {
            return Ok(());
        };
        let Ok(buffer) = self.log_buffer.lock() else {
            return Ok(());
        };

        if let Some(parent) = Path::new(log_file_path).parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(log_file_path)?;

        for log_entry in buffer.iter() {
            writeln!(file, "{}", log_entry)?;
        }

        file.flush()
    }

    pub fn is_log_export_enabled(&self) -> bool {
        self.log_file_path.is_some()
    }

    pub fn get_log_count(&self) -> usize {
        self.log_buffer.lock().map(|b| b.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_from_count() {
        assert_eq!(VerbosityLevel::from_verbose_count(0), VerbosityLevel::Summary);
        assert_eq!(VerbosityLevel::from_verbose_count(1), VerbosityLevel::Detailed);
        assert_eq!(VerbosityLevel::from_verbose_count(5), VerbosityLevel::Debug);
    }

    #[test]
    fn test_messages_buffered_only_when_exporting() {
        let logger = ScanLogger::new(VerbosityLevel::Debug);
        logger.info("not buffered");
        assert_eq!(logger.get_log_count(), 0);

        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("logs").join("zeta.log");
        let logger = ScanLogger::with_log_file(VerbosityLevel::Summary, path.to_string_lossy().to_string());
        logger.info("first");
        logger.debug("filtered out at Summary");
        logger.error("second");
        assert_eq!(logger.get_log_count(), 2);

        logger.export_logs().unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("INFO: first"));
        assert!(content.contains("ERROR: second"));
        assert!(!content.contains("filtered out"));
    }

    #[test]
    fn test_source_results_accumulate() {
        let logger = ScanLogger::new(VerbosityLevel::Silent);
        logger.log_source_complete("Crt.sh", 4, false);
        logger.log_source_complete("Subdomainfinder.c99.nl", 0, true);

        let metadata = logger.run_metadata.lock().unwrap();
        assert_eq!(metadata.sources_scanned, 2);
        assert_eq!(metadata.sources_failed, 1);
        assert_eq!(metadata.subdomains_found, 4);
    }
}
