// Image extensions the detector batch picks up (compared lowercase)
pub const IMG_FORMATS: &[&str] = &["png", "jpg", "jpeg"];

// Annotation files the converter batch picks up
pub const ANNOTATION_EXTENSION: &str = "xml";

// YOLO label file extension
pub const LABEL_EXTENSION: &str = "txt";

/// Returns true when `path` has one of the detector's image extensions.
pub fn is_image_file(path: &std::path::Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMG_FORMATS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

// Per-run counters for the batch drivers
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProcessingStats {
    pub total_files_processed: usize,
    pub successful: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl ProcessingStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_total(&mut self) {
        self.total_files_processed += 1;
    }

    pub fn increment_successful(&mut self) {
        self.successful += 1;
    }

    pub fn increment_skipped(&mut self) {
        self.skipped += 1;
    }

    pub fn increment_failed(&mut self) {
        self.failed += 1;
    }

    pub fn print_summary(&self, label: &str) {
        log::info!("=== {} Summary ===", label);
        log::info!("Total files processed: {}", self.total_files_processed);
        log::info!("Successful: {}", self.successful);
        log::info!("Skipped: {}", self.skipped);
        log::info!("Failed: {}", self.failed);

        if self.failed > 0 {
            log::warn!(
                "{} of {} files failed, see the errors above",
                self.failed,
                self.total_files_processed
            );
        }
    }
}
