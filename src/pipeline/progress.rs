// file: src/pipeline/progress.rs
// description: progress tracking and statistics reporting for pipeline execution
// reference: uses indicatif for progress bars and tracks processing metrics

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Instant;

#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    pub documents_complete: usize,
    pub documents_partial: usize,
    pub documents_failed: usize,
    pub chunks_extracted: usize,
    pub service_calls: u32,
    pub duration_secs: u64,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn documents_total(&self) -> usize {
        self.documents_complete + self.documents_partial + self.documents_failed
    }

    pub fn documents_per_second(&self) -> f64 {
        if self.duration_secs == 0 {
            return 0.0;
        }
        self.documents_total() as f64 / self.duration_secs as f64
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.documents_total();
        if total == 0 {
            return 0.0;
        }
        ((self.documents_complete + self.documents_partial) as f64 / total as f64) * 100.0
    }
}

pub struct ProgressTracker {
    main_bar: ProgressBar,
    detail_bar: ProgressBar,
    documents_complete: Arc<AtomicUsize>,
    documents_partial: Arc<AtomicUsize>,
    documents_failed: Arc<AtomicUsize>,
    chunks_extracted: Arc<AtomicUsize>,
    service_calls: Arc<AtomicU32>,
    start_time: Instant,
}

impl ProgressTracker {
    pub fn new(total_documents: usize) -> Self {
        Self::with_color(total_documents, true)
    }

    pub fn with_color(total_documents: usize, colored: bool) -> Self {
        let multi_progress = MultiProgress::new();

        let main_bar = create_progress_bar(&multi_progress, total_documents as u64, colored);
        let detail_bar = create_detail_bar(&multi_progress);

        Self {
            main_bar,
            detail_bar,
            documents_complete: Arc::new(AtomicUsize::new(0)),
            documents_partial: Arc::new(AtomicUsize::new(0)),
            documents_failed: Arc::new(AtomicUsize::new(0)),
            chunks_extracted: Arc::new(AtomicUsize::new(0)),
            service_calls: Arc::new(AtomicU32::new(0)),
            start_time: Instant::now(),
        }
    }

    pub fn inc_complete(&self) {
        self.documents_complete.fetch_add(1, Ordering::SeqCst);
        self.main_bar.inc(1);
        self.update_detail_bar();
    }

    pub fn inc_partial(&self) {
        self.documents_partial.fetch_add(1, Ordering::SeqCst);
        self.main_bar.inc(1);
        self.update_detail_bar();
    }

    pub fn inc_failed(&self) {
        self.documents_failed.fetch_add(1, Ordering::SeqCst);
        self.main_bar.inc(1);
        self.update_detail_bar();
    }

    pub fn add_chunks(&self, chunks: usize) {
        self.chunks_extracted.fetch_add(chunks, Ordering::SeqCst);
    }

    pub fn add_service_calls(&self, calls: u32) {
        self.service_calls.fetch_add(calls, Ordering::SeqCst);
    }

    pub fn set_message(&self, message: String) {
        self.detail_bar.set_message(message);
    }

    pub fn finish(&self) {
        self.main_bar.finish_with_message("Processing complete");
        self.detail_bar.finish_and_clear();
    }

    pub fn get_stats(&self) -> PipelineStats {
        let duration = self.start_time.elapsed().as_secs();

        PipelineStats {
            documents_complete: self.documents_complete.load(Ordering::SeqCst),
            documents_partial: self.documents_partial.load(Ordering::SeqCst),
            documents_failed: self.documents_failed.load(Ordering::SeqCst),
            chunks_extracted: self.chunks_extracted.load(Ordering::SeqCst),
            service_calls: self.service_calls.load(Ordering::SeqCst),
            duration_secs: duration,
        }
    }

    fn update_detail_bar(&self) {
        let complete = self.documents_complete.load(Ordering::SeqCst);
        let partial = self.documents_partial.load(Ordering::SeqCst);
        let failed = self.documents_failed.load(Ordering::SeqCst);

        let message = format!(
            "Complete: {} | Partial: {} | Failed: {}",
            complete, partial, failed
        );

        self.detail_bar.set_message(message);
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        self.finish();
    }
}

fn create_progress_bar(multi_progress: &MultiProgress, total: u64, colored: bool) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(total));
    if colored {
        bar.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
                )
                .expect("Failed to create progress bar template")
                .progress_chars("█▓▒░"),
        );
    } else {
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({eta}) {msg}")
                .expect("Failed to create progress bar template")
                .progress_chars("=>-"),
        );
    }
    bar
}

fn create_detail_bar(multi_progress: &MultiProgress) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(0));
    let style = ProgressStyle::default_bar()
        .template("{msg}")
        .expect("Failed to create detail bar template");
    bar.set_style(style);
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_stats_calculations() {
        let mut stats = PipelineStats::new();
        stats.documents_complete = 80;
        stats.documents_partial = 10;
        stats.documents_failed = 10;
        stats.duration_secs = 10;

        assert_eq!(stats.documents_total(), 100);
        assert_eq!(stats.documents_per_second(), 10.0);
        assert!((stats.success_rate() - 90.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_pipeline_stats_zero_duration() {
        let stats = PipelineStats::new();
        assert_eq!(stats.documents_per_second(), 0.0);
        assert_eq!(stats.success_rate(), 0.0);
    }

    #[test]
    fn test_progress_tracker_counts_by_status() {
        let tracker = ProgressTracker::with_color(10, false);

        tracker.inc_complete();
        tracker.inc_partial();
        tracker.inc_failed();
        tracker.add_chunks(4);
        tracker.add_service_calls(7);

        let stats = tracker.get_stats();
        assert_eq!(stats.documents_complete, 1);
        assert_eq!(stats.documents_partial, 1);
        assert_eq!(stats.documents_failed, 1);
        assert_eq!(stats.chunks_extracted, 4);
        assert_eq!(stats.service_calls, 7);
    }
}
