// ジョブ単位: パス解決 -> 操作の実行 -> 結果の集約

use std::path::PathBuf;

use tracing::{debug, info};

use crate::config::job::Job;
use crate::config::merged::MergedConfig;
use crate::config::resolve_path;
use crate::ops;
use crate::ops::rotate::RotationPlan;
use crate::output::ProcessResult;
use crate::pipeline::progress::ProgressTracker;

/// Configuration for a single job.
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub job: Job,
    /// Directory of the job file; relative paths in the job resolve against it.
    pub base_dir: PathBuf,
    pub merged: MergedConfig,
}

/// Result of processing a single job.
#[derive(Debug, Clone)]
pub struct JobResult {
    pub operation: &'static str,
    pub inputs: Vec<PathBuf>,
    /// Files written by the job (empty for read-only operations).
    pub outputs: Vec<ProcessResult>,
    /// One-line description for the `OK:` line.
    pub summary: String,
    /// Multi-line report printed on stdout (`info`).
    pub report: Option<String>,
    /// Warnings the user should see even when the job succeeded.
    pub notices: Vec<String>,
}

impl JobResult {
    fn new(operation: &'static str, inputs: Vec<PathBuf>) -> Self {
        Self {
            operation,
            inputs,
            outputs: Vec::new(),
            summary: String::new(),
            report: None,
            notices: Vec::new(),
        }
    }
}

impl JobConfig {
    fn input(&self, path: &str) -> PathBuf {
        resolve_path(&self.base_dir, path)
    }

    /// Explicit output relative to the job file, otherwise the default name in `output_dir`.
    fn output_path(&self) -> PathBuf {
        match (self.job.output(), self.job.default_output_name()) {
            (Some(explicit), _) => resolve_path(&self.base_dir, explicit),
            (None, Some(name)) => self.merged.output_dir.join(name),
            (None, None) => self.merged.output_dir.clone(),
        }
    }
}

/// Run one job with a fresh progress tracker.
pub fn run_job(config: &JobConfig) -> crate::error::Result<JobResult> {
    let mut tracker = ProgressTracker::new();
    run_job_with_progress(config, &mut tracker)
}

/// Run one job, reporting progress into `tracker`.
///
/// On failure the tracker ends in the error state with the error message.
pub fn run_job_with_progress(
    config: &JobConfig,
    tracker: &mut ProgressTracker,
) -> crate::error::Result<JobResult> {
    tracker.start();
    debug!(operation = config.job.operation(), base_dir = %config.base_dir.display(), "starting job");

    let outcome = dispatch(config, tracker);
    match &outcome {
        Ok(result) => {
            tracker.complete();
            info!(operation = result.operation, "{}", result.summary);
        }
        Err(e) => tracker.fail(e.to_string()),
    }
    outcome
}

fn dispatch(config: &JobConfig, tracker: &mut ProgressTracker) -> crate::error::Result<JobResult> {
    let operation = config.job.operation();

    match &config.job {
        Job::Merge(job) => {
            let inputs: Vec<PathBuf> = job.inputs.iter().map(|p| config.input(p)).collect();
            let output = config.output_path();
            let merged = ops::merge::merge(&inputs, &output, &mut |p| tracker.update(p))?;

            let mut result = JobResult::new(operation, inputs);
            result.summary = format!(
                "merged {} files -> {} ({})",
                result.inputs.len(),
                merged.path.display(),
                merged.size_formatted
            );
            result.outputs.push(merged);
            Ok(result)
        }

        Job::Split(job) => {
            let input = config.input(&job.input);
            let prefix = job.output_prefix.as_deref().unwrap_or("split");
            let parts = ops::split::split(&input, &job.ranges, &config.merged.output_dir, prefix)?;

            let mut result = JobResult::new(operation, vec![input]);
            result.summary = format!(
                "split into {} files in {}",
                parts.len(),
                config.merged.output_dir.display()
            );
            result.outputs = parts;
            Ok(result)
        }

        Job::Reorder(job) => {
            let input = config.input(&job.input);
            let output = config.output_path();
            let written = ops::reorder::reorder(&input, &job.order, &output)?;
            Ok(single_output(operation, input, written, "reordered"))
        }

        Job::Compress(job) => {
            let input = config.input(&job.input);
            let output = config.output_path();
            let report = ops::compress::compress(&input, &output, config.merged.compress_quality)?;

            let mut result = JobResult::new(operation, vec![input]);
            result.summary = format!("{} -> {}", report.summary(), report.result.path.display());
            if report.already_optimized() {
                result
                    .notices
                    .push("the document may already be optimized or contain mostly text".to_string());
            }
            result.outputs.push(report.result);
            Ok(result)
        }

        Job::Rotate(job) => {
            let input = config.input(&job.input);
            let output = config.output_path();
            let (written, rotations) =
                ops::rotate::rotate(&input, &output, &RotationPlan::from(job))?;
            let mut result = single_output(operation, input, written, "rotated");
            result.summary = format!("{} ({} pages)", result.summary, rotations.len());
            Ok(result)
        }

        Job::Watermark(job) => {
            let input = config.input(&job.input);
            let output = config.output_path();
            let written =
                ops::watermark::watermark(&input, &output, &job.text, job.position, job.opacity)?;
            Ok(single_output(operation, input, written, "watermarked"))
        }

        Job::PageNumbers(job) => {
            let input = config.input(&job.input);
            let output = config.output_path();
            let written =
                ops::page_numbers::add_page_numbers(&input, &output, job.position, &job.format)?;
            Ok(single_output(operation, input, written, "numbered"))
        }

        Job::ImageToPdf(job) => {
            let images: Vec<PathBuf> = job.images.iter().map(|p| config.input(p)).collect();
            let output = config.output_path();
            let report =
                ops::image_to_pdf::images_to_pdf(&images, &output, &mut |p| tracker.update(p))?;

            let mut result = JobResult::new(operation, images);
            result.summary = format!(
                "{} images -> {} ({})",
                report.embedded,
                report.result.path.display(),
                report.result.size_formatted
            );
            result.notices = report
                .skipped
                .iter()
                .map(|p| format!("skipped unsupported image {}", p.display()))
                .collect();
            result.outputs.push(report.result);
            Ok(result)
        }

        Job::Protect(job) => {
            let input = config.input(&job.input);
            let output = config.output_path();
            let written = ops::protect::protect(&input, &output, &job.password, &job.confirm_password)?;
            let mut result = single_output(operation, input, written, "protected");
            result
                .notices
                .push(ops::protect::ENCRYPTION_NOTICE.to_string());
            Ok(result)
        }

        Job::Unlock(job) => {
            let input = config.input(&job.input);
            let output = config.output_path();
            let written = ops::protect::unlock(&input, &output, &job.password)?;
            Ok(single_output(operation, input, written, "unlocked"))
        }

        Job::Info(job) => {
            let input = config.input(&job.input);
            let doc_info = ops::inspect::info(&input)?;

            let mut result = JobResult::new(operation, vec![input]);
            result.summary = format!(
                "{}: {} pages, {}",
                doc_info.file_name, doc_info.metadata.page_count, doc_info.file_size_formatted
            );
            result.report = Some(doc_info.to_string());
            Ok(result)
        }

        Job::ExtractText(job) => {
            let input = config.input(&job.input);
            let output = config.output_path();
            let extraction = ops::inspect::extract_text(&input, &output)?;

            let mut result = JobResult::new(operation, vec![input]);
            result.summary = format!(
                "text from {} of {} pages -> {}",
                extraction.pages_with_text,
                extraction.page_count,
                extraction.result.path.display()
            );
            if extraction.pages_with_text == 0 {
                result
                    .notices
                    .push("no text layer found; scanned pages need OCR".to_string());
            }
            result.outputs.push(extraction.result);
            Ok(result)
        }

        Job::ExtractImages(job) => {
            let input = config.input(&job.input);
            let output_dir = job.output_dir.as_deref().map(|d| config.input(d));
            let analysis = ops::inspect::extract_images(&input, output_dir.as_deref())?;

            let mut result = JobResult::new(operation, vec![input]);
            result.summary = format!(
                "found {} images on {} pages",
                analysis.total_images(),
                analysis.page_count
            );
            if let Some(dir) = &output_dir {
                result.summary = format!(
                    "{}, wrote {} to {}",
                    result.summary,
                    analysis.written.len(),
                    dir.display()
                );
            }
            if !analysis.skipped.is_empty() {
                result.notices.push(format!(
                    "{} images use unsupported encodings and were not written",
                    analysis.skipped.len()
                ));
            }
            result.outputs = analysis
                .written
                .iter()
                .map(|p| ProcessResult::from_file(p))
                .collect();
            Ok(result)
        }
    }
}

fn single_output(
    operation: &'static str,
    input: PathBuf,
    written: ProcessResult,
    verb: &str,
) -> JobResult {
    let mut result = JobResult::new(operation, vec![input]);
    result.summary = format!(
        "{verb} {} -> {} ({})",
        result.inputs[0].display(),
        written.path.display(),
        written.size_formatted
    );
    result.outputs.push(written);
    result
}
