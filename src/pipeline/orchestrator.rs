// 全ジョブ実行

use tracing::{debug, warn};

use crate::history::RecentFiles;
use crate::pipeline::job_runner::{JobConfig, JobResult, run_job_with_progress};
use crate::pipeline::progress::ProgressTracker;

/// Run multiple jobs in order, collecting results.
///
/// Jobs run inside a rayon pool of `workers` threads (0 = one per CPU) so that
/// the parallel parts of each operation share one pool. One job failure does
/// NOT prevent other jobs from running.
pub fn run_all_jobs(jobs: &[JobConfig], workers: usize) -> Vec<crate::error::Result<JobResult>> {
    match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
        Ok(pool) => pool.install(|| run_sequential(jobs)),
        Err(e) => {
            warn!(error = %e, "could not build worker pool, using the global pool");
            run_sequential(jobs)
        }
    }
}

fn run_sequential(jobs: &[JobConfig]) -> Vec<crate::error::Result<JobResult>> {
    let mut tracker = ProgressTracker::new();
    jobs.iter()
        .map(|config| {
            tracker.reset();
            let result = run_job_with_progress(config, &mut tracker);
            debug!(
                operation = config.job.operation(),
                status = ?tracker.status(),
                "job finished"
            );
            if let Ok(job_result) = &result {
                record_history(config, job_result);
            }
            result
        })
        .collect()
}

/// Add every written file to the recent-files history. Failures are only logged.
fn record_history(config: &JobConfig, result: &JobResult) {
    let Some(history_file) = &config.merged.history_file else {
        return;
    };
    if result.outputs.is_empty() {
        return;
    }

    let recorded = RecentFiles::load(history_file, config.merged.history_limit).and_then(|mut recent| {
        for output in &result.outputs {
            recent.add(&output.path, Some(output.size))?;
        }
        Ok(())
    });
    if let Err(e) = recorded {
        warn!(path = %history_file.display(), error = %e, "failed to update recent files");
    }
}
