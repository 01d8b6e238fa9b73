use std::path::{Path, PathBuf};
use std::process::ExitCode;

use pdf_mantra::config::job::JobFile;
use pdf_mantra::config::merged::MergedConfig;
use pdf_mantra::config::{self};
use pdf_mantra::history::RecentFiles;
use pdf_mantra::ops::inspect;
use pdf_mantra::output::format_size;
use pdf_mantra::pipeline::job_runner::JobConfig;
use pdf_mantra::pipeline::orchestrator::run_all_jobs;

const USAGE: &str = "\
Usage: pdf_mantra <jobs.yaml>...
       pdf_mantra info <file.pdf> [--json]
       pdf_mantra recent [dir] [--clear]
  Merge, split, reorder, compress, rotate, watermark, number, protect and
  inspect PDF files according to job specifications.";

fn main() -> ExitCode {
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.is_empty() || args.iter().any(|a| a == "--help" || a == "-h") {
        eprintln!("{USAGE}");
        return if args.is_empty() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        };
    }

    if args.iter().any(|a| a == "--version" || a == "-V") {
        eprintln!("pdf_mantra {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    match args[0].as_str() {
        "info" => run_info(&args[1..]),
        "recent" => run_recent(&args[1..]),
        _ => run_job_files(&args),
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("pdf_mantra=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run_info(args: &[String]) -> ExitCode {
    let json = args.iter().any(|a| a == "--json");
    let Some(path) = args.iter().find(|a| !a.starts_with("--")) else {
        eprintln!("ERROR: info needs a PDF file");
        return ExitCode::FAILURE;
    };

    let info = match inspect::info(Path::new(path)) {
        Ok(info) => info,
        Err(e) => {
            eprintln!("ERROR: {path}: {e}");
            return ExitCode::FAILURE;
        }
    };

    if json {
        match serde_json::to_string_pretty(&info) {
            Ok(s) => println!("{s}"),
            Err(e) => {
                eprintln!("ERROR: {path}: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        print!("{info}");
    }
    ExitCode::SUCCESS
}

fn run_recent(args: &[String]) -> ExitCode {
    let clear = args.iter().any(|a| a == "--clear");
    let dir = args
        .iter()
        .find(|a| !a.starts_with("--"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    let settings = match config::load_settings_in(&dir) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("ERROR: Failed to load settings in {}: {e}", dir.display());
            return ExitCode::FAILURE;
        }
    };
    let history_path = config::history_path(&settings, &dir);

    let mut recent = match RecentFiles::load(&history_path, settings.history_limit) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("ERROR: {e}");
            return ExitCode::FAILURE;
        }
    };

    if clear {
        if let Err(e) = recent.clear() {
            eprintln!("ERROR: {e}");
            return ExitCode::FAILURE;
        }
        eprintln!("OK: cleared {}", history_path.display());
        return ExitCode::SUCCESS;
    }

    if recent.is_empty() {
        eprintln!("No recent files");
    }
    for entry in recent.entries() {
        let size = entry.size.map(format_size).unwrap_or_default();
        println!("{}\t{}\t{}", entry.name, size, entry.path.display());
    }
    ExitCode::SUCCESS
}

fn run_job_files(args: &[String]) -> ExitCode {
    // Collect job configs from every job file, keeping each file's worker count.
    let mut batches: Vec<(Vec<JobConfig>, usize)> = Vec::new();

    for job_file_arg in args {
        let job_file_path = Path::new(job_file_arg);

        // Load settings from the same directory as the job file.
        let settings = match config::load_settings_for_job(job_file_path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("ERROR: Failed to load settings for {job_file_arg}: {e}");
                return ExitCode::FAILURE;
            }
        };

        let yaml_content = match std::fs::read_to_string(job_file_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("ERROR: Failed to read job file {job_file_arg}: {e}");
                return ExitCode::FAILURE;
            }
        };

        let job_file: JobFile = match serde_yml::from_str(&yaml_content) {
            Ok(jf) => jf,
            Err(e) => {
                eprintln!("ERROR: Failed to parse job file {job_file_arg}: {e}");
                return ExitCode::FAILURE;
            }
        };

        // Resolve job file directory for relative paths.
        let job_dir = job_file_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();

        let configs = job_file
            .jobs
            .into_iter()
            .map(|job| JobConfig {
                merged: MergedConfig::new(&settings, &job, &job_dir),
                base_dir: job_dir.clone(),
                job,
            })
            .collect();
        batches.push((configs, settings.parallel_workers));
    }

    let mut has_error = false;
    for (configs, workers) in &batches {
        let results = run_all_jobs(configs, *workers);

        for (config, result) in configs.iter().zip(results) {
            match result {
                Ok(job_result) => {
                    if let Some(report) = &job_result.report {
                        print!("{report}");
                    }
                    eprintln!("OK: [{}] {}", job_result.operation, job_result.summary);
                    for notice in &job_result.notices {
                        eprintln!("NOTE: {notice}");
                    }
                }
                Err(e) => {
                    eprintln!(
                        "ERROR: [{}] {}: {e}",
                        config.job.operation(),
                        config.job.inputs().join(", ")
                    );
                    has_error = true;
                }
            }
        }
    }

    if has_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
