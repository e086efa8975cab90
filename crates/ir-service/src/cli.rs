//! Command-line interface for the `inforedact` binary.

use crate::runner::RedactionService;
use clap::{Parser, Subcommand};
use ir_common::Result;
use ir_core::{Collaborators, DetectorOutagePolicy, PipelineConfig, RedactionPipeline};
use ir_policy::RedactionPolicy;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "inforedact", version, about = "Policy-driven document redaction")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Redact one document in the foreground.
    Run {
        /// Input document container.
        input: PathBuf,

        /// Redacted output path. Defaults to `<input stem>_redacted.<ext>`.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Policy override file (YAML).
        #[arg(long, env = "INFOREDACT_POLICY")]
        policy: Option<PathBuf>,

        /// Audit log path. Defaults to `<output stem>_log.json`.
        #[arg(long)]
        log: Option<PathBuf>,

        /// Abort instead of continuing on pattern matching alone when
        /// the entity detector is unavailable.
        #[arg(long)]
        fail_on_detector_outage: bool,
    },

    /// Submit several documents as background jobs and wait for all.
    Batch {
        /// Input document containers.
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Working directory for uploads and results.
        #[arg(long, default_value = "inforedact-work")]
        work_dir: PathBuf,

        /// Policy override file (YAML).
        #[arg(long, env = "INFOREDACT_POLICY")]
        policy: Option<PathBuf>,

        /// Per-job timeout in seconds.
        #[arg(long, default_value_t = 300)]
        timeout: u64,
    },

    /// Inspect the effective redaction policy.
    Policy {
        #[command(subcommand)]
        command: PolicyCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum PolicyCommand {
    /// Print the effective policy (defaults plus overrides) as JSON.
    Show {
        /// Policy override file (YAML).
        #[arg(long, env = "INFOREDACT_POLICY")]
        policy: Option<PathBuf>,
    },
}

pub fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run {
            input,
            output,
            policy,
            log,
            fail_on_detector_outage,
        } => run_one(
            &input,
            output,
            policy,
            log,
            fail_on_detector_outage,
        ),
        Command::Batch {
            inputs,
            work_dir,
            policy,
            timeout,
        } => run_batch(&inputs, &work_dir, policy, Duration::from_secs(timeout)),
        Command::Policy {
            command: PolicyCommand::Show { policy },
        } => show_policy(policy),
    }
}

fn run_one(
    input: &Path,
    output: Option<PathBuf>,
    policy_path: Option<PathBuf>,
    log_path: Option<PathBuf>,
    fail_on_detector_outage: bool,
) -> Result<()> {
    let output = output.unwrap_or_else(|| suffixed(input, "_redacted"));
    let log_path = log_path.unwrap_or_else(|| {
        let mut path = suffixed(&output, "_log");
        path.set_extension("json");
        path
    });

    let policy = RedactionPolicy::load(policy_path.as_deref());
    let config = PipelineConfig {
        detector_outage: if fail_on_detector_outage {
            DetectorOutagePolicy::Fail
        } else {
            DetectorOutagePolicy::PassThrough
        },
    };

    let mut pipeline =
        RedactionPipeline::with_config(input, policy, Collaborators::default(), config);
    let log = pipeline.process(&output)?;
    pipeline.save_log(&log_path)?;

    info!(output = %output.display(), "redacted document written");
    println!(
        "{}: {} redactions across {} categories, {} visual elements",
        output.display(),
        log.metrics.total_redactions,
        log.metrics.unique_categories,
        log.metrics.total_visual_elements,
    );
    Ok(())
}

fn run_batch(
    inputs: &[PathBuf],
    work_dir: &Path,
    policy_path: Option<PathBuf>,
    timeout: Duration,
) -> Result<()> {
    let service = RedactionService::new(work_dir)?;

    let mut job_ids = Vec::with_capacity(inputs.len());
    for input in inputs {
        let job_id = service.submit(input)?;
        service.start(
            &job_id,
            RedactionPolicy::load(policy_path.as_deref()),
            Collaborators::default(),
            PipelineConfig::default(),
        )?;
        job_ids.push((input, job_id));
    }

    let mut failures = 0;
    for (input, job_id) in &job_ids {
        let status = service.wait(job_id, timeout)?;
        match status.error {
            None => {
                println!("{}  {}  {}", job_id, status.state, input.display());
                for file in &status.result_files {
                    println!("    {}", file.display());
                }
            }
            Some(error) => {
                failures += 1;
                println!("{}  {}  {}: {}", job_id, status.state, input.display(), error);
            }
        }
    }

    if failures > 0 {
        return Err(ir_common::Error::Service(format!(
            "{} of {} jobs failed",
            failures,
            job_ids.len()
        )));
    }
    Ok(())
}

fn show_policy(policy_path: Option<PathBuf>) -> Result<()> {
    let policy = RedactionPolicy::load(policy_path.as_deref());
    println!("{}", serde_json::to_string_pretty(&policy)?);
    Ok(())
}

/// `scan.json` + `_redacted` → `scan_redacted.json`.
fn suffixed(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let name = match path.extension() {
        Some(ext) => format!("{}{}.{}", stem, suffix, ext.to_string_lossy()),
        None => format!("{}{}", stem, suffix),
    };
    path.with_file_name(name)
}
