mod command;
mod process;

pub use command::ToolCommand;
pub use process::{DryRunExecutor, Executor, ProcessExecutor, StepFailed};

use crate::model::{DatasetProfile, DirState, RunConfig, RunEvent, RunReport, SkipReason, Step};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Whether the optional render step runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderDecision {
    Render(PathBuf),
    Skip(SkipReason),
}

/// Render only when a trajectory is named and present on disk right now.
pub fn render_decision(profile: &DatasetProfile) -> RenderDecision {
    match profile.trajectory.as_deref() {
        None => RenderDecision::Skip(SkipReason::NoTrajectory),
        Some(path) if path.exists() => RenderDecision::Render(path.to_path_buf()),
        Some(path) => RenderDecision::Skip(SkipReason::TrajectoryMissing(path.to_path_buf())),
    }
}

/// Create `path` and any missing parents. Returns whether it had to be created.
pub fn ensure_output_dir(path: &Path) -> Result<bool> {
    let existed = path.is_dir();
    std::fs::create_dir_all(path)
        .with_context(|| format!("create output directory {}", path.display()))?;
    Ok(!existed)
}

pub struct Runner {
    cfg: RunConfig,
}

impl Runner {
    pub fn new(cfg: RunConfig) -> Self {
        Self { cfg }
    }

    /// Train, then render if a trajectory is available.
    ///
    /// A non-zero exit from either step aborts the run with [`StepFailed`].
    pub async fn run<E: Executor>(
        &self,
        executor: &mut E,
        mut on_event: impl FnMut(RunEvent),
    ) -> Result<RunReport> {
        let cfg = &self.cfg;
        let started_utc = time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "now".into());

        let state = if cfg.dry_run {
            DirState::Planned
        } else if ensure_output_dir(&cfg.out_dir)? {
            DirState::Created
        } else {
            DirState::Existing
        };
        on_event(RunEvent::OutputDir {
            path: cfg.out_dir.clone(),
            state,
        });

        let train = ToolCommand::train(
            &cfg.tool,
            &cfg.profile.method,
            &cfg.profile.data,
            &cfg.out_dir,
        );
        let train_duration = run_step(executor, Step::Train, &train, &mut on_event).await?;

        let checkpoint = cfg.checkpoint_path();
        let render_duration = match render_decision(&cfg.profile) {
            RenderDecision::Render(trajectory) => {
                let render = ToolCommand::render(&cfg.tool, &checkpoint, &trajectory);
                Some(run_step(executor, Step::Render, &render, &mut on_event).await?)
            }
            RenderDecision::Skip(reason) => {
                log::debug!("render skipped for '{}': {reason:?}", cfg.key);
                on_event(RunEvent::RenderSkipped(reason));
                None
            }
        };

        Ok(RunReport {
            key: cfg.key.clone(),
            method: cfg.profile.method.clone(),
            output_dir: cfg.out_dir.clone(),
            checkpoint,
            started_utc,
            train_duration,
            rendered: render_duration.is_some(),
            render_duration,
            dry_run: cfg.dry_run,
        })
    }
}

async fn run_step<E: Executor>(
    executor: &mut E,
    step: Step,
    cmd: &ToolCommand,
    on_event: &mut impl FnMut(RunEvent),
) -> Result<Duration> {
    on_event(RunEvent::StepStarted {
        step,
        command: cmd.to_string(),
    });
    let start = Instant::now();
    let exit = executor.run(cmd).await?;
    let elapsed = start.elapsed();
    if !exit.success() {
        log::debug!("{step} step {exit} after {:?}", elapsed);
        return Err(StepFailed { step, exit }.into());
    }
    on_event(RunEvent::StepFinished { step, elapsed });
    Ok(elapsed)
}
