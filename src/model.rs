use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// File the trainer leaves in the output directory; the render step reads it back.
pub const CHECKPOINT_FILE: &str = "checkpoint.ckpt";

/// One dataset entry of the profile table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetProfile {
    pub method: String,
    pub data: PathBuf,
    pub output: Option<PathBuf>,
    pub trajectory: Option<PathBuf>,
}

impl DatasetProfile {
    pub fn new(method: impl Into<String>, data: impl Into<PathBuf>) -> Self {
        Self {
            method: method.into(),
            data: data.into(),
            output: None,
            trajectory: None,
        }
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }
}

/// Everything the runner needs for a single invocation, resolved up front.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub key: String,
    pub profile: DatasetProfile,
    pub out_dir: PathBuf,
    pub tool: String,
    pub dry_run: bool,
}

impl RunConfig {
    pub fn checkpoint_path(&self) -> PathBuf {
        self.out_dir.join(CHECKPOINT_FILE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Train,
    Render,
}

impl Step {
    /// Subcommand name understood by the external tool.
    pub fn as_subcommand(self) -> &'static str {
        match self {
            Step::Train => "train",
            Step::Render => "render",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_subcommand())
    }
}

/// What happened to the output directory before training.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirState {
    Created,
    Existing,
    /// Dry run: the directory was resolved but not touched.
    Planned,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NoTrajectory,
    TrajectoryMissing(PathBuf),
}

/// Progress notifications emitted by the runner and rendered by the CLI layer.
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    OutputDir { path: PathBuf, state: DirState },
    StepStarted { step: Step, command: String },
    StepFinished { step: Step, elapsed: Duration },
    RenderSkipped(SkipReason),
}

impl RunEvent {
    /// Render a human-readable message for the console.
    pub fn to_message(&self) -> String {
        match self {
            RunEvent::OutputDir { path, state } => match state {
                DirState::Created => format!("Created output directory {}", path.display()),
                DirState::Existing => format!("Using existing output directory {}", path.display()),
                DirState::Planned => format!("Output directory would be {}", path.display()),
            },
            // Leading blank line separates the echo from the previous tool's output.
            RunEvent::StepStarted { command, .. } => format!("\n$ {command}"),
            RunEvent::StepFinished { step, elapsed } => format!(
                "{step} finished in {}",
                humantime::format_duration(round_to_secs(*elapsed))
            ),
            RunEvent::RenderSkipped(SkipReason::NoTrajectory) => {
                "Render step skipped (no trajectory).".to_string()
            }
            RunEvent::RenderSkipped(SkipReason::TrajectoryMissing(path)) => format!(
                "Render step skipped (trajectory {} not found).",
                path.display()
            ),
        }
    }
}

/// Outcome of a successful run, printed as text or JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub key: String,
    pub method: String,
    pub output_dir: PathBuf,
    pub checkpoint: PathBuf,
    pub started_utc: String,
    #[serde(with = "humantime_serde")]
    pub train_duration: Duration,
    pub rendered: bool,
    #[serde(default, with = "humantime_serde")]
    pub render_duration: Option<Duration>,
    #[serde(default)]
    pub dry_run: bool,
}

/// Row of the `--list` output.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileSummary {
    pub key: String,
    pub is_default: bool,
    pub method: String,
    pub data: PathBuf,
    pub output_dir: PathBuf,
    pub trajectory: Option<PathBuf>,
}

/// Sub-second precision is noise for multi-hour training runs.
pub fn round_to_secs(d: Duration) -> Duration {
    if d < Duration::from_secs(1) {
        Duration::from_millis(d.as_millis() as u64)
    } else {
        Duration::from_secs(d.as_secs())
    }
}
