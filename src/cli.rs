use crate::engine::{DryRunExecutor, ProcessExecutor, Runner};
use crate::model::{RunConfig, RunEvent};
use crate::profiles::{ProfileTable, DEFAULT_TOOL};
use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use std::path::PathBuf;

#[derive(Debug, Parser, Clone)]
#[command(
    name = "nerf-runner",
    version,
    about = "Train (and optionally render) a configured dataset with nerfbaselines"
)]
pub struct Cli {
    /// Dataset profile to run (defaults to the table's default key)
    #[arg(long, value_name = "KEY")]
    pub select: Option<String>,

    /// JSON profile table to use instead of the built-in profiles
    #[arg(long, env = "NERF_RUNNER_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Executable to invoke for train/render
    #[arg(long, env = "NERF_RUNNER_TOOL", value_name = "PROGRAM")]
    pub tool: Option<String>,

    /// List configured profiles and exit
    #[arg(long)]
    pub list: bool,

    /// Print the commands that would run without creating directories or launching anything
    #[arg(long)]
    pub dry_run: bool,

    /// Print the run report (or profile listing) as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: Cli) -> Result<()> {
    let table = load_table(&args)?;

    if args.list {
        return list_profiles(&table, args.json);
    }

    let cfg = build_config(&args, &table)?;
    log::info!(
        "profile '{}': method={} data={} out={} tool={}",
        cfg.key,
        cfg.profile.method,
        cfg.profile.data.display(),
        cfg.out_dir.display(),
        cfg.tool
    );

    // In JSON mode stdout carries only the report; progress goes to stderr.
    let json = args.json;
    let print_event = move |ev: RunEvent| {
        if json {
            eprintln!("{}", ev.to_message());
        } else {
            println!("{}", ev.to_message());
        }
    };

    let runner = Runner::new(cfg);
    let report = if args.dry_run {
        runner.run(&mut DryRunExecutor, print_event).await?
    } else {
        let mut executor = ProcessExecutor::new().child_stdout_to_stderr(json);
        runner.run(&mut executor, print_event).await?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for line in crate::text_summary::build_text_summary(&report).lines {
            println!("{line}");
        }
    }
    Ok(())
}

fn load_table(args: &Cli) -> Result<ProfileTable> {
    match args.config.as_deref() {
        Some(path) => ProfileTable::from_path(path)
            .with_context(|| format!("failed to load profiles from {}", path.display())),
        None => Ok(ProfileTable::builtin()),
    }
}

/// Build a `RunConfig` from CLI arguments and the profile table.
///
/// An unknown `--select` key is reported as a clap usage error.
pub fn build_config(args: &Cli, table: &ProfileTable) -> Result<RunConfig> {
    let key = args
        .select
        .clone()
        .unwrap_or_else(|| table.default_key().to_string());

    let (Some(profile), Some(out_dir)) = (table.get(&key), table.resolve_output_dir(&key)) else {
        let err = Cli::command().error(
            clap::error::ErrorKind::InvalidValue,
            format!(
                "invalid value '{key}' for '--select <KEY>' (possible values: {})",
                table.keys().collect::<Vec<_>>().join(", ")
            ),
        );
        return Err(err.into());
    };

    let tool = args
        .tool
        .clone()
        .filter(|t| !t.trim().is_empty())
        .or_else(|| table.tool().map(str::to_string))
        .unwrap_or_else(|| DEFAULT_TOOL.to_string());

    Ok(RunConfig {
        key,
        profile: profile.clone(),
        out_dir,
        tool,
        dry_run: args.dry_run,
    })
}

fn list_profiles(table: &ProfileTable, json: bool) -> Result<()> {
    if json {
        let rows = crate::text_summary::profile_summaries(table);
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        for line in crate::text_summary::build_profile_listing(table).lines {
            println!("{line}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    /// Built directly so `NERF_RUNNER_*` variables in the test environment cannot leak in.
    fn args(select: Option<&str>, tool: Option<&str>) -> Cli {
        Cli {
            select: select.map(str::to_string),
            config: None,
            tool: tool.map(str::to_string),
            list: false,
            dry_run: false,
            json: false,
        }
    }

    #[test]
    fn defaults_to_table_default_key() {
        let cfg = build_config(&args(None, None), &ProfileTable::builtin()).unwrap();
        assert_eq!(cfg.key, "sculpture");
        assert_eq!(cfg.out_dir, Path::new("outputs/drone-sculpture"));
        assert_eq!(cfg.tool, DEFAULT_TOOL);
        assert_eq!(
            cfg.checkpoint_path(),
            Path::new("outputs/drone-sculpture/checkpoint.ckpt")
        );
    }

    #[test]
    fn selects_trevi() {
        let cfg = build_config(&args(Some("trevi"), None), &ProfileTable::builtin()).unwrap();
        assert_eq!(cfg.profile.method, "wild-gaussians");
        assert_eq!(cfg.profile.data, Path::new("datasets/phototourism/trevi-fountain"));
        assert_eq!(cfg.out_dir, Path::new("outputs/trevi"));
        assert_eq!(cfg.profile.trajectory, None);
    }

    #[test]
    fn unknown_key_is_a_usage_error() {
        let err = build_config(&args(Some("garden"), None), &ProfileTable::builtin()).unwrap_err();
        let usage = err.downcast_ref::<clap::Error>().unwrap();
        assert_eq!(usage.exit_code(), 2);
        let msg = usage.to_string();
        assert!(msg.contains("garden"));
        assert!(msg.contains("custom, sculpture, trevi"));
    }

    #[test]
    fn tool_precedence_cli_then_file_then_default() {
        let table = ProfileTable::from_json(
            r#"{ "tool": "nb-from-file", "profiles": { "a": { "method": "m", "data": "d" } } }"#,
        )
        .unwrap();
        let from_file = build_config(&args(Some("a"), None), &table).unwrap();
        assert_eq!(from_file.tool, "nb-from-file");

        let from_cli = build_config(&args(None, Some("./nb")), &table).unwrap();
        assert_eq!(from_cli.tool, "./nb");
        assert_eq!(from_cli.out_dir, Path::new("outputs").join("a"));

        let blank_cli = build_config(&args(None, Some("  ")), &table).unwrap();
        assert_eq!(blank_cli.tool, "nb-from-file");

        let builtin = build_config(&args(Some("trevi"), None), &ProfileTable::builtin()).unwrap();
        assert_eq!(builtin.tool, DEFAULT_TOOL);
    }

    #[test]
    fn parses_flags() {
        let args =
            Cli::try_parse_from(["nerf-runner", "--list", "--json", "--dry-run", "--select", "x"])
                .unwrap();
        assert!(args.list && args.json && args.dry_run);
        assert_eq!(args.select.as_deref(), Some("x"));
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
