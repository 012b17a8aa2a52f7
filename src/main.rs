mod cli;
mod engine;
mod model;
mod profiles;
mod text_summary;

use clap::Parser;
use engine::StepFailed;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = cli::Cli::parse();
    let code = match cli::run(args).await {
        Ok(()) => 0,
        Err(e) => exit_code_for(&e),
    };
    std::process::exit(code);
}

/// Map a run error to the process exit code, printing it on the way.
fn exit_code_for(e: &anyhow::Error) -> i32 {
    if let Some(usage) = e.downcast_ref::<clap::Error>() {
        usage.exit();
    }
    if let Some(failed) = e.downcast_ref::<StepFailed>() {
        // The tool has already printed its own diagnostics; mirror its status.
        eprintln!("{failed}");
        return failed.exit_code();
    }
    eprintln!("Error: {e:#}");
    1
}
