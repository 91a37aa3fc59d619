use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, IsTerminal};
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

mod apply;
mod cli;
mod history;
mod plan;
mod redo;
mod rule_spec;
mod status;
mod undo;
mod workspace;

#[cfg(test)]
mod test_lock_signals;

use cli::{Cli, Commands};

fn main() {
    let interrupted = Arc::new(AtomicBool::new(false));

    let interrupted_clone = Arc::clone(&interrupted);
    ctrlc::set_handler(move || {
        eprintln!("\nReceived SIGINT. Cleaning up...");
        interrupted_clone.store(true, Ordering::SeqCst);
    })
    .expect("Error setting SIGINT handler");

    let interrupted_clone = Arc::clone(&interrupted);
    unsafe {
        signal_hook::low_level::register(signal_hook::consts::SIGTERM, move || {
            eprintln!("\nReceived SIGTERM. Cleaning up...");
            interrupted_clone.store(true, Ordering::SeqCst);
        })
        .expect("Error setting SIGTERM handler");
    }

    let cli = Cli::parse();
    let use_color = !cli.no_color && io::stdout().is_terminal();

    if let Some(ref dir) = cli.directory {
        if let Err(e) = std::env::set_current_dir(dir).with_context(|| format!("failed to change to directory: {}", dir.display())) {
            eprintln!("Error: {e:#}");
            process::exit(2);
        }
    }

    let result = dispatch(cli.command, use_color, Arc::clone(&interrupted));

    if interrupted.load(Ordering::SeqCst) {
        eprintln!("Operation interrupted, cleaning up...");
        process::exit(130);
    }

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(2);
        },
    }
}

fn dispatch(command: Commands, use_color: bool, interrupted: Arc<AtomicBool>) -> Result<i32> {
    match command {
        Commands::Plan { target, plan_out, only_rules, dry_run, output_fullname, output, preview, format, quiet } => {
            plan::handle_plan(&target, &plan_out, only_rules, dry_run, output_fullname, output, preview, format, quiet, use_color)
        },
        Commands::Apply { plan, in_place, target, continue_on_error, dry_run, format, quiet } => {
            apply::handle_apply(plan, in_place, &target, continue_on_error, dry_run, format, quiet, interrupted)
        },
        Commands::Undo { id, format } => undo::handle_undo(&id, format, interrupted),
        Commands::Redo { id, format } => redo::handle_redo(&id, format, interrupted),
        Commands::Status { format } => status::handle_status(format),
        Commands::History { limit, format } => history::handle_history(limit, format),
        Commands::TestLock { delay } => handle_test_lock(delay, interrupted).map(|()| 0),
    }
}

/// Acquires the lock and holds it for `delay` milliseconds, checking for
/// interruption between sleeps. Exists so the signal-handling integration
/// tests have something to send SIGINT/SIGTERM at mid-operation.
fn handle_test_lock(delay: u64, interrupted: Arc<AtomicBool>) -> Result<()> {
    use molt_core::LockFile;
    use std::thread;
    use std::time::Duration;

    let current_dir = std::env::current_dir().context("failed to get current directory")?;
    let molt_dir = current_dir.join(".molt");

    if !molt_dir.exists() {
        std::fs::create_dir_all(&molt_dir).context("failed to create .molt directory")?;
    }

    eprintln!("Acquiring lock...");
    let _lock = LockFile::acquire(&molt_dir).context("failed to acquire lock for test-lock operation")?;

    eprintln!("Lock acquired. Sleeping for {delay}ms...");

    let sleep_interval = 100;
    let mut remaining = delay;

    while remaining > 0 && !interrupted.load(Ordering::SeqCst) {
        let sleep_time = std::cmp::min(remaining, sleep_interval);
        thread::sleep(Duration::from_millis(sleep_time));
        remaining = remaining.saturating_sub(sleep_time);
    }

    if interrupted.load(Ordering::SeqCst) {
        eprintln!("Interrupted during sleep, releasing lock...");
        return Ok(());
    }

    eprintln!("Sleep complete. Lock will be released automatically on exit.");
    Ok(())
}
