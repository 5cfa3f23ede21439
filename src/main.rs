use anyhow::Result;
use linebar::app::App;
use linebar::cli;

fn main() -> Result<()> {
    // Process CLI arguments first (before logging init for cleaner output)
    let runtime_options = match cli::process_cli() {
        cli::CliResult::Exit(code) => {
            if code == 0 {
                return Ok(());
            }
            std::process::exit(code);
        }
        cli::CliResult::Continue(options) => options,
    };
    // CLI --log-level flag takes highest precedence, then RUST_LOG, then config (applied later).
    linebar::debug::init_log_bridge(runtime_options.log_level);

    log::info!("Starting linebar {}", linebar::VERSION);

    let result = App::new(runtime_options).and_then(App::run);

    match result {
        Ok(()) => Ok(()),
        Err(ref e) => {
            eprintln!("linebar: error: {e:#}");
            // Return the original error so main exits with code 1 (anyhow default)
            result
        }
    }
}
