//! session-keeper binary entry point.

use std::process::ExitCode;

use session_keeper::cli::{self, Args};
use session_keeper::{logging, MemoryRuntime, SessionHandler, SessionOption, SessionsConfig};
use tracing::{error, info};

fn main() -> ExitCode {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {e}");
            eprintln!("Try 'session-keeper --help' for more information.");
            return ExitCode::from(2);
        }
    };

    if args.help {
        cli::print_help();
        return ExitCode::SUCCESS;
    }
    if args.version {
        cli::print_version();
        return ExitCode::SUCCESS;
    }
    if args.list_options {
        for option in SessionOption::ALL {
            println!("{option}");
        }
        return ExitCode::SUCCESS;
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = SessionsConfig::load(args)?;
    logging::init_with_filter(config.log_filter()).ok();

    info!("session-keeper v{}", env!("CARGO_PKG_VERSION"));

    let handler = SessionHandler::with_runtime(config, MemoryRuntime::new())?;
    info!(
        options = handler.configuration().options().len(),
        "Configuration accepted"
    );

    handler.start()?;
    handler.set("smoke_check", true)?;
    let id = handler.id().map(|id| id.to_string()).unwrap_or_default();
    handler.write_close()?;

    handler.start()?;
    let resumed = handler.get_as::<bool>("smoke_check")?;
    handler.destroy()?;

    println!("name:    {}", handler.name());
    println!("id:      {id}");
    println!("resumed: {resumed}");
    println!("status:  {}", handler.status());
    Ok(())
}
