use anyhow::Context;
use clap::Parser;
use labware_console::utils::error::ErrorSeverity;
use labware_console::utils::logger::{self, LogFormat};
use labware_console::utils::validation::Validate;
use labware_console::{CliArgs, Command, ConsoleConfig, ConsoleError, ConsoleSession};
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    let format = if args.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };
    logger::init_logger(format, args.verbose);

    tracing::info!("Starting labware console");
    tracing::debug!("CLI args: {:?}", args);

    let session = ConsoleConfig::from_file(&args.config)
        .and_then(|config| {
            config.validate()?;
            ConsoleSession::from_config(&config, args.locked)
        });

    let mut session = match session {
        Ok(session) => session,
        Err(e) => exit_with(&e),
    };

    println!("Ready. Type `help` for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read from stdin")? {
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(message) => {
                println!("{}", message);
                continue;
            }
        };

        if command == Command::Quit {
            break;
        }

        for output in session.execute(command).await {
            println!("{}", output);
        }
    }

    tracing::info!(
        "Leaving with {} labware in the worklist",
        session.worklist().items().len()
    );
    Ok(())
}

fn exit_with(e: &ConsoleError) -> ! {
    tracing::error!(
        "Startup failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("{}", e.user_friendly_message());
    eprintln!("Suggestion: {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}
