use std::process;

use clap::Parser;
use lumen_cli::{
    cli::{Cli, Commands},
    config::{load_config, LumenConfig},
};
use lumen_io::ConversionManager;
use tracing::level_filters::LevelFilter;
use tracing::{debug, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod commands;

use commands::{batch::BatchArgs, convert::ConvertArgs};

/// `--log-level`, then the config file, then info. `RUST_LOG` wins over all.
fn init_tracing(flag: Option<Level>, config: &LumenConfig) {
    let configured = config.logging.level.parse::<Level>();
    let level = flag.or(configured.as_ref().ok().copied()).unwrap_or(Level::INFO);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(LevelFilter::from_level(level).into()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    if flag.is_none() && configured.is_err() {
        warn!(level = %config.logging.level, "ignoring unknown log level from config");
    }
}

fn run(cli: Cli, config: &LumenConfig) -> anyhow::Result<()> {
    let manager = ConversionManager::with_options(config.conversion.clone());
    debug!(options = ?manager.options(), "conversion manager ready");

    match cli.command {
        Commands::Detect { input, json } => commands::detect::handle(&manager, &input, json),
        Commands::Convert {
            input,
            to,
            from,
            output,
            strict,
            json,
            overrides,
        } => commands::convert::handle(
            &manager,
            ConvertArgs {
                input: &input,
                to,
                from,
                output: output.as_deref(),
                strict,
                json,
                overrides: overrides.into(),
            },
        ),
        Commands::Validate {
            input,
            from,
            strict,
            json,
        } => commands::validate::handle(&manager, &input, from, strict, json),
        Commands::Info { format, json } => commands::info::handle(&manager, format, json),
        Commands::Batch {
            inputs,
            to,
            output,
            threads,
            strict,
            resume,
            json,
            overrides,
        } => commands::batch::handle(
            &manager,
            BatchArgs {
                inputs: &inputs,
                to,
                output: &output,
                threads: threads.unwrap_or(config.batch.threads),
                strict,
                resume,
                json,
                overrides: overrides.into(),
            },
        ),
        Commands::Completions { shell, out } => commands::completions::handle(shell, out.as_deref()),
    }
}

fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err:#}");
            process::exit(2);
        }
    };
    init_tracing(cli.log_level, &config);

    if let Err(err) = run(cli, &config) {
        eprintln!("error: {err:#}");
        process::exit(1);
    }
}
