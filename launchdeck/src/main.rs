use anyhow::Result;
use clap::Parser;
use launchdeck::cli::{Cli, Commands};
use launchdeck::{commands, AppContext};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let mut cx = AppContext::open(
        cli.data_dir.clone(),
        cli.backend.map(Into::into),
        cli.category.as_deref(),
    )
    .await?;

    match cli.command {
        Commands::List(args) => commands::handle_list(args, &cx).await?,
        Commands::Add(args) => commands::handle_add(args, &mut cx).await?,
        Commands::Drop(args) => commands::handle_drop(args, cx).await?,
        Commands::Remove(args) => commands::handle_remove(args, &mut cx).await?,
        Commands::Open(args) => commands::handle_open(args, &mut cx).await?,
        Commands::Reveal(args) => commands::handle_reveal(args, &cx).await?,
        Commands::Rename(args) => commands::handle_rename(args, &mut cx).await?,
        Commands::Category(args) => commands::handle_category(args, &mut cx).await?,
        Commands::Config(args) => commands::handle_config(args, &cx).await?,
    }

    Ok(())
}

/// `RUST_LOG` wins; otherwise `-v` raises the level from `warn` and `-q` drops it to `error`.
fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
