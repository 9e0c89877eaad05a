use catalog_migrate::{
    cli::Cli,
    config::MigrateConfig,
    destination::CmsClient,
    error::{format_error_chain, suggest_fix, Result},
    logging,
    observer::{ConsoleObserver, TracingObserver},
    pipeline::{execute_run, print_run_summary, RunContext},
    source::PgSource,
};
use tracing::{debug, info};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    let cli = Cli::parse_args();

    if let Err(e) = run(cli).await {
        logging::output::error(format_error_chain(&e));

        if let Some(suggestion) = suggest_fix(&e) {
            logging::output::info(suggestion);
        }

        std::process::exit(1);
    }

    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config = MigrateConfig::from_environment()?;

    // Verbosity: 0 = warn, 1 = info, 2 = debug, 3+ = trace
    logging::init(config.verbosity.unwrap_or(0))?;
    info!("Starting catalog-migrate v{}", env!("CARGO_PKG_VERSION"));
    debug!("Tokens: {:?}", cli.tokens);

    let flags = cli.flags();
    config.validate(flags.into())?;

    let registry = config.registry();
    let destination = CmsClient::new(&config.cms_settings()?)?;
    // Connects on first read; clean runs never touch the database
    let source = PgSource::new(config.source.connection_string.clone().unwrap_or_default());
    let observer = (ConsoleObserver, TracingObserver);

    let ctx = RunContext::new(
        &source,
        &destination,
        &registry,
        &config.images,
        config.page_limit(),
        &observer,
    );

    let start = std::time::Instant::now();
    let outcome = execute_run(&ctx, flags).await?;
    print_run_summary(&outcome, start.elapsed());

    Ok(())
}
