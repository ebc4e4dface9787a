use clap::Parser;
use dicebox::cli::CliArgs;
use dicebox::config::{AppConfig, ConfigOrigin};
use dicebox::logging::setup_logging;
use dicebox::{AuthServerBuilder, DiceboxError};

#[tokio::main]
async fn main() -> Result<(), DiceboxError> {
    let args = CliArgs::parse();

    let (mut config, origin) = AppConfig::load_from_file(&args.config).await?;
    config.apply_cli(&args);
    config.validate()?;

    setup_logging(&config.logging)?;
    if origin == ConfigOrigin::CreatedDefault {
        tracing::info!(path = %args.config.display(), "created default configuration file");
    }

    let server = AuthServerBuilder::from_config(&config).build().await?;
    tracing::info!(addr = %server.local_addr()?, "dicebox auth service listening");

    server.run().await
}
