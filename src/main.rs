use clap::Parser;
use subscriber_registry::config::{get_configuration, CliArgs};
use subscriber_registry::startup::{Application, StartupError};
use subscriber_registry::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    let args = CliArgs::parse();

    let subscriber = get_subscriber(
        String::from("subscriber_registry"),
        String::from("info"),
        std::io::stdout,
    );

    init_subscriber(subscriber);

    let config = get_configuration(&args).map_err(StartupError::Configuration)?;
    let application = Application::build(config).await?;

    application.run_until_stopped().await
}
