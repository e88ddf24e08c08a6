use chrono::Local;
use fbevents::config::env_loader::load_config;
use fbevents::dates::FrenchCalendar;
use fbevents::facebook::api::FacebookAPI;
use fbevents::mail::api::SmtpMailer;
use fbevents::pipeline;
use fbevents::tracing::{setup_loki, shutdown_loki};
use std::error::Error;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let loki = setup_loki().await;

    let config = match load_config() {
        Ok(config) => config,
        Err(err) => {
            error!("Invalid configuration: {}", err);
            shutdown_loki(loki).await;
            return Err(err.into());
        }
    };

    info!("Starting with {:?}", config);

    let calendar = FrenchCalendar::new();
    let source = FacebookAPI::new(config.browser, calendar.clone());
    let mailer = SmtpMailer::new(config.smtp);

    let result = pipeline::run(
        &config.run,
        &calendar,
        &source,
        &mailer,
        Local::now().naive_local(),
    )
    .await;

    match &result {
        Ok(summary) => info!(
            "Exported {} events to {} ({} discarded)",
            summary.exported,
            summary.output.display(),
            summary.discarded
        ),
        Err(err) => error!("Run failed during {}: {}", err.stage(), err),
    }

    shutdown_loki(loki).await;

    result?;

    Ok(())
}
