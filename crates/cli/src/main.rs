//! `sparkjob` binary: load configuration, run one job, exit.
//!
//! Exit codes: 0 on success, 1 for user errors (configuration or
//! upstream rejection), 2 for internal errors.

use sparkjob_core::config::Config;
use sparkjob_core::error::RunError;
use sparkjob_datamechanics::DataMechanicsApi;
use sparkjob_runner::Orchestrator;
use sparkjob_storage::S3ArtifactStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "Run failed");
        std::process::exit(e.exit_code());
    }
}

async fn run() -> Result<(), RunError> {
    let config_path =
        std::env::var("SPARKJOB_CONFIG").unwrap_or_else(|_| "config.json".to_string());
    let config = Config::from_file(&config_path)?;
    let image = &config.image_parameters;

    // Unique names per run; the remote service keys the job by appName.
    let run_id = uuid::Uuid::new_v4().simple().to_string();
    let run_id = &run_id[..8];
    let app_name = format!("{}-{}", config.parameters.app_name, run_id);
    let job_name = format!("{}-job-{}", config.parameters.app_name, run_id);
    tracing::info!(app_name = %app_name, job_name = %job_name, "Starting run");

    let store = S3ArtifactStore::from_config(&image.storage).await;

    // One connection pool, two client instances: submission logs its
    // requests, polling stays quiet to avoid flooding the run log.
    let http = reqwest::Client::new();
    let submitter = DataMechanicsApi::with_client(
        http.clone(),
        image.api_url.clone(),
        image.api_token.clone(),
    );
    let poll_client =
        DataMechanicsApi::with_client(http, image.api_url.clone(), image.api_token.clone())
            .with_request_logging(false);

    let orchestrator = Orchestrator::new(
        store,
        submitter,
        poll_client,
        app_name,
        job_name,
        image.configuration_template.clone(),
    );
    orchestrator.run(&config.parameters.blocks).await?;
    Ok(())
}
