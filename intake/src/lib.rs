pub mod analyzer;
pub mod api;
pub mod catalog;
pub mod config;
pub mod errors;
pub mod handler;
pub mod metrics_defs;
pub mod payload;
pub mod sentiment;
pub mod storage;
pub mod submission;

#[cfg(test)]
mod testutils;

use analyzer::GeminiClient;
use api::IntakeService;
use errors::IntakeError;
use handler::FeedbackHandler;
use shared::admin_service::AdminService;
use shared::http::run_http_service;
use std::sync::Arc;
use storage::WebhookStore;

/// Wires the production collaborators described by `config`.
pub fn build_handler(config: &config::Config) -> FeedbackHandler {
    FeedbackHandler::new(
        Arc::new(GeminiClient::new(&config.ai)),
        Arc::new(WebhookStore::new(&config.storage)),
    )
}

pub async fn run(config: config::Config) -> Result<(), IntakeError> {
    let handler = Arc::new(build_handler(&config));

    if config.ai.api_key.is_none() {
        tracing::warn!("No AI credential configured, every submission will use the fallback assessment");
    }
    if !handler.is_ready() {
        tracing::warn!("No storage endpoint configured, submissions will fail to forward");
    }

    let intake_service = IntakeService::new(handler.clone(), config.environment);
    let admin_service = AdminService::new(move || handler.is_ready());

    let intake_task = run_http_service(
        &config.listener.host,
        config.listener.port,
        intake_service,
    );
    let admin_task = run_http_service(
        &config.admin_listener.host,
        config.admin_listener.port,
        admin_service,
    );

    tokio::try_join!(intake_task, admin_task)?;
    Ok(())
}
