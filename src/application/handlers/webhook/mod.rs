//! Webhook handlers.

mod ingest_webhook;

pub use ingest_webhook::{IngestWebhookCommand, IngestorConfig, WebhookIngestor};
