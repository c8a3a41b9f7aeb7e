use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use lapin::options::{BasicConsumeOptions, BasicQosOptions, QueueDeclareOptions};
use lapin::types::FieldTable;
use log::info;
use secrecy::ExposeSecret;

use crate::configuration::get_configuration;
use crate::forwarder::ApiClient;

mod broker;
mod configuration;
mod forwarder;
mod models;
mod worker;

const CONNECT_ATTEMPTS: u32 = 5;
const CONNECT_RETRY_DELAY: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let settings = get_configuration().context("Failed to read configuration")?;
    info!("Starting weather worker...");
    info!("RabbitMQ URL: {}", settings.masked_rabbitmq_url());
    info!("API URL: {}", settings.nestjs_api_url);
    info!("Queue name: {}", settings.queue_name);

    let conn = broker::connect_with_retry(
        settings.rabbitmq_url.expose_secret(),
        CONNECT_ATTEMPTS,
        CONNECT_RETRY_DELAY,
    )
    .await
    .context("Failed to connect to RabbitMQ")?;

    let channel = conn
        .create_channel()
        .await
        .context("Failed to open channel")?;

    let queue = channel
        .queue_declare(
            &settings.queue_name,
            QueueDeclareOptions {
                durable: true,
                ..QueueDeclareOptions::default()
            },
            FieldTable::default(),
        )
        .await
        .context("Failed to declare queue")?;
    info!("Declared queue {}", queue.name());

    channel
        .basic_qos(1, BasicQosOptions::default())
        .await
        .context("Failed to set QoS")?;

    let consumer = channel
        .basic_consume(
            &settings.queue_name,
            &format!("{}_consumer", settings.queue_name),
            BasicConsumeOptions::default(),
            FieldTable::default(),
        )
        .await
        .context("Failed to register consumer")?;

    let api = ApiClient::new(&settings.nestjs_api_url).context("Failed to build API client")?;

    worker::run(consumer, api).await;

    Err(anyhow!("delivery stream closed, shutting down"))
}
