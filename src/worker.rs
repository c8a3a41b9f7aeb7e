use futures_lite::stream::StreamExt;
use lapin::message::Delivery;
use lapin::options::{BasicAckOptions, BasicNackOptions};
use lapin::Consumer;
use log::{error, info, warn};

use crate::forwarder::ApiClient;
use crate::models::WeatherRecord;

/// What to signal back to the broker once a delivery has been processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Forwarded downstream; remove from the queue.
    Ack,
    /// Malformed or invalid; drop without redelivery.
    Discard,
    /// Downstream refused it; put it back for another round.
    Requeue,
}

/// Consumes deliveries one at a time until the stream ends.
pub async fn run(mut consumer: Consumer, api: ApiClient) {
    info!("Waiting for messages on queue {}...", consumer.queue());

    while let Some(delivery) = consumer.next().await {
        let delivery = match delivery {
            Ok(delivery) => delivery,
            Err(e) => {
                error!("Error receiving delivery: {}", e);
                continue;
            }
        };

        let disposition = process(&delivery.data, &api).await;
        settle(&delivery, disposition).await;
    }
}

/// Parses, validates and forwards one message body, deciding its fate.
pub async fn process(payload: &[u8], api: &ApiClient) -> Disposition {
    info!("Received message: {}", String::from_utf8_lossy(payload));

    let record: WeatherRecord = match serde_json::from_slice(payload) {
        Ok(record) => record,
        Err(e) => {
            error!("Error parsing message JSON: {}", e);
            return Disposition::Discard;
        }
    };

    if !record.is_valid() {
        warn!("Invalid weather record (empty location or timestamp), discarding");
        return Disposition::Discard;
    }

    match api.send(&record).await {
        Ok(()) => {
            info!("Forwarded observation for {} to the API", record.location);
            Disposition::Ack
        }
        Err(e) => {
            error!("Failed to forward record: {}, requeueing", e);
            Disposition::Requeue
        }
    }
}

async fn settle(delivery: &Delivery, disposition: Disposition) {
    let result = match disposition {
        Disposition::Ack => delivery.ack(BasicAckOptions::default()).await,
        Disposition::Discard => {
            delivery
                .nack(BasicNackOptions {
                    requeue: false,
                    ..BasicNackOptions::default()
                })
                .await
        }
        Disposition::Requeue => {
            delivery
                .nack(BasicNackOptions {
                    requeue: true,
                    ..BasicNackOptions::default()
                })
                .await
        }
    };

    if let Err(e) = result {
        error!("Failed to settle delivery ({:?}): {}", disposition, e);
    }
}
