use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use futures::stream::{self, BoxStream, StreamExt};
use std::time::Duration;
use tokio::time::interval;
use crate::config::timer_period;
use crate::errors::{FeedError, FeedResult};
use crate::models::{DeviceMap, DeviceReading, Reading, SlotStatus};
use super::{DeltaBatch, SlotDelta, SlotFeed};

/// Polls a sensor hub's `GET /devices` endpoint. A failed or malformed
/// response is logged and yields an empty batch for that tick.
pub struct HttpPollFeed {
    client: reqwest::Client,
    url: String,
    every: Duration,
}

impl HttpPollFeed {
    pub fn new(url: impl Into<String>, every: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            every: timer_period(every),
        }
    }

    pub async fn fetch_devices(&self) -> FeedResult<DeviceMap> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status.as_u16()));
        }
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn poll_once(&self) -> DeltaBatch {
        match self.fetch_devices().await {
            Ok(devices) => {
                tracing::debug!("Fetched {} device readings from {}", devices.len(), self.url);
                deltas_from_devices(&devices)
            }
            Err(e) => {
                tracing::error!("Error fetching live sensor: {}", e);
                Vec::new()
            }
        }
    }
}

// Hubs stamp readings either as RFC 3339 or as a naive ISO time taken to be UTC.
fn parse_timestamp(device: &str, reading: &DeviceReading) -> FeedResult<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(&reading.timestamp) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&reading.timestamp, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|_| FeedError::Timestamp {
            device: device.to_string(),
            value: reading.timestamp.clone(),
        })
}

/// Converts a device map into deltas, ordered by device id. `state == true`
/// means the bay is vacant.
pub fn deltas_from_devices(devices: &DeviceMap) -> DeltaBatch {
    let mut ids: Vec<&String> = devices.keys().collect();
    ids.sort();

    ids.into_iter()
        .filter_map(|id| {
            let reading = &devices[id];
            let ts = match parse_timestamp(id, reading) {
                Ok(ts) => ts,
                Err(e) => {
                    tracing::warn!("Skipping reading: {}", e);
                    return None;
                }
            };
            Some(SlotDelta {
                slot_id: id.clone(),
                status: Some(if reading.state {
                    SlotStatus::Free
                } else {
                    SlotStatus::Occupied
                }),
                reading: Some(Reading {
                    ts,
                    distance_cm: reading.distance,
                }),
            })
        })
        .collect()
}

impl SlotFeed for HttpPollFeed {
    fn name(&self) -> &'static str {
        "http-poll"
    }

    fn updates(self: Box<Self>) -> BoxStream<'static, DeltaBatch> {
        tracing::info!("Polling {} every {:?}", self.url, self.every);
        let ticker = interval(self.every);
        stream::unfold((ticker, self), |(mut ticker, feed)| async move {
            ticker.tick().await;
            let batch = feed.poll_once().await;
            Some((batch, (ticker, feed)))
        })
        .boxed()
    }
}
