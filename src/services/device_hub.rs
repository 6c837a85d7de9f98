use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;
use crate::models::{DeviceMap, DevicePayload, DeviceReading};

/// Latest reading per device as posted by sensor nodes. This is the data
/// behind `GET /devices`, the endpoint the HTTP poll feed reads.
#[derive(Clone, Default)]
pub struct DeviceHub {
    devices: Arc<RwLock<DeviceMap>>,
}

impl DeviceHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, payload: DevicePayload) -> DeviceReading {
        let reading = DeviceReading {
            state: payload.state,
            distance: payload.distance,
            timestamp: Utc::now().to_rfc3339(),
        };
        tracing::info!(
            "[{}] {}: {:.2} cm | Vacant: {}",
            reading.timestamp,
            payload.device_id,
            payload.distance,
            payload.state
        );
        self.devices
            .write()
            .await
            .insert(payload.device_id, reading.clone());
        reading
    }

    pub async fn devices(&self) -> DeviceMap {
        self.devices.read().await.clone()
    }
}
