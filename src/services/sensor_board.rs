use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use crate::models::{HealthWindows, Reading, Sensor, SensorHealth};

#[derive(Debug, Clone, Serialize)]
pub struct SensorReport {
    #[serde(flatten)]
    pub sensor: Sensor,
    pub health: SensorHealth,
}

/// The admin view of every sensor in the lot. Live readings are merged into
/// a fixed set of sensors; ids that match no sensor are ignored.
#[derive(Clone)]
pub struct SensorBoard {
    sensors: Arc<RwLock<Vec<Sensor>>>,
    windows: HealthWindows,
    history_len: usize,
}

impl SensorBoard {
    pub fn new(mut sensors: Vec<Sensor>, windows: HealthWindows, history_len: usize) -> Self {
        sensors.sort_by(|a, b| a.sensor_id.cmp(&b.sensor_id));
        Self {
            sensors: Arc::new(RwLock::new(sensors)),
            windows,
            history_len,
        }
    }

    pub async fn sensors(&self) -> Vec<Sensor> {
        self.sensors.read().await.clone()
    }

    /// Applies one round of live readings, keyed by sensor id or slot id.
    /// Sensors that did not report have their connectivity re-derived from
    /// how recently they were last seen. The result lines up with
    /// `readings`: the owning slot id, or `None` for an unknown key.
    pub async fn merge_readings(
        &self,
        readings: &[(String, Reading)],
        now: DateTime<Utc>,
    ) -> Vec<Option<String>> {
        let mut sensors = self.sensors.write().await;
        let mut touched = vec![false; sensors.len()];
        let mut merged = Vec::with_capacity(readings.len());

        for (key, reading) in readings {
            let Some(idx) = sensors
                .iter()
                .position(|s| &s.sensor_id == key || &s.slot_id == key)
            else {
                tracing::debug!("Reading for unknown sensor {} ignored", key);
                merged.push(None);
                continue;
            };
            sensors[idx].record(*reading, self.history_len);
            touched[idx] = true;
            merged.push(Some(sensors[idx].slot_id.clone()));
        }

        for (sensor, touched) in sensors.iter_mut().zip(touched) {
            if !touched {
                sensor.refresh_connectivity(&self.windows, now);
            }
        }
        merged
    }

    pub async fn report(&self, now: DateTime<Utc>) -> Vec<SensorReport> {
        self.sensors
            .read()
            .await
            .iter()
            .map(|sensor| SensorReport {
                health: sensor.health(&self.windows, now),
                sensor: sensor.clone(),
            })
            .collect()
    }
}
