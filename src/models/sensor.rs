use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub ts: DateTime<Utc>,
    pub distance_cm: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum SensorHealth {
    Ok,
    Stale,
    Down,
}

/// Recency thresholds used to classify a sensor's heartbeat.
#[derive(Debug, Clone, Copy)]
pub struct HealthWindows {
    pub ok: Duration,
    pub stale: Duration,
}

impl Default for HealthWindows {
    fn default() -> Self {
        Self {
            ok: Duration::minutes(5),
            stale: Duration::minutes(10),
        }
    }
}

impl HealthWindows {
    pub fn classify(&self, last_seen: Option<DateTime<Utc>>, now: DateTime<Utc>) -> SensorHealth {
        let Some(last_seen) = last_seen else {
            return SensorHealth::Down;
        };
        let age = now.signed_duration_since(last_seen);
        if age <= self.ok {
            SensorHealth::Ok
        } else if age <= self.stale {
            SensorHealth::Stale
        } else {
            SensorHealth::Down
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Sensor {
    pub sensor_id: String,
    pub slot_id: String,
    pub is_connected: bool,
    pub last_seen: Option<DateTime<Utc>>,
    pub distance_cm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_percent: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rssi_dbm: Option<i32>,
    // newest first
    #[serde(default)]
    pub history: VecDeque<Reading>,
}

impl Sensor {
    pub fn new(sensor_id: impl Into<String>, slot_id: impl Into<String>) -> Self {
        Self {
            sensor_id: sensor_id.into(),
            slot_id: slot_id.into(),
            is_connected: false,
            last_seen: None,
            distance_cm: None,
            battery_percent: None,
            rssi_dbm: None,
            history: VecDeque::new(),
        }
    }

    /// Records a live reading. History keeps at most `history_len` entries;
    /// `last_seen` and the current distance only advance for readings newer
    /// than anything seen so far.
    pub fn record(&mut self, reading: Reading, history_len: usize) {
        self.history.push_front(reading);
        self.history.truncate(history_len);
        self.is_connected = true;

        if self.last_seen.map_or(true, |seen| reading.ts >= seen) {
            self.last_seen = Some(reading.ts);
            self.distance_cm = Some(reading.distance_cm);
        }
    }

    pub fn health(&self, windows: &HealthWindows, now: DateTime<Utc>) -> SensorHealth {
        windows.classify(self.last_seen, now)
    }

    /// Re-derives connectivity from heartbeat recency, for sensors that did
    /// not report this round.
    pub fn refresh_connectivity(&mut self, windows: &HealthWindows, now: DateTime<Utc>) {
        self.is_connected = self.health(windows, now) == SensorHealth::Ok;
    }
}
