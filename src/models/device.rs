use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Body a sensor node posts to the hub.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DevicePayload {
    pub device_id: String,
    pub distance: f64,
    pub state: bool,  // true = vacant
}

/// One entry of the `GET /devices` map.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DeviceReading {
    pub state: bool,
    pub distance: f64,
    pub timestamp: String,
}

pub type DeviceMap = HashMap<String, DeviceReading>;
