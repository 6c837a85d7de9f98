use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Occupancy state of a parking slot. The older fixture vocabulary
/// (`vacant`, `parked`) is accepted on input.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    #[serde(alias = "vacant")]
    Free,
    #[serde(alias = "parked")]
    Occupied,
    Reserved,
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SlotStatus::Free => "free",
            SlotStatus::Occupied => "occupied",
            SlotStatus::Reserved => "reserved",
        };
        f.write_str(s)
    }
}

/// Who holds a slot. Only present while the slot is occupied or reserved.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    pub full_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub car_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parked_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserved_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    pub status: SlotStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<Owner>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_cm: Option<f64>,
    pub updated_at: DateTime<Utc>,
}

impl Slot {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            area: None,
            status: SlotStatus::Free,
            lat: None,
            lng: None,
            owner: None,
            distance_cm: None,
            updated_at: Utc::now(),
        }
    }

    /// Overwrites the status. Moving to `Free` drops the owner so a free
    /// slot never carries reservation metadata.
    pub fn set_status(&mut self, status: SlotStatus, at: DateTime<Utc>) {
        self.status = status;
        self.updated_at = at;
        if status == SlotStatus::Free {
            self.owner = None;
        }
    }

    pub fn reserve(&mut self, mut owner: Owner, at: DateTime<Utc>) {
        owner.reserved_at.get_or_insert(at);
        self.status = SlotStatus::Reserved;
        self.owner = Some(owner);
        self.updated_at = at;
    }

    pub fn is_free(&self) -> bool {
        self.status == SlotStatus::Free
    }
}
