use crate::models::Slot;
use crate::poller::RefreshRegistry;
use crate::services::{DeviceHub, PersistedValue, SensorBoard, SlotStore, UserService};

// Application state shared between handlers
#[derive(Clone)]
pub struct AppState {
    pub slots: SlotStore,
    pub sensors: SensorBoard,
    pub users: UserService,
    pub devices: DeviceHub,
    pub registry: RefreshRegistry,
    pub snapshot: PersistedValue<Vec<Slot>>,
}
