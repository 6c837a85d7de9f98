mod device;
mod forms;
mod sensor;
mod slot;
mod user;

pub use device::{DeviceMap, DevicePayload, DeviceReading};
pub use forms::{LoginForm, ReservationForm, SignupForm};
pub use sensor::{HealthWindows, Reading, Sensor, SensorHealth};
pub use slot::{Owner, Slot, SlotStatus};
pub use user::{normalize_email, Role, User};
