mod registry;
mod slot_poller;

pub use registry::{RefreshRegistry, SubscriberId};
pub use slot_poller::{PollPhase, PollState, PollerHandle, SlotPoller};
