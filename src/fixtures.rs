//! Seed data for a parking lot: a fixed 4x4 demo lot and a seeded random
//! generator producing lots of the same shape.

use chrono::{DateTime, Duration, Utc};
use rand::{rngs::StdRng, Rng, SeedableRng};
use crate::models::{Owner, Reading, Sensor, Slot, SlotStatus};

pub const AREAS: [&str; 4] = ["A", "B", "C", "D"];
pub const SLOTS_PER_AREA: usize = 4;
const FIXTURE_HISTORY: usize = 6;
const PLATE_PREFIXES: [&str; 4] = ["MH", "DL", "KA", "TN"];

#[derive(Debug, Clone)]
pub struct Lot {
    pub slots: Vec<Slot>,
    pub sensors: Vec<Sensor>,
}

struct FixtureOwner {
    full_name: &'static str,
    email: &'static str,
    phone: &'static str,
    car_number: &'static str,
    notes: &'static str,
    since_minutes: i64,
}

struct FixtureSlot {
    id: &'static str,
    status: SlotStatus,
    updated_minutes_ago: i64,
    owner: Option<FixtureOwner>,
}

const fn owner(
    full_name: &'static str,
    email: &'static str,
    phone: &'static str,
    car_number: &'static str,
    notes: &'static str,
    since_minutes: i64,
) -> Option<FixtureOwner> {
    Some(FixtureOwner { full_name, email, phone, car_number, notes, since_minutes })
}

const FIXTURE: [FixtureSlot; 16] = [
    FixtureSlot { id: "A1", status: SlotStatus::Occupied, updated_minutes_ago: 10,
        owner: owner("Rahul Mehta", "rahul.mehta@example.com", "+91-9876543210", "MH12AB1234", "VIP pass", 22) },
    FixtureSlot { id: "A2", status: SlotStatus::Free, updated_minutes_ago: 167, owner: None },
    FixtureSlot { id: "A3", status: SlotStatus::Reserved, updated_minutes_ago: 42,
        owner: owner("Priya Desai", "priya.desai@example.com", "+91-9012345678", "DL1AA1234", "Reservation for client meeting", 47) },
    FixtureSlot { id: "A4", status: SlotStatus::Free, updated_minutes_ago: 302, owner: None },
    FixtureSlot { id: "B1", status: SlotStatus::Occupied, updated_minutes_ago: 27,
        owner: owner("Ananya Roy", "ananya.roy@example.com", "+91-9123456780", "DL4CAF5032", "EV charging", 32) },
    FixtureSlot { id: "B2", status: SlotStatus::Free, updated_minutes_ago: 362, owner: None },
    FixtureSlot { id: "B3", status: SlotStatus::Reserved, updated_minutes_ago: 72,
        owner: owner("Karan Gupta", "karan.gupta@example.com", "+91-9980011223", "KA05ZZ7777", "Reserved by contractor", 77) },
    FixtureSlot { id: "B4", status: SlotStatus::Free, updated_minutes_ago: 392, owner: None },
    FixtureSlot { id: "C1", status: SlotStatus::Free, updated_minutes_ago: 542, owner: None },
    FixtureSlot { id: "C2", status: SlotStatus::Occupied, updated_minutes_ago: 17,
        owner: owner("Vikas Sharma", "vikas.sharma@example.com", "+91-9988776655", "KA03MN9001", "", 52) },
    FixtureSlot { id: "C3", status: SlotStatus::Free, updated_minutes_ago: 592, owner: None },
    FixtureSlot { id: "C4", status: SlotStatus::Reserved, updated_minutes_ago: 132,
        owner: owner("Meera Iyer", "meera.iyer@example.com", "+91-9765432100", "", "Reservation for evening event", 147) },
    FixtureSlot { id: "D1", status: SlotStatus::Free, updated_minutes_ago: 932, owner: None },
    FixtureSlot { id: "D2", status: SlotStatus::Occupied, updated_minutes_ago: 62,
        owner: owner("Sanjay Kulkarni", "sanjay.k@example.com", "+91-9445566778", "TN07XY4321", "Monthly pass", 67) },
    FixtureSlot { id: "D3", status: SlotStatus::Free, updated_minutes_ago: 272, owner: None },
    FixtureSlot { id: "D4", status: SlotStatus::Reserved, updated_minutes_ago: 282,
        owner: owner("Rohit Patel", "rohit.patel@example.com", "+91-9001122334", "MH20AB4321", "Reserved for VIP guest", 287) },
];

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

fn slot_shell(id: &str, status: SlotStatus, updated_at: DateTime<Utc>) -> Slot {
    let mut slot = Slot::new(id, id);
    slot.area = Some(id[..1].to_string());
    slot.status = status;
    slot.updated_at = updated_at;
    slot
}

/// The deterministic demo lot, timestamped relative to `now`.
pub fn static_lot(now: DateTime<Utc>) -> Lot {
    let slots: Vec<Slot> = FIXTURE
        .iter()
        .map(|f| {
            let mut slot = slot_shell(f.id, f.status, now - Duration::minutes(f.updated_minutes_ago));
            slot.owner = f.owner.as_ref().map(|o| {
                let since = Some(now - Duration::minutes(o.since_minutes));
                Owner {
                    full_name: o.full_name.to_string(),
                    email: o.email.to_string(),
                    phone: non_empty(o.phone),
                    car_number: non_empty(o.car_number),
                    notes: non_empty(o.notes),
                    parked_at: if f.status == SlotStatus::Occupied { since } else { None },
                    reserved_at: if f.status == SlotStatus::Reserved { since } else { None },
                }
            });
            slot
        })
        .collect();

    // One sensor per slot, heartbeats staggered a minute apart.
    let sensors = slots
        .iter()
        .enumerate()
        .map(|(idx, slot)| {
            let idx = idx as i64;
            let distance = if slot.status == SlotStatus::Occupied {
                12.0 + (idx % 6) as f64
            } else {
                90.0 + ((idx % 10) * 2) as f64
            };
            let last_seen = now - Duration::minutes(idx);
            let mut sensor = Sensor::new(format!("S-{}", slot.id), slot.id.clone());
            for h in (0..FIXTURE_HISTORY as i64).rev() {
                let wobble = ((h + idx) % 3 - 1) as f64;
                sensor.record(
                    Reading {
                        ts: last_seen - Duration::seconds(h * 30),
                        distance_cm: distance + wobble,
                    },
                    FIXTURE_HISTORY,
                );
            }
            sensor.battery_percent = Some(70 + (idx % 4) as u8 * 7);
            sensor.rssi_dbm = Some(-60 + (idx % 5) as i32 - 2);
            sensor
        })
        .collect();

    Lot { slots, sensors }
}

fn random_plate(rng: &mut StdRng) -> String {
    format!(
        "{}{}XY{}",
        PLATE_PREFIXES[rng.gen_range(0..PLATE_PREFIXES.len())],
        rng.gen_range(10..100),
        rng.gen_range(1000..10000)
    )
}

/// A randomised lot of the same 4x4 shape. The same seed always produces
/// the same statuses, owners and readings relative to `now`.
pub fn generate_lot(seed: u64, now: DateTime<Utc>) -> Lot {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut slots = Vec::with_capacity(AREAS.len() * SLOTS_PER_AREA);

    for area in AREAS {
        for i in 1..=SLOTS_PER_AREA {
            let id = format!("{}{}", area, i);
            let roll: f64 = rng.gen();
            let status = if roll < 0.25 {
                SlotStatus::Occupied
            } else if roll < 0.5 {
                SlotStatus::Reserved
            } else {
                SlotStatus::Free
            };
            let updated_at = now - Duration::seconds(rng.gen_range(0..3600));
            let mut slot = slot_shell(&id, status, updated_at);

            let since = Some(now - Duration::seconds(rng.gen_range(0..5400)));
            slot.owner = match status {
                SlotStatus::Occupied => Some(Owner {
                    full_name: format!("User {}", id),
                    email: format!("user{}@example.com", id),
                    phone: Some(format!("+91-9{}", rng.gen_range(100_000_000..1_000_000_000u64))),
                    car_number: Some(random_plate(&mut rng)),
                    notes: None,
                    parked_at: since,
                    reserved_at: None,
                }),
                SlotStatus::Reserved => Some(Owner {
                    full_name: format!("Reserved {}", id),
                    email: format!("reserved{}@example.com", id),
                    phone: Some(format!("+91-8{}", rng.gen_range(100_000_000..1_000_000_000u64))),
                    car_number: rng.gen_bool(0.5).then(|| random_plate(&mut rng)),
                    notes: Some("Auto-generated reservation".to_string()),
                    parked_at: None,
                    reserved_at: since,
                }),
                SlotStatus::Free => None,
            };
            slots.push(slot);
        }
    }

    let sensors = slots
        .iter()
        .map(|slot| {
            let mut sensor = Sensor::new(format!("S-{}", slot.id), slot.id.clone());
            let connected = rng.gen_bool(0.97);
            let base = if slot.status == SlotStatus::Occupied {
                rng.gen_range(10.0..20.0)
            } else {
                rng.gen_range(80.0..120.0)
            };
            if connected {
                let last_seen = now - Duration::seconds(rng.gen_range(0..300));
                for h in (0..FIXTURE_HISTORY as i64).rev() {
                    let distance: f64 = base + rng.gen_range(-3.0..3.0);
                    sensor.record(
                        Reading {
                            ts: last_seen - Duration::seconds(h * 30),
                            distance_cm: distance.max(2.0).round(),
                        },
                        FIXTURE_HISTORY,
                    );
                }
            }
            sensor.battery_percent = Some(rng.gen_range(60..=100));
            sensor.rssi_dbm = Some(rng.gen_range(-70..=-50));
            sensor
        })
        .collect();

    Lot { slots, sensors }
}
