use chrono::{Duration, TimeZone, Utc};
use medora::{
    db::MemoryStore,
    models::{Collection, JsonMap},
};
use serde_json::{json, Value};

/// Turn a JSON object literal into stored fields.
pub fn record(value: Value) -> JsonMap {
    match value {
        Value::Object(map) => map,
        other => panic!("fixture record must be an object, got {other}"),
    }
}

/// Creation timestamp `seq` seconds after a fixed epoch, in stored format.
pub fn created_at(seq: usize) -> String {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    (base + Duration::seconds(seq as i64))
        .to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Seed `count` rooms of one hospital, created in order `room-001`, `room-002`, ...
pub async fn seed_rooms(store: &MemoryStore, count: usize, hospital: &str) {
    for i in 1..=count {
        store
            .put(
                Collection::Rooms,
                &format!("room-{i:03}"),
                record(json!({
                    "number": i.to_string(),
                    "floor": (i % 3) as i32,
                    "hospital": hospital,
                    "createdAt": created_at(i),
                })),
            )
            .await;
    }
}

/// Two hospitals with staff, wards and appointments.
///
/// Hospital `h-1` has doctors `d-1`/`d-2`, nurse `n-1`, patients `p-1` (in bed
/// `b-1`) and `p-2`, a free bed `b-2`, and appointments `a-1` (d-1, p-1) and
/// `a-2` (d-2, p-2). Hospital `h-2` has `d-3`, `p-3`, `b-3` and `a-3`.
pub async fn seed_network(store: &MemoryStore) {
    let mut seq = 0;
    let mut next = || {
        seq += 1;
        created_at(seq)
    };

    let docs: Vec<(Collection, &str, Value)> = vec![
        (Collection::SubscriptionPlans, "plan-basic", json!({"name": "Basic", "price": 99.0, "maxBeds": 50})),
        (Collection::Hospitals, "h-1", json!({"name": "North General", "plan": "plan-basic"})),
        (Collection::Hospitals, "h-2", json!({"name": "South Clinic"})),
        (Collection::Rooms, "r-1", json!({"number": "101", "floor": 1, "hospital": "h-1"})),
        (Collection::Beds, "b-1", json!({"label": "101-A", "room": "r-1", "hospital": "h-1", "occupied": true, "patient": "p-1"})),
        (Collection::Beds, "b-2", json!({"label": "101-B", "room": "r-1", "hospital": "h-1", "occupied": false})),
        (Collection::Beds, "b-3", json!({"label": "S-1", "hospital": "h-2", "occupied": false})),
        (Collection::Doctors, "d-1", json!({"name": "Dr. Adams", "specialty": "cardiology", "hospital": "h-1"})),
        (Collection::Doctors, "d-2", json!({"name": "Dr. Baker", "specialty": "oncology", "hospital": "h-1"})),
        (Collection::Doctors, "d-3", json!({"name": "Dr. Chen", "hospital": "h-2"})),
        (Collection::Nurses, "n-1", json!({"name": "Nora", "shift": "night", "hospital": "h-1"})),
        (Collection::Patients, "p-1", json!({"name": "Ann", "hospital": "h-1", "bed": "b-1"})),
        (Collection::Patients, "p-2", json!({"name": "Ben", "hospital": "h-1"})),
        (Collection::Patients, "p-3", json!({"name": "Cat", "hospital": "h-2"})),
        (Collection::Appointments, "a-1", json!({"scheduledAt": "2024-03-01T09:00:00.000Z", "hospital": "h-1", "doctor": "d-1", "patient": "p-1"})),
        (Collection::Appointments, "a-2", json!({"scheduledAt": "2024-03-01T10:00:00.000Z", "hospital": "h-1", "doctor": "d-2", "patient": "p-2"})),
        (Collection::Appointments, "a-3", json!({"scheduledAt": "2024-03-02T09:00:00.000Z", "hospital": "h-2", "doctor": "d-3", "patient": "p-3"})),
        (Collection::Medicines, "m-1", json!({"name": "Aspirin", "dosage": "100mg", "stock": 40, "hospital": "h-1"})),
    ];

    for (collection, id, value) in docs {
        let mut data = record(value);
        data.insert("createdAt".to_string(), Value::String(next()));
        store.put(collection, id, data).await;
    }
}
