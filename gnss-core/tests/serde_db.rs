//! Serialization coverage for the database model (gated on the `serde`
//! feature), in the `serde_json::json!` / `to_value` comparison style this
//! workspace's own `parser_tests.rs` already uses for packet structs.

#![cfg(feature = "serde")]

use gnss_core::db::{Database, NavMode, Quality, System};
use gnss_core::nmea::{gga, Sentence};

#[test]
fn position_serializes_the_scenario_1_fix() {
    let sentence = Sentence::parse(
        "$GPGGA,172814.0,3723.46587704,N,12202.26957864,W,2,6,1.2,18.893,M,-25.669,M,2.0,0031*4F\r\n",
    )
    .unwrap();
    let mut db = Database::new();
    gga(&sentence, &mut db).unwrap();

    let position = db.get(System::Gps).position;
    assert_eq!(position.quality, Quality::Differential);

    let value = serde_json::to_value(&position).unwrap();
    assert_eq!(value["lat_nanominutes"], 2_243_465_877_040_i64);
    assert_eq!(value["lon_nanominutes"], -7_322_269_578_640_i64);
    assert_eq!(value["altitude_mm"], 18_893);
    assert_eq!(value["sats_used"], 6);
    assert_eq!(value["quality"], "Differential");
}

#[test]
fn nav_mode_round_trips_through_json() {
    let encoded = serde_json::to_string(&NavMode::Fix3D).unwrap();
    assert_eq!(encoded, "\"Fix3D\"");
    let decoded: NavMode = serde_json::from_str(&encoded).unwrap();
    assert_eq!(decoded, NavMode::Fix3D);
}

#[test]
fn whole_database_round_trips_through_json() {
    let db = Database::new();
    let encoded = serde_json::to_string(&db).unwrap();
    let decoded: Database = serde_json::from_str(&encoded).unwrap();
    assert_eq!(decoded.get(System::Gps).position.quality, db.get(System::Gps).position.quality);
}
