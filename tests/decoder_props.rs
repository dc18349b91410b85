//! Property tests for the line decoder.

use proptest::prelude::*;
use serde_json::{Map, Value};
use serial_sensor_bridge::{decode, DecodeError, Reading};

fn field_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        (-100_000i32..100_000).prop_map(|n| Value::from(f64::from(n) / 10.0)),
        "[a-zA-Z0-9 ]{0,12}".prop_map(Value::from),
    ]
}

fn reading() -> impl Strategy<Value = Reading> {
    (
        field_value(),
        prop::collection::vec(("[a-z_]{1,10}", field_value()), 0..6),
    )
        .prop_map(|(temperature, extras)| {
            let mut fields = Map::new();
            fields.insert("temperatura".to_string(), temperature);
            for (key, value) in extras {
                fields.entry(key).or_insert(value);
            }
            Reading::from_fields(fields).unwrap()
        })
}

proptest! {
    #[test]
    fn encoded_readings_decode_unchanged(reading in reading()) {
        let line = reading.encode();
        prop_assert!(!line.contains('\n'));
        prop_assert_eq!(decode(&line).unwrap(), reading);
    }

    #[test]
    fn objects_without_temperature_are_rejected(
        extras in prop::collection::vec(("[a-z_]{1,10}", field_value()), 0..6)
    ) {
        let mut fields = Map::new();
        for (key, value) in extras {
            if key != "temperatura" {
                fields.insert(key, value);
            }
        }
        let line = Value::Object(fields).to_string();
        prop_assert_eq!(decode(&line), Err(DecodeError::MissingField("temperatura")));
    }

    #[test]
    fn arbitrary_text_never_panics(line in "\\PC{0,64}") {
        let _ = decode(&line);
    }
}
