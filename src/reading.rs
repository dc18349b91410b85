//! Sensor readings and the line decoder.
//!
//! A reading is whatever JSON object the device sent, kept verbatim so extra
//! fields reach HTTP clients unchanged. The only hard requirement is a
//! temperature value.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Wire key carrying the temperature in degrees Celsius. Required.
pub const TEMPERATURE_KEY: &str = "temperatura";
/// Wire key carrying relative humidity in percent.
pub const HUMIDITY_KEY: &str = "umidade";
/// Wire key carrying the gas sensor status.
pub const GAS_KEY: &str = "gas";

/// Why a line was not accepted as a reading.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The line is not a JSON object.
    #[error("malformed reading: {0}")]
    Malformed(String),

    /// The object lacks a required key.
    #[error("reading is missing required field `{0}`")]
    MissingField(&'static str),
}

/// One sensor reading as received from the device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reading(Map<String, Value>);

impl Reading {
    /// The placeholder served before the first successful read.
    pub fn zero() -> Self {
        let mut fields = Map::new();
        fields.insert(TEMPERATURE_KEY.to_string(), Value::from(0));
        fields.insert(HUMIDITY_KEY.to_string(), Value::from(0));
        fields.insert(GAS_KEY.to_string(), Value::from(0));
        Self(fields)
    }

    /// Build a reading from a JSON object, enforcing the required fields.
    pub fn from_fields(fields: Map<String, Value>) -> Result<Self, DecodeError> {
        if !fields.contains_key(TEMPERATURE_KEY) {
            return Err(DecodeError::MissingField(TEMPERATURE_KEY));
        }
        Ok(Self(fields))
    }

    pub fn temperature(&self) -> Option<f64> {
        self.number(TEMPERATURE_KEY)
    }

    pub fn humidity(&self) -> Option<f64> {
        self.number(HUMIDITY_KEY)
    }

    pub fn gas(&self) -> Option<f64> {
        self.number(GAS_KEY)
    }

    /// Raw access to any field, including ones this crate does not know about.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Single-line wire form, without the trailing newline.
    pub fn encode(&self) -> String {
        Value::Object(self.0.clone()).to_string()
    }

    fn number(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(Value::as_f64)
    }
}

impl Default for Reading {
    fn default() -> Self {
        Self::zero()
    }
}

/// Parse one line from the device into a [`Reading`].
///
/// Anything short of a JSON object with a temperature is rejected whole;
/// nothing is ever partially accepted.
pub fn decode(line: &str) -> Result<Reading, DecodeError> {
    let value: Value =
        serde_json::from_str(line).map_err(|e| DecodeError::Malformed(e.to_string()))?;

    match value {
        Value::Object(fields) => Reading::from_fields(fields),
        other => Err(DecodeError::Malformed(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
