use failure::Fail;
use serde_json::Value;
use std::fmt;

#[derive(Debug, Fail, PartialEq)]
pub enum PayloadError {
    #[fail(display = "Missing {} field in {}", _0, _1)]
    MissingField(&'static str, String),
    #[fail(display = "Unexpected JSON type for {}: {}", _0, _1)]
    UnexpectedType(&'static str, String),
}

/// Occupancy reported for one bay. The backend is free to send states
/// other than the two we style specially ("empty", "unknown", ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpotState {
    Available,
    Occupied,
    Other(String),
}

impl SpotState {
    pub fn as_str(&self) -> &str {
        match self {
            SpotState::Available => "available",
            SpotState::Occupied => "occupied",
            SpotState::Other(s) => s,
        }
    }

    pub fn is_occupied(&self) -> bool {
        *self == SpotState::Occupied
    }
}

impl From<&str> for SpotState {
    fn from(s: &str) -> Self {
        match s {
            "available" => SpotState::Available,
            "occupied" => SpotState::Occupied,
            other => SpotState::Other(other.to_string()),
        }
    }
}

impl fmt::Display for SpotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpotStatus {
    pub id: String,
    pub status: SpotState,
    pub plate: Option<String>,
    pub car_number: Option<String>,
}

/// Full answer of `/get_parking_status`, replaced wholesale on every poll.
#[derive(Debug, Clone, PartialEq)]
pub struct ParkingSnapshot {
    pub total_spots: i64,
    pub available: i64,
    pub occupied: i64,
    pub spots: Vec<SpotStatus>,
}

/// One entry of the `/api/parking/status` map.
#[derive(Debug, Clone, PartialEq)]
pub struct SpotEntry {
    pub spot: String,
    pub status: SpotState,
    pub plate: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpotMap {
    pub entries: Vec<SpotEntry>,
}

/// Payload of the `parking_status_update` live event.
#[derive(Debug, Clone, PartialEq)]
pub struct PushUpdate {
    pub spot_number: String,
    pub status: SpotState,
    pub plate: Option<String>,
}

impl ParkingSnapshot {
    pub fn from_json(value: &Value) -> Result<Self, PayloadError> {
        let spots = value["spots"]
            .as_array()
            .ok_or_else(|| missing("spots", value))?
            .iter()
            .map(SpotStatus::from_json)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ParkingSnapshot {
            total_spots: counter(value, "total_spots")?,
            available: counter(value, "available")?,
            occupied: counter(value, "occupied")?,
            spots,
        })
    }
}

impl SpotStatus {
    fn from_json(value: &Value) -> Result<Self, PayloadError> {
        Ok(SpotStatus {
            id: identifier(value, "id")?,
            status: SpotState::from(
                value["status"]
                    .as_str()
                    .ok_or_else(|| missing("status", value))?,
            ),
            plate: plate(&value["plate"]),
            car_number: plate(&value["car_number"]),
        })
    }
}

impl SpotMap {
    pub fn from_json(value: &Value) -> Result<Self, PayloadError> {
        let object = value
            .as_object()
            .ok_or_else(|| PayloadError::UnexpectedType("spot map", value.to_string()))?;
        let mut entries = Vec::with_capacity(object.len());
        for (spot, data) in object {
            let entry = match data {
                // Older backends report a bare status string per spot.
                Value::String(status) => SpotEntry {
                    spot: spot.clone(),
                    status: SpotState::from(status.as_str()),
                    plate: None,
                },
                Value::Object(_) => SpotEntry {
                    spot: spot.clone(),
                    status: SpotState::from(
                        data["status"]
                            .as_str()
                            .ok_or_else(|| missing("status", data))?,
                    ),
                    plate: plate(&data["plate"]),
                },
                _ => return Err(PayloadError::UnexpectedType("spot entry", data.to_string())),
            };
            entries.push(entry);
        }
        Ok(SpotMap { entries })
    }
}

impl PushUpdate {
    pub fn from_json(value: &Value) -> Result<Self, PayloadError> {
        let spot_number = identifier(value, "spot_number")?;
        match &value["status"] {
            Value::String(status) => Ok(PushUpdate {
                spot_number,
                status: SpotState::from(status.as_str()),
                plate: plate(&value["plate"]),
            }),
            // The detector emits `{status: {status, plate}}` when it pairs a plate with a bay.
            nested @ Value::Object(_) => Ok(PushUpdate {
                spot_number,
                status: SpotState::from(
                    nested["status"]
                        .as_str()
                        .ok_or_else(|| missing("status", nested))?,
                ),
                plate: plate(&nested["plate"]).or_else(|| plate(&value["plate"])),
            }),
            Value::Null => Err(missing("status", value)),
            other => Err(PayloadError::UnexpectedType("status", other.to_string())),
        }
    }
}

fn missing(field: &'static str, value: &Value) -> PayloadError {
    PayloadError::MissingField(field, value.to_string())
}

fn counter(value: &Value, field: &'static str) -> Result<i64, PayloadError> {
    value[field].as_i64().ok_or_else(|| missing(field, value))
}

fn identifier(value: &Value, field: &'static str) -> Result<String, PayloadError> {
    match &value[field] {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(number_id(n)),
        Value::Null => Err(missing(field, value)),
        other => Err(PayloadError::UnexpectedType(field, other.to_string())),
    }
}

/// Whole-valued floats (`1.0`) print like integers so they map to the same element.
fn number_id(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.is_finite() && f.fract() == 0.0 => format!("{}", f as i64),
        _ => n.to_string(),
    }
}

/// Empty strings count as "no plate", same as null.
fn plate(value: &Value) -> Option<String> {
    value
        .as_str()
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}
