use serde_json::{Map, Value};

use crate::error::AppError;
use crate::tools::builtin::{CALCULATE, CALL_PHONE_NUMBER, GET_CURRENT_TIME, GET_CURRENT_WEATHER, SEARCH_WEB};

pub const DEFAULT_NUM_RESULTS: usize = 3;
pub const DEFAULT_TIMEZONE: &str = "UTC";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureUnit {
    Celsius,
    Fahrenheit,
}

/// Arguments for each builtin tool, decoded from the model's untrusted payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolArgs {
    Weather {
        location: String,
        unit: TemperatureUnit,
    },
    WebSearch {
        query: String,
        num_results: usize,
    },
    CurrentTime {
        timezone: String,
    },
    Calculate {
        expression: String,
    },
    PlaceCall {
        phone_number: String,
        contact_name: Option<String>,
    },
}

impl ToolArgs {
    pub fn decode(tool_name: &str, args: &Map<String, Value>) -> Result<Self, AppError> {
        match tool_name {
            GET_CURRENT_WEATHER => {
                let location = required_str(args, tool_name, "location")?;
                let unit = as_str(args, "unit")
                    .map(|u| parse_unit(&u))
                    .unwrap_or(TemperatureUnit::Celsius);
                Ok(ToolArgs::Weather { location, unit })
            }
            SEARCH_WEB => {
                let query = required_str(args, tool_name, "query")?;
                let num_results = as_i64(args, "num_results")
                    .filter(|n| *n > 0)
                    .map(|n| n as usize)
                    .unwrap_or(DEFAULT_NUM_RESULTS);
                Ok(ToolArgs::WebSearch { query, num_results })
            }
            GET_CURRENT_TIME => {
                let timezone = as_str(args, "timezone").unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
                Ok(ToolArgs::CurrentTime { timezone })
            }
            CALCULATE => {
                let expression = required_str(args, tool_name, "expression")?;
                Ok(ToolArgs::Calculate { expression })
            }
            CALL_PHONE_NUMBER => {
                let phone_number = required_str(args, tool_name, "phone_number")?;
                let contact_name = as_str(args, "contact_name");
                Ok(ToolArgs::PlaceCall {
                    phone_number,
                    contact_name,
                })
            }
            _ => Err(AppError::ToolNotFound(tool_name.to_string())),
        }
    }
}

/// Coerces a raw arguments payload into a key/value map. Anything that is not
/// a JSON object (or a string holding one) becomes the empty map.
pub fn normalize_arguments(raw: &Value) -> Map<String, Value> {
    match raw {
        Value::Object(map) => map.clone(),
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        },
        _ => Map::new(),
    }
}

/// Anything that is not celsius reads as fahrenheit.
fn parse_unit(raw: &str) -> TemperatureUnit {
    match raw.to_ascii_lowercase().as_str() {
        "celsius" | "c" => TemperatureUnit::Celsius,
        _ => TemperatureUnit::Fahrenheit,
    }
}

fn as_str(args: &Map<String, Value>, key: &str) -> Option<String> {
    args.get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

fn required_str(args: &Map<String, Value>, tool: &str, key: &str) -> Result<String, AppError> {
    as_str(args, key).ok_or_else(|| AppError::missing_argument(tool, key))
}

fn as_i64(args: &Map<String, Value>, key: &str) -> Option<i64> {
    match args.get(key)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
