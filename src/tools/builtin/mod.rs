pub mod calculator;
pub mod phone;
pub mod search;
pub mod time;
pub mod weather;

use serde_json::json;

use crate::tools::definition::ToolDefinition;

pub const GET_CURRENT_WEATHER: &str = "get_current_weather";
pub const SEARCH_WEB: &str = "search_web";
pub const GET_CURRENT_TIME: &str = "get_current_time";
pub const CALCULATE: &str = "calculate";
pub const CALL_PHONE_NUMBER: &str = "call_phone_number";

pub fn definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: GET_CURRENT_WEATHER.to_string(),
            description: "Get the current weather in a given location".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "location": { "type": "string", "description": "The city and state, e.g. San Francisco, CA" },
                    "unit": { "type": "string", "enum": ["celsius", "fahrenheit"], "description": "The unit of temperature" }
                },
                "required": ["location"]
            }),
        },
        ToolDefinition {
            name: SEARCH_WEB.to_string(),
            description: "Search the web for current information".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "The search query" },
                    "num_results": { "type": "integer", "description": "Number of results to return (default 3)", "default": 3 }
                },
                "required": ["query"]
            }),
        },
        ToolDefinition {
            name: GET_CURRENT_TIME.to_string(),
            description: "Get the current date and time".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "timezone": { "type": "string", "description": "Timezone (e.g., 'UTC', 'America/New_York')", "default": "UTC" }
                },
                "required": []
            }),
        },
        ToolDefinition {
            name: CALCULATE.to_string(),
            description: "Perform mathematical calculations with + - * / ^, unary minus and parentheses".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "expression": { "type": "string", "description": "Arithmetic expression to evaluate (e.g., '2 + 2', '(3 - 1) ^ 2')" }
                },
                "required": ["expression"]
            }),
        },
        ToolDefinition {
            name: CALL_PHONE_NUMBER.to_string(),
            description: "Make a phone call to a specified phone number".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "phone_number": { "type": "string", "description": "The phone number to call (e.g., '+1-555-123-4567', '(555) 123-4567')" },
                    "contact_name": { "type": "string", "description": "Optional name of the contact being called" }
                },
                "required": ["phone_number"]
            }),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn definitions_have_unique_names_and_object_schemas() {
        let defs = definitions();
        let names: HashSet<_> = defs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names.len(), defs.len());
        for def in &defs {
            assert_eq!(def.parameters["type"], "object", "{}", def.name);
            assert!(!def.description.is_empty());
        }
    }
}
