//! Input helpers shared by the commands.

use serde_json::Value;
use std::io::{self, Read};

/// Reads JSON from a file, or from stdin when no path is given.
pub fn read_json(input: Option<String>) -> Result<Value, Box<dyn std::error::Error>> {
    let json_str = if let Some(path) = input {
        std::fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read file {}: {}", path, e))?
    } else {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    };

    let value = serde_json::from_str(&json_str).map_err(|e| format!("Invalid JSON: {}", e))?;
    Ok(value)
}

/// Reads a JSON array.
pub fn read_array(input: Option<String>) -> Result<Vec<Value>, Box<dyn std::error::Error>> {
    match read_json(input)? {
        Value::Array(items) => Ok(items),
        other => Err(format!("Expected a JSON array, got {}", kind(&other)).into()),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
