use chrono::NaiveDate;
use serde_json::{Number, Value};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Decimal,
    Date,
    Boolean,
}

impl FromStr for FieldKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "string" => Ok(Self::Text),
            "integer" | "int" => Ok(Self::Integer),
            "decimal" | "number" => Ok(Self::Decimal),
            "date" => Ok(Self::Date),
            "boolean" | "bool" => Ok(Self::Boolean),
            other => Err(format!("unknown field kind `{other}`")),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Decimal => "decimal",
            Self::Date => "date",
            Self::Boolean => "boolean",
        };
        f.write_str(name)
    }
}

/// Convert one raw form value into its JSON representation.
///
/// Blank values of non-text kinds become `null`.
pub fn coerce_value(name: &str, kind: FieldKind, raw: &str) -> Result<Value, String> {
    let value = raw.trim();
    match kind {
        FieldKind::Text => Ok(Value::String(raw.to_string())),
        _ if value.is_empty() => Ok(Value::Null),
        FieldKind::Integer => value
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| format!("{name}: `{value}` is not a whole number")),
        FieldKind::Decimal => value
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| format!("{name}: `{value}` is not a number")),
        FieldKind::Date => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
            .map_err(|_| format!("{name}: `{value}` is not a YYYY-MM-DD date")),
        FieldKind::Boolean => match value.to_ascii_lowercase().as_str() {
            "true" | "on" | "1" => Ok(Value::Bool(true)),
            "false" | "off" | "0" => Ok(Value::Bool(false)),
            _ => Err(format!("{name}: `{value}` is not a yes/no value")),
        },
    }
}
