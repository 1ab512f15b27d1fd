use crate::models::FormData;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormError {
    #[error("form file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("form JSON must be a flat object")]
    NotAnObject,
    #[error("field `{0}` holds a nested value; only text, numbers and booleans are allowed")]
    NestedValue(String),
    #[error("line {line}: expected `name=value`")]
    MalformedLine { line: usize },
    #[error("field argument `{0}` must look like `name=value`")]
    MalformedField(String),
    #[error("field name is empty")]
    EmptyName,
}

/// Parse a flat JSON object into form entries.
///
/// Numbers and booleans become their textual form, the same way an input
/// element hands them over. `null` becomes an empty value.
pub fn parse_form_json(input: &str) -> Result<FormData, FormError> {
    let value: Value = serde_json::from_str(input)?;
    let Value::Object(map) = value else {
        return Err(FormError::NotAnObject);
    };

    let mut form = FormData::new();
    for (name, value) in map {
        let text = match value {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Null => String::new(),
            Value::Array(_) | Value::Object(_) => return Err(FormError::NestedValue(name)),
        };
        form.append(name, text);
    }
    Ok(form)
}

/// Parse `name=value` lines. Blank lines and lines starting with `#` are
/// skipped; everything after the first `=` belongs to the value.
pub fn parse_form_lines(input: &str) -> Result<FormData, FormError> {
    let mut form = FormData::new();
    for (idx, raw) in input.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (name, value) = line
            .split_once('=')
            .ok_or(FormError::MalformedLine { line: idx + 1 })?;
        let name = name.trim();
        if name.is_empty() {
            return Err(FormError::MalformedLine { line: idx + 1 });
        }
        form.append(name, value);
    }
    Ok(form)
}

/// Pick the parser from the content: a leading `{` means JSON.
pub fn parse_form(input: &str) -> Result<FormData, FormError> {
    if input.trim_start().starts_with('{') {
        parse_form_json(input)
    } else {
        parse_form_lines(input)
    }
}

/// Split a single `name=value` command line argument.
pub fn parse_field_arg(arg: &str) -> Result<(String, String), FormError> {
    let (name, value) = arg
        .split_once('=')
        .ok_or_else(|| FormError::MalformedField(arg.to_string()))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(FormError::EmptyName);
    }
    Ok((name.to_string(), value.to_string()))
}
