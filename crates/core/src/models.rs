use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvoiceNumberError {
    #[error("invoice number is empty")]
    Missing,
}

/// Invoice number as typed into the purchase form.
///
/// Always trimmed and never empty. Uniqueness is decided by the server,
/// never here.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InvoiceNumber(String);

impl InvoiceNumber {
    pub fn parse(raw: &str) -> Result<Self, InvoiceNumberError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(InvoiceNumberError::Missing);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvoiceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for InvoiceNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Ordered name/value entries of a submitted form.
///
/// Values are kept as text exactly as entered. Names may repeat; when the
/// form is turned into a JSON object the last entry for a name wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    entries: Vec<(String, String)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Replace every entry named `name` with a single one, keeping the
    /// position of the first occurrence.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter().position(|(n, _)| *n == name) {
            Some(first) => {
                self.entries[first].1 = value;
                let mut idx = 0;
                self.entries.retain(|(n, _)| {
                    let keep = idx <= first || *n != name;
                    idx += 1;
                    keep
                });
            }
            None => self.entries.push((name, value)),
        }
    }

    /// First value stored under `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read the invoice number out of `field`. A missing field counts as
    /// an empty one.
    pub fn invoice_number(&self, field: &str) -> Result<InvoiceNumber, InvoiceNumberError> {
        InvoiceNumber::parse(self.get(field).unwrap_or_default())
    }

    /// Flat JSON object with every field as a string value.
    pub fn to_json_object(&self) -> Map<String, Value> {
        let mut out = Map::new();
        for (name, value) in &self.entries {
            out.insert(name.clone(), Value::String(value.clone()));
        }
        out
    }
}

impl<K, V> FromIterator<(K, V)> for FormData
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut form = FormData::new();
        for (k, v) in iter {
            form.append(k, v);
        }
        form
    }
}

impl Serialize for FormData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json_object().serialize(serializer)
    }
}
