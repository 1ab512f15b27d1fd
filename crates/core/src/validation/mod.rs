mod rules;

pub use rules::{coerce_value, FieldKind};

use crate::models::FormData;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Expected JSON type per form field.
///
/// Fields without an entry are sent as text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormSchema {
    fields: BTreeMap<String, FieldKind>,
}

impl FormSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Field kinds of the purchase (pembelian) form.
    pub fn purchase() -> Self {
        Self::new()
            .with_field("tanggal_faktur", FieldKind::Date)
            .with_field("no_faktur", FieldKind::Text)
            .with_field("supplier", FieldKind::Integer)
            .with_field("jenis_pembayaran", FieldKind::Text)
    }

    pub fn with_field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.insert(name.into(), kind);
        self
    }

    /// Build a schema from `field -> kind name` pairs, e.g. as read from a
    /// config file.
    pub fn from_names<'a, I>(pairs: I) -> Result<Self, Vec<String>>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut schema = Self::new();
        let mut errs = Vec::new();
        for (field, kind) in pairs {
            match kind.parse::<FieldKind>() {
                Ok(kind) => {
                    schema.fields.insert(field.to_string(), kind);
                }
                Err(e) => errs.push(format!("{field}: {e}")),
            }
        }
        if errs.is_empty() {
            Ok(schema)
        } else {
            Err(errs)
        }
    }

    pub fn kind_of(&self, field: &str) -> FieldKind {
        self.fields.get(field).copied().unwrap_or(FieldKind::Text)
    }
}

/// Turn the form into a JSON object following `schema`. Every failing
/// field is reported, not only the first one.
pub fn coerce(form: &FormData, schema: &FormSchema) -> Result<Map<String, Value>, Vec<String>> {
    let mut out = Map::new();
    let mut errs = Vec::new();

    for (name, raw) in form.entries() {
        match coerce_value(name, schema.kind_of(name), raw) {
            Ok(value) => {
                out.insert(name.to_string(), value);
            }
            Err(e) => errs.push(e),
        }
    }

    if errs.is_empty() {
        Ok(out)
    } else {
        Err(errs)
    }
}
