use serde::Deserialize;
use serde_json::Value;

use crate::domain::EntryField;

#[derive(Debug, thiserror::Error)]
pub enum EntryListError {
    #[error("response has no entry_list")]
    MissingEntryList,

    #[error("invalid entry field: {0}")]
    Field(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Deserialize)]
struct EntryFieldJson {
    name: String,
    #[serde(default)]
    value: Value,
}

/// Flatten a `get_entry_list`-style response into `(name, value)` fields,
/// entry by entry, in response order.
///
/// `name_value_list` may be a list of fields or an object keyed by field name;
/// both shapes occur in the wild.
pub fn decode_entry_list(response: &Value) -> Result<Vec<EntryField>, EntryListError> {
    let entries = response
        .get("entry_list")
        .and_then(Value::as_array)
        .ok_or(EntryListError::MissingEntryList)?;

    let mut fields = Vec::new();
    for entry in entries {
        let raw_fields: Vec<&Value> = match entry.get("name_value_list") {
            Some(Value::Array(items)) => items.iter().collect(),
            Some(Value::Object(map)) => map.values().collect(),
            _ => Vec::new(),
        };
        for raw in raw_fields {
            let field = EntryFieldJson::deserialize(raw)?;
            fields.push(EntryField {
                name: field.name,
                value: field.value,
            });
        }
    }
    Ok(fields)
}
