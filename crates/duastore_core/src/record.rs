//! Record shapes: incoming writes, stored records and the public view.
//!
//! Every record carries two system fields next to its free-form content:
//! `id` (the store key, never part of the stored document) and `version`
//! (epoch millis of the last accepted change, stored inside the document).

use crate::error::{CoreError, CoreResult};
use duastore_codec::{Document, Value};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Name of the identity field in incoming and outgoing records.
pub const ID_FIELD: &str = "id";

/// Name of the version field in stored documents and delta output.
pub const VERSION_FIELD: &str = "version";

/// An incoming write split into its identity and content.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingRecord {
    /// Caller-supplied id, if any.
    pub id: Option<String>,
    /// Content fields, without system fields.
    pub fields: Document,
}

impl IncomingRecord {
    /// Splits a raw write payload.
    ///
    /// The `id` field is coerced to a string key. A blank id (`null`,
    /// `false`, `0`, `""`) counts as no id at all. Any `version` field is
    /// dropped: versions are assigned by the engine, never by callers.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidRecord` if the id is an array or a map.
    pub fn from_document(mut document: Document) -> CoreResult<Self> {
        document.remove(VERSION_FIELD);
        let id = match document.remove(ID_FIELD) {
            None => None,
            Some(value) if value.is_blank() => None,
            Some(Value::Text(s)) => Some(s),
            Some(value @ (Value::Bool(_) | Value::Integer(_) | Value::Float(_))) => {
                Some(value.to_string())
            }
            Some(other) => {
                return Err(CoreError::InvalidRecord(format!(
                    "id must be text or a number, found {}",
                    other.kind()
                )))
            }
        };
        Ok(Self {
            id,
            fields: document,
        })
    }
}

/// A record as callers see it: id and content, no version.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Record id.
    pub id: String,
    /// Content fields.
    pub fields: Document,
}

/// A record as stored, including its version stamp.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    /// Record id.
    pub id: String,
    /// Content fields.
    pub fields: Document,
    /// Epoch millis of the last accepted change.
    pub version: u64,
}

impl Record {
    /// Flattens into one document with the id next to the content.
    pub fn into_wire(self) -> Document {
        let mut document = self.fields;
        document.insert(ID_FIELD.to_string(), Value::Text(self.id));
        document
    }
}

impl StoredRecord {
    /// Creates a stored record.
    pub fn new(id: impl Into<String>, fields: Document, version: u64) -> Self {
        Self {
            id: id.into(),
            fields,
            version,
        }
    }

    /// Rebuilds a record from a stored document.
    ///
    /// Documents without a usable `version` read as version 0. A stray
    /// `id` field inside the document is ignored; the store key wins.
    pub fn from_document(id: impl Into<String>, mut document: Document) -> Self {
        let version = document
            .remove(VERSION_FIELD)
            .and_then(|v| v.as_integer())
            .and_then(|v| u64::try_from(v).ok())
            .unwrap_or(0);
        document.remove(ID_FIELD);
        Self::new(id, document, version)
    }

    /// Builds the document persisted for this record.
    pub fn to_document(&self) -> Document {
        let mut document = self.fields.clone();
        document.insert(
            VERSION_FIELD.to_string(),
            Value::Integer(i64::try_from(self.version).unwrap_or(i64::MAX)),
        );
        document
    }

    /// Flattens into one document carrying both the id and the version.
    pub fn into_wire(self) -> Document {
        let mut document = self.to_document();
        document.insert(ID_FIELD.to_string(), Value::Text(self.id));
        document
    }

    /// Drops the version, producing the public view.
    pub fn into_record(self) -> Record {
        Record {
            id: self.id,
            fields: self.fields,
        }
    }
}

impl From<StoredRecord> for Record {
    fn from(stored: StoredRecord) -> Self {
        stored.into_record()
    }
}

fn serialize_flat<S: Serializer>(
    serializer: S,
    id: &str,
    fields: &Document,
    version: Option<u64>,
) -> Result<S::Ok, S::Error> {
    let system = 1 + usize::from(version.is_some());
    let mut map = serializer.serialize_map(Some(fields.len() + system))?;
    map.serialize_entry(ID_FIELD, id)?;
    for (key, value) in fields {
        if key != ID_FIELD && key != VERSION_FIELD {
            map.serialize_entry(key, value)?;
        }
    }
    if let Some(version) = version {
        map.serialize_entry(VERSION_FIELD, &version)?;
    }
    map.end()
}

impl Serialize for Record {
    /// Serializes flat: `{"id": ..., ...fields}`.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_flat(serializer, &self.id, &self.fields, None)
    }
}

impl Serialize for StoredRecord {
    /// Serializes flat: `{"id": ..., ...fields, "version": ...}`.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_flat(serializer, &self.id, &self.fields, Some(self.version))
    }
}
