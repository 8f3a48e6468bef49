//! Request and response messages.
//!
//! Records travel flat: the `id` sits next to the content fields, and
//! `version` is present only in update-check responses.

use crate::error::ProtocolResult;
use duastore_codec::Document;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// A list of flat records.
pub type RecordList = Vec<Document>;

/// A request to the content API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "body", rename_all = "camelCase")]
pub enum Request {
    /// Ask whether a caller may edit content.
    VerifyAuthority(VerifyAuthorityRequest),
    /// Fetch records changed after a watermark.
    CheckUpdates(CheckUpdatesRequest),
    /// Fetch a whole collection.
    Open {
        /// Collection name.
        collection: String,
    },
    /// Upsert one record.
    Set {
        /// Collection name.
        collection: String,
        /// Flat record, `id` optional.
        record: Document,
    },
    /// Upsert many records.
    SetAll {
        /// Collection name.
        collection: String,
        /// Flat records, `id` optional.
        records: RecordList,
    },
}

impl Request {
    /// Returns the operation name, as it appears on the wire.
    pub fn operation(&self) -> &'static str {
        match self {
            Request::VerifyAuthority(_) => "verifyAuthority",
            Request::CheckUpdates(_) => "checkUpdates",
            Request::Open { .. } => "open",
            Request::Set { .. } => "set",
            Request::SetAll { .. } => "setAll",
        }
    }

    /// Encodes to JSON.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes from JSON.
    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// A response from the content API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "body", rename_all = "camelCase")]
pub enum Response {
    /// Authority decision.
    VerifyAuthority(VerifyAuthorityResponse),
    /// Changed records per collection.
    CheckUpdates(CheckUpdatesResponse),
    /// All records of a collection, without versions.
    Open(RecordList),
    /// The record as stored, without version.
    Set(Document),
    /// One outcome per submitted record, in order.
    SetAll(Vec<ItemOutcome>),
    /// The request failed.
    Error(ErrorResponse),
}

impl Response {
    /// Encodes to JSON.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes from JSON.
    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Returns true if this is an error response.
    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error(_))
    }
}

/// Authority check input. Both fields are optional; a token wins over an
/// email when both are present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyAuthorityRequest {
    /// Email to check directly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Signed identity token carrying an email claim.
    #[serde(default, alias = "idToken", skip_serializing_if = "Option::is_none")]
    pub identity_token: Option<String>,
}

impl VerifyAuthorityRequest {
    /// Creates a request checking an email.
    pub fn email(email: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            identity_token: None,
        }
    }

    /// Creates a request checking an identity token.
    pub fn token(token: impl Into<String>) -> Self {
        Self {
            email: None,
            identity_token: Some(token.into()),
        }
    }
}

/// Authority decision, echoing the token claims when access is granted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyAuthorityResponse {
    /// Whether the caller may edit content.
    pub has_authority: bool,
    /// Decoded token claims, flattened into the response.
    #[serde(flatten)]
    pub claims: Document,
}

impl VerifyAuthorityResponse {
    /// A refusal with no claims.
    pub fn denied() -> Self {
        Self::default()
    }

    /// A decision with no claims.
    pub fn decided(has_authority: bool) -> Self {
        Self {
            has_authority,
            claims: Document::new(),
        }
    }

    /// A grant carrying token claims.
    pub fn granted(claims: Document) -> Self {
        Self {
            has_authority: true,
            claims,
        }
    }
}

/// Update check input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckUpdatesRequest {
    /// Highest version the client has seen. Absent means "everything".
    ///
    /// Accepted as an integer, an integral float or a numeric string.
    #[serde(
        default,
        deserialize_with = "deserialize_watermark",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<u64>,
}

fn deserialize_watermark<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Integer(u64),
        Float(f64),
        Text(String),
    }

    fn from_float(f: f64) -> Option<u64> {
        (f >= 0.0 && f.fract() == 0.0 && f < u64::MAX as f64).then_some(f as u64)
    }

    let Some(raw) = Option::<Raw>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let watermark = match &raw {
        Raw::Integer(n) => Some(*n),
        Raw::Float(f) => from_float(*f),
        Raw::Text(text) => {
            let text = text.trim();
            text.parse::<u64>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().and_then(from_float))
        }
    };
    match watermark {
        Some(n) => Ok(Some(n)),
        None => Err(D::Error::custom(match raw {
            Raw::Text(text) => format!("invalid watermark {text:?}"),
            Raw::Float(f) => format!("invalid watermark {f}"),
            Raw::Integer(n) => format!("invalid watermark {n}"),
        })),
    }
}

impl CheckUpdatesRequest {
    /// Creates a request for changes after `timestamp`.
    pub fn since(timestamp: u64) -> Self {
        Self {
            timestamp: Some(timestamp),
        }
    }
}

/// Records changed after the watermark, with versions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckUpdatesResponse {
    /// Changed tags.
    pub tags: RecordList,
    /// Changed duas.
    pub duas: RecordList,
    /// Changed themes.
    pub themes: RecordList,
}

impl CheckUpdatesResponse {
    /// Returns the highest version across all collections, if any.
    ///
    /// Clients store this as their next watermark.
    pub fn max_version(&self) -> Option<u64> {
        self.tags
            .iter()
            .chain(&self.duas)
            .chain(&self.themes)
            .filter_map(|record| record.get("version"))
            .filter_map(|v| v.as_integer())
            .filter_map(|v| u64::try_from(v).ok())
            .max()
    }

    /// Returns the total number of records.
    pub fn len(&self) -> usize {
        self.tags.len() + self.duas.len() + self.themes.len()
    }

    /// Returns true if nothing changed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The outcome of one record of a batch write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ItemOutcome {
    /// Stored (or found unchanged); the record is shown without version.
    Stored {
        /// The record as stored.
        record: Document,
    },
    /// Left out because it carried no id.
    Skipped,
    /// Failed without affecting the rest of the batch.
    Failed {
        /// What went wrong.
        error: String,
    },
}

/// A failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// HTTP-style status code.
    pub status: u16,
    /// Human-readable message.
    pub message: String,
}

impl ErrorResponse {
    /// Creates an error response.
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}
