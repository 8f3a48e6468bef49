//! The fixed set of managed collections.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Store collection holding the admin settings document.
pub const SETTINGS_COLLECTION: &str = "setting";

/// Id of the admin settings document.
pub const ADMIN_DOCUMENT_ID: &str = "admin";

/// Field of the admin settings document listing authorized emails.
pub const ADMIN_EMAIL_FIELD: &str = "email";

/// One of the editorial record collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    /// Topic tags.
    Tags,
    /// Supplications.
    Duas,
    /// Themes grouping duas.
    Themes,
}

impl Collection {
    /// Every managed collection.
    pub const ALL: [Collection; 3] = [Collection::Tags, Collection::Duas, Collection::Themes];

    /// The store name of this collection.
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Tags => "tags",
            Collection::Duas => "duas",
            Collection::Themes => "themes",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Collection {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Collection::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| CoreError::UnknownCollection(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_collections() {
        for c in Collection::ALL {
            assert_eq!(c.as_str().parse::<Collection>().unwrap(), c);
        }
    }

    #[test]
    fn reject_other_names() {
        for name in ["setting", "Tags", "", "users"] {
            assert!(matches!(
                name.parse::<Collection>(),
                Err(CoreError::UnknownCollection(_))
            ));
        }
    }

    #[test]
    fn serializes_as_lowercase_name() {
        assert_eq!(
            serde_json::to_string(&Collection::Duas).unwrap(),
            "\"duas\""
        );
    }
}
