//! Identifiers of sections, projects and users.
//!
//! All three are opaque strings on the wire. Only sections and projects are
//! minted locally; user ids always come from the auth provider.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Declares a transparent string identifier. `minted` adds `generate()`.
macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self(raw)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self(raw.to_owned())
            }
        }
    };
    ($(#[$doc:meta])* $name:ident, minted) => {
        string_id!($(#[$doc])* $name);

        impl $name {
            /// Fresh random v4 identifier.
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }
        }
    };
}

string_id!(
    /// Stable identifier of one section within a page. Survives saves,
    /// reloads and media promotion.
    SectionId,
    minted
);

string_id!(
    /// Remote project identifier.
    ProjectId,
    minted
);

string_id!(
    /// Authenticated user identifier as issued by the auth provider.
    UserId
);
