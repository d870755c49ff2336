//! Who is editing, and which device storage scope their work lives in.

use serde::{Deserialize, Serialize};

use crate::ids::UserId;

pub const ANONYMOUS_NAMESPACE: &str = "anonymous";

/// Identity attached to every persistence operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(tag = "kind", content = "user_id", rename_all = "snake_case")]
pub enum Identity {
    #[default]
    Anonymous,
    Authenticated(UserId),
}

/// Device storage lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageScope {
    /// Cleared when the browsing session ends.
    Session,
    /// Survives restarts.
    Durable,
}

impl Identity {
    pub fn authenticated(user_id: impl Into<UserId>) -> Self {
        Identity::Authenticated(user_id.into())
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Identity::Anonymous)
    }

    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            Identity::Anonymous => None,
            Identity::Authenticated(user_id) => Some(user_id),
        }
    }

    pub fn scope(&self) -> StorageScope {
        match self {
            Identity::Anonymous => StorageScope::Session,
            Identity::Authenticated(_) => StorageScope::Durable,
        }
    }

    /// Key namespace: `"anonymous"` or the user id.
    pub fn namespace(&self) -> &str {
        match self {
            Identity::Anonymous => ANONYMOUS_NAMESPACE,
            Identity::Authenticated(user_id) => user_id.as_str(),
        }
    }
}

impl From<Option<UserId>> for Identity {
    fn from(value: Option<UserId>) -> Self {
        value.map_or(Identity::Anonymous, Identity::Authenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_uses_session_scope() {
        let identity = Identity::Anonymous;
        assert_eq!(identity.scope(), StorageScope::Session);
        assert_eq!(identity.namespace(), "anonymous");
        assert!(identity.user_id().is_none());
    }

    #[test]
    fn authenticated_uses_durable_scope_and_user_namespace() {
        let identity = Identity::authenticated("user-42");
        assert_eq!(identity.scope(), StorageScope::Durable);
        assert_eq!(identity.namespace(), "user-42");
        assert!(!identity.is_anonymous());
    }

    #[test]
    fn from_optional_user() {
        assert_eq!(Identity::from(None), Identity::Anonymous);
        assert_eq!(
            Identity::from(Some(UserId::from("u"))),
            Identity::authenticated("u")
        );
    }
}
