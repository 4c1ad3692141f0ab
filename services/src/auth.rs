//! Caller identity passed explicitly into every operation that needs it.
//!
//! The context is produced by whatever authenticated the request and is
//! trusted as already verified.

use crate::accounts::Account;
use crate::error::StoreError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    username: Option<String>,
    admin: bool,
    uploader: bool,
}

impl AuthContext {
    /// A caller with no identity and no roles.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// An authenticated caller without roles.
    pub fn for_user(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            admin: false,
            uploader: false,
        }
    }

    /// An authenticated caller holding both roles.
    pub fn admin(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            admin: true,
            uploader: true,
        }
    }

    pub fn from_account(account: &Account) -> Self {
        Self {
            username: Some(account.username.clone()),
            admin: account.admin,
            uploader: account.uploader,
        }
    }

    pub fn with_uploader(mut self, uploader: bool) -> Self {
        self.uploader = uploader;
        self
    }

    pub fn with_admin(mut self, admin: bool) -> Self {
        self.admin = admin;
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.username.is_some()
    }

    /// Roles only count for authenticated callers.
    pub fn is_admin(&self) -> bool {
        self.is_authenticated() && self.admin
    }

    pub fn is_uploader(&self) -> bool {
        self.is_authenticated() && self.uploader
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn current_username(&self) -> Result<&str, StoreError> {
        self.username()
            .ok_or_else(|| StoreError::Unauthorized("no authenticated user".to_owned()))
    }

    /// Whether the caller may edit a post uploaded by `uploader`.
    pub fn can_edit(&self, uploader: &str) -> bool {
        self.is_admin() || (self.is_uploader() && self.username() == Some(uploader))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_has_no_roles() {
        let ctx = AuthContext::anonymous().with_admin(true).with_uploader(true);
        assert!(!ctx.is_authenticated());
        assert!(!ctx.is_admin());
        assert!(!ctx.is_uploader());
        assert!(ctx.current_username().unwrap_err().is_unauthorized());
    }

    #[test]
    fn test_admin_implies_uploader() {
        let ctx = AuthContext::admin("root");
        assert!(ctx.is_admin());
        assert!(ctx.is_uploader());
        assert_eq!(ctx.current_username().expect("authenticated"), "root");
    }

    #[test]
    fn test_can_edit_own_posts_only() {
        let alice = AuthContext::for_user("alice").with_uploader(true);
        assert!(alice.can_edit("alice"));
        assert!(!alice.can_edit("bob"));

        let reader = AuthContext::for_user("alice");
        assert!(!reader.can_edit("alice"));

        assert!(AuthContext::admin("root").can_edit("bob"));
    }
}
