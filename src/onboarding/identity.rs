//! Who is onboarding.

/// Supplies the authenticated user id, if any.
pub trait Identity: Send + Sync {
    fn current_user_id(&self) -> Option<String>;
}

/// Fixed identity, set when the session is created.
#[derive(Debug, Clone, Default)]
pub struct FixedIdentity(Option<String>);

impl FixedIdentity {
    pub fn user(id: impl Into<String>) -> Self {
        Self(Some(id.into()))
    }

    pub fn anonymous() -> Self {
        Self(None)
    }
}

impl From<Option<String>> for FixedIdentity {
    fn from(id: Option<String>) -> Self {
        Self(id.filter(|s| !s.trim().is_empty()))
    }
}

impl Identity for FixedIdentity {
    fn current_user_id(&self) -> Option<String> {
        self.0.clone()
    }
}
