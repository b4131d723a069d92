use std::fmt;

use url::Url;

use crate::domain::validation::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// URL of the CRM REST service, usually `.../service/v4/rest.php`.
///
/// Invariant: absolute URL with a host and an explicit path component.
pub struct Endpoint(Url);

impl Endpoint {
    /// Name used in validation errors.
    pub const FIELD: &'static str = "endpoint";

    /// Create a validated [`Endpoint`].
    ///
    /// `https://crm.example.com` is rejected because it has no path, while
    /// `https://crm.example.com/` and `https://crm.example.com/service/v4/rest.php`
    /// are accepted.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }

        let invalid = |reason| ValidationError::InvalidEndpoint {
            input: value.clone(),
            reason,
        };
        let url = Url::parse(&value).map_err(|_| invalid("not an absolute url"))?;
        if !url.has_host() {
            return Err(invalid("missing host"));
        }
        if !has_explicit_path(&value) {
            return Err(invalid("missing path"));
        }
        Ok(Self(url))
    }

    /// Borrow the normalized URL string.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// `Url` normalizes `http://host` to `http://host/`, so the path check has to
// look at the raw input.
fn has_explicit_path(raw: &str) -> bool {
    let Some((_, rest)) = raw.trim().split_once("://") else {
        return false;
    };
    match rest.find(['/', '?', '#']) {
        Some(idx) => rest[idx..].starts_with('/'),
        None => false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Session identifier issued by the CRM on login (`session` on the wire).
///
/// Invariant: non-empty.
pub struct SessionId(String);

impl SessionId {
    /// Form field name used by the CRM (`session`).
    pub const FIELD: &'static str = "session";

    /// Create a validated [`SessionId`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.is_empty() {
            return Err(ValidationError::Empty { field: Self::FIELD });
        }
        Ok(Self(value))
    }

    /// Borrow the session id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// CRM account user name (`user_name`).
pub struct Username(String);

impl Username {
    /// JSON field name used inside `user_auth`.
    pub const FIELD: &'static str = "user_name";

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, PartialEq, Eq)]
/// CRM account password.
///
/// The password is kept as provided; only its MD5 digest goes on the wire.
/// `Debug` output never includes the value.
pub struct Password(String);

impl Password {
    /// JSON field name used inside `user_auth`.
    pub const FIELD: &'static str = "password";

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Lowercase hex MD5 digest of the password, as the legacy login call expects.
    ///
    /// MD5 offers no real protection; it is only here for protocol compatibility.
    /// Always use an `https` endpoint.
    pub fn legacy_digest(&self) -> String {
        format!("{:x}", md5::compute(self.0.as_bytes()))
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(\"***\")")
    }
}
