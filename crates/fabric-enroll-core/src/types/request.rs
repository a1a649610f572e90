use serde::{Deserialize, Serialize};
use std::fmt;

/// Attribute the CA should embed in the issued certificate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeRequest {
    /// Attribute name registered for the identity
    pub name: String,
    /// Whether enrollment may proceed if the identity lacks the attribute
    #[serde(default)]
    pub optional: bool,
}

/// Credentials and CSR options for one enrollment.
///
/// The secret is single use on most CAs; it is redacted from `Debug`
/// output and never logged.
#[derive(Clone, PartialEq, Eq)]
pub struct EnrollmentRequest {
    enrollment_id: String,
    enrollment_secret: String,
    common_name: Option<String>,
    hosts: Vec<String>,
    profile: Option<String>,
    attr_reqs: Vec<AttributeRequest>,
}

impl EnrollmentRequest {
    /// Create a request for `enrollment_id` authenticated by `enrollment_secret`
    pub fn new(enrollment_id: impl Into<String>, enrollment_secret: impl Into<String>) -> Self {
        Self {
            enrollment_id: enrollment_id.into(),
            enrollment_secret: enrollment_secret.into(),
            common_name: None,
            hosts: Vec::new(),
            profile: None,
            attr_reqs: Vec::new(),
        }
    }

    /// Override the CSR common name (defaults to the enrollment id)
    #[must_use]
    pub fn common_name(mut self, cn: impl Into<String>) -> Self {
        self.common_name = Some(cn.into());
        self
    }

    /// Add a subject alternative name to the CSR
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.hosts.push(host.into());
        self
    }

    /// Ask the CA to sign with a named profile (e.g. `tls`)
    #[must_use]
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Request an attribute in the issued certificate
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>, optional: bool) -> Self {
        self.attr_reqs.push(AttributeRequest {
            name: name.into(),
            optional,
        });
        self
    }

    /// Enrollment id registered with the CA
    #[must_use]
    pub fn enrollment_id(&self) -> &str {
        &self.enrollment_id
    }

    /// One-time enrollment secret
    #[must_use]
    pub fn enrollment_secret(&self) -> &str {
        &self.enrollment_secret
    }

    /// CSR common name
    #[must_use]
    pub fn subject_common_name(&self) -> &str {
        self.common_name.as_deref().unwrap_or(&self.enrollment_id)
    }

    /// Subject alternative names for the CSR
    #[must_use]
    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    /// Signing profile, if any
    #[must_use]
    pub fn signing_profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    /// Requested attributes
    #[must_use]
    pub fn attribute_requests(&self) -> &[AttributeRequest] {
        &self.attr_reqs
    }
}

impl fmt::Debug for EnrollmentRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnrollmentRequest")
            .field("enrollment_id", &self.enrollment_id)
            .field("enrollment_secret", &"<redacted>")
            .field("common_name", &self.subject_common_name())
            .field("hosts", &self.hosts)
            .field("profile", &self.profile)
            .field("attr_reqs", &self.attr_reqs)
            .finish()
    }
}
