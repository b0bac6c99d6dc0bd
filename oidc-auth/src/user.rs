//! Canonical user record every decoder produces.

/// User profile as reported by an identity provider.
///
/// Fields missing from the provider's response are left empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct User {
    /// Provider's unique user identifier.
    pub id: String,
    /// Login handle.
    pub login: String,
    pub email: String,
    pub full_name: String,
    pub first_name: String,
    pub last_name: String,
    /// Permission strings granted by the provider.
    pub permissions: Vec<String>,
}
