//! # oidc-auth
//!
//! Building blocks of the OpenID Connect / OAuth 2.0 relying party:
//! - State and PKCE generation (plain and S256)
//! - Provider clients for the authorization code flow
//! - User-info decoders selected by name
//! - The client registry built from provider configuration
//! - Temporary and persistent session storage
//!
//! ## Architecture
//!
//! This crate holds no flow logic. The `domain` crate composes the registry and
//! a session [`session::Manager`] into the login, callback and userinfo use cases.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use oidc_auth::{
//!     client::ProviderConfig,
//!     decoder,
//!     registry::{Registry, RegistryOptions},
//!     session::InMemoryManager,
//! };
//! ```

pub mod client;
pub mod decoder;
pub mod error;
pub mod http;
pub mod pkce;
pub mod registry;
pub mod session;
pub mod token;
pub mod user;

// Re-export commonly used types
pub use error::{Error, ErrorKind};
pub use token::Token;
pub use user::User;
