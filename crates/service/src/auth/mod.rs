//! Auth module: three-layer architecture (domain, repository, service).
//!
//! Signup, login, session tokens, role gating and the password reset flow.
//! Storage and email delivery sit behind the `UserStore` and `Notifier` traits.

pub mod clock;
pub mod domain;
pub mod errors;
pub mod notifier;
pub mod password;
pub mod repo;
pub mod repository;
pub mod reset;
pub mod service;
pub mod token;

pub use service::{restrict_to, AuthConfig, AuthService};
