//! Service layer providing business operations on top of models.
//! - `auth`: signup, login, session tokens, role gating, password reset.
//! - `reviews`: review listing, creation and deletion.
//! - Storage and outbound email sit behind traits with in-memory mocks.

pub mod errors;
pub mod auth;
pub mod reviews;
#[cfg(test)]
pub mod test_support;
