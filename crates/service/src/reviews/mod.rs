//! Reviews: list, create (with nested-route defaulting) and delete.

pub mod domain;
pub mod repository;
pub mod seaorm;
pub mod service;

pub use service::ReviewService;
