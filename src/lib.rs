//! BlogHub: public reading views and an admin editor over a hosted table backend.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
