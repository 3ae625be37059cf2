//! Application services layer.

pub mod admin;
pub mod auth;
pub mod chrome;
pub mod drafts;
pub mod error;
pub mod feed;
pub mod render;
pub mod repos;
pub mod uploads;
