//! Askama views and the response helpers that render them.

pub mod views;
