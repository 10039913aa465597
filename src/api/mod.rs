//! Request handlers, grouped by page.

pub mod auth;
pub mod authoring;
pub mod mentorship;
pub mod pages;
pub mod profile;
