pub mod api;
pub mod authoring;
pub mod config;
pub mod db;
pub mod error;
pub mod explore;
pub mod hosted;
pub mod mentorship;
pub mod models;
pub mod playback;
pub mod routes;
pub mod session;
pub mod state;
pub mod views;
