//! # Galeria Server
//!
//! Serves a directory of JPEG photos as a password-protected web gallery.
//!
//! At startup every photo is thumbnailed in parallel (bounded by a
//! concurrency budget) and the results are frozen into an in-memory index.
//! Only then does the HTTP listener bind. Requests are served from that
//! index, except for full-size photos and on-demand rescales which read the
//! original file.

pub mod auth;
pub mod handlers;
pub mod infra;
pub mod progress;
pub mod routes;
pub mod views;

pub use infra::app_state::AppState;
