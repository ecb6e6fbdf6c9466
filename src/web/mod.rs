//! Web server for the landing page, reservations and verification
//!
//! Serves the server-rendered pages and the JSON endpoints they call.

mod api;
mod pages;
mod server;

pub use server::{build_state, start_web_server};
