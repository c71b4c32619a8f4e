//! Line-oriented front end for running the limiter as a process.
//!
//! Each input line is a JSON object such as
//! `{"op":"consume","identifier":"10.0.0.5","class":"login"}`; each output
//! line is the matching JSON response.

mod server;
mod service;

pub use server::LineServer;
pub use service::{DriverRequest, DriverResponse, LimitService};
