//! Attendance synchronization and time accounting for biometric terminals.
//!
//! [`device`] speaks the terminal control protocol, [`sync`] pulls punches and
//! identities into the [`store`] repositories, and [`attendance`] derives daily
//! verdicts and range summaries from what was stored.

pub mod api;
pub mod attendance;
pub mod config;
pub mod db;
pub mod device;
pub mod docs;
pub mod model;
pub mod routes;
pub mod state;
pub mod store;
pub mod sync;
pub mod utils;
