//! Request and response schema definitions

pub mod availability;
pub mod billing;
pub mod booking;
pub mod game;
