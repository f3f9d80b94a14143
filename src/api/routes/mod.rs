//! API Routes
//!
//! Route handlers organized by functionality.

pub mod control;
pub mod health;
pub mod video;
