//! HTTP route handlers

pub mod alerts;
pub mod analysis;
pub mod samples;
pub mod sessions;
