//! Library components of the `pendant-data` maintenance tool.

pub mod commands;
pub mod logging;
pub mod summary;
