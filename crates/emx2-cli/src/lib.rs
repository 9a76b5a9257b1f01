//! Library side of the `odm2emx2` binary.

pub mod config;
pub mod logging;
pub mod pipeline;
pub mod types;
