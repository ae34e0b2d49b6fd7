pub mod config;
pub mod logging;

pub mod aggregate;
pub mod decode;
pub mod fallback;
pub mod fetch;
pub mod matcher;
pub mod pattern;
pub mod report;
pub mod scheduler;
pub mod seed;
