#![allow(dead_code)]

pub mod fake;
pub mod http_server;
