pub mod config;
pub mod constants;
pub mod encounter;
pub mod engine;
pub mod error;
pub mod ghost;
pub mod grid;
pub mod motion;
pub mod pickup;
pub mod power;
pub mod rng;
pub mod server_protocol;
pub mod session;
pub mod types;
pub mod world;
