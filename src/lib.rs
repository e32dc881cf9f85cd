//! studiocontroller
//!
//! A small HTTP control panel that runs Mikrotik router scripts over SSH.
//! Requests are dispatched through per-method endpoint tables; anything the
//! tables don't know is served from a resource archive or the static root.

pub mod cli;
pub mod config;
pub mod controller;
pub mod endpoint;
pub mod handler;
pub mod http;
pub mod logger;
pub mod resources;
pub mod server;
