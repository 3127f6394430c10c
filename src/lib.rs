#[macro_use]
extern crate failure;

pub mod client;
pub mod config;
pub mod dom;
pub mod page;
pub mod poller;
pub mod push;
pub mod render;
pub mod schedule;
pub mod state;
pub mod types;
pub mod view;
