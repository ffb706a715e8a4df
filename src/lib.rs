pub mod cli;
pub mod client;
pub mod config;
pub mod resolver;
pub mod server;
pub mod utils;

#[cfg(test)]
mod testing;
