mod client;
mod client_config;

pub use client::ChoreoClient;
pub use client_config::ClientConfig;
