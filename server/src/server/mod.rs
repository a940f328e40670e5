mod server;
mod server_config;

pub use server::ChoreoServer;
pub use server_config::ServerConfig;
