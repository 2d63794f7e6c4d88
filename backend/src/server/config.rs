//! HTTP server configuration object.

use std::net::SocketAddr;

use backend::settings::AppSettings;

/// Builder-style configuration for creating the HTTP server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) frontend_origin: String,
}

impl ServerConfig {
    #[must_use]
    pub fn new(bind_addr: SocketAddr, frontend_origin: impl Into<String>) -> Self {
        Self {
            bind_addr,
            frontend_origin: frontend_origin.into(),
        }
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}

impl From<&AppSettings> for ServerConfig {
    fn from(settings: &AppSettings) -> Self {
        Self::new(settings.bind_addr, settings.frontend_origin.clone())
    }
}
