use std::{
    net::{Ipv4Addr, SocketAddr},
    time::Duration,
};

use crate::DEFAULT_BUFFER_SIZE;

/// Which phases an interactive [`Session`](crate::session::Session) runs for each name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Resolve the name and print the address.
    ResolveOnly,
    /// Resolve the name, then fetch content from the resolved address.
    #[default]
    ResolveAndFetch,
}

/// Endpoints and limits shared by the resolver client, the fetch client and the session.
///
/// The defaults match a resolver and content server running locally on port 20020.
#[derive(Debug, Clone)]
pub struct Config {
    resolver: SocketAddr,
    fetch_port: u16,
    buffer_size: usize,
    timeout: Duration,
    mode: Mode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            resolver: Self::DEFAULT_RESOLVER,
            fetch_port: Self::DEFAULT_FETCH_PORT,
            buffer_size: DEFAULT_BUFFER_SIZE,
            timeout: Self::DEFAULT_TIMEOUT,
            mode: Mode::default(),
        }
    }
}

impl Config {
    /// `127.0.0.1:20020`.
    pub const DEFAULT_RESOLVER: SocketAddr =
        SocketAddr::new(std::net::IpAddr::V4(Ipv4Addr::LOCALHOST), 20020);
    pub const DEFAULT_FETCH_PORT: u16 = 20020;
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Sets the address of the DNS server that names are resolved with.
    #[inline]
    pub fn resolver(self, resolver: SocketAddr) -> Self {
        Self { resolver, ..self }
    }

    /// Sets the TCP port content is fetched from on the resolved address.
    #[inline]
    pub fn fetch_port(self, fetch_port: u16) -> Self {
        Self { fetch_port, ..self }
    }

    /// Sets the size of the receive buffers.
    ///
    /// # Panics
    ///
    /// Panics if `buffer_size` is 0.
    #[inline]
    pub fn buffer_size(self, buffer_size: usize) -> Self {
        assert_ne!(buffer_size, 0, "receive buffer size must be non-zero");
        Self {
            buffer_size,
            ..self
        }
    }

    /// Sets how long a single connect or receive operation may block before failing with
    /// [`ErrorKind::Timeout`](crate::ErrorKind::Timeout).
    ///
    /// # Panics
    ///
    /// Panics if `timeout` is zero, since sockets reject a zero timeout.
    #[inline]
    pub fn timeout(self, timeout: Duration) -> Self {
        assert!(!timeout.is_zero(), "timeout must be non-zero");
        Self { timeout, ..self }
    }

    #[inline]
    pub fn mode(self, mode: Mode) -> Self {
        Self { mode, ..self }
    }

    #[inline]
    pub fn resolver_addr(&self) -> SocketAddr {
        self.resolver
    }

    #[inline]
    pub fn fetch_port_num(&self) -> u16 {
        self.fetch_port
    }

    #[inline]
    pub fn buffer_len(&self) -> usize {
        self.buffer_size
    }

    #[inline]
    pub fn timeout_duration(&self) -> Duration {
        self.timeout
    }

    #[inline]
    pub fn session_mode(&self) -> Mode {
        self.mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.resolver_addr().to_string(), "127.0.0.1:20020");
        assert_eq!(config.fetch_port_num(), 20020);
        assert_eq!(config.buffer_len(), 1024);
        assert_eq!(config.timeout_duration(), Duration::from_secs(5));
        assert_eq!(config.session_mode(), Mode::ResolveAndFetch);
    }

    #[test]
    fn builder() {
        let config = Config::default()
            .resolver("10.0.0.1:53".parse().unwrap())
            .fetch_port(8080)
            .buffer_size(4096)
            .timeout(Duration::from_millis(250))
            .mode(Mode::ResolveOnly);
        assert_eq!(config.resolver_addr().to_string(), "10.0.0.1:53");
        assert_eq!(config.fetch_port_num(), 8080);
        assert_eq!(config.buffer_len(), 4096);
        assert_eq!(config.timeout_duration(), Duration::from_millis(250));
        assert_eq!(config.session_mode(), Mode::ResolveOnly);
    }

    #[test]
    #[should_panic]
    fn zero_buffer_size() {
        let _ = Config::default().buffer_size(0);
    }
}
