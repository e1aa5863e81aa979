//! Content retrieval from a resolved address.
//!
//! The request is a bare `GET` with a `Host` header. The reply is read with a single `read` call
//! into a buffer of the configured size and returned unparsed: there is no status line or header
//! handling, and nothing beyond the first read is collected.

use std::{
    borrow::Cow,
    fmt,
    io::{Read, Write},
    net::{IpAddr, SocketAddr, TcpStream},
    time::Duration,
};

use socket2::{Domain, Protocol, Socket, Type};

use crate::{hex::Hex, Config, Error};

/// Raw bytes received from a content server.
#[derive(Clone, PartialEq, Eq)]
pub struct Payload {
    bytes: Vec<u8>,
}

impl Payload {
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns the payload as text, replacing invalid UTF-8 sequences.
    pub fn to_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Payload({:?})", self.to_text())
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// Fetches content from resolved addresses.
///
/// Every call opens a new TCP connection, which is closed again before the call returns.
#[derive(Debug, Clone)]
pub struct FetchClient {
    port: u16,
    buffer_size: usize,
    timeout: Duration,
}

impl FetchClient {
    pub fn new(config: &Config) -> Self {
        Self {
            port: config.fetch_port_num(),
            buffer_size: config.buffer_len(),
            timeout: config.timeout_duration(),
        }
    }

    /// Returns the port content is fetched from.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Requests `/{name}` from `address` and returns the first chunk of the reply.
    ///
    /// A peer that closes the connection without sending anything yields an empty payload.
    pub fn fetch(&self, name: &str, address: IpAddr) -> Result<Payload, Error> {
        let peer = SocketAddr::new(address, self.port);
        let mut stream = connect(peer, self.timeout).map_err(Error::from_socket)?;
        stream
            .set_read_timeout(Some(self.timeout))
            .map_err(Error::Connection)?;

        let req = request(name, address);
        log::debug!("GET /{} from {}", name, peer);
        stream
            .write_all(req.as_bytes())
            .map_err(Error::from_socket)?;

        let mut buf = vec![0; self.buffer_size];
        let len = stream.read(&mut buf).map_err(Error::from_socket)?;
        buf.truncate(len);
        log::trace!("recv from {}: {} bytes {}", peer, len, Hex(&buf));
        if len == self.buffer_size {
            log::debug!("reply from {} filled the receive buffer and was cut off", peer);
        }

        Ok(Payload { bytes: buf })
    }
}

/// Fetches `/{name}` from `address:port` with a one-off client.
///
/// `timeout` bounds the connect and the read separately.
pub fn fetch(
    name: &str,
    address: IpAddr,
    port: u16,
    buffer_size: usize,
    timeout: Duration,
) -> Result<Payload, Error> {
    let config = Config::default()
        .fetch_port(port)
        .buffer_size(buffer_size)
        .timeout(timeout);
    FetchClient::new(&config).fetch(name, address)
}

/// Builds the request text sent to the content server.
pub fn request(name: &str, address: IpAddr) -> String {
    let host = match address {
        IpAddr::V4(v4) => v4.to_string(),
        IpAddr::V6(v6) => format!("[{}]", v6),
    };
    format!("GET /{} HTTP/1.1\r\nHost: {}\r\n\r\n", name, host)
}

fn connect(peer: SocketAddr, timeout: Duration) -> std::io::Result<TcpStream> {
    let sock = Socket::new(Domain::for_address(peer), Type::STREAM, Some(Protocol::TCP))?;
    sock.connect_timeout(&peer.into(), timeout)?;
    Ok(TcpStream::from(sock))
}

#[cfg(test)]
mod tests {
    use std::{
        net::{Ipv4Addr, TcpListener},
        thread,
    };

    use crate::{
        testing::{closed_port, EchoServer},
        ErrorKind,
    };

    use super::*;

    const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
    const TIMEOUT: Duration = Duration::from_secs(2);

    #[test]
    fn request_text() {
        assert_eq!(
            request("example.test", "203.0.113.5".parse().unwrap()),
            "GET /example.test HTTP/1.1\r\nHost: 203.0.113.5\r\n\r\n"
        );
        assert_eq!(
            request("example.test", "2001:db8::1".parse().unwrap()),
            "GET /example.test HTTP/1.1\r\nHost: [2001:db8::1]\r\n\r\n"
        );
    }

    #[test]
    fn fetch_echoes_path() {
        let server = EchoServer::start();
        let payload = fetch("example.test", LOCALHOST, server.port(), 1024, TIMEOUT).unwrap();
        assert!(!payload.is_empty());
        assert!(payload.to_text().contains("example.test"), "{:?}", payload);
        assert!(payload.to_text().starts_with("HTTP/1.1 200 OK\r\n"));

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0],
            "GET /example.test HTTP/1.1\r\nHost: 127.0.0.1\r\n\r\n"
        );
    }

    #[test]
    fn single_read_is_bounded() {
        let server = EchoServer::start();
        let payload = fetch("example.test", LOCALHOST, server.port(), 8, TIMEOUT).unwrap();
        assert_eq!(payload.as_bytes(), b"HTTP/1.1");
    }

    #[test]
    fn connection_refused() {
        let config = Config::default()
            .fetch_port(closed_port())
            .timeout(Duration::from_secs(2));
        let err = FetchClient::new(&config)
            .fetch("example.test", LOCALHOST)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connection);
    }

    #[test]
    fn read_timeout() {
        // Accepts the connection and reads the request, but never replies.
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0; 1024];
            let _ = stream.read(&mut buf);
            thread::sleep(Duration::from_secs(1));
        });

        let err = fetch(
            "example.test",
            LOCALHOST,
            port,
            1024,
            Duration::from_millis(100),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
        server.join().unwrap();
    }

    #[test]
    fn payload_display() {
        let payload = Payload {
            bytes: b"hi \xff".to_vec(),
        };
        assert_eq!(payload.to_string(), "hi \u{fffd}");
        assert_eq!(payload.len(), 4);
    }
}
