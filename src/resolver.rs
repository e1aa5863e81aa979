//! DNS name resolution.

use std::{
    io, mem,
    net::{Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket},
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};

use socket2::{Domain, Protocol, Socket, Type};

use crate::{
    hex::Hex,
    message::{Query, ResolutionOutcome, Response},
    name::DomainName,
    packet::Header,
    Config, Error, DNS_BUFFER_SIZE,
};

/// A synchronous DNS stub resolver that asks one server to resolve names recursively.
///
/// The UDP socket is opened once in [`ResolverClient::new`] and reused for every query. Only one
/// query is ever outstanding.
pub struct ResolverClient {
    server: SocketAddr,
    sock: UdpSocket,
    buffer_size: usize,
    timeout: Duration,
    next_id: u16,
}

impl ResolverClient {
    /// Creates a resolver client that sends its queries to the resolver in `config`.
    pub fn new(config: &Config) -> Result<Self, Error> {
        let server = config.resolver_addr();
        let sock = bind_udp(server).map_err(Error::Connection)?;
        sock.set_read_timeout(Some(config.timeout_duration()))
            .map_err(Error::Connection)?;
        Ok(Self {
            server,
            sock,
            buffer_size: config.buffer_len(),
            timeout: config.timeout_duration(),
            next_id: initial_id(),
        })
    }

    /// Returns the address of the server queries are sent to.
    pub fn server(&self) -> SocketAddr {
        self.server
    }

    /// Returns the local address of the client socket.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.sock.local_addr()
    }

    /// Attempts to resolve `hostname` to an address.
    ///
    /// `hostname` must be a non-empty domain name; anything else fails with
    /// [`ErrorKind::InvalidName`](crate::ErrorKind::InvalidName) before any packet is sent.
    pub fn resolve(&mut self, hostname: &str) -> Result<ResolutionOutcome, Error> {
        let name = DomainName::from_str(hostname).map_err(Error::InvalidName)?;
        self.resolve_domain(&name)
    }

    /// Attempts to resolve a [`DomainName`] to an address.
    ///
    /// Sends a single `A` query with the `RD` bit set and waits for the matching reply. If the
    /// reply lists several addresses, the first one is returned.
    pub fn resolve_domain(&mut self, name: &DomainName) -> Result<ResolutionOutcome, Error> {
        Ok(self.query(&Query::address(name.clone()))?.outcome())
    }

    /// Sends `query` to the server and returns the decoded reply.
    ///
    /// Datagrams from other senders, and replies carrying a different message ID (for example a
    /// late reply to an earlier query that timed out), are discarded. The configured timeout
    /// bounds the whole wait, not each datagram.
    pub fn query(&mut self, query: &Query) -> Result<Response, Error> {
        if query.name().is_root() {
            return Err(Error::InvalidName(crate::packet::Error::InvalidEmptyLabel));
        }

        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);

        let mut send_buf = [0; DNS_BUFFER_SIZE];
        let data = query.encode(id, &mut send_buf).map_err(Error::InvalidName)?;

        log::trace!("resolving '{}', raw query: {}", query.name(), Hex(data));

        self.sock
            .send_to(data, self.server)
            .map_err(Error::from_socket)?;

        let deadline = Instant::now() + self.timeout;
        self.sock
            .set_read_timeout(Some(self.timeout))
            .map_err(Error::Connection)?;
        let mut recv_buf = vec![0; self.buffer_size];
        loop {
            let (len, addr) = self.sock.recv_from(&mut recv_buf).map_err(Error::from_socket)?;
            let recv = &recv_buf[..len];
            log::trace!("recv from {}: {}", addr, Hex(recv));

            if addr != self.server {
                log::warn!("ignoring datagram from unexpected sender {}", addr);
            } else if let Some(reply_id) = reply_id(recv).filter(|&reply_id| reply_id != id) {
                log::warn!("ignoring reply with id {}, expected {}", reply_id, id);
            } else {
                let response = Response::decode(recv).map_err(|e| {
                    if len == self.buffer_size {
                        log::debug!("reply filled the whole receive buffer; it was likely cut off");
                    }
                    Error::Decode(e)
                })?;
                if response.answers().is_empty() {
                    log::warn!(
                        "no address for '{}' (rcode {})",
                        query.name(),
                        response.rcode()
                    );
                }
                log::debug!("reply: {}", response);
                return Ok(response);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(Error::Timeout);
            }
            self.sock
                .set_read_timeout(Some(remaining))
                .map_err(Error::Connection)?;
        }
    }
}

/// Resolves `name` with a one-off client for the resolver at `server`, waiting at most `timeout`
/// for the reply.
///
/// A [`ResolverClient`] should be kept around instead when resolving several names.
pub fn resolve(
    name: &str,
    server: SocketAddr,
    buffer_size: usize,
    timeout: Duration,
) -> Result<ResolutionOutcome, Error> {
    let config = Config::default()
        .resolver(server)
        .buffer_size(buffer_size)
        .timeout(timeout);
    ResolverClient::new(&config)?.resolve(name)
}

/// Returns the message ID of `msg`, if it is long enough to carry a full header.
///
/// Anything shorter cannot be a reply to any query and is left to the decoder to reject.
fn reply_id(msg: &[u8]) -> Option<u16> {
    if msg.len() < mem::size_of::<Header>() {
        return None;
    }
    Some(u16::from_be_bytes([msg[0], msg[1]]))
}

/// Opens a UDP socket of the same address family as `server`, bound to an ephemeral port.
fn bind_udp(server: SocketAddr) -> io::Result<UdpSocket> {
    let bind_addr: SocketAddr = if server.is_ipv6() {
        (Ipv6Addr::UNSPECIFIED, 0).into()
    } else {
        (Ipv4Addr::UNSPECIFIED, 0).into()
    };
    let sock = Socket::new(Domain::for_address(server), Type::DGRAM, Some(Protocol::UDP))?;
    sock.bind(&bind_addr.into())?;
    Ok(UdpSocket::from(sock))
}

/// Picks a starting message ID that differs between runs.
fn initial_id() -> u16 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() as u16)
        .unwrap_or(0)
}
