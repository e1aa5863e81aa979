//! Stub servers for tests.

use std::{
    io::{Read, Write},
    net::{IpAddr, SocketAddr, TcpListener, UdpSocket},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    thread,
};

use crate::{
    name::DomainName,
    packet::{
        decoder::MessageDecoder,
        encoder::{self, MessageEncoder, ResourceRecord},
        records::{Record, A, AAAA},
        Header, RCode,
    },
};

/// A name server on `127.0.0.1` answering from a fixed table, in a background thread.
pub(crate) struct StubResolver {
    addr: SocketAddr,
    seen: Arc<AtomicUsize>,
    stale: Arc<AtomicBool>,
}

impl StubResolver {
    /// Starts a server that knows the given `(name, address)` pairs. A name listed several times
    /// gets all of its addresses in the listed order.
    pub(crate) fn start(records: &[(&str, &str)]) -> Self {
        let records: Vec<(DomainName, IpAddr)> = records
            .iter()
            .map(|(name, ip)| (name.parse().unwrap(), ip.parse().unwrap()))
            .collect();
        Self::start_raw(move |query| answer(query, &records))
    }

    /// Starts a server that replies to every datagram with whatever `respond` returns.
    pub(crate) fn start_raw(respond: impl Fn(&[u8]) -> Vec<u8> + Send + 'static) -> Self {
        let sock = UdpSocket::bind("127.0.0.1:0").unwrap();
        let addr = sock.local_addr().unwrap();
        let seen = Arc::new(AtomicUsize::new(0));
        let stale = Arc::new(AtomicBool::new(false));

        let (seen2, stale2) = (seen.clone(), stale.clone());
        thread::spawn(move || {
            let mut buf = [0; 512];
            while let Ok((len, peer)) = sock.recv_from(&mut buf) {
                seen2.fetch_add(1, Ordering::SeqCst);
                let reply = respond(&buf[..len]);
                if stale2.load(Ordering::SeqCst) && reply.len() >= 2 {
                    let mut bogus = reply.clone();
                    bogus[0] ^= 0xff;
                    let _ = sock.send_to(&bogus, peer);
                }
                if sock.send_to(&reply, peer).is_err() {
                    break;
                }
            }
        });

        Self { addr, seen, stale }
    }

    /// Makes the server send a reply with a wrong message ID before each real reply.
    pub(crate) fn with_stale_replies(self) -> Self {
        self.stale.store(true, Ordering::SeqCst);
        self
    }

    pub(crate) fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Number of datagrams received so far.
    pub(crate) fn queries_seen(&self) -> usize {
        self.seen.load(Ordering::SeqCst)
    }
}

fn answer(query: &[u8], records: &[(DomainName, IpAddr)]) -> Vec<u8> {
    let mut dec = MessageDecoder::new(query).unwrap();
    let query_header = *dec.header();
    let question = dec.next().unwrap().unwrap();

    let rdata: Vec<Record> = records
        .iter()
        .filter(|(name, _)| name == question.qname())
        .map(|(_, ip)| match ip {
            IpAddr::V4(ip) => Record::A(A::new(*ip)),
            IpAddr::V6(ip) => Record::AAAA(AAAA::new(*ip)),
        })
        .collect();

    let mut header = Header::default();
    header.set_id(query_header.id());
    header.set_response(true);
    header.set_recursion_desired(query_header.is_recursion_desired());
    header.set_recursion_available(true);
    if rdata.is_empty() {
        header.set_rcode(RCode::NX_DOMAIN);
    }

    let mut buf = vec![0; 512];
    let mut enc = MessageEncoder::new(&mut buf);
    enc.set_header(header);
    enc.question(encoder::Question::new(question.qname()).ty(question.qtype()));
    let mut enc = enc.answers();
    for rec in &rdata {
        enc.add_answer(ResourceRecord::new(question.qname(), rec).ttl(60));
    }
    let len = enc.finish().unwrap();
    buf.truncate(len);
    buf
}

/// A content server on `127.0.0.1` that answers every request with a short HTTP response naming
/// the requested path. Received requests are recorded.
pub(crate) struct EchoServer {
    port: u16,
    requests: Arc<Mutex<Vec<String>>>,
}

impl EchoServer {
    pub(crate) fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let requests = Arc::new(Mutex::new(Vec::new()));

        let log = requests.clone();
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { break };
                let mut buf = [0; 1024];
                let Ok(len) = stream.read(&mut buf) else {
                    continue;
                };
                let request = String::from_utf8_lossy(&buf[..len]).into_owned();
                let path = request
                    .split_whitespace()
                    .nth(1)
                    .unwrap_or("")
                    .trim_start_matches('/')
                    .to_string();
                log.lock().unwrap().push(request);

                let body = format!("content for {}", path);
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {}\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });

        Self { port, requests }
    }

    pub(crate) fn port(&self) -> u16 {
        self.port
    }

    /// All requests received so far, as text.
    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

/// Returns a local port that nothing is listening on.
pub(crate) fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}
