//! Address queries and the replies to them.

use std::{fmt, net::IpAddr};

use crate::{
    name::DomainName,
    packet::{
        decoder::MessageDecoder,
        encoder::{MessageEncoder, Question},
        Error, Header, QType, RCode,
    },
};

/// A query for the address of one domain name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    name: DomainName,
    ty: QType,
}

impl Query {
    /// Creates a query for the IPv4 address of `name`.
    pub fn address(name: DomainName) -> Self {
        Self {
            name,
            ty: QType::A,
        }
    }

    #[inline]
    pub fn name(&self) -> &DomainName {
        &self.name
    }

    #[inline]
    pub fn qtype(&self) -> QType {
        self.ty
    }

    /// Writes this query, with message ID `id` and the `RD` bit set, into `buf`.
    ///
    /// Returns the encoded message, or [`Error::Truncated`] if `buf` is too small.
    pub fn encode<'a>(&self, id: u16, buf: &'a mut [u8]) -> Result<&'a [u8], Error> {
        let mut header = Header::default();
        header.set_id(id);
        header.set_recursion_desired(true);
        let mut enc = MessageEncoder::new(buf);
        enc.set_header(header);
        enc.question(Question::new(&self.name).ty(self.ty));
        let len = enc.finish()?;
        Ok(&buf[..len])
    }
}

/// One resolved address from the *Answer* section of a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressRecord {
    address: IpAddr,
    ttl: u32,
}

impl AddressRecord {
    #[inline]
    pub fn address(&self) -> IpAddr {
        self.address
    }

    /// Time To Live of the record, in seconds.
    #[inline]
    pub fn ttl(&self) -> u32 {
        self.ttl
    }
}

/// A decoded reply from a name server.
///
/// Only address records (`A` and `AAAA`) are kept, in the order the server sent them.
#[derive(Debug, Clone)]
pub struct Response {
    header: Header,
    answers: Vec<AddressRecord>,
}

impl Response {
    /// Decodes a reply message.
    ///
    /// Fails if `msg` is not a well-formed response. A well-formed response without address
    /// records decodes successfully and has no [`answers`](Self::answers).
    pub fn decode(msg: &[u8]) -> Result<Self, Error> {
        let dec = MessageDecoder::new(msg)?;
        let header = *dec.header();
        log::trace!("header: {:?}", header);
        if !header.is_response() {
            return Err(Error::NotAResponse);
        }

        let mut answers = Vec::new();
        let mut dec = dec.answers()?;
        for res in dec.iter() {
            let rr = res?;
            log::debug!("ANS: {}", rr);
            match rr.as_enum() {
                Some(Ok(rec)) => match rec.ip_addr() {
                    Some(address) => answers.push(AddressRecord {
                        address,
                        ttl: rr.ttl(),
                    }),
                    None => log::debug!("skipping {} record for {}", rr.type_(), rr.name()),
                },
                Some(Err(e)) => return Err(e),
                None => log::debug!("skipping {} record for {}", rr.type_(), rr.name()),
            }
        }

        Ok(Self { header, answers })
    }

    #[inline]
    pub fn header(&self) -> &Header {
        &self.header
    }

    #[inline]
    pub fn rcode(&self) -> RCode {
        self.header.rcode()
    }

    #[inline]
    pub fn answers(&self) -> &[AddressRecord] {
        &self.answers
    }

    /// Reduces the reply to its first address.
    ///
    /// Any further records are ignored.
    pub fn outcome(&self) -> ResolutionOutcome {
        match self.answers.first() {
            Some(rec) => ResolutionOutcome::Resolved(rec.address),
            None => ResolutionOutcome::NotFound,
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "id={} rcode={} answers={}",
            self.header.id(),
            self.rcode(),
            self.answers.len()
        )?;
        for rec in &self.answers {
            write!(f, "\n{} ttl={}", rec.address, rec.ttl)?;
        }
        Ok(())
    }
}

/// The result of resolving a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionOutcome {
    /// The server returned at least one address; this is the first one.
    Resolved(IpAddr),
    /// The server knows no address for the name.
    NotFound,
}

impl ResolutionOutcome {
    pub fn address(&self) -> Option<IpAddr> {
        match self {
            ResolutionOutcome::Resolved(addr) => Some(*addr),
            ResolutionOutcome::NotFound => None,
        }
    }
}
