//! DNS resource records.
//!
//! This module contains the record data types a resolver client has to understand: the two
//! address records, and CNAME, which servers commonly place in front of them. Also refer to
//! [`encoder::ResourceRecord`] and [`decoder::ResourceRecord`].
//!
//! [`encoder::ResourceRecord`]: super::encoder::ResourceRecord
//! [`decoder::ResourceRecord`]: super::decoder::ResourceRecord

use std::{
    fmt,
    net::{IpAddr, Ipv4Addr, Ipv6Addr},
};

use crate::name::DomainName;

use super::{
    decoder::{self, Reader},
    encoder::Writer,
    Error, Type,
};

pub struct ResourceRecordEncoder<'a> {
    pub(crate) w: Writer<'a>,
}

pub struct ResourceRecordDecoder<'a> {
    pub(crate) r: Reader<'a>,
}

/// Trait implemented by all resource record types.
pub trait ResourceRecordData: Sized {
    /// The associated resource record type.
    const TYPE: Type;

    /// Writes the data of this resource record to the given encoder.
    fn encode(&self, enc: &mut ResourceRecordEncoder<'_>);

    /// Attempts to decode an instance of this resource record from an RDATA field.
    fn decode(r: &mut ResourceRecordDecoder<'_>) -> Result<Self, Error>;
}

macro_rules! records {
    (
        $($record:ident),+ $(,)?
    ) => {
        /// Enumeration of all supported Resource Record types.
        #[non_exhaustive]
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub enum Record {
            $( $record($record), )+
        }

        impl Record {
            pub(crate) fn from_rr(rr: &decoder::ResourceRecord<'_>) -> Option<Result<Self, Error>> {
                let r = &mut ResourceRecordDecoder {
                    r: rr.rdata.clone(),
                };
                Some(match rr.type_() {
                    $( Type::$record => $record::decode(r).map(Self::$record), )+
                    _ => return None,
                })
            }

            pub(crate) fn encode(&self, enc: &mut ResourceRecordEncoder<'_>) {
                match self {
                    $( Record::$record(rr) => rr.encode(enc), )+
                }
            }

            pub fn record_type(&self) -> Type {
                match self {
                    $( Record::$record(_) => Type::$record, )+
                }
            }
        }

        impl fmt::Display for Record {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $( Record::$record(r) => r.fmt(f), )+
                }
            }
        }
    };
}

records!(A, AAAA, CNAME);

impl Record {
    /// Returns the address carried by an `A` or `AAAA` record, or `None` for other record types.
    pub fn ip_addr(&self) -> Option<IpAddr> {
        match self {
            Record::A(a) => Some(IpAddr::V4(a.addr())),
            Record::AAAA(a) => Some(IpAddr::V6(a.addr())),
            Record::CNAME(_) => None,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct A {
    addr: Ipv4Addr,
}

impl ResourceRecordData for A {
    const TYPE: Type = Type::A;

    fn encode(&self, enc: &mut ResourceRecordEncoder<'_>) {
        enc.w.write_slice(&self.addr.octets())
    }

    fn decode(dec: &mut ResourceRecordDecoder<'_>) -> Result<Self, Error> {
        let addr = Ipv4Addr::from(*dec.r.read_array()?);
        expect_end(dec)?;
        Ok(Self { addr })
    }
}

impl A {
    #[inline]
    pub fn new(addr: Ipv4Addr) -> Self {
        Self { addr }
    }

    #[inline]
    pub fn addr(&self) -> Ipv4Addr {
        self.addr
    }
}

impl fmt::Display for A {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.addr.fmt(f)
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct AAAA {
    addr: Ipv6Addr,
}

impl ResourceRecordData for AAAA {
    const TYPE: Type = Type::AAAA;

    fn encode(&self, enc: &mut ResourceRecordEncoder<'_>) {
        enc.w.write_slice(&self.addr.octets());
    }

    fn decode(dec: &mut ResourceRecordDecoder<'_>) -> Result<Self, Error> {
        let addr = Ipv6Addr::from(*dec.r.read_array()?);
        expect_end(dec)?;
        Ok(Self { addr })
    }
}

impl AAAA {
    #[inline]
    pub fn new(addr: Ipv6Addr) -> Self {
        Self { addr }
    }

    #[inline]
    pub fn addr(&self) -> Ipv6Addr {
        self.addr
    }
}

impl fmt::Display for AAAA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.addr.fmt(f)
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct CNAME {
    name: DomainName,
}

impl ResourceRecordData for CNAME {
    const TYPE: Type = Type::CNAME;

    fn encode(&self, enc: &mut ResourceRecordEncoder<'_>) {
        enc.w.write_domain_name(&self.name);
    }

    fn decode(dec: &mut ResourceRecordDecoder<'_>) -> Result<Self, Error> {
        Ok(Self {
            name: dec.r.read_domain_name()?,
        })
    }
}

impl CNAME {
    pub fn new(name: DomainName) -> Self {
        Self { name }
    }
}

impl fmt::Display for CNAME {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.name.fmt(f)
    }
}

/// Address records have a fixed RDATA size; trailing bytes mean the record is malformed.
fn expect_end(dec: &ResourceRecordDecoder<'_>) -> Result<(), Error> {
    if dec.r.buf().is_empty() {
        Ok(())
    } else {
        Err(Error::InvalidValue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip<R: ResourceRecordData + PartialEq + std::fmt::Debug>(rr: R) {
        let mut buf = [0; 256];
        let mut enc = ResourceRecordEncoder {
            w: Writer::new(&mut buf),
        };
        rr.encode(&mut enc);
        let pos = enc.w.pos;
        let mut dec = ResourceRecordDecoder {
            r: Reader::new(&buf[..pos]),
        };
        let decoded = R::decode(&mut dec).unwrap();
        assert_eq!(rr, decoded);
    }

    #[test]
    fn test_roundtrip() {
        roundtrip(A::new(Ipv4Addr::new(203, 0, 113, 5)));
        roundtrip(AAAA::new(Ipv6Addr::LOCALHOST));
        roundtrip(CNAME::new("www.example.test".parse().unwrap()));
    }

    #[test]
    fn address_rdata_length() {
        let mut dec = ResourceRecordDecoder {
            r: Reader::new(&[203, 0, 113]),
        };
        assert_eq!(A::decode(&mut dec), Err(Error::Eof));

        let mut dec = ResourceRecordDecoder {
            r: Reader::new(&[203, 0, 113, 5, 0]),
        };
        assert_eq!(A::decode(&mut dec), Err(Error::InvalidValue));
    }

    #[test]
    fn ip_addr() {
        let a = Record::A(A::new(Ipv4Addr::new(203, 0, 113, 5)));
        assert_eq!(a.ip_addr(), Some("203.0.113.5".parse().unwrap()));
        assert_eq!(a.record_type(), Type::A);
        let cname = Record::CNAME(CNAME::new("example.test".parse().unwrap()));
        assert_eq!(cname.ip_addr(), None);
        assert_eq!(cname.to_string(), "example.test.");
    }
}
