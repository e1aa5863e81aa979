//! DNS message encoder and decoder.
//!
//! This covers the subset of [RFC 1035] that a stub resolver needs: writing a query with a single
//! question, and reading the header, questions and answer records of the reply.
//!
//! [RFC 1035]: https://datatracker.ietf.org/doc/html/rfc1035

#[macro_use]
mod macros;
pub mod decoder;
pub mod encoder;
mod error;
pub mod records;
pub mod section;

use core::fmt;

use bitflags::bitflags;

use crate::num::Be16;

pub use error::Error;

wire_enum! {
    /// DNS message operation codes. Only standard queries are sent.
    pub enum Opcode: u8 {
        QUERY = 0,
    }
}

wire_enum! {
    /// Server response codes.
    pub enum RCode: u8 {
        /// No error.
        NO_ERROR = 0,
        /// The query sent by the client was erroneous.
        FORM_ERR = 1,
        /// A server-side error prevented processing of the query.
        SERV_FAIL = 2,
        /// Signifies that the queried domain name does not exist.
        NX_DOMAIN = 3,
        /// The requested query type is not supported by the server.
        NOT_IMP = 4,
        /// The server refused to answer the query for policy reasons.
        REFUSED = 5,
    }
}

wire_enum! {
    /// Resource Record types the client understands. Others decode to an unnamed value.
    pub enum Type: u16 {
        A = 1,
        CNAME = 5,
        AAAA = 28,
    }
}

wire_enum! {
    /// The queried resource type.
    pub enum QType: u16 {
        A = 1,
    }
}

wire_enum! {
    /// Resource Record classes.
    pub enum Class: u16 {
        /// The Internet.
        IN = 1,
    }
}

wire_enum! {
    /// The queried resource class.
    pub enum QClass: u16 {
        /// The Internet.
        IN = 1,
    }
}

// Bit positions in the header flags are inverted, because RFC 1035 starts counting at the MSb.
const fn be_pos(pos: u16) -> u16 {
    15 - pos
}

bitflags! {
    #[derive(Debug, Clone, Copy)]
    #[repr(transparent)]
    struct HeaderFlags: u16 {
        /// If set, the message is a response to a query. If unset, it is a query.
        const QR = 1 << be_pos(0);
        const OPCODE = Self::OPCODE_MASK;
        /// Set if the message was truncated because it is longer than the maximum allowed length of
        /// the transmission channel.
        const TC = 1 << be_pos(6);
        /// Recursion Desired: asks the server to resolve the name recursively. Copied to the
        /// response.
        const RD = 1 << be_pos(7);
        /// Recursion Available: set in a response if the server supports recursion.
        const RA = 1 << be_pos(8);
        const RCODE = Self::RCODE_MASK;
    }
}

impl HeaderFlags {
    const OPCODE_POS: u16 = 11;
    const OPCODE_MASK: u16 = 0b1111 << Self::OPCODE_POS;

    const RCODE_POS: u16 = 0;
    const RCODE_MASK: u16 = 0b1111 << Self::RCODE_POS;

    fn opcode(&self) -> Opcode {
        Opcode(((self.bits() & Self::OPCODE_MASK) >> Self::OPCODE_POS) as u8)
    }

    fn rcode(&self) -> RCode {
        RCode(((self.bits() & Self::RCODE_MASK) >> Self::RCODE_POS) as u8)
    }

    fn with_field(self, mask: u16, pos: u16, value: u16) -> Self {
        Self::from_bits_retain((self.bits() & !mask) | ((value << pos) & mask))
    }
}

/// Message header.
#[derive(Clone, Copy, Default, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C, packed)]
pub struct Header {
    id: Be16,
    flags: Be16,
    qdcount: Be16,
    ancount: Be16,
    nscount: Be16,
    arcount: Be16,
}

impl Header {
    fn flags(&self) -> HeaderFlags {
        HeaderFlags::from_bits_retain(self.flags.get())
    }

    fn modify_flags(&mut self, with: impl FnOnce(&mut HeaderFlags)) {
        let mut flags = self.flags();
        with(&mut flags);
        self.flags = flags.bits().into();
    }

    /// Returns the 16-bit message ID.
    ///
    /// Servers copy this ID to the corresponding response so that the client can match responses
    /// to its queries.
    #[inline]
    pub fn id(&self) -> u16 {
        self.id.get()
    }

    #[inline]
    pub fn set_id(&mut self, id: u16) {
        self.id = id.into();
    }

    #[inline]
    pub fn is_response(&self) -> bool {
        self.flags().contains(HeaderFlags::QR)
    }

    pub fn set_response(&mut self, is_response: bool) {
        self.modify_flags(|f| f.set(HeaderFlags::QR, is_response));
    }

    /// Returns whether the truncation flag is set, indicating that the message was truncated to
    /// fit in the transport channel.
    pub fn is_truncated(&self) -> bool {
        self.flags().contains(HeaderFlags::TC)
    }

    pub fn set_truncated(&mut self, trunc: bool) {
        self.modify_flags(|f| f.set(HeaderFlags::TC, trunc));
    }

    pub fn is_recursion_desired(&self) -> bool {
        self.flags().contains(HeaderFlags::RD)
    }

    pub fn set_recursion_desired(&mut self, rd: bool) {
        self.modify_flags(|f| f.set(HeaderFlags::RD, rd));
    }

    pub fn is_recursion_available(&self) -> bool {
        self.flags().contains(HeaderFlags::RA)
    }

    pub fn set_recursion_available(&mut self, ra: bool) {
        self.modify_flags(|f| f.set(HeaderFlags::RA, ra));
    }

    pub fn opcode(&self) -> Opcode {
        self.flags().opcode()
    }

    pub fn rcode(&self) -> RCode {
        self.flags().rcode()
    }

    pub fn set_rcode(&mut self, rcode: RCode) {
        self.modify_flags(|f| {
            *f = f.with_field(
                HeaderFlags::RCODE_MASK,
                HeaderFlags::RCODE_POS,
                rcode.0.into(),
            );
        });
    }

    pub fn question_count(&self) -> u16 {
        self.qdcount.get()
    }

    pub fn answer_count(&self) -> u16 {
        self.ancount.get()
    }

    fn set_qdcount(&mut self, qdcount: u16) {
        self.qdcount = qdcount.into();
    }

    fn set_ancount(&mut self, ancount: u16) {
        self.ancount = ancount.into();
    }
}

impl fmt::Debug for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Header")
            .field("id", &self.id())
            .field("response", &self.is_response())
            .field("opcode", &self.opcode())
            .field("rd", &self.is_recursion_desired())
            .field("ra", &self.is_recursion_available())
            .field("tc", &self.is_truncated())
            .field("rcode", &self.rcode())
            .field("qdcount", &self.qdcount.get())
            .field("ancount", &self.ancount.get())
            .field("nscount", &self.nscount.get())
            .field("arcount", &self.arcount.get())
            .finish()
    }
}
