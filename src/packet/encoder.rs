//! DNS message encoder.

use core::marker::PhantomData;
use std::mem::{align_of, size_of};

use bytemuck::{NoUninit, Zeroable};

use crate::name::DomainName;

use super::{
    records::{Record, ResourceRecordEncoder},
    section::{self, Section},
    Class, Error, Header, QClass, QType,
};

pub(crate) struct Writer<'a> {
    buf: &'a mut [u8],
    pub(crate) pos: usize,
    trunc: bool,
}

impl<'a> Writer<'a> {
    pub(crate) fn new(buf: &'a mut [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            trunc: false,
        }
    }

    fn modify_header(&mut self, with: impl FnOnce(&mut Header)) {
        assert_eq!(align_of::<Header>(), 1);

        let h = bytemuck::from_bytes_mut(&mut self.buf[..size_of::<Header>()]);
        with(h);
    }

    pub(crate) fn write_slice(&mut self, data: &[u8]) {
        let buf = &mut self.buf[self.pos..];
        if data.len() > buf.len() {
            self.trunc = true;
            let n = buf.len();
            buf.copy_from_slice(&data[..n]);
            self.pos += n;
        } else {
            buf[..data.len()].copy_from_slice(data);
            self.pos += data.len();
        }
    }

    fn write_obj<T: NoUninit>(&mut self, obj: T) {
        self.write_slice(bytemuck::bytes_of(&obj))
    }

    pub(crate) fn write_u8(&mut self, b: u8) {
        self.write_slice(&[b]);
    }

    pub(crate) fn write_u16(&mut self, v: u16) {
        self.write_slice(&v.to_be_bytes());
    }

    pub(crate) fn write_u32(&mut self, v: u32) {
        self.write_slice(&v.to_be_bytes());
    }

    /// Writes `name` uncompressed.
    pub(crate) fn write_domain_name(&mut self, name: &DomainName) {
        for label in name.labels() {
            self.write_u8(label.as_bytes().len() as u8);
            self.write_slice(label.as_bytes());
        }
        // Implicit root label at the end.
        self.write_u8(0);
    }
}

struct EncoderInner<'a> {
    w: Writer<'a>,
    qdcount: u16,
    ancount: u16,
}

impl<'a> Drop for EncoderInner<'a> {
    fn drop(&mut self) {
        let trunc = self.w.trunc;
        let (qdcount, ancount) = (self.qdcount, self.ancount);
        self.w.modify_header(|h| {
            h.set_qdcount(qdcount);
            h.set_ancount(ancount);
            h.set_truncated(trunc);
        });
    }
}

/// Writes a DNS message into a caller-provided buffer.
///
/// The section being written is tracked in the `S` type parameter: questions have to be added
/// before [`MessageEncoder::answers`] moves the encoder on to the *Answer* section.
pub struct MessageEncoder<'a, S: Section> {
    inner: EncoderInner<'a>,
    _p: PhantomData<S>,
}

impl<'a, S: Section> MessageEncoder<'a, S> {
    /// Overrides the whole message header.
    ///
    /// Note that the [`MessageEncoder`] will overwrite the section counts and the truncation flag
    /// on drop, to ensure that the message can be parsed correctly.
    pub fn set_header(&mut self, header: Header) {
        self.inner.w.modify_header(|h| *h = header);
    }

    /// Finishes encoding the message, and returns the number of bytes that were written to the
    /// buffer.
    ///
    /// If the message was truncated because the provided buffer was too small, this will return
    /// [`Error::Truncated`], and the message's truncation bit will be set.
    pub fn finish(self) -> Result<usize, Error> {
        let bytes_written = self.inner.w.pos;

        if self.inner.w.trunc {
            Err(Error::Truncated)
        } else {
            Ok(bytes_written)
        }
    }
}

impl<'a> MessageEncoder<'a, section::Question> {
    /// Creates a new message encoder that will write to `buf`.
    ///
    /// # Panics
    ///
    /// Panics if `buf` cannot hold a message [`Header`].
    pub fn new(buf: &'a mut [u8]) -> Self {
        assert!(buf.len() >= size_of::<Header>(), "buffer too small for a DNS header");
        let mut w = Writer::new(buf);
        w.write_obj(Header::zeroed());
        Self {
            inner: EncoderInner {
                w,
                qdcount: 0,
                ancount: 0,
            },
            _p: PhantomData,
        }
    }

    /// Adds a question to the *Question* section.
    pub fn question(&mut self, question: Question<'_>) {
        self.inner.w.write_domain_name(question.name);
        self.inner.w.write_u16(question.ty.0);
        self.inner.w.write_u16(question.class.0);
        self.inner.qdcount += 1;
    }

    /// Moves the encoder to the *Answer* section.
    #[inline]
    pub fn answers(self) -> MessageEncoder<'a, section::Answer> {
        MessageEncoder {
            inner: self.inner,
            _p: PhantomData,
        }
    }
}

impl<'a> MessageEncoder<'a, section::Answer> {
    /// Adds a resource record to the *Answer* section.
    pub fn add_answer(&mut self, rr: ResourceRecord<'_>) {
        let w = &mut self.inner.w;
        w.write_domain_name(rr.name);
        w.write_u16(rr.rdata.record_type().0);
        w.write_u16(rr.class.0);
        w.write_u32(rr.ttl);
        // RDLENGTH is only known after the RDATA is written, so write a placeholder and patch it.
        let lenpos = w.pos;
        w.write_u16(0);
        let before_rdata = w.pos;
        let mut enc = ResourceRecordEncoder {
            w: Writer {
                buf: &mut *w.buf,
                pos: w.pos,
                trunc: w.trunc,
            },
        };
        rr.rdata.encode(&mut enc);
        w.pos = enc.w.pos;
        w.trunc = enc.w.trunc;
        let rdata_len = w.pos - before_rdata;
        let finished_pos = w.pos;
        if !w.trunc {
            w.pos = lenpos;
            // Supported records are far below 64 KiB, and the buffer bounds them anyway.
            w.write_u16(rdata_len as u16);
            w.pos = finished_pos;
        }
        self.inner.ancount += 1;
    }
}

/// A question to add to the *Question* section of a message.
pub struct Question<'a> {
    name: &'a DomainName,
    class: QClass,
    ty: QType,
}

impl<'a> Question<'a> {
    /// Creates a question asking for the IPv4 address ([`QType::A`]) in the internet class
    /// ([`QClass::IN`]) pertaining to `name`.
    #[inline]
    pub fn new(name: &'a DomainName) -> Self {
        Self {
            name,
            class: QClass::IN,
            ty: QType::A,
        }
    }

    /// Sets the resource type to query.
    #[inline]
    pub fn ty(self, ty: QType) -> Self {
        Self { ty, ..self }
    }
}

/// A resource record to add to the *Answer* section of a message.
pub struct ResourceRecord<'a> {
    name: &'a DomainName,
    class: Class,
    ttl: u32,
    rdata: &'a Record,
}

impl<'a> ResourceRecord<'a> {
    pub fn new(name: &'a DomainName, rdata: &'a Record) -> Self {
        Self {
            name,
            class: Class::IN,
            ttl: 0,
            rdata,
        }
    }

    #[inline]
    pub fn ttl(self, ttl: u32) -> Self {
        Self { ttl, ..self }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        hex::{self, Hex},
        packet::records::A,
    };

    use super::*;

    #[test]
    fn encode_query() {
        let name = DomainName::from_str("example.test").unwrap();
        let mut buf = [0; 512];
        let mut header = Header::default();
        header.set_id(0x3039);
        header.set_recursion_desired(true);
        let mut enc = MessageEncoder::new(&mut buf);
        enc.set_header(header);
        enc.question(Question::new(&name));
        let len = enc.finish().unwrap();
        assert_eq!(
            Hex(&buf[..len]).to_string(),
            "303901000001000000000000076578616d706c65047465737400 00010001".replace(' ', "")
        );
    }

    #[test]
    fn encode_truncated() {
        let name = DomainName::from_str("example.test").unwrap();
        let mut buf = [0; 16];
        let mut enc = MessageEncoder::new(&mut buf);
        enc.question(Question::new(&name));
        assert_eq!(enc.finish(), Err(Error::Truncated));
        // the header still reports the truncation
        assert_eq!(buf[2] & 0x02, 0x02);
    }

    #[test]
    fn encode_answer() {
        let name = DomainName::from_str("example.test").unwrap();
        let rdata = Record::A(A::new([203, 0, 113, 5].into()));
        let mut buf = [0; 512];
        let mut enc = MessageEncoder::new(&mut buf);
        enc.question(Question::new(&name));
        let mut enc = enc.answers();
        enc.add_answer(ResourceRecord::new(&name, &rdata).ttl(60));
        let len = enc.finish().unwrap();
        assert_eq!(
            &buf[..len],
            hex::parse(
                "0000 0000 0001 0001 0000 0000
                 076578616d706c65 0474657374 00 0001 0001
                 076578616d706c65 0474657374 00 0001 0001 0000003c 0004 cb007105"
            )
        );
    }
}
