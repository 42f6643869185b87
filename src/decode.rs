//! Message decoder (C4): walks a datagram's question/answer/authority/
//! additional sections in order, handing back borrowed, offset-based views
//! rather than allocating owned records. Exposes both a pull-based lazy
//! iterator (`MessageDecoder::entries`) and a callback-style `walk`, since
//! spec.md treats the two as equivalent front ends over the same walk.
use crate::cursor::Cursor;
use crate::error::{MdnsError, MdnsResult};
use crate::message::{Header, Question, CACHE_FLUSH_BIT};
use crate::name::skip_name;

/// Which message section a decoded entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryType {
    Question,
    Answer,
    Authority,
    Additional,
}

const SECTIONS: [EntryType; 4] = [
    EntryType::Question,
    EntryType::Answer,
    EntryType::Authority,
    EntryType::Additional,
];

/// A decoded resource record: everything needed to hand the rdata off to
/// `record::parse_*`, without having parsed the rdata itself yet.
#[derive(Debug, Clone, Copy)]
pub struct DecodedRecord {
    pub section: EntryType,
    pub name_offset: usize,
    pub rtype: u16,
    pub rclass: u16,
    pub cache_flush: bool,
    pub ttl: u32,
    pub rdata_offset: usize,
    pub rdata_length: usize,
}

/// One item surfaced while walking a message: either a question (no rdata)
/// or a resource record (answer/authority/additional).
#[derive(Debug, Clone, Copy)]
pub enum DecodedItem {
    Question(Question),
    Record(DecodedRecord),
}

/// Parses a message header up front and hands out an [`Entries`] iterator
/// (or the equivalent callback via [`walk`](MessageDecoder::walk)) over its
/// sections.
pub struct MessageDecoder<'a> {
    buffer: &'a [u8],
    header: Header,
    body_start: usize,
}

impl<'a> MessageDecoder<'a> {
    pub fn new(buffer: &'a [u8]) -> MdnsResult<Self> {
        let mut cursor = Cursor::new(buffer);
        let header = Header::read(&mut cursor)?;
        Ok(MessageDecoder {
            buffer,
            header,
            body_start: cursor.position(),
        })
    }

    pub fn header(&self) -> Header {
        self.header
    }

    pub fn buffer(&self) -> &'a [u8] {
        self.buffer
    }

    pub fn entries(&self) -> Entries<'a> {
        Entries {
            buffer: self.buffer,
            pos: self.body_start,
            remaining: [
                self.header.question_count,
                self.header.answer_count,
                self.header.authority_count,
                self.header.additional_count,
            ],
            section_index: 0,
            errored: false,
        }
    }

    /// Callback-style equivalent of iterating `entries()` to exhaustion,
    /// stopping at the first error returned either by the decoder or by
    /// `f` itself.
    pub fn walk<F>(&self, mut f: F) -> MdnsResult<()>
    where
        F: FnMut(DecodedItem) -> MdnsResult<()>,
    {
        for item in self.entries() {
            f(item?)?;
        }
        Ok(())
    }
}

/// Lazy iterator over a message's sections, in wire order: questions, then
/// answers, then authorities, then additionals.
pub struct Entries<'a> {
    buffer: &'a [u8],
    pos: usize,
    remaining: [u16; 4],
    section_index: usize,
    errored: bool,
}

impl<'a> Iterator for Entries<'a> {
    type Item = MdnsResult<DecodedItem>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.errored {
            return None;
        }
        loop {
            if self.section_index >= SECTIONS.len() {
                return None;
            }
            if self.remaining[self.section_index] == 0 {
                self.section_index += 1;
                continue;
            }
            self.remaining[self.section_index] -= 1;
            let section = SECTIONS[self.section_index];
            let result = self.read_one(section);
            if result.is_err() {
                self.errored = true;
            }
            return Some(result);
        }
    }
}

impl<'a> Entries<'a> {
    fn read_one(&mut self, section: EntryType) -> MdnsResult<DecodedItem> {
        let name_offset = self.pos;
        let name_end = skip_name(self.buffer, name_offset)?;
        let mut cursor = Cursor::new(self.buffer);
        cursor.seek(name_end);

        if section == EntryType::Question {
            let question = Question::read(&mut cursor, name_offset)?;
            self.pos = cursor.position();
            return Ok(DecodedItem::Question(question));
        }

        let rtype = cursor.read16()?;
        let raw_rclass = cursor.read16()?;
        let ttl = cursor.read32()?;
        let rdlength = cursor.read16()? as usize;
        let rdata_offset = cursor.position();
        let rdata_end = rdata_offset
            .checked_add(rdlength)
            .ok_or(MdnsError::Truncated)?;
        if rdata_end > self.buffer.len() {
            return Err(MdnsError::Truncated);
        }
        self.pos = rdata_end;
        Ok(DecodedItem::Record(DecodedRecord {
            section,
            name_offset,
            rtype,
            rclass: raw_rclass & !CACHE_FLUSH_BIT,
            cache_flush: raw_rclass & CACHE_FLUSH_BIT != 0,
            ttl,
            rdata_offset,
            rdata_length: rdlength,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{CLASS_IN, TYPE_A, TYPE_PTR};

    fn push_name(buf: &mut Vec<u8>, labels: &[&str]) {
        for label in labels {
            buf.push(label.len() as u8);
            buf.extend_from_slice(label.as_bytes());
        }
        buf.push(0);
    }

    // A response with one question (PTR, `_services._dns-sd._udp.local.`)
    // and one answer (A record for `host.local.`), built by hand the way
    // the teacher's inline tests build sample buffers.
    fn sample_response() -> Vec<u8> {
        let mut buf = vec![0u8, 0, 0x84, 0x00, 0, 1, 0, 1, 0, 0, 0, 0];
        push_name(&mut buf, &["_services", "_dns-sd", "_udp", "local"]);
        buf.extend_from_slice(&(TYPE_PTR as u16).to_be_bytes());
        buf.extend_from_slice(&(CLASS_IN as u16).to_be_bytes());

        push_name(&mut buf, &["host", "local"]);
        buf.extend_from_slice(&(TYPE_A as u16).to_be_bytes());
        buf.extend_from_slice(&(0x8001u16).to_be_bytes()); // IN with cache-flush bit
        buf.extend_from_slice(&120u32.to_be_bytes());
        buf.extend_from_slice(&4u16.to_be_bytes());
        buf.extend_from_slice(&[10, 0, 0, 1]);
        buf
    }

    #[test]
    fn decodes_question_then_answer_in_order() {
        let buf = sample_response();
        let decoder = MessageDecoder::new(&buf).unwrap();
        assert!(decoder.header().is_response());

        let items: Vec<_> = decoder.entries().collect::<Result<_, _>>().unwrap();
        assert_eq!(items.len(), 2);
        match &items[0] {
            DecodedItem::Question(q) => assert_eq!(q.qtype, TYPE_PTR),
            _ => panic!("expected a question first"),
        }
        match &items[1] {
            DecodedItem::Record(r) => {
                assert_eq!(r.section, EntryType::Answer);
                assert_eq!(r.rtype, TYPE_A);
                assert!(r.cache_flush);
                assert_eq!(r.ttl, 120);
                assert_eq!(&buf[r.rdata_offset..r.rdata_offset + r.rdata_length], &[10, 0, 0, 1]);
            }
            _ => panic!("expected a record second"),
        }
    }

    #[test]
    fn walk_visits_every_entry() {
        let buf = sample_response();
        let decoder = MessageDecoder::new(&buf).unwrap();
        let mut count = 0;
        decoder
            .walk(|_item| {
                count += 1;
                Ok(())
            })
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn truncated_rdlength_is_reported_not_panicked() {
        let mut buf = sample_response();
        let len = buf.len();
        buf.truncate(len - 1);
        let decoder = MessageDecoder::new(&buf).unwrap();
        let result: MdnsResult<Vec<_>> = decoder.entries().collect();
        assert!(result.is_err());
    }
}
