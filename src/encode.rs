//! Message encoders (C5): build a query or response datagram into a
//! caller-owned, fixed-size buffer via [`Writer`]. Mirrors the shapes
//! `original_source/mdns.c`'s `mdns_discovery_send`, `mdns_query_send`,
//! `mdns_discovery_answer` and `mdns_query_answer` build by hand with
//! `memcpy`, but through the same bounds-checked `Writer` the decoder's
//! `Cursor` mirrors, so a short buffer fails with `Truncated` instead of
//! overrunning.
use std::net::{Ipv4Addr, Ipv6Addr};

use crate::cursor::Writer;
use crate::error::MdnsResult;
use crate::message::{
    Header, CACHE_FLUSH_BIT, CLASS_IN, DNS_SD_ENUMERATION_NAME, QU_BIT, TYPE_A, TYPE_AAAA,
    TYPE_PTR, TYPE_SRV, TYPE_TXT,
};
use crate::name::encode_name;

/// Encode a DNS-SD service-enumeration query (RFC 6763 §9): a single PTR
/// question for `_services._dns-sd._udp.local.`.
pub fn encode_discovery_query(writer: &mut Writer<'_>, unicast_response: bool) -> MdnsResult<usize> {
    let header = Header {
        question_count: 1,
        ..Header::default()
    };
    header.write(writer)?;
    write_question(writer, DNS_SD_ENUMERATION_NAME, TYPE_PTR, unicast_response)?;
    Ok(writer.position())
}

/// Encode a single-question query for `name`/`qtype` (PTR for service
/// discovery, SRV/TXT/A/AAAA to resolve a known instance), tagged with
/// `id` so the caller can match the response it's looking for against
/// this particular query rather than any reply on the wire.
pub fn encode_query(
    writer: &mut Writer<'_>,
    id: u16,
    name: &str,
    qtype: u16,
    unicast_response: bool,
) -> MdnsResult<u16> {
    let header = Header {
        id,
        question_count: 1,
        ..Header::default()
    };
    header.write(writer)?;
    write_question(writer, name, qtype, unicast_response)?;
    Ok(id)
}

fn write_question(
    writer: &mut Writer<'_>,
    name: &str,
    qtype: u16,
    unicast_response: bool,
) -> MdnsResult<()> {
    encode_name(writer, name)?;
    writer.write16(qtype)?;
    let qclass = CLASS_IN | if unicast_response { QU_BIT } else { 0 };
    writer.write16(qclass)
}

/// Encode a DNS-SD service-enumeration answer: one PTR record mapping
/// `_services._dns-sd._udp.local.` to `service_name`.
pub fn encode_discovery_answer(
    writer: &mut Writer<'_>,
    service_name: &str,
    ttl: u32,
) -> MdnsResult<usize> {
    let header = Header {
        answer_count: 1,
        ..Header::default()
    }
    .with_response_bit(true)
    .with_authoritative_bit(true);
    header.write(writer)?;
    write_record_header(writer, DNS_SD_ENUMERATION_NAME, TYPE_PTR, false, ttl)?;
    write_rdata(writer, |w| encode_name(w, service_name))?;
    Ok(writer.position())
}

/// One answer to encode alongside others in a [`encode_query_answer`] call,
/// mirroring the record kinds `mdns_query_answer` in the original driver
/// builds for a resolved service instance (SRV + TXT + A/AAAA together).
pub enum AnswerRecord<'a> {
    Ptr { target: &'a str },
    Srv { priority: u16, weight: u16, port: u16, target: &'a str },
    Txt { rdata: &'a [u8] },
    A(Ipv4Addr),
    Aaaa(Ipv6Addr),
}

impl AnswerRecord<'_> {
    fn rtype(&self) -> u16 {
        match self {
            AnswerRecord::Ptr { .. } => TYPE_PTR,
            AnswerRecord::Srv { .. } => TYPE_SRV,
            AnswerRecord::Txt { .. } => TYPE_TXT,
            AnswerRecord::A(_) => TYPE_A,
            AnswerRecord::Aaaa(_) => TYPE_AAAA,
        }
    }
}

/// Encode a response to a direct query against a service instance: one PTR
/// answer mapping `service_name` to `instance_name` (an=1), followed by
/// `additional` (SRV/TXT/A/AAAA, typically) describing that instance in the
/// additional section (ar=1+N). Mirrors the shape a responder sends back
/// for a query naming its service type directly, rather than the DNS-SD
/// enumeration name — the PTR is the only record actually answering the
/// question asked; everything else rides along as additional data the
/// querier didn't ask for but needs next.
pub fn encode_query_answer(
    writer: &mut Writer<'_>,
    service_name: &str,
    instance_name: &str,
    additional: &[AnswerRecord<'_>],
    ttl: u32,
) -> MdnsResult<usize> {
    let header = Header {
        answer_count: 1,
        additional_count: additional.len() as u16,
        ..Header::default()
    }
    .with_response_bit(true)
    .with_authoritative_bit(true);
    header.write(writer)?;

    write_record_header(writer, service_name, TYPE_PTR, false, ttl)?;
    write_rdata(writer, |w| encode_name(w, instance_name))?;

    for record in additional {
        let cache_flush = !matches!(record, AnswerRecord::Ptr { .. });
        write_record_header(writer, instance_name, record.rtype(), cache_flush, ttl)?;
        write_rdata(writer, |w| match record {
            AnswerRecord::Ptr { target } => encode_name(w, target),
            AnswerRecord::Srv {
                priority,
                weight,
                port,
                target,
            } => {
                w.write16(*priority)?;
                w.write16(*weight)?;
                w.write16(*port)?;
                encode_name(w, target)
            }
            AnswerRecord::Txt { rdata } => w.write_span(rdata),
            AnswerRecord::A(addr) => w.write_span(&addr.octets()),
            AnswerRecord::Aaaa(addr) => w.write_span(&addr.octets()),
        })?;
    }
    Ok(writer.position())
}

fn write_record_header(
    writer: &mut Writer<'_>,
    owner_name: &str,
    rtype: u16,
    cache_flush: bool,
    ttl: u32,
) -> MdnsResult<()> {
    encode_name(writer, owner_name)?;
    writer.write16(rtype)?;
    writer.write16(CLASS_IN | if cache_flush { CACHE_FLUSH_BIT } else { 0 })?;
    writer.write32(ttl)
}

/// Write rdata via `f`, then go back and patch in the correct 2-octet
/// rdlength now that its size is known.
fn write_rdata(
    writer: &mut Writer<'_>,
    f: impl FnOnce(&mut Writer<'_>) -> MdnsResult<()>,
) -> MdnsResult<()> {
    let rdlength_at = writer.reserve(2)?;
    let rdata_start = writer.position();
    f(writer)?;
    let rdata_len = writer.position() - rdata_start;
    writer.patch16_at(rdlength_at, rdata_len as u16);
    Ok(())
}

/// Accumulates `key=value` (or bare-key) TXT attributes into a single
/// rdata blob, the generalized form of `original_source/mdns.c`'s
/// hand-built `"test=1"` TXT buffer in `service_callback`.
#[derive(Default)]
pub struct TxtBuilder {
    rdata: Vec<u8>,
}

impl TxtBuilder {
    pub fn new() -> Self {
        TxtBuilder { rdata: Vec::new() }
    }

    pub fn entry(mut self, key: &str, value: Option<&str>) -> Self {
        let entry_len = key.len() + value.map_or(0, |v| v.len() + 1);
        self.rdata.push(entry_len as u8);
        self.rdata.extend_from_slice(key.as_bytes());
        if let Some(value) = value {
            self.rdata.push(b'=');
            self.rdata.extend_from_slice(value.as_bytes());
        }
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.rdata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{DecodedItem, EntryType, MessageDecoder};
    use crate::name::decode_name;
    use crate::record::{parse_a, parse_txt};

    #[test]
    fn discovery_query_round_trips_through_decoder() {
        let mut buf = [0u8; 128];
        let mut writer = Writer::new(&mut buf);
        let len = encode_discovery_query(&mut writer, true).unwrap();
        let decoder = MessageDecoder::new(&buf[..len]).unwrap();
        assert_eq!(decoder.header().question_count, 1);
        let items: Vec<_> = decoder.entries().collect::<Result<_, _>>().unwrap();
        match &items[0] {
            DecodedItem::Question(q) => {
                assert_eq!(q.qtype, TYPE_PTR);
                assert!(q.unicast_response);
            }
            _ => panic!("expected a question"),
        }
    }

    #[test]
    fn discovery_answer_round_trips() {
        let mut buf = [0u8; 128];
        let mut writer = Writer::new(&mut buf);
        let len = encode_discovery_answer(&mut writer, "_http._tcp.local.", 10).unwrap();
        let decoder = MessageDecoder::new(&buf[..len]).unwrap();
        assert!(decoder.header().is_response());
        let items: Vec<_> = decoder.entries().collect::<Result<_, _>>().unwrap();
        match &items[0] {
            DecodedItem::Record(r) => {
                assert_eq!(r.rtype, TYPE_PTR);
                assert_eq!(r.ttl, 10);
                let mut name = String::with_capacity(64);
                decode_name(&buf, r.rdata_offset, &mut name).unwrap();
                assert_eq!(name, "_http._tcp.local.");
            }
            _ => panic!("expected a record"),
        }
    }

    #[test]
    fn query_answer_puts_ptr_in_answer_and_rest_in_additional() {
        let txt = TxtBuilder::new().entry("txtvers", Some("1")).build();
        let additional = [
            AnswerRecord::A(Ipv4Addr::new(10, 0, 0, 5)),
            AnswerRecord::Txt { rdata: &txt },
        ];
        let mut buf = [0u8; 256];
        let mut writer = Writer::new(&mut buf);
        let len = encode_query_answer(
            &mut writer,
            "_http._tcp.local.",
            "host._http._tcp.local.",
            &additional,
            120,
        )
        .unwrap();
        let decoder = MessageDecoder::new(&buf[..len]).unwrap();
        assert_eq!(decoder.header().answer_count, 1);
        assert_eq!(decoder.header().additional_count, 2);
        let items: Vec<_> = decoder.entries().collect::<Result<_, _>>().unwrap();
        assert_eq!(items.len(), 3);

        match &items[0] {
            DecodedItem::Record(r) => {
                assert_eq!(r.section, EntryType::Answer);
                assert_eq!(r.rtype, TYPE_PTR);
                assert!(!r.cache_flush);
            }
            _ => panic!(),
        }
        match &items[1] {
            DecodedItem::Record(r) => {
                assert_eq!(r.section, EntryType::Additional);
                assert!(r.cache_flush);
                assert_eq!(parse_a(&buf, r.rdata_offset, r.rdata_length).unwrap(), Ipv4Addr::new(10, 0, 0, 5));
            }
            _ => panic!(),
        }
        match &items[2] {
            DecodedItem::Record(r) => {
                assert_eq!(r.section, EntryType::Additional);
                let entries: Vec<_> = parse_txt(&buf, r.rdata_offset, r.rdata_length)
                    .unwrap()
                    .collect::<Result<_, _>>()
                    .unwrap();
                assert_eq!(entries[0].key, "txtvers");
            }
            _ => panic!(),
        }
    }

    #[test]
    fn encode_fails_with_truncated_on_undersized_buffer() {
        let mut buf = [0u8; 4];
        let mut writer = Writer::new(&mut buf);
        assert!(encode_discovery_query(&mut writer, false).is_err());
    }
}
