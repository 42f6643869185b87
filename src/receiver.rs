//! Receiver entrypoints (C7): pull one datagram off an [`MdnsSocket`] and
//! apply the per-use-case filter spec.md §4.4 step 2 describes, so callers
//! never have to walk every record of every datagram themselves. This sits
//! one layer above the zero-allocation codec (C1-C5): the name comparisons
//! here use a small scratch `String`, the same way the teacher's
//! `dnsquery/display.rs` allocates to format a decoded record for a human,
//! rather than trying to keep the filtering layer allocation-free too.
use std::net::SocketAddr;

use crate::decode::{DecodedItem, EntryType, MessageDecoder};
use crate::error::MdnsResult;
use crate::message::{DNS_SD_ENUMERATION_NAME, TYPE_PTR};
use crate::name::decode_name;
use crate::transport::MdnsSocket;

fn name_matches(buffer: &[u8], offset: usize, expected: &str) -> MdnsResult<bool> {
    let mut scratch = String::with_capacity(expected.len() + 8);
    decode_name(buffer, offset, &mut scratch)?;
    let expected = if expected.ends_with('.') {
        std::borrow::Cow::Borrowed(expected)
    } else {
        std::borrow::Cow::Owned(format!("{expected}."))
    };
    Ok(scratch.eq_ignore_ascii_case(&expected))
}

fn is_discovery_answer(buffer: &[u8]) -> MdnsResult<bool> {
    let decoder = MessageDecoder::new(buffer)?;
    if !decoder.header().is_response() {
        return Ok(false);
    }
    for item in decoder.entries() {
        if let DecodedItem::Record(record) = item? {
            if record.section == EntryType::Answer
                && record.rtype == TYPE_PTR
                && name_matches(buffer, record.name_offset, DNS_SD_ENUMERATION_NAME)?
            {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

/// Receive one datagram and report whether it's a DNS-SD enumeration
/// answer (RFC 6763 §9), i.e. a PTR record under
/// `_services._dns-sd._udp.local.`. Returns the datagram length when it
/// matches, so the caller can decode it fully; `None` means a relevant
/// datagram simply wasn't received this call, not an error.
pub fn recv_discovery(socket: &MdnsSocket, buffer: &mut [u8]) -> MdnsResult<Option<usize>> {
    let (len, _from) = socket.recv(buffer)?;
    if is_discovery_answer(&buffer[..len])? {
        Ok(Some(len))
    } else {
        Ok(None)
    }
}

fn has_answer_for(buffer: &[u8], service_name: &str) -> MdnsResult<bool> {
    let decoder = MessageDecoder::new(buffer)?;
    if !decoder.header().is_response() {
        return Ok(false);
    }
    for item in decoder.entries() {
        if let DecodedItem::Record(record) = item? {
            if record.section != EntryType::Question
                && name_matches(buffer, record.name_offset, service_name)?
            {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

/// Receive one datagram and report whether it answers a query for
/// `service_name` (an SRV/TXT/A/AAAA response naming that instance, or a
/// PTR under it).
pub fn recv_query(socket: &MdnsSocket, buffer: &mut [u8], service_name: &str) -> MdnsResult<Option<usize>> {
    let (len, _from) = socket.recv(buffer)?;
    if has_answer_for(&buffer[..len], service_name)? {
        Ok(Some(len))
    } else {
        Ok(None)
    }
}

/// Which question a responder decided to answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponderQuery {
    /// A DNS-SD enumeration query (`_services._dns-sd._udp.local.`).
    Enumeration,
    /// A query naming this responder's own service directly.
    Service,
}

fn match_responder_query(
    buffer: &[u8],
    service_name: &str,
) -> MdnsResult<Option<(ResponderQuery, bool)>> {
    let decoder = MessageDecoder::new(buffer)?;
    if decoder.header().is_response() {
        return Ok(None);
    }
    for item in decoder.entries() {
        if let DecodedItem::Question(question) = item? {
            if name_matches(buffer, question.name_offset, DNS_SD_ENUMERATION_NAME)? {
                return Ok(Some((ResponderQuery::Enumeration, question.unicast_response)));
            }
            if name_matches(buffer, question.name_offset, service_name)? {
                return Ok(Some((ResponderQuery::Service, question.unicast_response)));
            }
        }
    }
    Ok(None)
}

/// Receive one datagram and, if it is a query this responder should answer
/// (either DNS-SD enumeration or a direct query for `service_name`), return
/// which kind it was, the sender to reply to, and whether the question's QU
/// bit asked for a unicast reply.
pub fn listen_responder(
    socket: &MdnsSocket,
    buffer: &mut [u8],
    service_name: &str,
) -> MdnsResult<Option<(ResponderQuery, SocketAddr, bool)>> {
    let (len, from) = socket.recv(buffer)?;
    Ok(match_responder_query(&buffer[..len], service_name)?.map(|(kind, unicast)| (kind, from, unicast)))
}
