//! Typed parsers for the five record kinds mdnslib understands (C3): A,
//! AAAA, PTR, SRV, TXT. Each takes the full datagram plus the rdata's
//! `(offset, length)` — rdata offsets are absolute into the datagram rather
//! than relative, since PTR/SRV targets are themselves (possibly
//! compressed) names that may point anywhere in the buffer, same as the
//! teacher's RR types in `rfc1035.rs` store their data borrowed from the
//! enclosing buffer.
use std::net::{Ipv4Addr, Ipv6Addr};

use crate::error::{MdnsError, MdnsResult};
use crate::name::decode_name;

fn rdata_slice(buffer: &[u8], offset: usize, length: usize) -> MdnsResult<&[u8]> {
    buffer
        .get(offset..offset + length)
        .ok_or(MdnsError::Truncated)
}

/// Parse an A record's rdata (RFC 1035 §3.4.1): a 4-octet IPv4 address.
pub fn parse_a(buffer: &[u8], offset: usize, length: usize) -> MdnsResult<Ipv4Addr> {
    let rdata = rdata_slice(buffer, offset, length)?;
    let octets: [u8; 4] = rdata
        .try_into()
        .map_err(|_| MdnsError::Malformed("A record rdata is not 4 octets"))?;
    Ok(Ipv4Addr::from(octets))
}

/// Parse an AAAA record's rdata (RFC 3596 §2.2): a 16-octet IPv6 address.
pub fn parse_aaaa(buffer: &[u8], offset: usize, length: usize) -> MdnsResult<Ipv6Addr> {
    let rdata = rdata_slice(buffer, offset, length)?;
    let octets: [u8; 16] = rdata
        .try_into()
        .map_err(|_| MdnsError::Malformed("AAAA record rdata is not 16 octets"))?;
    Ok(Ipv6Addr::from(octets))
}

/// Parse a PTR record's rdata (RFC 1035 §3.3.12): a single domain name,
/// appended to `out` the same way [`decode_name`] appends any other name.
pub fn parse_ptr(buffer: &[u8], offset: usize, length: usize, out: &mut String) -> MdnsResult<()> {
    let _ = rdata_slice(buffer, offset, length)?; // bounds-check rdlength itself
    decode_name(buffer, offset, out)?;
    Ok(())
}

/// A decoded SRV record (RFC 2782): priority, weight, port, and the
/// service's target hostname (written into the caller-supplied `out`).
#[derive(Debug, Clone, Copy)]
pub struct SrvHeader {
    pub priority: u16,
    pub weight: u16,
    pub port: u16,
}

/// Parse an SRV record's rdata, returning the fixed-size header and
/// appending the target hostname to `out`.
pub fn parse_srv(
    buffer: &[u8],
    offset: usize,
    length: usize,
    out: &mut String,
) -> MdnsResult<SrvHeader> {
    let rdata = rdata_slice(buffer, offset, length)?;
    if rdata.len() < 6 {
        return Err(MdnsError::Malformed("SRV record rdata shorter than 6 octets"));
    }
    let priority = u16::from_be_bytes([rdata[0], rdata[1]]);
    let weight = u16::from_be_bytes([rdata[2], rdata[3]]);
    let port = u16::from_be_bytes([rdata[4], rdata[5]]);
    decode_name(buffer, offset + 6, out)?;
    Ok(SrvHeader {
        priority,
        weight,
        port,
    })
}

/// Borrowing iterator over a TXT record's `key=value`/bare-key character
/// strings (RFC 6763 §6). TXT strings never contain compression pointers,
/// so this never needs the full datagram, only the rdata span itself.
pub struct TxtEntries<'a> {
    remaining: &'a [u8],
}

/// One TXT attribute: a key, and an optional value when the entry contained
/// an `=` separator (a bare key with no `=` means "present, boolean true"
/// per RFC 6763 §6.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxtEntry<'a> {
    pub key: &'a str,
    pub value: Option<&'a [u8]>,
}

impl<'a> Iterator for TxtEntries<'a> {
    type Item = MdnsResult<TxtEntry<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining.is_empty() {
            return None;
        }
        let len = self.remaining[0] as usize;
        if self.remaining.len() < 1 + len {
            self.remaining = &[];
            return Some(Err(MdnsError::Truncated));
        }
        let entry = &self.remaining[1..1 + len];
        self.remaining = &self.remaining[1 + len..];
        if entry.is_empty() {
            // RFC 6763 §6.4: a zero-length string is allowed and ignored.
            return self.next();
        }
        Some(match entry.iter().position(|&b| b == b'=') {
            Some(eq) => std::str::from_utf8(&entry[..eq])
                .map(|key| TxtEntry {
                    key,
                    value: Some(&entry[eq + 1..]),
                })
                .map_err(|_| MdnsError::Malformed("TXT key is not valid utf-8")),
            None => std::str::from_utf8(entry)
                .map(|key| TxtEntry { key, value: None })
                .map_err(|_| MdnsError::Malformed("TXT key is not valid utf-8")),
        })
    }
}

/// Parse a TXT record's rdata into a lazy [`TxtEntries`] iterator.
pub fn parse_txt(buffer: &[u8], offset: usize, length: usize) -> MdnsResult<TxtEntries<'_>> {
    let rdata = rdata_slice(buffer, offset, length)?;
    Ok(TxtEntries { remaining: rdata })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_a_reads_four_octets() {
        let buf = [192, 168, 1, 42];
        assert_eq!(parse_a(&buf, 0, 4).unwrap(), Ipv4Addr::new(192, 168, 1, 42));
    }

    #[test]
    fn parse_a_rejects_wrong_length() {
        let buf = [1, 2, 3];
        assert!(parse_a(&buf, 0, 3).is_err());
    }

    #[test]
    fn parse_aaaa_reads_sixteen_octets() {
        let addr = Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 1);
        let buf = addr.octets();
        assert_eq!(parse_aaaa(&buf, 0, 16).unwrap(), addr);
    }

    #[test]
    fn parse_ptr_decodes_target_name() {
        let buf: &[u8] = &[4, b'_', b'h', b't', b'p', 5, b'l', b'o', b'c', b'a', b'l', 0];
        let mut out = String::with_capacity(64);
        parse_ptr(buf, 0, buf.len(), &mut out).unwrap();
        assert_eq!(out, "_htp.local.");
    }

    #[test]
    fn parse_srv_reads_header_and_target() {
        let mut buf = vec![0u8, 0, 0, 10, 0x1F, 0x90]; // priority=0 weight=10 port=8080
        buf.extend_from_slice(&[4, b'h', b'o', b's', b't', 0]);
        let mut out = String::with_capacity(32);
        let hdr = parse_srv(&buf, 0, buf.len(), &mut out).unwrap();
        assert_eq!(hdr.weight, 10);
        assert_eq!(hdr.port, 8080);
        assert_eq!(out, "host.");
    }

    #[test]
    fn parse_txt_splits_key_value_and_bare_keys() {
        let mut buf = Vec::new();
        for s in ["txtvers=1", "ready"] {
            buf.push(s.len() as u8);
            buf.extend_from_slice(s.as_bytes());
        }
        let entries: Vec<_> = parse_txt(&buf, 0, buf.len())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(entries[0].key, "txtvers");
        assert_eq!(entries[0].value, Some(&b"1"[..]));
        assert_eq!(entries[1].key, "ready");
        assert_eq!(entries[1].value, None);
    }

    #[test]
    fn parse_txt_skips_zero_length_strings() {
        let buf = [0u8, 3, b'a', b'=', b'b'];
        let entries: Vec<_> = parse_txt(&buf, 0, buf.len())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].key, "a");
    }
}
