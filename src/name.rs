//! RFC 1035 §4.1.4 domain name codec (C2): length-prefixed label sequences
//! terminated by a zero octet, with two-octet back-pointers into the same
//! datagram for compression. Ported from the pointer-following algorithm in
//! the teacher's `rfc1035.rs::DomainName::from_position`, but reworked to be
//! non-allocating on the label data (only the caller's output `String` is
//! ever written to) and to enforce a *forward-only-pointer invariant*: each
//! followed pointer must target an offset strictly smaller than every offset
//! visited so far in this name, so a pointer cycle is rejected outright
//! instead of needing a growing visited-offset set.
use crate::cursor::Writer;
use crate::error::{MdnsError, MdnsResult};

const POINTER_TAG: u8 = 0b1100_0000;
const MAX_LABEL_LEN: usize = 63;

/// Decode the name starting at `start` in `buffer`, appending its
/// dotted-label text representation (e.g. `"_http._tcp.local."`) to `out`.
///
/// `out` is never grown past its current capacity: once appending a further
/// label would overflow it, the remaining labels are still walked (to find
/// the name's end on the wire) but are no longer copied out. This is a
/// truncation, not an error, matching the "never allocate in the core
/// codec" rule — callers that need the full name reserve enough capacity
/// up front.
///
/// Returns the offset of the first octet after this name in `buffer` (i.e.
/// after the terminating zero octet or a pointer's second octet), which is
/// always within the span the name actually occupies on the wire, even when
/// the name's expansion follows pointers elsewhere in the buffer.
pub fn decode_name(buffer: &[u8], start: usize, out: &mut String) -> MdnsResult<usize> {
    let cap = out.capacity();
    let mut pos = start;
    let mut min_seen = start;
    let mut end_of_name: Option<usize> = None;

    loop {
        let len_byte = *buffer.get(pos).ok_or(MdnsError::Truncated)?;
        match len_byte & POINTER_TAG {
            0b0000_0000 => {
                if len_byte == 0 {
                    if end_of_name.is_none() {
                        end_of_name = Some(pos + 1);
                    }
                    break;
                }
                let label_len = len_byte as usize;
                let label_start = pos + 1;
                let label_end = label_start
                    .checked_add(label_len)
                    .ok_or(MdnsError::Truncated)?;
                if label_end > buffer.len() {
                    return Err(MdnsError::Truncated);
                }
                let label = std::str::from_utf8(&buffer[label_start..label_end])
                    .map_err(|_| MdnsError::Malformed("name label is not valid utf-8"))?;
                append_label(out, label, cap);
                pos = label_end;
            }
            POINTER_TAG => {
                let hi = (len_byte & !POINTER_TAG) as usize;
                let lo = *buffer.get(pos + 1).ok_or(MdnsError::Truncated)? as usize;
                let pointer = (hi << 8) | lo;
                if end_of_name.is_none() {
                    end_of_name = Some(pos + 2);
                }
                if pointer >= min_seen {
                    return Err(MdnsError::Malformed("name pointer does not point backward"));
                }
                min_seen = pointer;
                pos = pointer;
            }
            _ => return Err(MdnsError::Malformed("reserved label length bits set")),
        }
    }

    if out.len() < cap {
        out.push('.');
    }
    Ok(end_of_name.expect("loop only exits after setting end_of_name"))
}

fn append_label(out: &mut String, label: &str, cap: usize) {
    if out.len() >= cap {
        return;
    }
    if !out.is_empty() {
        if out.len() + 1 > cap {
            return;
        }
        out.push('.');
    }
    let remaining = cap - out.len();
    if label.len() <= remaining {
        out.push_str(label);
    } else {
        out.push_str(&label[..remaining]);
    }
}

/// Walk past the name at `start` without decoding its text, returning the
/// offset just past it. Used by record parsers that only need to skip the
/// owner name to reach the type/class/ttl/rdlength fields.
pub fn skip_name(buffer: &[u8], start: usize) -> MdnsResult<usize> {
    let mut pos = start;
    let min_seen = start;
    loop {
        let len_byte = *buffer.get(pos).ok_or(MdnsError::Truncated)?;
        match len_byte & POINTER_TAG {
            0b0000_0000 => {
                if len_byte == 0 {
                    return Ok(pos + 1);
                }
                let label_len = len_byte as usize;
                let label_end = pos + 1 + label_len;
                if label_end > buffer.len() {
                    return Err(MdnsError::Truncated);
                }
                pos = label_end;
            }
            POINTER_TAG => {
                let hi = (len_byte & !POINTER_TAG) as usize;
                let lo = *buffer.get(pos + 1).ok_or(MdnsError::Truncated)? as usize;
                let pointer = (hi << 8) | lo;
                if pointer >= min_seen {
                    return Err(MdnsError::Malformed("name pointer does not point backward"));
                }
                // A pointer is always the final element of a name on the
                // wire, so the name ends right after its two octets
                // regardless of what it points at.
                return Ok(pos + 2);
            }
            _ => return Err(MdnsError::Malformed("reserved label length bits set")),
        }
    }
}

/// Compare the two names at `a` and `b` (each an owner-name offset in the
/// same or different buffers) for RFC 1035 case-insensitive equality,
/// without allocating.
pub fn names_equal(buf_a: &[u8], a: usize, buf_b: &[u8], b: usize) -> MdnsResult<bool> {
    let mut la = NameLabels::new(buf_a, a);
    let mut lb = NameLabels::new(buf_b, b);
    loop {
        let next_a = la.next()?;
        let next_b = lb.next()?;
        match (next_a, next_b) {
            (None, None) => return Ok(true),
            (Some(x), Some(y)) => {
                if x.len() != y.len() || !x.eq_ignore_ascii_case(y) {
                    return Ok(false);
                }
            }
            _ => return Ok(false),
        }
    }
}

/// Lazily yields the label slices of a (possibly compressed) name,
/// following pointers under the same forward-only invariant as
/// [`decode_name`].
struct NameLabels<'a> {
    buffer: &'a [u8],
    pos: usize,
    min_seen: usize,
    done: bool,
}

impl<'a> NameLabels<'a> {
    fn new(buffer: &'a [u8], start: usize) -> Self {
        NameLabels {
            buffer,
            pos: start,
            min_seen: start,
            done: false,
        }
    }

    fn next(&mut self) -> MdnsResult<Option<&'a [u8]>> {
        if self.done {
            return Ok(None);
        }
        loop {
            let len_byte = *self.buffer.get(self.pos).ok_or(MdnsError::Truncated)?;
            match len_byte & POINTER_TAG {
                0b0000_0000 => {
                    if len_byte == 0 {
                        self.done = true;
                        return Ok(None);
                    }
                    let label_len = len_byte as usize;
                    let label_start = self.pos + 1;
                    let label_end = label_start + label_len;
                    if label_end > self.buffer.len() {
                        return Err(MdnsError::Truncated);
                    }
                    self.pos = label_end;
                    return Ok(Some(&self.buffer[label_start..label_end]));
                }
                POINTER_TAG => {
                    let hi = (len_byte & !POINTER_TAG) as usize;
                    let lo = *self.buffer.get(self.pos + 1).ok_or(MdnsError::Truncated)? as usize;
                    let pointer = (hi << 8) | lo;
                    if pointer >= self.min_seen {
                        return Err(MdnsError::Malformed("name pointer does not point backward"));
                    }
                    self.min_seen = pointer;
                    self.pos = pointer;
                }
                _ => return Err(MdnsError::Malformed("reserved label length bits set")),
            }
        }
    }
}

/// Encode `name` (a dotted label string such as `"_http._tcp.local"` or
/// `"_http._tcp.local."`, trailing dot optional) into `writer` as an
/// uncompressed label sequence terminated by a zero octet. Compression is
/// never emitted on encode; RFC 1035 only requires decoders to understand
/// it, and always writing names out in full keeps the encoder a single
/// linear pass with no back-reference table to maintain.
pub fn encode_name(writer: &mut Writer, name: &str) -> MdnsResult<()> {
    for label in name.trim_end_matches('.').split('.') {
        if label.is_empty() {
            continue;
        }
        if label.len() > MAX_LABEL_LEN {
            return Err(MdnsError::Malformed("label exceeds 63 octets"));
        }
        writer.write_u8(label.len() as u8)?;
        writer.write_span(label.as_bytes())?;
    }
    writer.write_u8(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    // "www.example.com" as an uncompressed name, taken from a wireshark
    // capture of an A query, followed by a second occurrence that points
    // back at offset 0 via a compression pointer.
    const SAMPLE: &[u8] = &[
        3, b'w', b'w', b'w', 7, b'e', b'x', b'a', b'm', b'p', b'l', b'e', 3, b'c', b'o', b'm', 0,
        0xC0, 0x00,
    ];

    #[test]
    fn decode_uncompressed_name() {
        let mut out = String::with_capacity(64);
        let end = decode_name(SAMPLE, 0, &mut out).unwrap();
        assert_eq!(out, "www.example.com.");
        assert_eq!(end, 17);
    }

    #[test]
    fn decode_follows_compression_pointer() {
        let mut out = String::with_capacity(64);
        let end = decode_name(SAMPLE, 17, &mut out).unwrap();
        assert_eq!(out, "www.example.com.");
        assert_eq!(end, 19);
    }

    #[test]
    fn decode_truncates_into_small_capacity_without_error() {
        let mut out = String::with_capacity(5);
        let cap = out.capacity();
        let end = decode_name(SAMPLE, 0, &mut out).unwrap();
        assert_eq!(end, 17);
        assert!(out.len() <= cap);
    }

    #[test]
    fn forward_pointer_is_rejected() {
        let buf: &[u8] = &[0xC0, 0x02, 0, 0];
        let mut out = String::new();
        assert!(matches!(
            decode_name(buf, 0, &mut out),
            Err(MdnsError::Malformed(_))
        ));
    }

    #[test]
    fn self_pointer_cycle_is_rejected() {
        let buf: &[u8] = &[0xC0, 0x00];
        let mut out = String::new();
        assert!(matches!(
            decode_name(buf, 0, &mut out),
            Err(MdnsError::Malformed(_))
        ));
    }

    #[test]
    fn skip_name_matches_decode_end_offset() {
        assert_eq!(skip_name(SAMPLE, 0).unwrap(), 17);
        assert_eq!(skip_name(SAMPLE, 17).unwrap(), 19);
    }

    #[test]
    fn names_equal_is_case_insensitive_and_follows_pointers() {
        assert!(names_equal(SAMPLE, 0, SAMPLE, 17).unwrap());
    }

    #[test]
    fn encode_then_decode_roundtrips() {
        let mut buf = [0u8; 32];
        let mut w = Writer::new(&mut buf);
        encode_name(&mut w, "_http._tcp.local.").unwrap();
        let written_len = w.written().len();
        let mut out = String::with_capacity(64);
        let end = decode_name(w.written(), 0, &mut out).unwrap();
        assert_eq!(end, written_len);
        assert_eq!(out, "_http._tcp.local.");
    }

    #[test]
    fn encode_rejects_oversized_label() {
        let long_label = "a".repeat(64);
        let mut buf = [0u8; 128];
        let mut w = Writer::new(&mut buf);
        assert!(matches!(
            encode_name(&mut w, &long_label),
            Err(MdnsError::Malformed(_))
        ));
    }
}
