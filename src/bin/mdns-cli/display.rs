//! Display helpers: decoded records borrow from the datagram buffer, so
//! formatting them for a human happens right here in the driver rather
//! than in the library, the same split the teacher keeps between
//! `dnslib::rfc1035` (parsing) and `dnsquery/display.rs` (printing).
use mdnslib::decode::{DecodedItem, EntryType};
use mdnslib::error::MdnsResult;
use mdnslib::message::{TYPE_A, TYPE_AAAA, TYPE_PTR, TYPE_SRV, TYPE_TXT};
use mdnslib::name::decode_name;
use mdnslib::record::{parse_a, parse_aaaa, parse_ptr, parse_srv, parse_txt};

fn section_label(section: EntryType) -> &'static str {
    match section {
        EntryType::Question => "qd",
        EntryType::Answer => "an",
        EntryType::Authority => "ns",
        EntryType::Additional => "ar",
    }
}

/// Print every entry in a decoded message, resolving the owner name and
/// typed rdata for records along the way.
pub fn display_message(buffer: &[u8]) -> MdnsResult<()> {
    let decoder = mdnslib::decode::MessageDecoder::new(buffer)?;
    let header = decoder.header();
    println!(
        "id:{:04x} {} qd:{} an:{} ns:{} ar:{}",
        header.id,
        if header.is_response() { "response" } else { "query" },
        header.question_count,
        header.answer_count,
        header.authority_count,
        header.additional_count,
    );

    for item in decoder.entries() {
        match item? {
            DecodedItem::Question(question) => {
                let mut name = String::with_capacity(256);
                decode_name(buffer, question.name_offset, &mut name)?;
                println!(
                    "  qd  {name} qtype:{} {}",
                    question.qtype,
                    if question.unicast_response { "(QU)" } else { "" },
                );
            }
            DecodedItem::Record(record) => {
                let mut name = String::with_capacity(256);
                decode_name(buffer, record.name_offset, &mut name)?;
                print!(
                    "  {}  {name} ttl:{}{} ",
                    section_label(record.section),
                    record.ttl,
                    if record.cache_flush { " (cache-flush)" } else { "" },
                );
                display_rdata(buffer, &record)?;
            }
        }
    }
    Ok(())
}

fn display_rdata(buffer: &[u8], record: &mdnslib::decode::DecodedRecord) -> MdnsResult<()> {
    match record.rtype {
        TYPE_A => {
            let addr = parse_a(buffer, record.rdata_offset, record.rdata_length)?;
            println!("A {addr}");
        }
        TYPE_AAAA => {
            let addr = parse_aaaa(buffer, record.rdata_offset, record.rdata_length)?;
            println!("AAAA {addr}");
        }
        TYPE_PTR => {
            let mut target = String::with_capacity(256);
            parse_ptr(buffer, record.rdata_offset, record.rdata_length, &mut target)?;
            println!("PTR {target}");
        }
        TYPE_SRV => {
            let mut target = String::with_capacity(256);
            let srv = parse_srv(buffer, record.rdata_offset, record.rdata_length, &mut target)?;
            println!(
                "SRV priority:{} weight:{} port:{} target:{target}",
                srv.priority, srv.weight, srv.port
            );
        }
        TYPE_TXT => {
            print!("TXT");
            for entry in parse_txt(buffer, record.rdata_offset, record.rdata_length)? {
                let entry = entry?;
                match entry.value {
                    Some(value) => print!(" {}={}", entry.key, String::from_utf8_lossy(value)),
                    None => print!(" {}", entry.key),
                }
            }
            println!();
        }
        other => println!("(unsupported rtype {other})"),
    }
    Ok(())
}
