//! A small mDNS / DNS-SD command line driver: the "external collaborator"
//! spec.md leaves outside the library itself (sockets, interface
//! enumeration, an event loop, logging of records). Structured the way
//! `original_source/mdns.c`'s `main()` dispatches between discovery, query
//! and service modes, translated into the teacher's `dnsquery` binary
//! layout (`args.rs` for CLI parsing, `display.rs` for formatting
//! decoded records).
use std::io;
use std::net::Ipv4Addr;
use std::time::{Duration, Instant};

use log::debug;

use mdnslib::cursor::Writer;
use mdnslib::encode::{encode_discovery_answer, encode_discovery_query, encode_query, encode_query_answer, AnswerRecord, TxtBuilder};
use mdnslib::error::{MdnsError, MdnsResult};
use mdnslib::message::TYPE_PTR;
use mdnslib::receiver::{listen_responder, recv_discovery, recv_query, ResponderQuery};
use mdnslib::transport::MdnsSocket;

mod args;
use args::{CliOptions, Mode};

mod display;
use display::display_message;

const MAX_DATAGRAM: usize = 4096;
const POLL_INTERVAL: Duration = Duration::from_millis(500);

fn main() -> MdnsResult<()> {
    env_logger::init();

    let options = CliOptions::options()?;
    debug!("options: {:?}", &options);

    let socket = MdnsSocket::open_ipv4()?;
    socket.set_read_timeout(Some(POLL_INTERVAL))?;
    debug!("socket bound to {:?}", socket.local_addr());

    match &options.mode {
        Mode::Discovery => run_discovery(&socket, options.timeout_secs),
        Mode::Query(service) => run_query(&socket, service, options.timeout_secs),
        Mode::Service(service) => run_service(&socket, service, &options),
    }
}

fn is_timeout(error: &io::Error) -> bool {
    matches!(error.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}

fn run_discovery(socket: &MdnsSocket, timeout_secs: u64) -> MdnsResult<()> {
    let mut send_buf = [0u8; 512];
    let mut writer = Writer::new(&mut send_buf);
    let len = encode_discovery_query(&mut writer, false)?;
    socket.send_multicast(&send_buf[..len])?;
    println!("sent DNS-SD enumeration query, listening for {timeout_secs}s...");

    let deadline = Instant::now() + Duration::from_secs(timeout_secs);
    let mut recv_buf = [0u8; MAX_DATAGRAM];
    while Instant::now() < deadline {
        match recv_discovery(socket, &mut recv_buf) {
            Ok(Some(len)) => display_message(&recv_buf[..len])?,
            Ok(None) => {}
            Err(MdnsError::Io(e)) if is_timeout(&e) => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

fn run_query(socket: &MdnsSocket, service: &str, timeout_secs: u64) -> MdnsResult<()> {
    let mut send_buf = [0u8; 512];
    let mut writer = Writer::new(&mut send_buf);
    let id = encode_query(&mut writer, 0, service, TYPE_PTR, false)?;
    let len = writer.position();
    socket.send_multicast(&send_buf[..len])?;
    debug!("sent query id {id:#06x} for {service}");
    println!("sent query for {service}, listening for {timeout_secs}s...");

    let deadline = Instant::now() + Duration::from_secs(timeout_secs);
    let mut recv_buf = [0u8; MAX_DATAGRAM];
    while Instant::now() < deadline {
        match recv_query(socket, &mut recv_buf, service) {
            Ok(Some(len)) => display_message(&recv_buf[..len])?,
            Ok(None) => {}
            Err(MdnsError::Io(e)) if is_timeout(&e) => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

fn run_service(socket: &MdnsSocket, service: &str, options: &CliOptions) -> MdnsResult<()> {
    let hostname = match &options.hostname {
        Some(h) => h.clone(),
        None => hostname::get()?.to_string_lossy().into_owned(),
    };
    let service_type = service.trim_end_matches('.').to_string();
    let host_name = format!("{hostname}.local.");
    let instance_name = format!("{hostname}.{service_type}.");

    let mut txt_builder = TxtBuilder::new();
    for kv in &options.txt {
        txt_builder = match kv.split_once('=') {
            Some((key, value)) => txt_builder.entry(key, Some(value)),
            None => txt_builder.entry(kv, None),
        };
    }
    let txt_rdata = txt_builder.build();
    let local_addrs = local_ipv4_addresses()?;
    if local_addrs.is_empty() {
        debug!("no non-loopback IPv4 interface found; advertising SRV/TXT only, no A records");
    }

    println!("advertising {instance_name} ({host_name}:{}), ctrl-c to stop", options.port);
    let mut recv_buf = [0u8; MAX_DATAGRAM];
    loop {
        match listen_responder(socket, &mut recv_buf, &service_type) {
            Ok(Some((kind, from, unicast))) => {
                let mut send_buf = [0u8; 512];
                let mut writer = Writer::new(&mut send_buf);
                let len = match kind {
                    ResponderQuery::Enumeration => {
                        encode_discovery_answer(&mut writer, &format!("{service_type}."), 10)?
                    }
                    ResponderQuery::Service => {
                        let mut additional = vec![
                            AnswerRecord::Srv {
                                priority: 0,
                                weight: 0,
                                port: options.port,
                                target: &host_name,
                            },
                            AnswerRecord::Txt { rdata: &txt_rdata },
                        ];
                        additional.extend(local_addrs.iter().map(|addr| AnswerRecord::A(*addr)));
                        encode_query_answer(
                            &mut writer,
                            &format!("{service_type}."),
                            &instance_name,
                            &additional,
                            10,
                        )?
                    }
                };
                if unicast {
                    socket.send_unicast(&send_buf[..len], from)?;
                } else {
                    socket.send_multicast(&send_buf[..len])?;
                }
                println!("answered {kind:?} query from {from}");
            }
            Ok(None) => {}
            Err(MdnsError::Io(e)) if is_timeout(&e) => {}
            Err(e) => return Err(e),
        }
    }
}

/// Enumerate this host's non-loopback IPv4 addresses, the way
/// `original_source/mdns.c`'s `open_service_sockets` walks `getifaddrs()`
/// to decide which addresses to advertise A records for, generalized here
/// to just the address list (socket opening stays a single wildcard bind
/// in `transport::MdnsSocket`).
fn local_ipv4_addresses() -> MdnsResult<Vec<Ipv4Addr>> {
    let interfaces = if_addrs::get_if_addrs()?;
    Ok(interfaces
        .into_iter()
        .filter(|iface| !iface.is_loopback())
        .filter_map(|iface| match iface.addr {
            if_addrs::IfAddr::V4(v4) => Some(v4.ip),
            _ => None,
        })
        .collect())
}
