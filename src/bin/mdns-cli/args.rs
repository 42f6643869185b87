//! Manage command line arguments here.
use clap::{App, Arg};

use mdnslib::error::MdnsResult;

/// What the driver should do once it has a socket.
#[derive(Debug)]
pub enum Mode {
    /// `--discovery`: enumerate advertised service types.
    Discovery,
    /// `--query <service>`: resolve one service type to its instances.
    Query(String),
    /// `--service <service>`: advertise one instance and answer queries.
    Service(String),
}

/// This structure holds the command line arguments.
#[derive(Debug)]
pub struct CliOptions {
    pub mode: Mode,
    pub hostname: Option<String>,
    pub port: u16,
    pub txt: Vec<String>,
    pub timeout_secs: u64,
}

impl CliOptions {
    pub fn options() -> MdnsResult<Self> {
        let matches = App::new("mdns-cli")
            .version("0.1")
            .about(
                r#"A small mDNS / DNS-SD command line driver

            Modes (pick exactly one):
              --discovery              enumerate advertised service types
              --query <service>        resolve a service type to its instances
              --service <service>       advertise an instance and answer queries
            "#,
            )
            .arg(
                Arg::new("discovery")
                    .long("discovery")
                    .required(false)
                    .takes_value(false)
                    .long_help("Send a DNS-SD service enumeration query"),
            )
            .arg(
                Arg::new("query")
                    .short('q')
                    .long("query")
                    .required(false)
                    .takes_value(true)
                    .long_help("Service type to query, e.g. _http._tcp.local"),
            )
            .arg(
                Arg::new("service")
                    .short('s')
                    .long("service")
                    .required(false)
                    .takes_value(true)
                    .long_help("Service type to advertise, e.g. _http._tcp.local"),
            )
            .arg(
                Arg::new("hostname")
                    .long("hostname")
                    .required(false)
                    .takes_value(true)
                    .long_help("Hostname to advertise in --service mode (default: local hostname)"),
            )
            .arg(
                Arg::new("port")
                    .short('p')
                    .long("port")
                    .required(false)
                    .takes_value(true)
                    .default_value("0")
                    .long_help("Port to advertise in --service mode"),
            )
            .arg(
                Arg::new("txt")
                    .long("txt")
                    .required(false)
                    .takes_value(true)
                    .multiple_occurrences(true)
                    .long_help("key=value TXT attribute to advertise (repeatable)"),
            )
            .arg(
                Arg::new("timeout")
                    .short('t')
                    .long("timeout")
                    .required(false)
                    .takes_value(true)
                    .default_value("5")
                    .long_help("Seconds to listen for answers in --discovery/--query mode"),
            )
            .get_matches();

        let mode = if matches.is_present("discovery") {
            Mode::Discovery
        } else if let Some(service) = matches.value_of("query") {
            Mode::Query(service.to_string())
        } else if let Some(service) = matches.value_of("service") {
            Mode::Service(service.to_string())
        } else {
            return Err(mdnslib::error::MdnsError::Malformed(
                "one of --discovery, --query or --service is required",
            ));
        };

        let port: u16 = matches
            .value_of("port")
            .unwrap()
            .parse()
            .map_err(|_| mdnslib::error::MdnsError::Malformed("--port is not a valid u16"))?;
        let timeout_secs: u64 = matches
            .value_of("timeout")
            .unwrap()
            .parse()
            .map_err(|_| mdnslib::error::MdnsError::Malformed("--timeout is not a valid u64"))?;

        Ok(CliOptions {
            mode,
            hostname: matches.value_of("hostname").map(String::from),
            port,
            txt: matches
                .values_of("txt")
                .map(|vals| vals.map(String::from).collect())
                .unwrap_or_default(),
            timeout_secs,
        })
    }
}
