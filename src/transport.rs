//! Multicast socket transport (C6). Socket creation and binding is outside
//! spec.md's scope for the *library*, but a usable crate still needs one
//! concrete, correct way to get a socket joined to the mDNS groups; that
//! lives here so the CLI driver (and any other caller) doesn't have to
//! reimplement `IP_ADD_MEMBERSHIP`/`IPV6_ADD_MEMBERSHIP` plumbing by hand.
//! `socket2` does the setup (`SO_REUSEADDR`, multicast group join) that
//! `std::net::UdpSocket` alone cannot express; the resulting socket is then
//! converted into a plain `std::net::UdpSocket` for send/recv, since that's
//! all an mDNS transport needs once it is bound and joined.
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use std::time::Duration;

use socket2::{Domain, Protocol, SockAddr, Socket, Type};

use crate::error::MdnsResult;
use crate::message::{MDNS_GROUP_V4, MDNS_GROUP_V6, MDNS_PORT};

/// A socket bound to the mDNS port and joined to the appropriate multicast
/// group for one address family.
pub struct MdnsSocket {
    socket: UdpSocket,
    group: SocketAddr,
}

impl MdnsSocket {
    /// Open and join the IPv4 mDNS group (`224.0.0.251:5353`) on all local
    /// interfaces.
    pub fn open_ipv4() -> MdnsResult<Self> {
        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
        socket.set_reuse_address(true)?;
        let bind_addr: SocketAddr = (Ipv4Addr::UNSPECIFIED, MDNS_PORT).into();
        socket.bind(&SockAddr::from(bind_addr))?;
        socket.join_multicast_v4(&MDNS_GROUP_V4, &Ipv4Addr::UNSPECIFIED)?;
        socket.set_multicast_loop_v4(true)?;

        Ok(MdnsSocket {
            socket: socket.into(),
            group: SocketAddr::new(IpAddr::V4(MDNS_GROUP_V4), MDNS_PORT),
        })
    }

    /// Open and join the IPv6 mDNS group (`[ff02::fb]:5353`) on the given
    /// interface index (`0` lets the OS pick a default, matching
    /// `original_source/mdns.c`'s use of `if_nametoindex`-or-zero).
    pub fn open_ipv6(interface_index: u32) -> MdnsResult<Self> {
        let socket = Socket::new(Domain::IPV6, Type::DGRAM, Some(Protocol::UDP))?;
        socket.set_reuse_address(true)?;
        socket.set_only_v6(true)?;
        let bind_addr: SocketAddr = (Ipv6Addr::UNSPECIFIED, MDNS_PORT).into();
        socket.bind(&SockAddr::from(bind_addr))?;
        socket.join_multicast_v6(&MDNS_GROUP_V6, interface_index)?;
        socket.set_multicast_loop_v6(true)?;

        Ok(MdnsSocket {
            socket: socket.into(),
            group: SocketAddr::new(IpAddr::V6(MDNS_GROUP_V6), MDNS_PORT),
        })
    }

    /// Send `datagram` to the joined multicast group.
    pub fn send_multicast(&self, datagram: &[u8]) -> MdnsResult<usize> {
        Ok(self.socket.send_to(datagram, self.group)?)
    }

    /// Send `datagram` directly to `to`, used to answer a unicast-requested
    /// query (the QU bit) straight back to the querier.
    pub fn send_unicast(&self, datagram: &[u8], to: SocketAddr) -> MdnsResult<usize> {
        Ok(self.socket.send_to(datagram, to)?)
    }

    /// Receive one datagram, returning its length and sender address.
    /// Timeouts are the caller's responsibility via
    /// [`set_read_timeout`](Self::set_read_timeout); spec.md §5 keeps this
    /// out of the transport itself.
    pub fn recv(&self, buffer: &mut [u8]) -> MdnsResult<(usize, SocketAddr)> {
        Ok(self.socket.recv_from(buffer)?)
    }

    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> MdnsResult<()> {
        self.socket.set_read_timeout(timeout)?;
        Ok(())
    }

    pub fn local_addr(&self) -> MdnsResult<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }
}
