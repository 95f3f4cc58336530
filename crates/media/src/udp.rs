//! UDP-Versand von DTLS-Records mit expliziter Quelladresse
//!
//! Der Relay lauscht typischerweise auf einer Wildcard-Adresse. Damit die
//! Antwort von genau der Adresse kommt, an die der Peer gesendet hat, wird
//! die lokale Quelladresse per Ancillary-Data (`IP_PKTINFO` bzw.
//! `IPV6_PKTINFO`) an `sendmsg` uebergeben.
//!
//! ```text
//! DtlsTransport::senden()
//!     |
//!     v
//! AusgehendesDatagramm { quelle, ziel, nutzdaten }
//!     |
//!     v
//! DatagrammSender::senden()  --> sendmsg(MSG_DONTWAIT) + PKTINFO
//! ```
//!
//! Ein Versuch, nicht blockierend, keine Wiederholung.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;

/// Ein zu sendendes Datagramm mit Quell- und Zieladresse
#[derive(Debug, Clone, Copy)]
pub struct AusgehendesDatagramm<'a> {
    /// Lokale Quelladresse; der Port ergibt sich aus dem Socket
    pub quelle: SocketAddr,
    pub ziel: SocketAddr,
    pub nutzdaten: &'a [u8],
}

/// Versandweg fuer DTLS-Records
pub trait DatagrammSender: Send + Sync {
    /// Sendet genau ein Datagramm, ohne zu blockieren
    fn senden(&self, datagramm: &AusgehendesDatagramm<'_>) -> io::Result<usize>;
}

/// Sendet ueber einen gebundenen UDP-Socket mit PKTINFO-Quelladresse
pub struct PktinfoSender {
    socket: Arc<UdpSocket>,
    #[cfg_attr(not(any(target_os = "linux", target_os = "android")), allow(dead_code))]
    ipv6: bool,
}

impl PktinfoSender {
    /// Uebernimmt einen bereits gebundenen Socket (z.B. den des Empfangs-Loops)
    pub fn neu(socket: Arc<UdpSocket>) -> io::Result<Self> {
        let ipv6 = socket.local_addr()?.is_ipv6();
        Ok(Self { socket, ipv6 })
    }

    /// Bindet einen neuen UDP-Socket
    pub async fn binden(addr: SocketAddr) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        tracing::info!(addr = %socket.local_addr()?, "DTLS-UDP-Socket gebunden");
        Self::neu(Arc::new(socket))
    }

    pub fn socket(&self) -> &Arc<UdpSocket> {
        &self.socket
    }

    pub fn lokale_adresse(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

impl DatagrammSender for PktinfoSender {
    #[cfg(any(target_os = "linux", target_os = "android"))]
    fn senden(&self, datagramm: &AusgehendesDatagramm<'_>) -> io::Result<usize> {
        use std::os::fd::AsRawFd;
        pktinfo::senden(self.socket.as_raw_fd(), self.ipv6, datagramm)
    }

    #[cfg(not(any(target_os = "linux", target_os = "android")))]
    fn senden(&self, datagramm: &AusgehendesDatagramm<'_>) -> io::Result<usize> {
        self.socket.try_send_to(datagramm.nutzdaten, datagramm.ziel)
    }
}

#[cfg(any(target_os = "linux", target_os = "android"))]
mod pktinfo {
    use super::AusgehendesDatagramm;
    use nix::sys::socket::{sendmsg, ControlMessage, MsgFlags, SockaddrIn, SockaddrIn6};
    use std::io::{self, IoSlice};
    use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6};
    use std::os::fd::RawFd;

    pub(super) fn senden(
        fd: RawFd,
        ipv6: bool,
        datagramm: &AusgehendesDatagramm<'_>,
    ) -> io::Result<usize> {
        let iov = [IoSlice::new(datagramm.nutzdaten)];
        let flags = MsgFlags::MSG_DONTWAIT;

        let gesendet = if ipv6 {
            let quelle = als_v6(datagramm.quelle.ip());
            let ziel = match datagramm.ziel {
                SocketAddr::V4(v4) => SocketAddrV6::new(v4.ip().to_ipv6_mapped(), v4.port(), 0, 0),
                SocketAddr::V6(v6) => v6,
            };
            let info = libc::in6_pktinfo {
                ipi6_addr: libc::in6_addr {
                    s6_addr: quelle.octets(),
                },
                ipi6_ifindex: 0,
            };
            sendmsg(
                fd,
                &iov,
                &[ControlMessage::Ipv6PacketInfo(&info)],
                flags,
                Some(&SockaddrIn6::from(ziel)),
            )
        } else {
            let quelle = als_v4(datagramm.quelle.ip()).ok_or_else(|| adressfamilie(datagramm.quelle))?;
            let ziel = match datagramm.ziel {
                SocketAddr::V4(v4) => v4,
                SocketAddr::V6(v6) => v6
                    .ip()
                    .to_ipv4_mapped()
                    .map(|ip| SocketAddrV4::new(ip, v6.port()))
                    .ok_or_else(|| adressfamilie(datagramm.ziel))?,
            };
            let info = libc::in_pktinfo {
                ipi_ifindex: 0,
                ipi_spec_dst: libc::in_addr {
                    s_addr: u32::from(quelle).to_be(),
                },
                ipi_addr: libc::in_addr { s_addr: 0 },
            };
            sendmsg(
                fd,
                &iov,
                &[ControlMessage::Ipv4PacketInfo(&info)],
                flags,
                Some(&SockaddrIn::from(ziel)),
            )
        };

        gesendet.map_err(io::Error::from)
    }

    fn als_v6(ip: IpAddr) -> Ipv6Addr {
        match ip {
            IpAddr::V4(v4) => v4.to_ipv6_mapped(),
            IpAddr::V6(v6) => v6,
        }
    }

    fn als_v4(ip: IpAddr) -> Option<Ipv4Addr> {
        match ip {
            IpAddr::V4(v4) => Some(v4),
            IpAddr::V6(v6) => v6.to_ipv4_mapped(),
        }
    }

    fn adressfamilie(addr: SocketAddr) -> io::Error {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("IPv6-Adresse {addr} auf IPv4-Socket"),
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
