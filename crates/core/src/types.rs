//! Gemeinsame Identifikationstypen fuer mediarelay
//!
//! IDs verwenden das Newtype-Pattern um Verwechslungen zur Compilezeit
//! auszuschliessen.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use uuid::Uuid;

/// Eindeutige ID eines Media-Streams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamId(pub Uuid);

impl StreamId {
    /// Erstellt eine neue zufaellige StreamId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for StreamId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for StreamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "stream:{}", self.0)
    }
}

/// Netzwerk-Endpunkt (IP + Port) eines Streams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpunkt {
    pub ip: IpAddr,
    pub port: u16,
}

impl Endpunkt {
    pub fn neu(ip: IpAddr, port: u16) -> Self {
        Self { ip, port }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }
}

impl From<SocketAddr> for Endpunkt {
    fn from(addr: SocketAddr) -> Self {
        Self::neu(addr.ip(), addr.port())
    }
}

impl std::fmt::Display for Endpunkt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.socket_addr())
    }
}

/// DTLS-Rolle eines Streams, von der Signalisierung ausgehandelt
///
/// `Aktiv` initiiert den Handshake (Client), `Passiv` antwortet (Server).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DtlsRolle {
    Aktiv,
    Passiv,
}

impl DtlsRolle {
    pub fn ist_aktiv(&self) -> bool {
        matches!(self, Self::Aktiv)
    }
}

impl std::fmt::Display for DtlsRolle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Aktiv => f.write_str("aktiv"),
            Self::Passiv => f.write_str("passiv"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_id_eindeutig() {
        let a = StreamId::new();
        let b = StreamId::new();
        assert_ne!(a, b, "Zwei neue StreamIds muessen verschieden sein");
    }

    #[test]
    fn stream_id_display() {
        let id = StreamId(Uuid::nil());
        assert!(id.to_string().starts_with("stream:"));
    }

    #[test]
    fn endpunkt_aus_socket_addr() {
        let addr: SocketAddr = "192.0.2.10:40000".parse().unwrap();
        let ep = Endpunkt::from(addr);
        assert_eq!(ep.port, 40000);
        assert_eq!(ep.socket_addr(), addr);
        assert_eq!(ep.to_string(), "192.0.2.10:40000");
    }

    #[test]
    fn rolle_ist_serde_kompatibel() {
        let json = serde_json::to_string(&DtlsRolle::Passiv).unwrap();
        assert_eq!(json, "\"passiv\"");
        let rolle: DtlsRolle = serde_json::from_str("\"aktiv\"").unwrap();
        assert!(rolle.ist_aktiv());
    }
}
