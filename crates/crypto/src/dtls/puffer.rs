//! In-Memory-Puffer zwischen OpenSSL und dem Netzwerk
//!
//! OpenSSL liest und schreibt ueber `Read`/`Write` auf diesem Adapter statt
//! auf einem Socket. Eingehende Datagramme behalten ihre Grenzen (DTLS
//! erwartet pro Lesevorgang ein Datagramm); ausgehende Records werden
//! aneinandergehaengt, bis der Transport-Treiber sie abholt.

use std::collections::VecDeque;
use std::io::{self, Read, Write};

use bytes::{Bytes, BytesMut};

#[derive(Debug, Default)]
pub struct DatagrammPuffer {
    eingang: VecDeque<Bytes>,
    ausgang: BytesMut,
}

impl DatagrammPuffer {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Legt ein empfangenes Datagramm in den Eingangspuffer
    pub fn eingang_anhaengen(&mut self, datagramm: &[u8]) {
        if !datagramm.is_empty() {
            self.eingang.push_back(Bytes::copy_from_slice(datagramm));
        }
    }

    /// Noch nicht gelesene Bytes im Eingangspuffer
    pub fn eingang_ausstehend(&self) -> usize {
        self.eingang.iter().map(Bytes::len).sum()
    }

    /// Zum Senden bereitstehende Bytes im Ausgangspuffer
    pub fn ausgang_ausstehend(&self) -> usize {
        self.ausgang.len()
    }

    /// Entnimmt den gesamten Ausgangspuffer
    pub fn ausgang_entnehmen(&mut self) -> Bytes {
        self.ausgang.split().freeze()
    }

    /// Haengt bereits erzeugte Records an den Ausgangspuffer an
    pub fn ausgang_anhaengen(&mut self, daten: &[u8]) {
        self.ausgang.extend_from_slice(daten);
    }

    /// Verwirft den Ausgangspuffer ohne ihn zu senden
    pub fn ausgang_verwerfen(&mut self) {
        self.ausgang.clear();
    }
}

impl Read for DatagrammPuffer {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Some(mut datagramm) = self.eingang.pop_front() else {
            return Err(io::ErrorKind::WouldBlock.into());
        };

        let n = datagramm.len().min(buf.len());
        buf[..n].copy_from_slice(&datagramm[..n]);

        if n < datagramm.len() {
            let rest = datagramm.split_off(n);
            self.eingang.push_front(rest);
        }
        Ok(n)
    }
}

impl Write for DatagrammPuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.ausgang.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
