//! The header cipher: RC4 keyed through HMAC-SHA1 of the 40-byte session
//! key, with the first kilobyte of keystream dropped on both sides.
//!
//! Only frame headers pass through this; payloads are plaintext on the
//! 3.3.5a link.

use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// HMAC seed for the client-to-server direction.
const SEND_SEED: [u8; 16] = [
    0xC2, 0xB3, 0x72, 0x3C, 0xC6, 0xAE, 0xD9, 0xB5, 0x34, 0x3C, 0x53, 0xEE,
    0x2F, 0x43, 0x67, 0xCE,
];

/// HMAC seed for the server-to-client direction.
const RECV_SEED: [u8; 16] = [
    0xCC, 0x98, 0xAE, 0x04, 0xE8, 0x97, 0xEA, 0xCA, 0x12, 0xDD, 0xC0, 0x93,
    0x42, 0x91, 0x53, 0x57,
];

/// Keystream bytes discarded after key schedule, per the 3.3.5a protocol.
const DROP: usize = 1024;

/// Plain RC4 keystream state.
struct Rc4 {
    state: [u8; 256],
    i: u8,
    j: u8,
}

impl Rc4 {
    fn new(key: &[u8]) -> Self {
        debug_assert!(!key.is_empty() && key.len() <= 256);
        let mut state = [0u8; 256];
        for (i, b) in state.iter_mut().enumerate() {
            *b = i as u8;
        }
        let mut j = 0u8;
        for i in 0..256 {
            j = j.wrapping_add(state[i]).wrapping_add(key[i % key.len()]);
            state.swap(i, j as usize);
        }
        Rc4 { state, i: 0, j: 0 }
    }

    fn next(&mut self) -> u8 {
        self.i = self.i.wrapping_add(1);
        self.j = self.j.wrapping_add(self.state[self.i as usize]);
        self.state.swap(self.i as usize, self.j as usize);
        let at = self.state[self.i as usize].wrapping_add(self.state[self.j as usize]);
        self.state[at as usize]
    }

    fn apply(&mut self, data: &mut [u8]) {
        for b in data {
            *b ^= self.next();
        }
    }
}

/// Both directions of the header cipher for one session.
pub struct HeaderCrypto {
    send: Rc4,
    recv: Rc4,
}

impl std::fmt::Debug for HeaderCrypto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("HeaderCrypto")
    }
}

fn keyed_rc4(seed: &[u8], session_key: &[u8]) -> Rc4 {
    let mut mac = HmacSha1::new_from_slice(seed)
        .expect("hmac accepts any key length");
    mac.update(session_key);
    let digest = mac.finalize().into_bytes();
    let mut rc4 = Rc4::new(digest.as_slice());
    let mut sync = [0u8; DROP];
    rc4.apply(&mut sync);
    rc4
}

impl HeaderCrypto {
    /// Key schedule from the session secret established at login.
    pub fn new(session_key: &[u8]) -> Self {
        HeaderCrypto {
            send: keyed_rc4(&SEND_SEED, session_key),
            recv: keyed_rc4(&RECV_SEED, session_key),
        }
    }

    /// Encrypt an outbound header in place.
    pub fn encrypt(&mut self, header: &mut [u8]) {
        self.send.apply(header);
    }

    /// Decrypt an inbound header in place.
    pub fn decrypt(&mut self, header: &mut [u8]) {
        self.recv.apply(header);
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; 40] = [
        0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B,
        0x0C, 0x0D, 0x0E, 0x0F, 0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16,
        0x17, 0x18, 0x19, 0x1A, 0x1B, 0x1C, 0x1D, 0x1E, 0x1F, 0x20, 0x21,
        0x22, 0x23, 0x24, 0x25, 0x26, 0x27, 0x28,
    ];

    #[test]
    fn same_key_schedule_round_trips() {
        // a freshly keyed inbound cipher undoes an outbound cipher built
        // on the same seed and key
        let mut a = keyed_rc4(&SEND_SEED, &KEY);
        let mut b = keyed_rc4(&SEND_SEED, &KEY);
        for plain in [[0u8; 6], [0x12, 0x34, 0x56, 0x78, 0x9A, 0xBC]] {
            let mut buf = plain;
            a.apply(&mut buf);
            assert_ne!(buf, plain);
            b.apply(&mut buf);
            assert_eq!(buf, plain);
        }
    }

    #[test]
    fn directions_use_distinct_keystreams() {
        let mut crypto = HeaderCrypto::new(&KEY);
        let mut sent = [0u8; 6];
        let mut received = [0u8; 6];
        crypto.encrypt(&mut sent);
        crypto.decrypt(&mut received);
        assert_ne!(sent, received);
    }

    #[test]
    fn cipher_is_stateful_across_headers() {
        let mut crypto = HeaderCrypto::new(&KEY);
        let mut first = [0u8; 4];
        let mut second = [0u8; 4];
        crypto.decrypt(&mut first);
        crypto.decrypt(&mut second);
        assert_ne!(first, second);
    }
}
