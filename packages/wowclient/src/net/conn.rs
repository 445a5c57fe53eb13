//! The framed, non-blocking world connection.
//!
//! Inbound frames are `{u16 big-endian size, u16 opcode, payload}` with the
//! 4-byte header passed through the stateful header cipher; outbound frames
//! carry a 6-byte header (`u16` size, `u32` opcode) encrypted likewise.
//! `pump` moves a bounded amount of socket I/O and never blocks the frame.

use crate::net::crypto::HeaderCrypto;
use std::{
    io::{self, Read, Write},
    net::TcpStream,
};
use anyhow::{Result, Context, bail, ensure};


/// Per-pump read budget. Keeps one frame tick from stalling on a firehose.
const READ_BUDGET: usize = 64 * 1024;

/// One decoded inbound frame.
#[derive(Debug)]
pub struct Frame {
    pub opcode: u16,
    pub payload: Vec<u8>,
}

/// A connected, possibly ciphered, world link.
#[derive(Debug)]
pub struct WorldConn {
    stream: TcpStream,
    crypto: Option<HeaderCrypto>,
    recv_buf: Vec<u8>,
    send_buf: Vec<u8>,
    /// Header already taken off `recv_buf` and decrypted, waiting for its
    /// payload to arrive. The cipher is stateful, so each header byte must
    /// be decrypted exactly once.
    pending: Option<(u16, usize)>,
}

impl WorldConn {
    pub fn connect(host: &str, port: u16) -> Result<Self> {
        let stream = TcpStream::connect((host, port))
            .with_context(|| format!("connecting to {}:{}", host, port))?;
        stream.set_nonblocking(true).context("setting nonblocking")?;
        if let Err(e) = stream.set_nodelay(true) {
            warn!(%e, "failed to disable nagling");
        }
        Ok(WorldConn {
            stream,
            crypto: None,
            recv_buf: Vec::new(),
            send_buf: Vec::new(),
            pending: None,
        })
    }

    /// Arm the header cipher. Frames queued before this call go out in the
    /// clear, which is exactly what the pre-auth exchange needs.
    pub fn install_cipher(&mut self, session_key: &[u8]) {
        self.crypto = Some(HeaderCrypto::new(session_key));
    }

    /// Queue an outbound frame. Actual socket writes happen in `pump`.
    pub fn send(&mut self, opcode: u16, payload: &[u8]) -> Result<()> {
        let size = payload.len() + 4;
        ensure!(size <= u16::MAX as usize, "outbound frame too large");
        let mut header = [0u8; 6];
        header[0..2].copy_from_slice(&(size as u16).to_be_bytes());
        header[2..6].copy_from_slice(&(opcode as u32).to_le_bytes());
        if let Some(crypto) = &mut self.crypto {
            crypto.encrypt(&mut header);
        }
        self.send_buf.extend_from_slice(&header);
        self.send_buf.extend_from_slice(payload);
        Ok(())
    }

    /// Flush queued writes, read what the socket has ready (bounded), and
    /// decode every complete frame buffered so far. Errors are transport
    /// failures; the session tears down on them.
    pub fn pump(&mut self) -> Result<Vec<Frame>> {
        self.flush_writes()?;
        self.fill_reads()?;

        let mut frames = Vec::new();
        loop {
            if self.pending.is_none() {
                if self.recv_buf.len() < 4 {
                    break;
                }
                let mut header = [0u8; 4];
                header.copy_from_slice(&self.recv_buf[0..4]);
                self.recv_buf.drain(0..4);
                if let Some(crypto) = &mut self.crypto {
                    crypto.decrypt(&mut header);
                }
                let size = u16::from_be_bytes([header[0], header[1]]) as usize;
                let opcode = u16::from_le_bytes([header[2], header[3]]);
                ensure!(size >= 2, "inbound frame size {} shorter than opcode", size);
                self.pending = Some((opcode, size - 2));
            }
            let (opcode, payload_len) = self.pending.unwrap();
            if self.recv_buf.len() < payload_len {
                break;
            }
            let payload = self.recv_buf.drain(0..payload_len).collect();
            self.pending = None;
            frames.push(Frame { opcode, payload });
        }
        Ok(frames)
    }

    fn flush_writes(&mut self) -> Result<()> {
        while !self.send_buf.is_empty() {
            match self.stream.write(&self.send_buf) {
                Ok(0) => bail!("socket closed while writing"),
                Ok(n) => {
                    self.send_buf.drain(0..n);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e).context("socket write"),
            }
        }
        Ok(())
    }

    fn fill_reads(&mut self) -> Result<()> {
        let mut chunk = [0u8; 4096];
        let mut read_total = 0;
        while read_total < READ_BUDGET {
            match self.stream.read(&mut chunk) {
                Ok(0) => bail!("connection closed by peer"),
                Ok(n) => {
                    self.recv_buf.extend_from_slice(&chunk[..n]);
                    read_total += n;
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e).context("socket read"),
            }
        }
        Ok(())
    }

    /// Tear down. Outstanding queued bytes are dropped.
    pub fn close(&mut self) {
        self.send_buf.clear();
        self.recv_buf.clear();
        let _ = self.stream.shutdown(std::net::Shutdown::Both);
    }
}
