//! Paletted mip decoding, shared by both container revisions.
//!
//! The palette is 256 BGRX entries. The mip payload is one index byte per
//! pixel followed by a packed alpha stream whose depth is 0, 1, 4, or 8
//! bits per pixel, least significant bits first.

use anyhow::{Result, bail, ensure};


pub(crate) type Palette = [[u8; 4]; 256];

pub(crate) fn read_palette(data: &[u8], at: usize) -> Result<Palette> {
    ensure!(at + 1024 <= data.len(), "blp: truncated palette");
    let mut pal = [[0u8; 4]; 256];
    for (i, entry) in data[at..at + 1024].chunks_exact(4).enumerate() {
        pal[i] = [entry[0], entry[1], entry[2], entry[3]];
    }
    Ok(pal)
}

pub(crate) fn decode(
    bytes: &[u8],
    pal: &Palette,
    w: u32,
    h: u32,
    alpha_depth: u32,
) -> Result<Vec<u8>> {
    let count = w as usize * h as usize;
    ensure!(bytes.len() >= count, "blp: palette mip shorter than index stream");
    let alpha = &bytes[count..];

    let mut out = Vec::with_capacity(count * 4);
    for (i, &idx) in bytes[..count].iter().enumerate() {
        let [b, g, r, _] = pal[idx as usize];
        let a = alpha_at(alpha, i, alpha_depth)?;
        out.extend_from_slice(&[r, g, b, a]);
    }
    Ok(out)
}

fn alpha_at(alpha: &[u8], i: usize, depth: u32) -> Result<u8> {
    Ok(match depth {
        0 => 0xFF,
        1 => {
            let byte = *alpha.get(i / 8).unwrap_or(&0);
            if byte >> (i % 8) & 1 != 0 { 0xFF } else { 0x00 }
        }
        4 => {
            let byte = *alpha.get(i / 2).unwrap_or(&0);
            let nibble = byte >> ((i % 2) * 4) & 0x0F;
            nibble * 0x11
        }
        8 => *alpha.get(i).unwrap_or(&0xFF),
        other => bail!("blp: unsupported alpha depth {}", other),
    })
}
