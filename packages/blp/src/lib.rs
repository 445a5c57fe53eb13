//! Decoder for the BLP texture container.
//!
//! Both container revisions are handled: `BLP1` (word-sized header fields,
//! palette compression only) and `BLP2` (palette, DXT1/3/5, and raw
//! B8G8R8A8). Output is always RGBA8, mip 0 first, even though the on-disk
//! color order is BGR. A format/feature combination this decoder does not
//! recognize is an error rather than a silent mis-decode.

#[macro_use]
extern crate tracing;

mod dxt;
mod palette;

use anyhow::{Result, bail, ensure};


/// Number of mip slots in a BLP header.
const MIP_SLOTS: usize = 16;

/// A decoded texture: RGBA8 pixel data for each mip level.
#[derive(Debug, Clone)]
pub struct BlpImage {
    pub width: u32,
    pub height: u32,
    /// Mip chain, largest first. Never empty; `mips[0]` is `width` by
    /// `height`.
    pub mips: Vec<Vec<u8>>,
}

impl BlpImage {
    /// RGBA8 bytes of the full-resolution image.
    pub fn pixels(&self) -> &[u8] {
        &self.mips[0]
    }

    pub fn mip_count(&self) -> u32 {
        self.mips.len() as u32
    }
}

/// Decode a BLP byte buffer of either revision.
pub fn decode(data: &[u8]) -> Result<BlpImage> {
    ensure!(data.len() >= 4, "blp: buffer shorter than magic");
    match &data[0..4] {
        b"BLP1" => decode_blp1(data),
        b"BLP2" => decode_blp2(data),
        magic => bail!("blp: bad magic {:?}", magic),
    }
}

fn read_u32(data: &[u8], at: usize) -> Result<u32> {
    ensure!(at + 4 <= data.len(), "blp: truncated header");
    Ok(u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]]))
}

/// Mip offset/size tables, common to both revisions.
fn read_mip_tables(data: &[u8], at: usize) -> Result<([u32; MIP_SLOTS], [u32; MIP_SLOTS])> {
    let mut offsets = [0u32; MIP_SLOTS];
    let mut sizes = [0u32; MIP_SLOTS];
    for i in 0..MIP_SLOTS {
        offsets[i] = read_u32(data, at + i * 4)?;
        sizes[i] = read_u32(data, at + (MIP_SLOTS + i) * 4)?;
    }
    Ok((offsets, sizes))
}

fn mip_data<'a>(data: &'a [u8], offset: u32, size: u32) -> Result<&'a [u8]> {
    let start = offset as usize;
    let end = start + size as usize;
    ensure!(end <= data.len() && start <= end, "blp: mip range out of bounds");
    Ok(&data[start..end])
}

fn decode_blp1(data: &[u8]) -> Result<BlpImage> {
    // BLP1 header is word-wide throughout: magic, compression, alpha bits,
    // width, height, picture type, picture subtype.
    let compression = read_u32(data, 4)?;
    let alpha_depth = read_u32(data, 8)?;
    let width = read_u32(data, 12)?;
    let height = read_u32(data, 16)?;
    ensure!(width > 0 && height > 0, "blp1: zero-sized image");

    if compression == 0 {
        warn!("blp1: jpeg-compressed variant not supported");
        bail!("blp1: jpeg compression");
    }
    ensure!(compression == 1, "blp1: unknown compression {}", compression);
    ensure!(
        matches!(alpha_depth, 0 | 1 | 4 | 8),
        "blp1: unsupported alpha depth {}", alpha_depth,
    );

    let (offsets, sizes) = read_mip_tables(data, 28)?;
    let pal = palette::read_palette(data, 28 + MIP_SLOTS * 8)?;

    decode_mips(width, height, &offsets, &sizes, |mip, w, h| {
        let bytes = mip_data(data, offsets[mip], sizes[mip])?;
        palette::decode(bytes, &pal, w, h, alpha_depth)
    })
}

fn decode_blp2(data: &[u8]) -> Result<BlpImage> {
    let version = read_u32(data, 4)?;
    ensure!(version == 1, "blp2: unknown version {}", version);
    ensure!(data.len() >= 20, "blp2: truncated header");
    let compression = data[8];
    let alpha_depth = data[9];
    let alpha_encoding = data[10];
    let width = read_u32(data, 12)?;
    let height = read_u32(data, 16)?;
    ensure!(width > 0 && height > 0, "blp2: zero-sized image");

    let (offsets, sizes) = read_mip_tables(data, 20)?;
    let pal_at = 20 + MIP_SLOTS * 8;

    match compression {
        // palette
        1 => {
            ensure!(
                matches!(alpha_depth, 0 | 1 | 4 | 8),
                "blp2: unsupported palette alpha depth {}", alpha_depth,
            );
            let pal = palette::read_palette(data, pal_at)?;
            decode_mips(width, height, &offsets, &sizes, |mip, w, h| {
                let bytes = mip_data(data, offsets[mip], sizes[mip])?;
                palette::decode(bytes, &pal, w, h, alpha_depth as u32)
            })
        }
        // dxt-compressed
        2 => {
            let format = match (alpha_depth, alpha_encoding) {
                (0, 0) | (1, 0) => dxt::Format::Dxt1,
                (_, 1) => dxt::Format::Dxt3,
                (_, 7) => dxt::Format::Dxt5,
                other => bail!("blp2: unknown dxt variant {:?}", other),
            };
            decode_mips(width, height, &offsets, &sizes, |mip, w, h| {
                let bytes = mip_data(data, offsets[mip], sizes[mip])?;
                dxt::decode(bytes, w, h, format)
            })
        }
        // raw B8G8R8A8
        3 => decode_mips(width, height, &offsets, &sizes, |mip, w, h| {
            let bytes = mip_data(data, offsets[mip], sizes[mip])?;
            let count = w as usize * h as usize;
            ensure!(bytes.len() >= count * 4, "blp2: raw mip too short");
            let mut out = Vec::with_capacity(count * 4);
            for px in bytes[..count * 4].chunks_exact(4) {
                out.extend_from_slice(&[px[2], px[1], px[0], px[3]]);
            }
            Ok(out)
        }),
        other => bail!("blp2: unknown compression {}", other),
    }
}

/// Walk the mip chain, halving dimensions per level, stopping at the first
/// empty slot. Mip 0 must decode; deeper levels that fail are dropped with
/// a warning so a damaged tail does not lose the whole texture.
fn decode_mips<F>(
    width: u32,
    height: u32,
    offsets: &[u32; MIP_SLOTS],
    sizes: &[u32; MIP_SLOTS],
    mut decode_one: F,
) -> Result<BlpImage>
where
    F: FnMut(usize, u32, u32) -> Result<Vec<u8>>,
{
    let mut mips = Vec::new();
    let (mut w, mut h) = (width, height);
    for mip in 0..MIP_SLOTS {
        if offsets[mip] == 0 || sizes[mip] == 0 {
            break;
        }
        match decode_one(mip, w, h) {
            Ok(pixels) => mips.push(pixels),
            Err(e) => {
                if mip == 0 {
                    return Err(e);
                }
                warn!(%e, mip, "blp: dropping undecodable mip tail");
                break;
            }
        }
        if w == 1 && h == 1 {
            break;
        }
        w = (w / 2).max(1);
        h = (h / 2).max(1);
    }
    ensure!(!mips.is_empty(), "blp: no mip data");
    Ok(BlpImage { width, height, mips })
}


#[cfg(test)]
mod tests {
    use super::*;

    /// Assemble a minimal BLP2 container around one mip payload.
    fn blp2(
        compression: u8,
        alpha_depth: u8,
        alpha_encoding: u8,
        w: u32,
        h: u32,
        palette: Option<&[u8]>,
        payload: &[u8],
    ) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"BLP2");
        buf.extend_from_slice(&1u32.to_le_bytes());
        buf.extend_from_slice(&[compression, alpha_depth, alpha_encoding, 0]);
        buf.extend_from_slice(&w.to_le_bytes());
        buf.extend_from_slice(&h.to_le_bytes());
        let data_at = 20 + 16 * 8 + 1024;
        for i in 0..16u32 {
            buf.extend_from_slice(&if i == 0 { data_at as u32 } else { 0 }.to_le_bytes());
        }
        for i in 0..16u32 {
            buf.extend_from_slice(&if i == 0 { payload.len() as u32 } else { 0 }.to_le_bytes());
        }
        match palette {
            Some(pal) => buf.extend_from_slice(pal),
            None => buf.extend_from_slice(&[0; 1024]),
        }
        buf.extend_from_slice(payload);
        buf
    }

    #[test]
    fn rejects_bad_magic() {
        assert!(decode(b"BLP0____________").is_err());
        assert!(decode(b"").is_err());
    }

    #[test]
    fn raw_bgra_pixel_swaps_to_rgba() {
        let data = blp2(3, 8, 0, 1, 1, None, &[0x10, 0x20, 0x30, 0xFF]);
        let img = decode(&data).unwrap();
        assert_eq!(img.width, 1);
        assert_eq!(img.height, 1);
        assert_eq!(img.pixels(), &[0x30, 0x20, 0x10, 0xFF]);
    }

    #[test]
    fn palette_with_4bit_alpha() {
        // entry 0 = pure red in BGR order, entry 1 = pure blue
        let mut pal = vec![0u8; 1024];
        pal[0..4].copy_from_slice(&[0x00, 0x00, 0xFF, 0x00]);
        pal[4..8].copy_from_slice(&[0xFF, 0x00, 0x00, 0x00]);
        // 2x1 image: indices [0, 1], then packed 4-bit alpha 0xF, 0x0
        let payload = [0u8, 1, 0x0F];
        let data = blp2(1, 4, 0, 2, 1, Some(&pal), &payload);
        let img = decode(&data).unwrap();
        assert_eq!(img.pixels(), &[0xFF, 0, 0, 0xFF, 0, 0, 0xFF, 0x00]);
    }

    #[test]
    fn palette_opaque_when_no_alpha_depth() {
        let mut pal = vec![0u8; 1024];
        pal[0..4].copy_from_slice(&[0x20, 0x40, 0x60, 0x00]);
        let data = blp2(1, 0, 0, 1, 1, Some(&pal), &[0u8]);
        let img = decode(&data).unwrap();
        assert_eq!(img.pixels(), &[0x60, 0x40, 0x20, 0xFF]);
    }

    #[test]
    fn dxt5_solid_block() {
        // alpha0=0xFF alpha1=0x00, all alpha indices 0 -> alpha 0xFF.
        // c0 = white in rgb565, c1 = 0, all color indices 0 -> white.
        let mut payload = Vec::new();
        payload.extend_from_slice(&[0xFF, 0x00, 0, 0, 0, 0, 0, 0]);
        payload.extend_from_slice(&0xFFFFu16.to_le_bytes());
        payload.extend_from_slice(&0u16.to_le_bytes());
        payload.extend_from_slice(&[0, 0, 0, 0]);
        let data = blp2(2, 8, 7, 4, 4, None, &payload);
        let img = decode(&data).unwrap();
        assert_eq!(img.pixels().len(), 4 * 4 * 4);
        for px in img.pixels().chunks_exact(4) {
            assert_eq!(px, &[0xFF, 0xFF, 0xFF, 0xFF]);
        }
    }

    #[test]
    fn dxt1_one_bit_transparency() {
        // c0 <= c1 selects the 3-color + transparent mode; index 3 is the
        // transparent black texel.
        let mut payload = Vec::new();
        payload.extend_from_slice(&0u16.to_le_bytes());
        payload.extend_from_slice(&0xFFFFu16.to_le_bytes());
        payload.extend_from_slice(&[0xFF, 0xFF, 0xFF, 0xFF]);
        let data = blp2(2, 1, 0, 4, 4, None, &payload);
        let img = decode(&data).unwrap();
        for px in img.pixels().chunks_exact(4) {
            assert_eq!(px[3], 0);
        }
    }

    #[test]
    fn blp1_jpeg_variant_rejected() {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"BLP1");
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&[0; 8]);
        buf.extend_from_slice(&[0; 16 * 8]);
        assert!(decode(&buf).is_err());
    }
}
