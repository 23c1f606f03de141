//! Fixed header blocks of a UKSoft file.
//!
//! Layout (all integers little-endian):
//! - 20-byte null-padded id string starting with `UKSOFT`;
//! - file block: total size, format version, bits per pixel, 6 alignment +
//!   8 spare bytes, width, height, image count, attached recipe size,
//!   56 spare bytes, then an optional recipe in a 128-byte slot;
//! - image block: size, version, colorscale low/high, a Windows FILETIME
//!   timestamp, mask shifts, use-mask flag, markup size, spin, and the
//!   LEEM-data version that selects the metadata block layout.
use chrono::{DateTime, Utc};

use super::raw::{decode_text, Reader};
use crate::error::{Error, Result};

/// Leading bytes of the 20-byte id string every UKSoft file starts with.
pub const SIGNATURE: &[u8; 6] = b"UKSOFT";

/// Seconds between 1601-01-01 (FILETIME epoch) and 1970-01-01.
const FILETIME_UNIX_OFFSET_SECS: i64 = 11_644_473_600;

/// Parsed fixed headers (file block + first image block).
#[derive(Clone, Debug)]
pub struct FileHeader {
    /// Null-stripped id string, e.g. `UKSOFT2001`.
    pub id: String,
    /// Declared total header size in bytes.
    pub total_size: i16,
    /// File format version.
    pub version: i16,
    /// Sample width; Elmitec cameras write 16.
    pub bits_per_pixel: i16,
    /// Image width in pixels.
    pub width: usize,
    /// Image height in pixels.
    pub height: usize,
    /// Number of images in the file (always 1 for single-image files).
    pub image_count: i16,
    /// Attached acquisition recipe, when the file carries one.
    pub recipe: Option<Vec<u8>>,
    /// Declared image-block size and version.
    pub image_block: (i16, i16),
    /// Display colorscale hint (low, high) stored by U-View.
    pub colorscale: (i16, i16),
    /// Acquisition time, converted from the Windows FILETIME field.
    pub timestamp: DateTime<Utc>,
    /// Mask shift (x, y) and whether the mask applies.
    pub mask_shift: (i16, i16),
    pub use_mask: bool,
    /// Size of attached markup/overlay data (skipped on load).
    pub markup_size: i16,
    pub spin: i16,
    /// Metadata block selector: 2 means the fixed 256-byte block, any other
    /// value is the block length after a 388-byte gap.
    pub leem_data_version: i16,
}

impl FileHeader {
    /// Number of bytes the pixel block must hold.
    pub fn pixel_bytes(&self) -> usize {
        2 * self.width * self.height
    }
}

pub(crate) fn parse(rd: &mut Reader<'_>) -> Result<FileHeader> {
    let id_bytes = rd.take(20)?;
    if !id_bytes.starts_with(SIGNATURE) {
        return Err(Error::BadSignature);
    }
    let id = decode_text(id_bytes.split(|&b| b == 0).next().unwrap_or(id_bytes));

    let total_size = rd.read_i16()?;
    let version = rd.read_i16()?;
    let bits_per_pixel = rd.read_i16()?;
    rd.skip(6)?; // alignment
    rd.skip(8)?; // spare
    let width = rd.read_i16()?.max(0) as usize;
    let height = rd.read_i16()?.max(0) as usize;
    let image_count = rd.read_i16()?;
    let recipe_size = rd.read_i16()?.max(0) as usize;
    rd.skip(56)?; // spare

    // The recipe occupies a fixed 128-byte slot when present.
    let recipe = if recipe_size > 0 {
        let bytes = rd.take(recipe_size.min(128))?.to_vec();
        rd.skip(128usize.saturating_sub(recipe_size))?;
        Some(bytes)
    } else {
        None
    };

    let image_block = (rd.read_i16()?, rd.read_i16()?);
    let colorscale = (rd.read_i16()?, rd.read_i16()?);
    let timestamp = filetime_to_utc(rd.read_u64()?);
    let mask_shift = (rd.read_i16()?, rd.read_i16()?);
    let use_mask = rd.read_u8()? != 0;
    rd.skip(1)?; // spare
    let markup_size = rd.read_i16()?;
    let spin = rd.read_i16()?;
    let leem_data_version = rd.read_i16()?;

    Ok(FileHeader {
        id,
        total_size,
        version,
        bits_per_pixel,
        width,
        height,
        image_count,
        recipe,
        image_block,
        colorscale,
        timestamp,
        mask_shift,
        use_mask,
        markup_size,
        spin,
        leem_data_version,
    })
}

/// Convert a Windows FILETIME (100 ns ticks since 1601) to UTC.
fn filetime_to_utc(raw: u64) -> DateTime<Utc> {
    let secs = (raw / 10_000_000) as i64 - FILETIME_UNIX_OFFSET_SECS;
    let nanos = ((raw % 10_000_000) * 100) as u32;
    DateTime::from_timestamp(secs, nanos).unwrap_or(DateTime::UNIX_EPOCH)
}
