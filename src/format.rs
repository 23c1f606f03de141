//! UKSoft binary format reader.
//!
//! Purpose
//! - Decode a single Elmitec U-View image file into a [`LeemImage`]:
//!   fixed headers, tagged metadata records, and the 16-bit pixel block.
//!
//! Design
//! - The file is read whole and parsed from a byte slice; the handle is
//!   closed before any decoding starts, and every failure path reports a
//!   typed [`crate::Error`].
//! - Structural violations (bad signature, missing pixel bytes) abort the
//!   parse. Malformed or unknown metadata records do not: firmware
//!   revisions vary their schemas, so the metadata scan keeps whatever
//!   decoded cleanly (see [`crate::metadata::MetaValue::Raw`]).
//! - Pixels are located from the end of the file, as U-View writes them;
//!   markup/overlay data between header and pixels is skipped.
mod fields;
mod header;
mod raw;

pub use header::{FileHeader, SIGNATURE};

use byteorder::{ByteOrder, LittleEndian};
use log::debug;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::image::ImageF32;
use crate::metadata::Metadata;
use crate::types::LeemImage;

/// Fixed metadata block size used when the LEEM-data version is 2.
const FIXED_META_BLOCK: usize = 256;
/// Gap preceding the variable-length metadata block of newer files.
const EXTENDED_META_GAP: usize = 388;

/// Read and decode a UKSoft file.
///
/// The file handle is released before this returns, on success and on
/// failure alike.
pub fn load(path: impl AsRef<Path>) -> Result<LeemImage> {
    let path = path.as_ref();
    let buf = fs::read(path)?;
    debug!("read {} ({} bytes)", path.display(), buf.len());
    parse(&buf)
}

/// Decode a UKSoft file already resident in memory.
pub fn parse(buf: &[u8]) -> Result<LeemImage> {
    let mut rd = raw::Reader::new(buf);
    let header = header::parse(&mut rd)?;
    debug!(
        "{} v{}: {}x{} at {} bits/pixel",
        header.id, header.version, header.width, header.height, header.bits_per_pixel
    );

    let meta_block = if header.leem_data_version == 2 {
        rd.take_at_most(FIXED_META_BLOCK)
    } else {
        rd.skip_at_most(EXTENDED_META_GAP);
        rd.take_at_most(header.leem_data_version.max(0) as usize)
    };
    let mut metadata = Metadata::new();
    fields::decode(meta_block, &mut metadata);
    debug!("decoded {} metadata records", metadata.len());

    let need = header.pixel_bytes();
    if rd.remaining() < need {
        return Err(Error::Truncated {
            needed: rd.pos() + need,
            available: buf.len(),
        });
    }
    let pixel_bytes = &buf[buf.len() - need..];
    let mut samples = vec![0u16; header.width * header.height];
    LittleEndian::read_u16_into(pixel_bytes, &mut samples);

    // Rows are stored bottom-up on disk; flip so row 0 is the top scan line.
    let mut data = ImageF32::new(header.width, header.height);
    for y in 0..header.height {
        let src = (header.height - 1 - y) * header.width;
        for x in 0..header.width {
            data.set(x, y, f32::from(samples[src + x]));
        }
    }

    Ok(LeemImage {
        header,
        metadata,
        data,
    })
}
