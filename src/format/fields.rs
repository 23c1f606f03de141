//! Tagged metadata fields from the image header block.
//!
//! The block is a byte stream of `(tag, payload)` records terminated by a
//! 0xFF sentinel or the end of the block. Most instrument channels use the
//! standard layout `name bytes, unit digit, 0x00, f32 value`; a handful of
//! tags have bespoke payloads (field of view, camera exposure, pressure
//! gauges, stage positions, titles). Unknown tags are consumed with the
//! standard-layout fallback and recorded verbatim instead of aborting the
//! parse: firmware revisions vary their metadata schemas freely.
use byteorder::{ByteOrder, LittleEndian};
use log::{debug, warn};

use super::raw::decode_text;
use crate::metadata::{MetaValue, Metadata};

/// End-of-metadata sentinel.
const END_TAG: u8 = 0xFF;

/// Unit table indexed by the ASCII digit trailing a standard field name.
const UNITS: [&str; 10] = ["", "V", "mA", "A", "°C", " K", "mV", "pA", "nA", "µA"];

/// Standard-layout instrument channels known from Bremen, Lund (MaxLAB III)
/// and ALBA installations.
const fn is_standard_tag(tag: u8) -> bool {
    matches!(
        tag,
        11 | 38 | 39 | 44 | 55 | 94
            | 128..=138
            | 140..=165
            | 168..=192
            | 194..=215
            | 220
            | 221
    )
}

/// Decode every field in `block` into `meta`. Never fails: a malformed
/// record ends the scan, keeping whatever decoded cleanly before it.
pub(crate) fn decode(block: &[u8], meta: &mut Metadata) {
    let mut pos = 0usize;
    while pos < block.len() {
        let tag = block[pos];
        if tag == END_TAG {
            break;
        }
        pos += 1;
        let rest = &block[pos..];
        let consumed = match tag {
            t if is_standard_tag(t) => standard_field(rest, meta),
            110 => field_of_view(rest, meta),
            104 => camera_exposure(rest, meta),
            106..=109 | 235..=237 => varian_gauge(rest, meta),
            100 => mitutoyo(rest, meta),
            233 => image_title(rest, meta),
            240 => mirror_state(rest, meta, "MirrorState1"),
            242 => mirror_state(rest, meta, "MirrorState2"),
            243 => mcp_voltage(rest, meta, "MCPscreen"),
            244 => mcp_voltage(rest, meta, "MCPchannelplate"),
            other => unknown_field(rest, meta, other),
        };
        match consumed {
            Some(n) => pos += n,
            None => {
                warn!("malformed metadata field (tag {tag}) at offset {pos}; stopping scan");
                break;
            }
        }
    }
}

/// Bytes before the first 0x00, or `None` when the terminator is missing.
fn null_terminated(rest: &[u8]) -> Option<&[u8]> {
    rest.split(|&b| b == 0).next().filter(|seg| seg.len() < rest.len())
}

fn read_f32_at(rest: &[u8], off: usize) -> Option<f32> {
    rest.get(off..off + 4).map(LittleEndian::read_f32)
}

/// `name bytes, unit digit, 0x00, f32` — the common channel layout.
fn standard_field(rest: &[u8], meta: &mut Metadata) -> Option<usize> {
    let seg = null_terminated(rest)?;
    let (name_bytes, unit_digit) = seg.split_at(seg.len().checked_sub(1)?);
    let unit_idx = (unit_digit[0] as char).to_digit(10)? as usize;
    let unit = UNITS.get(unit_idx)?;
    let value = read_f32_at(rest, seg.len() + 1)?;
    let name = decode_text(name_bytes);
    debug!("field {name}: {value} {unit}");
    meta.insert(
        name,
        MetaValue::Quantity {
            value,
            unit: (*unit).to_string(),
        },
    );
    Some(seg.len() + 5)
}

/// Tag 110: null-terminated FOV string followed by an f32 calibration
/// factor. A string starting with `LEED` marks a diffraction image.
fn field_of_view(rest: &[u8], meta: &mut Metadata) -> Option<usize> {
    let seg = null_terminated(rest)?;
    let fov_str = decode_text(seg);
    let cal = read_f32_at(rest, seg.len() + 1)?;
    meta.insert("FOV cal. factor".into(), MetaValue::Float(cal));

    if fov_str.starts_with("LEED") {
        debug!("field of view: LEED");
        meta.insert("LEED".into(), MetaValue::Int(1));
    } else if fov_str.starts_with("none") {
        debug!("field of view: none");
    } else {
        meta.insert("LEED".into(), MetaValue::Int(0));
        // Real-space FOV strings look like "10.0µm" (sometimes with a
        // trailing marker); take the numeric prefix before the µ sign.
        match fov_str.split('µ').next().and_then(|s| s.trim().parse::<f32>().ok()) {
            Some(value) => {
                debug!("field of view: {value} µm");
                meta.insert(
                    "FOV".into(),
                    MetaValue::Quantity {
                        value,
                        unit: "µm".into(),
                    },
                );
            }
            None => {
                warn!("unrecognized FOV string {fov_str:?}");
                meta.insert("FOV".into(), MetaValue::Text(fov_str));
            }
        }
    }
    Some(seg.len() + 5)
}

/// Tag 104: f32 exposure in seconds plus an averaging count byte
/// (0 = none, 255 = sliding average).
fn camera_exposure(rest: &[u8], meta: &mut Metadata) -> Option<usize> {
    let value = read_f32_at(rest, 0)?;
    let avg = *rest.get(4)?;
    debug!("camera exposure: {value} s, averaging {avg}");
    meta.insert(
        "Camera Exposure".into(),
        MetaValue::Quantity {
            value,
            unit: "s".into(),
        },
    );
    meta.insert("Average Images".into(), MetaValue::Int(i64::from(avg)));
    Some(6)
}

/// Varian pressure gauges: two null-terminated strings (name, unit) and an
/// f32 reading.
fn varian_gauge(rest: &[u8], meta: &mut Metadata) -> Option<usize> {
    let name_seg = null_terminated(rest)?;
    let unit_seg = null_terminated(&rest[name_seg.len() + 1..])?;
    let value = read_f32_at(rest, name_seg.len() + unit_seg.len() + 2)?;
    let name = decode_text(name_seg);
    let unit = decode_text(unit_seg);
    debug!("gauge {name}: {value} {unit}");
    meta.insert(name, MetaValue::Quantity { value, unit });
    Some(name_seg.len() + unit_seg.len() + 6)
}

/// Tag 100: two f32 Mitutoyo stage positions in mm.
fn mitutoyo(rest: &[u8], meta: &mut Metadata) -> Option<usize> {
    let x = read_f32_at(rest, 0)?;
    let y = read_f32_at(rest, 4)?;
    debug!("stage position: x={x} mm, y={y} mm");
    for (key, value) in [("Mitutoyo X", x), ("Mitutoyo Y", y)] {
        meta.insert(
            key.into(),
            MetaValue::Quantity {
                value,
                unit: "mm".into(),
            },
        );
    }
    Some(8)
}

/// Tag 233: null-terminated title string.
fn image_title(rest: &[u8], meta: &mut Metadata) -> Option<usize> {
    let seg = null_terminated(rest)?;
    let title = decode_text(seg);
    debug!("image title: {title:?}");
    meta.insert("Image Title".into(), MetaValue::Text(title));
    Some(seg.len() + 1)
}

/// Tags 240/242: single state byte followed by a null.
fn mirror_state(rest: &[u8], meta: &mut Metadata, key: &str) -> Option<usize> {
    let state = *rest.first()?;
    meta.insert(key.into(), MetaValue::Int(i64::from(state)));
    Some(2)
}

/// Tags 243/244: bare f32 voltage.
fn mcp_voltage(rest: &[u8], meta: &mut Metadata, key: &str) -> Option<usize> {
    let value = read_f32_at(rest, 0)?;
    meta.insert(
        key.into(),
        MetaValue::Quantity {
            value,
            unit: "V".into(),
        },
    );
    Some(4)
}

/// Unknown tag: consume per the standard-layout fallback and keep the bytes
/// under a `tag <n>` key so nothing is silently dropped.
fn unknown_field(rest: &[u8], meta: &mut Metadata, tag: u8) -> Option<usize> {
    let seg = null_terminated(rest)?;
    let consumed = (seg.len() + 5).min(rest.len());
    warn!("unknown metadata tag {tag}; keeping {consumed} raw bytes");
    meta.insert(
        format!("tag {tag}"),
        MetaValue::Raw(rest[..consumed].to_vec()),
    );
    Some(consumed)
}

#[cfg(test)]
mod tests {
    use super::decode;
    use crate::metadata::{MetaValue, Metadata};

    fn standard(tag: u8, name: &str, unit_digit: u8, value: f32) -> Vec<u8> {
        let mut out = vec![tag];
        out.extend_from_slice(name.as_bytes());
        out.push(unit_digit);
        out.push(0);
        out.extend_from_slice(&value.to_le_bytes());
        out
    }

    #[test]
    fn standard_field_decodes_value_and_unit() {
        let mut block = standard(38, "Start Voltage", b'1', 4.25);
        block.push(0xFF);
        let mut meta = Metadata::new();
        decode(&block, &mut meta);
        assert_eq!(
            meta["Start Voltage"],
            MetaValue::Quantity {
                value: 4.25,
                unit: "V".into()
            }
        );
    }

    #[test]
    fn scan_stops_at_sentinel() {
        let mut block = standard(39, "Temperature", b'4', 300.5);
        block.push(0xFF);
        // Garbage past the sentinel must be ignored.
        block.extend_from_slice(&[1, 2, 3, 4, 5]);
        let mut meta = Metadata::new();
        decode(&block, &mut meta);
        assert_eq!(meta.len(), 1);
        assert_eq!(meta["Temperature"].as_f32(), Some(300.5));
    }

    #[test]
    fn unknown_tag_is_kept_raw_and_scan_continues() {
        let mut block = standard(57, "Mystery", b'0', 1.0); // 57 is not a known tag
        block.extend_from_slice(&standard(44, "Objective", b'2', 2.5));
        block.push(0xFF);
        let mut meta = Metadata::new();
        decode(&block, &mut meta);
        assert!(matches!(meta["tag 57"], MetaValue::Raw(_)));
        assert_eq!(meta["Objective"].as_f32(), Some(2.5));
    }

    #[test]
    fn camera_exposure_and_title() {
        let mut block = vec![104];
        block.extend_from_slice(&0.25f32.to_le_bytes());
        block.push(3); // averaging count
        block.push(0);
        block.push(233);
        block.extend_from_slice(b"Si(111) growth\0");
        block.push(0xFF);
        let mut meta = Metadata::new();
        decode(&block, &mut meta);
        assert_eq!(meta["Camera Exposure"].as_f32(), Some(0.25));
        assert_eq!(meta["Average Images"].as_i64(), Some(3));
        assert_eq!(meta["Image Title"].as_str(), Some("Si(111) growth"));
    }

    #[test]
    fn varian_gauge_field() {
        let mut block = vec![106];
        block.extend_from_slice(b"Main chamber\0");
        block.extend_from_slice(b"mBar\0");
        block.extend_from_slice(&2.5e-10f32.to_le_bytes());
        block.push(0xFF);
        let mut meta = Metadata::new();
        decode(&block, &mut meta);
        assert_eq!(
            meta["Main chamber"],
            MetaValue::Quantity {
                value: 2.5e-10,
                unit: "mBar".into()
            }
        );
    }

    #[test]
    fn leed_fov_sets_flag() {
        let mut block = vec![110];
        block.extend_from_slice(b"LEED\0");
        block.extend_from_slice(&1.5f32.to_le_bytes());
        block.push(0xFF);
        let mut meta = Metadata::new();
        decode(&block, &mut meta);
        assert_eq!(meta["LEED"].as_i64(), Some(1));
        assert_eq!(meta["FOV cal. factor"].as_f32(), Some(1.5));
    }

    #[test]
    fn real_space_fov_parses_micrometers() {
        let mut block = vec![110];
        // cp1252 µ is a single 0xB5 byte on disk.
        block.extend_from_slice(b"10.0\xb5m\0");
        block.extend_from_slice(&0.9f32.to_le_bytes());
        block.push(0xFF);
        let mut meta = Metadata::new();
        decode(&block, &mut meta);
        assert_eq!(meta["LEED"].as_i64(), Some(0));
        assert_eq!(
            meta["FOV"],
            MetaValue::Quantity {
                value: 10.0,
                unit: "µm".into()
            }
        );
    }

    #[test]
    fn truncated_record_keeps_earlier_fields() {
        let mut block = standard(39, "Temperature", b'4', 300.5);
        block.push(38); // tag with no terminator behind it
        block.extend_from_slice(b"Start Vol");
        let mut meta = Metadata::new();
        decode(&block, &mut meta);
        assert_eq!(meta.len(), 1);
        assert!(meta.contains_key("Temperature"));
    }
}
