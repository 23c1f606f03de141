//! Builder for synthetic UKSoft byte streams.
//!
//! Emits the same layout the reader expects: 20-byte signature, fixed file
//! block, optional 128-byte recipe slot, image block, a 256-byte metadata
//! block (fields + 0xFF sentinel + zero padding), then the pixel block with
//! rows bottom-up as U-View writes them.

/// FILETIME ticks for 2016-01-01 00:00:00 UTC.
pub const TEST_FILETIME: u64 = 130_960_800_000_000_000;

pub struct FileBuilder {
    width: usize,
    height: usize,
    signature: [u8; 20],
    recipe: Vec<u8>,
    fields: Vec<u8>,
    samples: Vec<u16>,
}

impl FileBuilder {
    pub fn new(width: usize, height: usize) -> Self {
        let mut signature = [0u8; 20];
        signature[..10].copy_from_slice(b"UKSOFT2001");
        Self {
            width,
            height,
            signature,
            recipe: Vec::new(),
            fields: Vec::new(),
            samples: vec![0; width * height],
        }
    }

    /// Replace the leading signature bytes (corruption tests).
    pub fn signature(mut self, bytes: &[u8]) -> Self {
        let n = bytes.len().min(20);
        self.signature[..n].copy_from_slice(&bytes[..n]);
        self
    }

    /// Attach an acquisition recipe (at most 128 bytes).
    pub fn recipe(mut self, bytes: &[u8]) -> Self {
        assert!(bytes.len() <= 128, "recipe slot is 128 bytes");
        self.recipe = bytes.to_vec();
        self
    }

    /// Pixel samples in row-major order, top scan line first.
    pub fn samples(mut self, samples: &[u16]) -> Self {
        assert_eq!(samples.len(), self.width * self.height);
        self.samples = samples.to_vec();
        self
    }

    /// Standard channel field: `tag, name, unit digit, 0x00, f32`.
    pub fn standard_field(mut self, tag: u8, name: &str, unit_digit: u8, value: f32) -> Self {
        self.fields.push(tag);
        self.fields.extend_from_slice(name.as_bytes());
        self.fields.push(unit_digit);
        self.fields.push(0);
        self.fields.extend_from_slice(&value.to_le_bytes());
        self
    }

    /// Image title field (tag 233).
    pub fn title(mut self, title: &str) -> Self {
        self.fields.push(233);
        self.fields.extend_from_slice(title.as_bytes());
        self.fields.push(0);
        self
    }

    /// Field-of-view field (tag 110).
    pub fn fov(mut self, fov_str: &str, cal_factor: f32) -> Self {
        self.fields.push(110);
        self.fields.extend_from_slice(fov_str.as_bytes());
        self.fields.push(0);
        self.fields.extend_from_slice(&cal_factor.to_le_bytes());
        self
    }

    /// Camera exposure field (tag 104).
    pub fn exposure(mut self, seconds: f32, averaging: u8) -> Self {
        self.fields.push(104);
        self.fields.extend_from_slice(&seconds.to_le_bytes());
        self.fields.push(averaging);
        self.fields.push(0);
        self
    }

    /// Varian pressure-gauge field.
    pub fn varian(mut self, tag: u8, name: &str, unit: &str, value: f32) -> Self {
        self.fields.push(tag);
        self.fields.extend_from_slice(name.as_bytes());
        self.fields.push(0);
        self.fields.extend_from_slice(unit.as_bytes());
        self.fields.push(0);
        self.fields.extend_from_slice(&value.to_le_bytes());
        self
    }

    /// Append arbitrary field bytes verbatim.
    pub fn raw_field_bytes(mut self, bytes: &[u8]) -> Self {
        self.fields.extend_from_slice(bytes);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        let push_i16 = |out: &mut Vec<u8>, v: i16| out.extend_from_slice(&v.to_le_bytes());

        out.extend_from_slice(&self.signature);
        push_i16(&mut out, 104); // declared header size
        push_i16(&mut out, 7); // format version
        push_i16(&mut out, 16); // bits per pixel
        out.extend_from_slice(&[0; 6]); // alignment
        out.extend_from_slice(&[0; 8]); // spare
        push_i16(&mut out, self.width as i16);
        push_i16(&mut out, self.height as i16);
        push_i16(&mut out, 1); // image count
        push_i16(&mut out, self.recipe.len() as i16);
        out.extend_from_slice(&[0; 56]); // spare
        if !self.recipe.is_empty() {
            out.extend_from_slice(&self.recipe);
            out.extend(std::iter::repeat(0u8).take(128 - self.recipe.len()));
        }

        push_i16(&mut out, 288); // image block size
        push_i16(&mut out, 7); // image block version
        push_i16(&mut out, 0); // colorscale low
        push_i16(&mut out, 0); // colorscale high
        out.extend_from_slice(&TEST_FILETIME.to_le_bytes());
        push_i16(&mut out, 0); // mask x shift
        push_i16(&mut out, 0); // mask y shift
        out.push(0); // use mask
        out.push(0); // spare
        push_i16(&mut out, 0); // markup size
        push_i16(&mut out, 0); // spin
        push_i16(&mut out, 2); // leem-data version: fixed 256-byte block

        assert!(self.fields.len() < 256, "metadata block overflow");
        let meta_start = out.len();
        out.extend_from_slice(&self.fields);
        out.push(0xFF);
        out.resize(meta_start + 256, 0);

        // Pixel rows are written bottom-up.
        for y in (0..self.height).rev() {
            for x in 0..self.width {
                out.extend_from_slice(&self.samples[y * self.width + x].to_le_bytes());
            }
        }
        out
    }
}
