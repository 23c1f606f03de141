//! The loaded image object.
use crate::error::Result;
use crate::format::FileHeader;
use crate::image::ImageF32;
use crate::metadata::Metadata;
use crate::ops::{self, InelasticFilter, Levels};

/// One decoded UKSoft image: headers, metadata records, and pixel grid.
///
/// Constructed by [`crate::format::load`]; holds no file handle. The object
/// is immutable — every operation returns a fresh grid.
#[derive(Clone, Debug)]
pub struct LeemImage {
    pub header: FileHeader,
    pub metadata: Metadata,
    pub data: ImageF32,
}

impl LeemImage {
    /// Image width in pixels.
    pub fn width(&self) -> usize {
        self.data.w
    }

    /// Image height in pixels.
    pub fn height(&self) -> usize {
        self.data.h
    }

    /// Whether the file records itself as a LEED diffraction image.
    pub fn is_leed(&self) -> bool {
        self.metadata
            .get("LEED")
            .and_then(|v| v.as_i64())
            .unwrap_or(0)
            != 0
    }

    /// CCD flat-field normalization against a reference frame.
    /// See [`ops::normalize_on_ccd`].
    pub fn normalize_on_ccd(&self, ccd: &LeemImage) -> Result<ImageF32> {
        ops::normalize_on_ccd(&self.data, &ccd.data)
    }

    /// Inelastic-background suppression. See [`ops::filter_inelastic_bkg`].
    pub fn filter_inelastic_bkg(&self, params: &InelasticFilter) -> ImageF32 {
        ops::filter_inelastic_bkg(&self.data, params)
    }

    /// Display contrast estimate. See [`ops::display_levels`].
    pub fn display_levels(&self) -> Levels {
        ops::display_levels(&self.data, self.is_leed())
    }
}
