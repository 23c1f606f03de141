//! Reader and processing utilities for the UKSoft binary image format
//! written by Elmitec U-View (LEEM/LEED electron microscopes).
//!
//! The entry point is [`load`], which decodes one `.dat` file into a
//! [`LeemImage`]: a `width × height` f32 pixel grid plus a typed metadata
//! map of instrument settings. [`ops`] holds the post-processing
//! operations: CCD flat-field normalization, inelastic-background
//! filtering, and display-level estimation.
//!
//! ```no_run
//! use uksoft::prelude::*;
//!
//! # fn main() -> uksoft::Result<()> {
//! let img = uksoft::load("growth_0042.dat")?;
//! println!(
//!     "{}x{}, acquired {}",
//!     img.width(),
//!     img.height(),
//!     img.header.timestamp
//! );
//! if let Some(v) = img.metadata.get("Start Voltage").and_then(MetaValue::as_f32) {
//!     println!("start voltage: {v} V");
//! }
//!
//! let ccd = uksoft::load("CCD_2x2.dat")?;
//! let flat = img.normalize_on_ccd(&ccd)?;
//! let levels = img.display_levels();
//! uksoft::image::save_grayscale_png(&flat, levels.min, levels.max, "out.png".as_ref())?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod format;
pub mod image;
pub mod metadata;
pub mod ops;
pub mod types;

pub use crate::error::{Error, Result};
pub use crate::format::{load, FileHeader};
pub use crate::types::LeemImage;

/// Small prelude for quick experiments.
pub mod prelude {
    pub use crate::image::ImageF32;
    pub use crate::metadata::MetaValue;
    pub use crate::ops::{InelasticFilter, Levels};
    pub use crate::{load, LeemImage};
}
