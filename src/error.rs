//! Crate-wide error and result types.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Underlying I/O failure while opening or reading a file.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The leading id bytes are not the UKSOFT signature.
    #[error("not a UKSoft file (bad signature)")]
    BadSignature,

    /// The file holds fewer bytes than its header declares.
    #[error("truncated file: need {needed} bytes, only {available} present")]
    Truncated { needed: usize, available: usize },

    /// Image and reference grid dimensions differ.
    #[error("shape mismatch: image is {w}x{h}, reference is {ref_w}x{ref_h}")]
    ShapeMismatch {
        w: usize,
        h: usize,
        ref_w: usize,
        ref_h: usize,
    },

    /// Flat-field reference contains zero samples, or the normalized
    /// maximum is zero. Dividing through would silently produce inf/NaN.
    #[error("degenerate normalization reference")]
    DegenerateReference,
}

pub type Result<T> = std::result::Result<T, Error>;
