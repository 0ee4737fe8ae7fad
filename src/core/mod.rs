//! Core SAR processing modules

pub mod band_limit;
pub mod intensity;

// Re-export main types
pub use band_limit::{
    apply_band_limit_window, band_limit_window, fftshift, hann_window, ifftshift, passband,
    BandLimitFilter,
};
pub use intensity::{intensity_db, subset, RegionOfInterest};
