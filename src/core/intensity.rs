use crate::types::{SarError, SarImage, SarRealImage, SarResult};
use ndarray::{s, Array2};
use serde::{Deserialize, Serialize};

/// Intensity in dB, `20 log10(|x|)`; exact zeros map to negative infinity
pub fn intensity_db(slc: &SarImage) -> SarRealImage {
    slc.mapv(|sample| 20.0 * sample.norm().log10())
}

/// Rectangular region in (line, pixel) coordinates, half-open on both axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionOfInterest {
    pub line_min: usize,
    pub line_max: usize,
    pub pixel_min: usize,
    pub pixel_max: usize,
}

impl RegionOfInterest {
    pub fn new(line_min: usize, line_max: usize, pixel_min: usize, pixel_max: usize) -> Self {
        Self {
            line_min,
            line_max,
            pixel_min,
            pixel_max,
        }
    }

    pub fn dim(&self) -> (usize, usize) {
        (
            self.line_max.saturating_sub(self.line_min),
            self.pixel_max.saturating_sub(self.pixel_min),
        )
    }
}

/// Copy a region of interest out of an image
pub fn subset<T: Clone>(image: &Array2<T>, roi: &RegionOfInterest) -> SarResult<Array2<T>> {
    let (lines, pixels) = image.dim();

    if roi.line_min >= roi.line_max || roi.pixel_min >= roi.pixel_max {
        return Err(SarError::InvalidParameter(format!("Empty region of interest: {:?}", roi)));
    }
    if roi.line_max > lines || roi.pixel_max > pixels {
        return Err(SarError::InvalidParameter(format!(
            "Region of interest {:?} exceeds image size {} x {}",
            roi, lines, pixels
        )));
    }

    Ok(image
        .slice(s![roi.line_min..roi.line_max, roi.pixel_min..roi.pixel_max])
        .to_owned())
}
