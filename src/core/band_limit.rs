//! Range band limiting with a Hann window in the frequency domain
//!
//! Every line of an SLC image is transformed to the frequency domain
//! (zero-padded to the FFT size), center-shifted, multiplied by a window that
//! holds a Hann taper over the central half of the spectrum and zeros
//! elsewhere, shifted back and inverse transformed. Truncating the result to
//! the original width gives an image with lower PSF sidelobes at the cost of
//! range resolution.
//!
//! ```text
//!  shifted spectrum bin:  0        n/4            3n/4        n-1
//!  window:                0 ... 0  /‾‾‾‾ Hann ‾‾‾‾\  0 ... 0
//!  normalized frequency: -0.5             0                  +0.5
//! ```

use crate::types::{SarComplex, SarError, SarImage, SarResult, SpectralWindow};
use ndarray::{s, Array1, Array2, ArrayView1, Axis};
use num_traits::Zero;
use rustfft::{Fft, FftPlanner};
use std::f64::consts::PI;
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Symmetric Hann window of the given length
///
/// `w(k) = 0.5 - 0.5 cos(2πk / (M - 1))` for `k` in `0..M`. A length of one
/// yields `[1.0]`.
pub fn hann_window(length: usize) -> SpectralWindow {
    match length {
        0 => Array1::zeros(0),
        1 => Array1::ones(1),
        _ => {
            let denom = (length - 1) as f64;
            Array1::from_iter(
                (0..length).map(|k| 0.5 - 0.5 * (2.0 * PI * k as f64 / denom).cos()),
            )
        }
    }
}

/// Start index and length of the window passband for an FFT size
pub fn passband(fft_size: usize) -> (usize, usize) {
    (fft_size / 4, fft_size / 2)
}

/// Band-limiting window over a center-shifted spectrum of `fft_size` bins
///
/// Bins outside `[fft_size/4, fft_size/4 + fft_size/2)` are exactly zero.
pub fn band_limit_window(fft_size: usize) -> SpectralWindow {
    let (start, length) = passband(fft_size);
    let mut window = Array1::zeros(fft_size);
    window
        .slice_mut(s![start..start + length])
        .assign(&hann_window(length));
    window
}

/// Move the zero-frequency bin to index `n / 2`
pub fn fftshift<T>(data: &mut [T]) {
    let n = data.len();
    data.rotate_right(n / 2);
}

/// Inverse of [`fftshift`], also for odd lengths
pub fn ifftshift<T>(data: &mut [T]) {
    let n = data.len();
    data.rotate_left(n / 2);
}

/// Per-line Hann band-limiting filter
pub struct BandLimitFilter {
    fft_size: usize,
    window: SpectralWindow,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
    scratch_len: usize,
}

impl fmt::Debug for BandLimitFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BandLimitFilter")
            .field("fft_size", &self.fft_size)
            .finish()
    }
}

impl BandLimitFilter {
    /// Create a filter for the given FFT size
    pub fn new(fft_size: usize) -> SarResult<Self> {
        if fft_size == 0 {
            return Err(SarError::InvalidParameter(
                "FFT size must be positive".to_string(),
            ));
        }
        if !fft_size.is_power_of_two() {
            log::debug!("FFT size {} is not a power of two", fft_size);
        }

        Ok(Self::with_window(band_limit_window(fft_size)))
    }

    /// Filter with an arbitrary window; the FFT size is the window length
    pub(crate) fn with_window(window: SpectralWindow) -> Self {
        let fft_size = window.len();
        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(fft_size);
        let inverse = planner.plan_fft_inverse(fft_size);
        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());

        Self {
            fft_size,
            window,
            forward,
            inverse,
            scratch_len,
        }
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Window applied to each center-shifted line spectrum
    pub fn window(&self) -> &SpectralWindow {
        &self.window
    }

    /// Center-shifted, zero-padded spectrum of every line: (lines x fft_size)
    pub fn spectrum(&self, slc: &SarImage) -> SarResult<SarImage> {
        self.check_width(slc)?;
        Ok(self.map_rows(slc, self.fft_size, |filter, row, buffer, scratch| {
            filter.forward_row(row, buffer, scratch);
        }))
    }

    /// [`spectrum`](Self::spectrum) after multiplication by the window
    pub fn masked_spectrum(&self, slc: &SarImage) -> SarResult<SarImage> {
        self.check_width(slc)?;
        Ok(self.map_rows(slc, self.fft_size, |filter, row, buffer, scratch| {
            filter.forward_row(row, buffer, scratch);
            filter.mask_row(buffer);
        }))
    }

    /// Band-limit every line; the output has the shape of the input
    pub fn apply(&self, slc: &SarImage) -> SarResult<SarImage> {
        self.check_width(slc)?;
        let (lines, pixels) = slc.dim();
        log::info!(
            "Applying Hann band-limit window to {} x {} image (n_fft = {})",
            lines, pixels, self.fft_size
        );
        let start_time = std::time::Instant::now();

        let filtered = self.map_rows(slc, pixels, |filter, row, buffer, scratch| {
            filter.filter_row(row, buffer, scratch);
        });

        log::info!("Band limiting completed in {:?}", start_time.elapsed());
        Ok(filtered)
    }

    fn check_width(&self, slc: &SarImage) -> SarResult<()> {
        if self.fft_size < slc.ncols() {
            return Err(SarError::InvalidParameter(format!(
                "FFT size {} is smaller than the line length {}",
                self.fft_size,
                slc.ncols()
            )));
        }
        Ok(())
    }

    /// Zero-pad, transform and center-shift one line into `buffer`
    fn forward_row(&self, row: ArrayView1<SarComplex>, buffer: &mut [SarComplex], scratch: &mut [SarComplex]) {
        buffer.fill(SarComplex::zero());
        for (dst, src) in buffer.iter_mut().zip(row.iter()) {
            *dst = *src;
        }
        self.forward.process_with_scratch(buffer, scratch);
        fftshift(buffer);
    }

    fn mask_row(&self, buffer: &mut [SarComplex]) {
        for (bin, &weight) in buffer.iter_mut().zip(self.window.iter()) {
            // exact zero even for non-finite bins
            if weight == 0.0 {
                *bin = SarComplex::zero();
            } else {
                *bin = *bin * weight;
            }
        }
    }

    /// Undo the shift and inverse transform with 1/N normalization
    fn inverse_row(&self, buffer: &mut [SarComplex], scratch: &mut [SarComplex]) {
        ifftshift(buffer);
        self.inverse.process_with_scratch(buffer, scratch);

        let scale = 1.0 / self.fft_size as f64;
        for sample in buffer.iter_mut() {
            *sample *= scale;
        }
    }

    /// Full forward/mask/inverse chain; `buffer` holds all `fft_size` outputs
    pub(crate) fn filter_row(&self, row: ArrayView1<SarComplex>, buffer: &mut [SarComplex], scratch: &mut [SarComplex]) {
        self.forward_row(row, buffer, scratch);
        self.mask_row(buffer);
        self.inverse_row(buffer, scratch);
    }

    /// Run `op` on each input line and keep the first `out_cols` buffer values
    fn map_rows<F>(&self, slc: &SarImage, out_cols: usize, op: F) -> SarImage
    where
        F: Fn(&Self, ArrayView1<SarComplex>, &mut [SarComplex], &mut [SarComplex]) + Sync,
    {
        let mut output = Array2::zeros((slc.nrows(), out_cols));
        let new_buffers = || {
            (
                vec![SarComplex::zero(); self.fft_size],
                vec![SarComplex::zero(); self.scratch_len],
            )
        };

        #[cfg(feature = "parallel")]
        {
            output
                .axis_iter_mut(Axis(0))
                .into_par_iter()
                .zip(slc.axis_iter(Axis(0)))
                .for_each_init(new_buffers, |(buffer, scratch), (mut out_row, in_row)| {
                    op(self, in_row, buffer.as_mut_slice(), scratch.as_mut_slice());
                    out_row.assign(&ArrayView1::from(&buffer[..out_cols]));
                });
        }

        #[cfg(not(feature = "parallel"))]
        {
            let (mut buffer, mut scratch) = new_buffers();
            for (mut out_row, in_row) in output.axis_iter_mut(Axis(0)).zip(slc.axis_iter(Axis(0))) {
                op(self, in_row, buffer.as_mut_slice(), scratch.as_mut_slice());
                out_row.assign(&ArrayView1::from(&buffer[..out_cols]));
            }
        }

        output
    }
}

/// Band-limit an SLC image with a Hann window over the central half of each
/// line spectrum, transformed at `fft_size` points
pub fn apply_band_limit_window(slc: &SarImage, fft_size: usize) -> SarResult<SarImage> {
    if fft_size < slc.ncols() {
        return Err(SarError::InvalidParameter(format!(
            "FFT size {} is smaller than the line length {}",
            fft_size,
            slc.ncols()
        )));
    }
    BandLimitFilter::new(fft_size)?.apply(slc)
}
