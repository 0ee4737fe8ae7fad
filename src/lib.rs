//! palsar-bandlimit: ALOS-PALSAR L1.1 SLC reader and range band limiting
//!
//! Decodes the CEOS image file of an ALOS-PALSAR Level-1.1 single-look
//! complex product into a complex matrix, and suppresses range PSF
//! sidelobes by weighting each line spectrum with a Hann window over the
//! central half of the band.

pub mod types;
pub mod io;
pub mod core;

// Re-export main types and functions for easier access
pub use types::{SarComplex, SarError, SarImage, SarReal, SarRealImage, SarResult, SpectralWindow};

pub use io::{read_product, read_product_with_layout, ByteOrder, LineCount, PalsarReader, ProductHeader, ProductLayout};
pub use crate::core::{apply_band_limit_window, intensity_db, subset, BandLimitFilter, RegionOfInterest};

/// Python bindings, operating on 2D `numpy.complex128` arrays
#[cfg(feature = "python")]
mod python {
    use crate::types::SarError;
    use num_complex::Complex64;
    use numpy::{IntoPyArray, PyArray2, PyReadonlyArray2};
    use pyo3::exceptions::{PyIOError, PyValueError};
    use pyo3::prelude::*;

    fn to_py_err(err: SarError) -> PyErr {
        match err {
            SarError::InvalidParameter(_) => PyValueError::new_err(err.to_string()),
            _ => PyIOError::new_err(err.to_string()),
        }
    }

    /// Read a PALSAR L1.1 SLC image file
    #[pyfunction]
    #[pyo3(name = "read_product")]
    fn py_read_product<'py>(py: Python<'py>, path: &str) -> PyResult<&'py PyArray2<Complex64>> {
        let slc = py
            .allow_threads(|| crate::io::read_product(path))
            .map_err(to_py_err)?;
        Ok(slc.into_pyarray(py))
    }

    /// Band-limit each line with a Hann window at the given FFT size
    #[pyfunction]
    #[pyo3(name = "apply_band_limit_window")]
    fn py_apply_band_limit_window<'py>(
        py: Python<'py>,
        slc: PyReadonlyArray2<'py, Complex64>,
        fft_size: usize,
    ) -> PyResult<&'py PyArray2<Complex64>> {
        let slc = slc.as_array().to_owned();
        let filtered = py
            .allow_threads(|| crate::core::apply_band_limit_window(&slc, fft_size))
            .map_err(to_py_err)?;
        Ok(filtered.into_pyarray(py))
    }

    /// Intensity in dB of a complex image
    #[pyfunction]
    #[pyo3(name = "intensity_db")]
    fn py_intensity_db<'py>(
        py: Python<'py>,
        slc: PyReadonlyArray2<'py, Complex64>,
    ) -> PyResult<&'py PyArray2<f64>> {
        let slc = slc.as_array().to_owned();
        Ok(crate::core::intensity_db(&slc).into_pyarray(py))
    }

    /// Python module definition
    #[pymodule]
    fn _core(_py: Python, m: &PyModule) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(py_read_product, m)?)?;
        m.add_function(wrap_pyfunction!(py_apply_band_limit_window, m)?)?;
        m.add_function(wrap_pyfunction!(py_intensity_db, m)?)?;
        Ok(())
    }
}
