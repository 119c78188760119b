// Cepstral module - decibel scaling and DCT
//
// power_to_db mirrors the usual spectrogram convention: 10*log10 of the power
// clamped at `amin`, shifted by the reference power, with the dynamic range
// limited to `top_db` below the peak. The cepstrum is an orthonormal DCT-II
// over the mel axis, truncated to the first `n_mfcc` coefficients.

use ndarray::Array2;

/// Floor applied to power values before taking the logarithm
pub const AMIN: f32 = 1e-10;

/// Dynamic range kept below the loudest cell
pub const TOP_DB: f32 = 80.0;

/// Reference level for decibel conversion
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DbReference {
    /// Absolute scale (reference power 1.0)
    Unity,
    /// Relative to the matrix maximum, so the loudest cell maps to 0 dB
    Max,
}

/// Convert a power matrix to decibels
pub fn power_to_db(power: &Array2<f32>, reference: DbReference) -> Array2<f32> {
    let ref_value = match reference {
        DbReference::Unity => 1.0,
        DbReference::Max => power.iter().copied().fold(0.0f32, f32::max),
    };
    let ref_db = 10.0 * ref_value.max(AMIN).log10();

    let mut db = power.mapv(|p| 10.0 * p.max(AMIN).log10() - ref_db);

    let peak = db.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let floor = peak - TOP_DB;
    db.mapv_inplace(|v| v.max(floor));
    db
}

/// Orthonormal DCT-II basis truncated to `n_out` rows
pub struct DctBasis {
    basis: Array2<f32>,
}

impl DctBasis {
    pub fn new(n_out: usize, n_in: usize) -> Self {
        let mut basis = Array2::<f32>::zeros((n_out, n_in));
        let n = n_in as f32;
        for k in 0..n_out {
            let scale = if k == 0 {
                (1.0 / n).sqrt()
            } else {
                (2.0 / n).sqrt()
            };
            for i in 0..n_in {
                let angle = std::f32::consts::PI * k as f32 * (2.0 * i as f32 + 1.0) / (2.0 * n);
                basis[[k, i]] = scale * angle.cos();
            }
        }
        Self { basis }
    }

    /// Transform a (n_in, frames) matrix into (n_out, frames) coefficients
    pub fn apply(&self, input: &Array2<f32>) -> Array2<f32> {
        self.basis.dot(input)
    }
}
