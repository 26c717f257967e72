//! Density histogram over [-4, 4] for normalized central-limit samples.

use std::f64::consts::PI;

pub const DOMAIN_MIN: f64 = -4.0;
pub const DOMAIN_MAX: f64 = 4.0;
pub const BIN_COUNT: usize = 40;
pub const BIN_WIDTH: f64 = (DOMAIN_MAX - DOMAIN_MIN) / BIN_COUNT as f64;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramBin {
    pub lower: f64,
    pub count: usize,
    /// count / (valid samples * bin width)
    pub density: f64,
}

impl HistogramBin {
    pub fn center(&self) -> f64 {
        self.lower + BIN_WIDTH / 2.0
    }
}

/// Standard normal density.
pub fn standard_normal_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub bins: Vec<HistogramBin>,
    pub valid_samples: usize,
    pub total_samples: usize,
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
}

impl Histogram {
    /// Bin `samples` into 40 equal bins on [-4, 4).
    ///
    /// Samples outside the domain (including NaN and the backend's -999
    /// sentinel) count toward `total_samples` only. With no valid samples
    /// every density is zero.
    pub fn from_samples(samples: &[f64]) -> Self {
        let mut counts = [0usize; BIN_COUNT];
        let mut valid = Vec::with_capacity(samples.len());

        for &v in samples {
            if (DOMAIN_MIN..DOMAIN_MAX).contains(&v) {
                let idx = (((v - DOMAIN_MIN) / BIN_WIDTH).floor() as usize).min(BIN_COUNT - 1);
                counts[idx] += 1;
                valid.push(v);
            }
        }

        let n = valid.len();
        let norm = n as f64 * BIN_WIDTH;
        let bins = counts
            .iter()
            .enumerate()
            .map(|(i, &count)| HistogramBin {
                lower: DOMAIN_MIN + i as f64 * BIN_WIDTH,
                count,
                density: if n == 0 { 0.0 } else { count as f64 / norm },
            })
            .collect();

        let (mean, std_dev) = if n == 0 {
            (None, None)
        } else {
            let mean = valid.iter().sum::<f64>() / n as f64;
            let var = valid.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
            (Some(mean), Some(var.sqrt()))
        };

        if n < samples.len() {
            log::debug!(
                "histogram dropped {} of {} samples outside [{DOMAIN_MIN}, {DOMAIN_MAX})",
                samples.len() - n,
                samples.len()
            );
        }

        Self {
            bins,
            valid_samples: n,
            total_samples: samples.len(),
            mean,
            std_dev,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.valid_samples == 0
    }

    /// Standard normal density at each bin center.
    pub fn reference_curve(&self) -> Vec<(f64, f64)> {
        self.bins
            .iter()
            .map(|b| (b.center(), standard_normal_pdf(b.center())))
            .collect()
    }

    /// Sum of density * bin width. 1 when any sample was in range.
    pub fn density_mass(&self) -> f64 {
        self.bins.iter().map(|b| b.density * BIN_WIDTH).sum()
    }

    pub fn max_density(&self) -> f64 {
        self.bins.iter().map(|b| b.density).fold(0.0, f64::max)
    }

    /// One-line summary used as the chart subtitle.
    pub fn summary(&self) -> String {
        match (self.mean, self.std_dev) {
            (Some(m), Some(s)) => format!(
                "n={}/{}, mean={:.3}, sd={:.3}",
                self.valid_samples, self.total_samples, m, s
            ),
            _ => format!("n=0/{}", self.total_samples),
        }
    }
}
