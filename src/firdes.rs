//! FIR filter design
//!
//! Tap designers for the shaping and band-limiting filters whose tap vectors
//! are derived parameters: root-raised-cosine, Gaussian, windowed-sinc
//! low-pass and boxcar. Tap counts and normalization follow the GNU Radio
//! `firdes` conventions so the vectors pushed to filter blocks match what the
//! transmit flow graphs compute.

use std::f64::consts::PI;
use std::fmt;

/// Window applied to a windowed-sinc design
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Window {
    Rectangular,
    Hann,
    Hamming,
    Blackman,
}

impl Window {
    /// Stop-band attenuation in dB, used to size the filter
    pub fn max_attenuation(self) -> f64 {
        match self {
            Window::Rectangular => 21.0,
            Window::Hann => 44.0,
            Window::Hamming => 53.0,
            Window::Blackman => 74.0,
        }
    }

    /// Symmetric window of `len` taps
    pub fn taps(self, len: usize) -> Vec<f64> {
        match self {
            Window::Rectangular => vec![1.0; len],
            Window::Hann => gen_cos(len, &[0.5, 0.5]),
            Window::Hamming => gen_cos(len, &[0.54, 0.46]),
            Window::Blackman => gen_cos(len, &[0.42, 0.5, 0.08]),
        }
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Window::Rectangular => write!(f, "rectangular"),
            Window::Hann => write!(f, "hann"),
            Window::Hamming => write!(f, "hamming"),
            Window::Blackman => write!(f, "blackman"),
        }
    }
}

/// Generalized cosine window:
///```text
/// w[n] = sum_k (-1)^k * coeffs[k] * cos(2*π*k*n/(N-1)),     0 ≤ n < N
///```
fn gen_cos(len: usize, coeffs: &[f64]) -> Vec<f64> {
    if len < 2 {
        return vec![1.0; len];
    }
    let span = (len - 1) as f64;
    (0..len)
        .map(|n| {
            coeffs
                .iter()
                .enumerate()
                .map(|(k, c)| {
                    let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
                    sign * c * (2.0 * PI * (k * n) as f64 / span).cos()
                })
                .sum()
        })
        .collect()
}

/// Tap count for a windowed design: `att * fs / (22 * tw)`, forced odd
pub fn compute_ntaps(sampling_freq: f64, transition_width: f64, window: Window) -> usize {
    let ntaps = (window.max_attenuation() * sampling_freq / (22.0 * transition_width)) as usize;
    ntaps | 1
}

/// Root-raised-cosine pulse-shaping filter
///
/// `ntaps` is forced odd. The taps are normalized so that they sum to `gain`.
///
/// Example usage:
/// ```
/// use txchain::firdes;
///
/// // 100 ksym/s at 5 Msps, 11 symbols long
/// let taps = firdes::root_raised_cosine(1.0, 5e6, 100e3, 0.35, 550).unwrap();
/// assert_eq!(taps.len(), 551);
/// ```
pub fn root_raised_cosine(
    gain: f64,
    sampling_freq: f64,
    symbol_rate: f64,
    alpha: f64,
    ntaps: usize,
) -> Result<Vec<f64>, String> {
    if !(sampling_freq > 0.0) {
        return Err(format!("sampling frequency must be positive, got {}", sampling_freq));
    }
    if !(symbol_rate > 0.0) {
        return Err(format!("symbol rate must be positive, got {}", symbol_rate));
    }
    if !(alpha > 0.0 && alpha <= 1.0) {
        return Err(format!("alpha must be in (0, 1], got {}", alpha));
    }

    let ntaps = ntaps | 1;
    let center = (ntaps / 2) as i64;
    let spb = sampling_freq / symbol_rate;

    let mut taps = Vec::with_capacity(ntaps);
    for i in 0..ntaps as i64 {
        let xindx = (i - center) as f64;
        let x1 = PI * xindx / spb;
        let x2 = 4.0 * alpha * xindx / spb;
        let x3 = x2 * x2 - 1.0;

        let tap = if x3.abs() >= 1e-6 {
            let num = if i != center {
                ((1.0 + alpha) * x1).cos() + ((1.0 - alpha) * x1).sin() / (4.0 * alpha * xindx / spb)
            } else {
                ((1.0 + alpha) * x1).cos() + (1.0 - alpha) * PI / (4.0 * alpha)
            };
            let den = x3 * PI;
            4.0 * alpha * num / den
        } else if alpha == 1.0 {
            -1.0
        } else {
            // Removable singularity at |t| = T/(4 alpha)
            let lo = (1.0 - alpha) * x1;
            let hi = (1.0 + alpha) * x1;
            let num = hi.sin() * (1.0 + alpha) * PI
                - lo.cos() * ((1.0 - alpha) * PI * spb) / (4.0 * alpha * xindx)
                + lo.sin() * spb * spb / (4.0 * alpha * xindx * xindx);
            let den = -32.0 * PI * alpha * alpha * xindx / spb;
            4.0 * alpha * num / den
        };
        taps.push(tap);
    }

    normalize_sum(taps, gain)
}

/// Gaussian pulse-shaping filter for GFSK/GMSK
///
/// `spb` is samples per bit, `bt` the bandwidth-time product. The taps sum to
/// `gain`.
pub fn gaussian(gain: f64, spb: f64, bt: f64, ntaps: usize) -> Result<Vec<f64>, String> {
    if !(spb > 0.0) {
        return Err(format!("samples per bit must be positive, got {}", spb));
    }
    if !(bt > 0.0) {
        return Err(format!("BT must be positive, got {}", bt));
    }
    if ntaps == 0 {
        return Err("gaussian filter needs at least one tap".to_string());
    }

    let dt = 1.0 / spb;
    let s = 1.0 / (2.0f64.ln().sqrt() / (2.0 * PI * bt));
    let mut t0 = -0.5 * ntaps as f64;

    let mut taps = Vec::with_capacity(ntaps);
    for _ in 0..ntaps {
        t0 += 1.0;
        let ts = s * dt * t0;
        taps.push((-0.5 * ts * ts).exp());
    }

    normalize_sum(taps, gain)
}

/// Windowed-sinc low-pass filter
///
/// The tap count follows from the window's attenuation and the transition
/// width (see [`compute_ntaps`]). The DC gain equals `gain`.
///
/// Example usage:
/// ```
/// use txchain::firdes::{self, Window};
///
/// let taps = firdes::low_pass(1.0, 24_000.0, 4_000.0, 1_000.0, Window::Hamming).unwrap();
/// assert_eq!(taps.len(), 57);
/// ```
pub fn low_pass(
    gain: f64,
    sampling_freq: f64,
    cutoff_freq: f64,
    transition_width: f64,
    window: Window,
) -> Result<Vec<f64>, String> {
    if !(sampling_freq > 0.0) {
        return Err(format!("sampling frequency must be positive, got {}", sampling_freq));
    }
    if !(cutoff_freq > 0.0 && cutoff_freq <= sampling_freq / 2.0) {
        return Err(format!(
            "cutoff {} must be in (0, {}]",
            cutoff_freq,
            sampling_freq / 2.0
        ));
    }
    if !(transition_width > 0.0) {
        return Err(format!("transition width must be positive, got {}", transition_width));
    }

    let ntaps = compute_ntaps(sampling_freq, transition_width, window);
    let w = window.taps(ntaps);
    let m = ((ntaps - 1) / 2) as i64;
    let fw_t0 = 2.0 * PI * cutoff_freq / sampling_freq;

    let mut taps: Vec<f64> = (-m..=m)
        .zip(w.iter())
        .map(|(n, w)| {
            if n == 0 {
                fw_t0 / PI * w
            } else {
                let n = n as f64;
                (n * fw_t0).sin() / (n * PI) * w
            }
        })
        .collect();

    let center = m as usize;
    let dc = taps[center] + 2.0 * taps[center + 1..].iter().sum::<f64>();
    if dc == 0.0 || !dc.is_finite() {
        return Err(format!("low-pass design has degenerate DC gain {}", dc));
    }
    let scale = gain / dc;
    for tap in &mut taps {
        *tap *= scale;
    }

    Ok(taps)
}

/// Rectangular pulse of `len` unit taps
pub fn boxcar(len: usize) -> Result<Vec<f64>, String> {
    if len == 0 {
        return Err("boxcar needs at least one tap".to_string());
    }
    Ok(vec![1.0; len])
}

fn normalize_sum(mut taps: Vec<f64>, gain: f64) -> Result<Vec<f64>, String> {
    let sum: f64 = taps.iter().sum();
    if sum == 0.0 || !sum.is_finite() {
        return Err(format!("filter taps have degenerate sum {}", sum));
    }
    let scale = gain / sum;
    for tap in &mut taps {
        *tap *= scale;
    }
    Ok(taps)
}
