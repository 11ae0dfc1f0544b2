//! Derived-quantity formulas
//!
//! The arithmetic the transmit flow graphs use to turn control values into
//! block parameters. Rates are in the units the controls use: sample rates in
//! samples/second, symbol rates in ksym/s, center frequencies in MHz, power in
//! dBm. The arithmetic is reproduced literally, including its rounding quirks.

use num_complex::Complex64;
use std::f64::consts::PI;

/// Power (dBm) at which the two power-control regimes meet
pub const POWER_HINGE_DBM: f64 = -50.0;

/// Integer decimation between the sample clock and the requested symbol rate
///
/// `floor(sample_rate / symbol_rate_ksps / 1000)`. Zero when the requested
/// rate cannot be reached, which is an error.
pub fn decimation(sample_rate: f64, symbol_rate_ksps: f64) -> Result<i64, String> {
    if !(symbol_rate_ksps > 0.0) {
        return Err(format!("symbol rate must be positive, got {}", symbol_rate_ksps));
    }
    let decimation = (sample_rate / symbol_rate_ksps / 1000.0).floor();
    if decimation < 1.0 {
        return Err(format!(
            "symbol rate {} ksym/s exceeds sample rate {}",
            symbol_rate_ksps, sample_rate
        ));
    }
    Ok(decimation as i64)
}

/// Symbol rate (ksym/s) actually produced by integer decimation
///
/// Not monotone in the request: 77 ksym/s at 5 Msps gives 78.125.
pub fn achieved_symbol_rate(sample_rate: f64, decimation: i64) -> f64 {
    sample_rate / decimation as f64 / 1000.0
}

/// Samples per symbol at the achieved rate
pub fn samples_per_symbol(sample_rate: f64, achieved_ksps: f64) -> f64 {
    sample_rate / achieved_ksps / 1000.0
}

/// Samples per symbol truncated to an integer, as the repeat-based modulators use it
pub fn integer_samples_per_symbol(sample_rate: f64, achieved_ksps: f64) -> i64 {
    samples_per_symbol(sample_rate, achieved_ksps) as i64
}

/// Bit rate (kbit/s)
pub fn bit_rate(achieved_ksps: f64, bits_per_symbol: i64) -> f64 {
    achieved_ksps * bits_per_symbol as f64
}

/// Constellation size `2^bits`
pub fn levels(bits_per_symbol: i64) -> i64 {
    1i64 << bits_per_symbol.clamp(0, 62)
}

/// USRP gain (dB) for a requested output power
///
/// Above the hinge the USRP supplies `p + 50` dB of gain; at or below it the
/// gain stays at zero and the signal is attenuated digitally instead.
pub fn usrp_gain(power_dbm: f64) -> f64 {
    if power_dbm > POWER_HINGE_DBM {
        power_dbm - POWER_HINGE_DBM
    } else {
        0.0
    }
}

/// Digital amplitude scale applied before the USRP
///
/// `10^((p + 50)/20) * k` at or below the hinge, `k` above it.
pub fn amplitude_scale(power_dbm: f64, k: f64) -> f64 {
    let exponent = if power_dbm <= POWER_HINGE_DBM {
        (power_dbm - POWER_HINGE_DBM) / 20.0
    } else {
        0.0
    };
    10f64.powf(exponent) * k
}

/// USRP center frequency in Hz from a control value in MHz
pub fn center_frequency_hz(center_mhz: f64) -> f64 {
    center_mhz * 1e6
}

/// Phase increment (radians/sample) of a rotator shifting by `pilot_freq - offset`
pub fn phase_increment(offset: f64, pilot_freq: f64, symbol_rate: f64) -> f64 {
    ((-offset + pilot_freq) / symbol_rate) * 2.0 * PI
}

/// ATSC 8-VSB symbol rate: 4.5 MHz / 286 * 684
pub fn atsc_symbol_rate() -> f64 {
    4.5e6 / 286.0 * 684.0
}

/// ATSC pilot frequency within the 6 MHz channel
pub fn atsc_pilot_freq(symbol_rate: f64) -> f64 {
    (6e6 - symbol_rate / 2.0) / 2.0
}

/// Phase-modulator sensitivity for M-PSK: `2π / 2^bits`
pub fn psk_sensitivity(bits_per_symbol: i64) -> f64 {
    2.0 * PI / levels(bits_per_symbol) as f64
}

/// Constellation rotation and back-off for M-PSK: `0.9 * e^(jπ/2^bits)`
pub fn psk_rotation(bits_per_symbol: i64) -> Complex64 {
    Complex64::from_polar(0.9, PI / levels(bits_per_symbol) as f64)
}

/// Amplitude step between adjacent ASK/FSK levels: `1 / (2^bits - 1)`
pub fn level_scale(bits_per_symbol: i64) -> Result<f64, String> {
    let steps = levels(bits_per_symbol) - 1;
    if steps < 1 {
        return Err(format!("bits per symbol must be at least 1, got {}", bits_per_symbol));
    }
    Ok(1.0 / steps as f64)
}

/// Frequency-modulator sensitivity (rad/sample per unit input) for a deviation in kHz
pub fn fm_sensitivity(deviation_khz: f64, sample_rate: f64) -> f64 {
    2.0 * PI * deviation_khz * 1000.0 / sample_rate
}

/// FSK sensitivity for a tone excursion in kHz
pub fn fsk_sensitivity(excursion_khz: f64, sample_rate: f64) -> f64 {
    excursion_khz * 2000.0 * PI / sample_rate
}

/// Sensitivity of the subcarrier FM modulator: 2.5 kHz of deviation per kHz of subcarrier
pub fn subcarrier_sensitivity(subcarrier_khz: f64, sample_rate: f64) -> f64 {
    2.0 * PI * subcarrier_khz * 2500.0 / sample_rate
}

/// Linear amplitude of the subcarrier noise from its dB setting, gated by on/off
pub fn noise_amplitude(enabled: i64, noise_db: f64) -> f64 {
    enabled as f64 * 10f64.powf(noise_db / 10.0)
}

/// Pulse period in microseconds
pub fn pulse_period_us(samples_per_pulse: f64, sample_rate: f64) -> f64 {
    samples_per_pulse / sample_rate * 1e6
}

/// UDP port of the live microphone stream for a USRP number
pub fn mike_port(usrp_number: i64) -> i64 {
    2020 + usrp_number
}

/// Modulation label such as `8PSK`
pub fn modulation_name(bits_per_symbol: i64, scheme: &str) -> String {
    format!("{}{}", levels(bits_per_symbol), scheme)
}
