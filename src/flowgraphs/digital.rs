//! Digital keying transmitters: ASK, PSK and FSK
//!
//! All three derive their symbol timing the same way: an integer repeat
//! factor between the sample clock and the requested symbol rate, the symbol
//! rate that factor actually achieves, and the samples per symbol used to
//! size the pulse-shaping filter.

use super::{
    amplitude_scale_backed_off, amplitude_scale_full, center_freq, output_ip_addr, rf_power,
    samp_rate, switch, usrp_center_freq, usrp_gain, USRP_SAMP_RATE_SINK,
};
use crate::domain::Kind;
use crate::firdes;
use crate::formulas;
use crate::parameter::{FlowgraphTable, Inputs, ParameterSpec};
use crate::value::Value;

/// Length of the RRC filter in symbols
const RRC_SPAN_SYMBOLS: usize = 11;

pub(super) fn ask() -> FlowgraphTable {
    FlowgraphTable::new("ask", "ASK Signal Generator")
        .parameters(common(10e6))
        .parameter(amplitude_scale_full("blocks_multiply_const_vxx_2.set_k"))
        .parameter(switch("carrier", 0).with_sink("blocks_add_const_vxx_1.set_k"))
        .parameter(switch("filterVal", 0).with_sink("blocks_selector_0.set_input_index"))
        .parameter(alpha("alpha"))
        .parameters(symbol_timing("blocks_repeat_0_0.set_interpolation"))
        .parameter(integer_sps())
        .parameter(bit_rate())
        .parameter(level_scale())
        .parameter(
            ParameterSpec::derived(
                "rrcTaps",
                Kind::Taps,
                &["sampRate", "achievedSymRate", "alpha", "sps"],
                ask_rrc_taps,
            )
            .with_sink("filter_fft_rrc_filter_0.set_taps"),
        )
        .parameter(ParameterSpec::derived("modName", Kind::Text, &["bitsPerSym"], ask_name))
}

pub(super) fn psk() -> FlowgraphTable {
    FlowgraphTable::new("psk", "PSK Signal Generator")
        .parameters(common(5e6))
        .parameter(amplitude_scale_backed_off("blocks_multiply_const_vxx_2.set_k"))
        .parameter(alpha("alphaVal"))
        .parameter(switch("rrcOption", 1).with_sink("blocks_selector_0.set_input_index"))
        .parameters(symbol_timing("blocks_repeat_0.set_interpolation"))
        .parameter(
            ParameterSpec::derived(
                "sps",
                Kind::Real,
                &["sampRate", "achievedSymRate"],
                real_samples_per_symbol,
            )
            .with_label("Samples per Symbol"),
        )
        .parameter(bit_rate())
        .parameter(
            ParameterSpec::derived("phaseSensitivity", Kind::Real, &["bitsPerSym"], psk_sensitivity)
                .with_sink("analog_phase_modulator_fc_0.set_sensitivity"),
        )
        .parameter(
            ParameterSpec::derived(
                "constellationRotation",
                Kind::Complex,
                &["bitsPerSym"],
                psk_rotation,
            )
            .with_sink("blocks_multiply_const_vxx_1.set_k"),
        )
        .parameter(
            ParameterSpec::derived(
                "rrcTaps",
                Kind::Taps,
                &["sampRate", "achievedSymRate", "alphaVal", "sps"],
                psk_rrc_taps,
            )
            .with_sink("filter_fft_rrc_filter_0.set_taps"),
        )
        .parameter(ParameterSpec::derived("modName", Kind::Text, &["bitsPerSym"], psk_name))
}

pub(super) fn fsk() -> FlowgraphTable {
    FlowgraphTable::new("fsk", "FSK Signal Generator")
        .parameters(common(5e6))
        .parameter(amplitude_scale_backed_off("blocks_multiply_const_vxx_0.set_k"))
        .parameter(
            ParameterSpec::primary("excursion", Kind::Real)
                .with_range(1.0, 500.0)
                .with_default(100.0)
                .with_label("Frequency Excursion (kHz)"),
        )
        .parameter(
            ParameterSpec::primary("bt", Kind::Real)
                .with_range(0.1, 1.0)
                .with_default(0.35)
                .with_label("Gaussian BT"),
        )
        .parameter(switch("filterVal", 0).with_sink("blocks_selector_0.set_input_index"))
        .parameters(symbol_timing("blocks_repeat_0_0.set_interpolation"))
        .parameter(integer_sps())
        .parameter(bit_rate())
        .parameter(level_scale())
        .parameter(
            ParameterSpec::derived(
                "fmSensitivity",
                Kind::Real,
                &["excursion", "sampRate"],
                fsk_sensitivity,
            )
            .with_sink("analog_frequency_modulator_fc_0.set_sensitivity"),
        )
        .parameter(
            ParameterSpec::derived("gaussianTaps", Kind::Taps, &["sps", "bt"], gaussian_taps)
                .with_sink("fir_filter_xxx_0.set_taps"),
        )
        .parameter(ParameterSpec::derived("modName", Kind::Text, &["bitsPerSym"], fsk_name))
}

/// USRP entries plus the symbol-rate and constellation-size controls
fn common(default_samp_rate: f64) -> Vec<ParameterSpec> {
    vec![
        output_ip_addr(),
        center_freq(50.0, 2200.0),
        usrp_center_freq(),
        samp_rate(default_samp_rate).with_sink(USRP_SAMP_RATE_SINK),
        rf_power(),
        usrp_gain(),
        ParameterSpec::primary("bitsPerSym", Kind::Choice)
            .with_options([1i64, 2, 3])
            .with_label("Bits per Symbol"),
        ParameterSpec::primary("symRate", Kind::Real)
            .with_range(1.0, 500.0)
            .with_label("Symbol Rate (kHz)"),
    ]
}

fn alpha(name: &str) -> ParameterSpec {
    ParameterSpec::primary(name, Kind::Real)
        .with_range(0.01, 1.0)
        .with_default(0.35)
        .with_label("RRC Alpha Value")
}

fn symbol_timing(repeat_sink: &str) -> Vec<ParameterSpec> {
    vec![
        ParameterSpec::derived("decimation", Kind::Integer, &["sampRate", "symRate"], decimation)
            .with_sink(repeat_sink),
        ParameterSpec::derived(
            "achievedSymRate",
            Kind::Real,
            &["sampRate", "decimation"],
            achieved_symbol_rate,
        )
        .with_label("Actual Symbol Rate (kHz)"),
    ]
}

fn integer_sps() -> ParameterSpec {
    ParameterSpec::derived(
        "sps",
        Kind::Integer,
        &["sampRate", "achievedSymRate"],
        integer_samples_per_symbol,
    )
    .with_label("Samples per Symbol")
}

fn bit_rate() -> ParameterSpec {
    ParameterSpec::derived("bitRate", Kind::Real, &["achievedSymRate", "bitsPerSym"], bit_rate_kbps)
        .with_label("Bit Rate (kbps)")
}

fn level_scale() -> ParameterSpec {
    ParameterSpec::derived("levelScale", Kind::Real, &["bitsPerSym"], level_step)
        .with_sink("blocks_multiply_const_vxx_1.set_k")
}

fn decimation(inputs: &Inputs<'_>) -> Result<Value, String> {
    let d = formulas::decimation(inputs.real("sampRate")?, inputs.real("symRate")?)?;
    Ok(Value::Integer(d))
}

fn achieved_symbol_rate(inputs: &Inputs<'_>) -> Result<Value, String> {
    Ok(Value::Real(formulas::achieved_symbol_rate(
        inputs.real("sampRate")?,
        inputs.integer("decimation")?,
    )))
}

fn integer_samples_per_symbol(inputs: &Inputs<'_>) -> Result<Value, String> {
    Ok(Value::Integer(formulas::integer_samples_per_symbol(
        inputs.real("sampRate")?,
        inputs.real("achievedSymRate")?,
    )))
}

fn real_samples_per_symbol(inputs: &Inputs<'_>) -> Result<Value, String> {
    Ok(Value::Real(formulas::samples_per_symbol(
        inputs.real("sampRate")?,
        inputs.real("achievedSymRate")?,
    )))
}

fn bit_rate_kbps(inputs: &Inputs<'_>) -> Result<Value, String> {
    Ok(Value::Real(formulas::bit_rate(
        inputs.real("achievedSymRate")?,
        inputs.integer("bitsPerSym")?,
    )))
}

fn level_step(inputs: &Inputs<'_>) -> Result<Value, String> {
    Ok(Value::Real(formulas::level_scale(inputs.integer("bitsPerSym")?)?))
}

fn ask_rrc_taps(inputs: &Inputs<'_>) -> Result<Value, String> {
    let sps = inputs.integer("sps")?.max(0) as usize;
    let taps = firdes::root_raised_cosine(
        1.0,
        inputs.real("sampRate")?,
        inputs.real("achievedSymRate")? * 1e3,
        inputs.real("alpha")?,
        RRC_SPAN_SYMBOLS * sps,
    )?;
    Ok(Value::Taps(taps))
}

fn psk_rrc_taps(inputs: &Inputs<'_>) -> Result<Value, String> {
    let ntaps = (RRC_SPAN_SYMBOLS as f64 * inputs.real("sps")?).max(0.0) as usize;
    let taps = firdes::root_raised_cosine(
        1.0,
        inputs.real("sampRate")?,
        inputs.real("achievedSymRate")? * 1000.0,
        inputs.real("alphaVal")?,
        ntaps,
    )?;
    Ok(Value::Taps(taps))
}

fn gaussian_taps(inputs: &Inputs<'_>) -> Result<Value, String> {
    let sps = inputs.integer("sps")?;
    let taps = firdes::gaussian(1.0, sps as f64, inputs.real("bt")?, (2 * sps).max(0) as usize)?;
    Ok(Value::Taps(taps))
}

fn psk_sensitivity(inputs: &Inputs<'_>) -> Result<Value, String> {
    Ok(Value::Real(formulas::psk_sensitivity(inputs.integer("bitsPerSym")?)))
}

fn psk_rotation(inputs: &Inputs<'_>) -> Result<Value, String> {
    Ok(Value::Complex(formulas::psk_rotation(inputs.integer("bitsPerSym")?)))
}

fn fsk_sensitivity(inputs: &Inputs<'_>) -> Result<Value, String> {
    Ok(Value::Real(formulas::fsk_sensitivity(
        inputs.real("excursion")?,
        inputs.real("sampRate")?,
    )))
}

fn ask_name(inputs: &Inputs<'_>) -> Result<Value, String> {
    Ok(Value::Text(formulas::modulation_name(inputs.integer("bitsPerSym")?, "ASK")))
}

fn psk_name(inputs: &Inputs<'_>) -> Result<Value, String> {
    Ok(Value::Text(formulas::modulation_name(inputs.integer("bitsPerSym")?, "PSK")))
}

fn fsk_name(inputs: &Inputs<'_>) -> Result<Value, String> {
    Ok(Value::Text(formulas::modulation_name(inputs.integer("bitsPerSym")?, "FSK")))
}
