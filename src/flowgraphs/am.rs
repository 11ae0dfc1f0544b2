//! AM voice transmitters: live audio and internal sine tone

use super::{
    amplitude_scale_backed_off, center_freq, output_ip_addr, rf_power, samp_rate, switch,
    usrp_gain, USRP_CENTER_FREQ_SINK, USRP_SAMP_RATE_SINK,
};
use crate::domain::Kind;
use crate::formulas;
use crate::parameter::{FlowgraphTable, Inputs, ParameterSpec};
use crate::value::Value;

/// USRP tuning offset of the sine generator, keeping the carrier off the LO
const SINE_LO_OFFSET_HZ: f64 = 330e3;

pub(super) fn audio_live() -> FlowgraphTable {
    FlowgraphTable::new(
        "am-audio-live",
        "AM Audio Signal Generator from Internal Audio Card",
    )
    .parameter(output_ip_addr())
    .parameter(
        ParameterSpec::primary("usrpNum", Kind::Integer)
            .with_range(1.0, 16.0)
            .with_default(1i64)
            .with_label("USRP Number"),
    )
    .parameter(ParameterSpec::derived("mikePort", Kind::Integer, &["usrpNum"], mike_port))
    .parameter(center_freq(50.0, 2200.0))
    .parameter(super::usrp_center_freq())
    .parameter(samp_rate(2e6).with_sink(USRP_SAMP_RATE_SINK))
    .parameter(rf_power())
    .parameter(usrp_gain())
    .parameter(mod_index().with_sink("blocks_multiply_const_vxx_2.set_k"))
    .parameter(switch("carrier", 1).with_sink("blocks_add_const_vxx_0.set_k"))
    .parameter(sideband())
    .parameter(sideband_type())
    .parameter(ParameterSpec::fixed("modName", Kind::Text, "AM"))
}

pub(super) fn sine() -> FlowgraphTable {
    FlowgraphTable::new("am-sine", "AM Sine Wave Generator")
        .parameter(output_ip_addr())
        .parameter(center_freq(50.0, 2200.0))
        .parameter(
            ParameterSpec::derived(
                "usrpCenterFreq",
                Kind::Real,
                &["centerFreq"],
                offset_center_freq,
            )
            .with_sink(USRP_CENTER_FREQ_SINK)
            .with_label("USRP Center Frequency (Hz)"),
        )
        .parameter(
            samp_rate(2e6)
                .with_sink(USRP_SAMP_RATE_SINK)
                .with_sink("analog_sig_source_x_1.set_sampling_freq"),
        )
        .parameter(rf_power())
        .parameter(usrp_gain())
        .parameter(amplitude_scale_backed_off("analog_sig_source_x_1.set_amplitude"))
        .parameter(
            ParameterSpec::primary("sineFreq", Kind::Real)
                .with_range(0.1, 20_000.0)
                .with_default(1000.0)
                .with_sink("analog_sig_source_x_0.set_frequency")
                .with_label("Sine Frequency (Hz)"),
        )
        .parameter(mod_index().with_sink("analog_sig_source_x_0.set_amplitude"))
        .parameter(switch("carrier", 1).with_sink("blocks_add_const_vxx_0.set_k"))
        .parameter(sideband())
        .parameter(sideband_type())
        .parameter(ParameterSpec::fixed("modName", Kind::Text, "AM"))
}

fn mod_index() -> ParameterSpec {
    ParameterSpec::primary("modIndex", Kind::Real)
        .with_range(0.0, 10.0)
        .with_default(1.0)
        .with_label("Modulation Index")
}

/// 0 double sideband, 1 single sideband
fn sideband() -> ParameterSpec {
    switch("sideband", 0)
        .with_sink("blocks_selector_2.set_input_index")
        .with_label("Single / Double Sideband")
}

/// -1 lower, 1 upper
fn sideband_type() -> ParameterSpec {
    ParameterSpec::primary("sidebandType", Kind::Choice)
        .with_options([-1i64, 1])
        .with_default(1i64)
        .with_sink("blocks_multiply_const_vxx_0.set_k")
        .with_label("Lower / Upper Sideband")
}

fn mike_port(inputs: &Inputs<'_>) -> Result<Value, String> {
    Ok(Value::Integer(formulas::mike_port(inputs.integer("usrpNum")?)))
}

fn offset_center_freq(inputs: &Inputs<'_>) -> Result<Value, String> {
    Ok(Value::Real(
        formulas::center_frequency_hz(inputs.real("centerFreq")?) - SINE_LO_OFFSET_HZ,
    ))
}
