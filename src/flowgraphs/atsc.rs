//! ATSC 8-VSB transmitter fed from a recorded transport stream

use super::{
    amplitude_scale_full, center_freq, file_name, output_ip_addr, rf_power, samp_rate,
    usrp_center_freq, usrp_gain, USRP_SAMP_RATE_SINK,
};
use crate::domain::Kind;
use crate::firdes;
use crate::formulas;
use crate::parameter::{FlowgraphTable, Inputs, ParameterSpec};
use crate::value::Value;

/// Offset of the pilot rotation from the channel center (Hz)
const CHANNEL_HALF_WIDTH_HZ: f64 = 3e6;

const VSB_RRC_GAIN: f64 = 0.11;
const VSB_RRC_ALPHA: f64 = 0.1152;
const VSB_RRC_TAPS: usize = 200;

pub(super) fn table() -> FlowgraphTable {
    FlowgraphTable::new("atsc", "ATSC Signal Generator")
        .parameter(output_ip_addr())
        .parameter(center_freq(50.0, 2200.0))
        .parameter(usrp_center_freq())
        .parameter(samp_rate(12.5e6).with_sink(USRP_SAMP_RATE_SINK))
        .parameter(rf_power())
        .parameter(usrp_gain())
        .parameter(amplitude_scale_full("blocks_multiply_const_vxx_0.set_k"))
        .parameter(
            ParameterSpec::primary("symbolRate", Kind::Real)
                .with_range(1e6, 12.5e6)
                .with_default(formulas::atsc_symbol_rate())
                .with_label("Symbol Rate (sym/s)"),
        )
        .parameter(ParameterSpec::derived("pilotFreq", Kind::Real, &["symbolRate"], pilot_freq))
        .parameter(
            ParameterSpec::derived(
                "pilotPhaseInc",
                Kind::Real,
                &["pilotFreq", "symbolRate"],
                pilot_phase_inc,
            )
            .with_sink("blocks_rotator_cc_0.set_phase_inc"),
        )
        .parameter(
            ParameterSpec::derived("rrcTaps", Kind::Taps, &["symbolRate"], vsb_rrc_taps)
                .with_sink("fft_filter_xxx_0.set_taps"),
        )
        .parameter(
            file_name("tsFileName")
                .with_sink("blocks_file_source_0.open")
                .with_label("Transport Stream File"),
        )
}

fn pilot_freq(inputs: &Inputs<'_>) -> Result<Value, String> {
    Ok(Value::Real(formulas::atsc_pilot_freq(inputs.real("symbolRate")?)))
}

fn pilot_phase_inc(inputs: &Inputs<'_>) -> Result<Value, String> {
    Ok(Value::Real(formulas::phase_increment(
        CHANNEL_HALF_WIDTH_HZ,
        inputs.real("pilotFreq")?,
        inputs.real("symbolRate")?,
    )))
}

fn vsb_rrc_taps(inputs: &Inputs<'_>) -> Result<Value, String> {
    let symbol_rate = inputs.real("symbolRate")?;
    let taps = firdes::root_raised_cosine(
        VSB_RRC_GAIN,
        symbol_rate,
        symbol_rate / 2.0,
        VSB_RRC_ALPHA,
        VSB_RRC_TAPS,
    )?;
    Ok(Value::Taps(taps))
}
