//! Pulse-position on-off keying transmitter

use super::{
    center_freq, fixed_gain, output_ip_addr, samp_rate, switch, usrp_center_freq,
    USRP_SAMP_RATE_SINK,
};
use crate::domain::Kind;
use crate::firdes::{self, Window};
use crate::formulas;
use crate::parameter::{FlowgraphTable, Inputs, ParameterSpec};
use crate::value::Value;

/// Samples blanked at the start of every frame by the gate vector
const GATE_BLANK_SAMPLES: usize = 10;

const AUDIO_RATE_HZ: f64 = 24_000.0;
const AUDIO_CUTOFF_HZ: f64 = 4_000.0;
const AUDIO_TRANSITION_HZ: f64 = 1_000.0;

pub(super) fn table() -> FlowgraphTable {
    FlowgraphTable::new("ppm-ook", "PPM OOK Signal Generator")
        .parameter(output_ip_addr())
        .parameter(center_freq(30.0, 2200.0))
        .parameter(usrp_center_freq())
        .parameter(samp_rate(20e6).with_sink(USRP_SAMP_RATE_SINK))
        .parameter(fixed_gain(10.0))
        .parameter(
            ParameterSpec::primary("sps", Kind::Integer)
                .with_range(20.0, 5000.0)
                .with_default(500i64)
                .with_label("Samples per Frame"),
        )
        .parameter(
            ParameterSpec::primary("pulseWidth", Kind::Choice)
                .with_options([10i64, 20, 40])
                .with_default(20i64)
                .with_label("Pulse Width (samples)"),
        )
        .parameter(
            ParameterSpec::primary("modLevel", Kind::Real)
                .with_range(0.1, 5.0)
                .with_default(1.0)
                .with_label("Modulation Level"),
        )
        .parameter(
            switch("coherence", 0)
                .with_sink("blocks_selector_0.set_input_index")
                .with_label("Coherent / Non-coherent"),
        )
        .parameter(
            switch("sourceIndex", 0)
                .with_sink("blocks_selector_1.set_input_index")
                .with_label("Audio Source (mic / file)"),
        )
        .parameter(
            ParameterSpec::derived("pulsePeriod", Kind::Real, &["sps", "sampRate"], pulse_period)
                .with_label("Pulse Period (us)"),
        )
        .parameter(
            ParameterSpec::derived("repeatInterp", Kind::Integer, &["sps"], repeat_interp)
                .with_sink("blocks_repeat_0.set_interpolation"),
        )
        .parameter(
            ParameterSpec::derived("frameTaps", Kind::Taps, &["sps"], frame_taps)
                .with_sink("fft_filter_xxx_0.set_taps"),
        )
        .parameter(
            ParameterSpec::derived("rampData", Kind::Taps, &["sps"], ramp_data)
                .with_sink("blocks_vector_source_x_0.set_data"),
        )
        .parameter(
            ParameterSpec::derived("gateData", Kind::Taps, &["sps"], gate_data)
                .with_sink("blocks_vector_source_x_0_0.set_data"),
        )
        .parameter(
            ParameterSpec::derived("pulseTaps", Kind::Taps, &["pulseWidth"], pulse_taps)
                .with_sink("fft_filter_xxx_0_0.set_taps"),
        )
        .parameter(
            ParameterSpec::derived("audioTaps", Kind::Taps, &["modLevel"], audio_taps)
                .with_sink("filter_fft_low_pass_filter_0.set_taps"),
        )
}

fn frame_len(inputs: &Inputs<'_>) -> Result<usize, String> {
    let sps = inputs.integer("sps")?;
    usize::try_from(sps).map_err(|_| format!("samples per frame must be positive, got {}", sps))
}

fn pulse_period(inputs: &Inputs<'_>) -> Result<Value, String> {
    Ok(Value::Real(formulas::pulse_period_us(
        inputs.real("sps")?,
        inputs.real("sampRate")?,
    )))
}

fn repeat_interp(inputs: &Inputs<'_>) -> Result<Value, String> {
    Ok(Value::Integer(inputs.integer("sps")?))
}

fn frame_taps(inputs: &Inputs<'_>) -> Result<Value, String> {
    Ok(Value::Taps(firdes::boxcar(frame_len(inputs)?)?))
}

/// Linear ramp from 1 down towards -1 over one frame
fn ramp_data(inputs: &Inputs<'_>) -> Result<Value, String> {
    let len = frame_len(inputs)?;
    let step = 2.0 / len as f64;
    Ok(Value::Taps((0..len).map(|i| 1.0 - step * i as f64).collect()))
}

fn gate_data(inputs: &Inputs<'_>) -> Result<Value, String> {
    let len = frame_len(inputs)?;
    if len <= GATE_BLANK_SAMPLES {
        return Err(format!(
            "frame of {} samples is shorter than the {}-sample gate",
            len, GATE_BLANK_SAMPLES
        ));
    }
    let mut gate = vec![0.0; GATE_BLANK_SAMPLES];
    gate.resize(len, 1.0);
    Ok(Value::Taps(gate))
}

fn pulse_taps(inputs: &Inputs<'_>) -> Result<Value, String> {
    let width = inputs.integer("pulseWidth")?;
    let width = usize::try_from(width).map_err(|_| format!("invalid pulse width {}", width))?;
    Ok(Value::Taps(firdes::boxcar(width)?))
}

fn audio_taps(inputs: &Inputs<'_>) -> Result<Value, String> {
    let taps = firdes::low_pass(
        inputs.real("modLevel")?,
        AUDIO_RATE_HZ,
        AUDIO_CUTOFF_HZ,
        AUDIO_TRANSITION_HZ,
        Window::Hamming,
    )?;
    Ok(Value::Taps(taps))
}
