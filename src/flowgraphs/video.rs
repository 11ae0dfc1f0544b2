//! Recorded-video transmitters: analog NTSC and AM video

use super::{
    amplitude_scale_backed_off, center_freq, file_name, output_ip_addr, rf_power, samp_rate,
    usrp_gain, USRP_CENTER_FREQ_SINK, USRP_GAIN_SINK, USRP_SAMP_RATE_SINK,
};
use crate::domain::Kind;
use crate::firdes::{self, Window};
use crate::formulas;
use crate::parameter::{FlowgraphTable, Inputs, ParameterSpec};
use crate::value::Value;

/// Picture carrier offset from the LO (Hz)
const NTSC_LO_OFFSET_HZ: f64 = 6e6;
/// Video low-pass cutoff and transition width (Hz)
const NTSC_VIDEO_CUTOFF_HZ: f64 = 2.475e6;
const NTSC_VIDEO_TRANSITION_HZ: f64 = 300e3;
/// Aural carrier deviation (kHz)
const NTSC_AUDIO_DEVIATION_KHZ: f64 = 25.0;
const VIDEO_PEAK: f64 = 0.9;

const FILE_SOURCE_SINK: &str = "blocks_file_source_0.open";

pub(super) fn ntsc() -> FlowgraphTable {
    FlowgraphTable::new("ntsc-video", "NTSC Video Signal Generator")
        .parameter(output_ip_addr())
        .parameter(center_freq(50.0, 2200.0))
        .parameter(
            ParameterSpec::derived("usrpCenterFreq", Kind::Real, &["centerFreq"], ntsc_center_freq)
                .with_sink(USRP_CENTER_FREQ_SINK)
                .with_label("USRP Center Frequency (Hz)"),
        )
        // The USRP runs at twice the baseband rate.
        .parameter(
            samp_rate(10e6)
                .with_sink("analog_sig_source_x_0.set_sampling_freq")
                .with_sink("analog_sig_source_x_0_0.set_sampling_freq")
                .with_sink("analog_sig_source_x_0_0_0.set_sampling_freq"),
        )
        .parameter(
            ParameterSpec::derived("usrpSampRate", Kind::Real, &["sampRate"], doubled_rate)
                .with_sink(USRP_SAMP_RATE_SINK)
                .with_sink("analog_sig_source_x_1.set_sampling_freq"),
        )
        .parameter(rf_power())
        .parameter(usrp_gain())
        .parameter(amplitude_scale_backed_off("blocks_multiply_const_vxx_2.set_k"))
        .parameter(
            ParameterSpec::primary("videoInvert", Kind::Choice)
                .with_options([-1i64, 1])
                .with_default(1i64)
                .with_label("Invert Video"),
        )
        .parameter(
            ParameterSpec::derived("videoScale", Kind::Real, &["videoInvert"], video_scale)
                .with_sink("blocks_multiply_const_vxx_0.set_k"),
        )
        .parameter(
            ParameterSpec::derived("audioSensitivity", Kind::Real, &["sampRate"], aural_sensitivity)
                .with_sink("analog_frequency_modulator_fc_0.set_sensitivity"),
        )
        .parameter(
            ParameterSpec::derived("videoTaps", Kind::Taps, &["sampRate"], video_taps)
                .with_sink("filter_fft_low_pass_filter_0.set_taps"),
        )
        .parameter(
            file_name("videoFileName")
                .with_sink(FILE_SOURCE_SINK)
                .with_label("Video File"),
        )
}

pub(super) fn am() -> FlowgraphTable {
    FlowgraphTable::new("am-video", "AM Video Signal Generator")
        .parameter(output_ip_addr())
        .parameter(center_freq(50.0, 2200.0))
        .parameter(super::usrp_center_freq())
        .parameter(samp_rate(20e6).with_sink(USRP_SAMP_RATE_SINK))
        .parameter(
            ParameterSpec::primary("power", Kind::Real)
                .with_range(0.0, 20.0)
                .with_default(0.0)
                .with_label("Output Power (dB)"),
        )
        .parameter(
            ParameterSpec::derived("gain", Kind::Real, &["power"], power_gain)
                .with_sink(USRP_GAIN_SINK)
                .with_label("USRP Gain (dB)"),
        )
        .parameter(
            ParameterSpec::primary("invertVideo", Kind::Choice)
                .with_options([1i64, 2])
                .with_default(1i64)
                .with_sink("blocks_multiply_const_vxx_0.set_k"),
        )
        .parameter(
            file_name("videoFileName")
                .with_sink(FILE_SOURCE_SINK)
                .with_label("Video File"),
        )
}

fn ntsc_center_freq(inputs: &Inputs<'_>) -> Result<Value, String> {
    Ok(Value::Real(
        formulas::center_frequency_hz(inputs.real("centerFreq")?) + NTSC_LO_OFFSET_HZ,
    ))
}

fn doubled_rate(inputs: &Inputs<'_>) -> Result<Value, String> {
    Ok(Value::Real(2.0 * inputs.real("sampRate")?))
}

fn video_scale(inputs: &Inputs<'_>) -> Result<Value, String> {
    Ok(Value::Real(inputs.integer("videoInvert")? as f64 * VIDEO_PEAK))
}

fn aural_sensitivity(inputs: &Inputs<'_>) -> Result<Value, String> {
    Ok(Value::Real(formulas::fm_sensitivity(
        NTSC_AUDIO_DEVIATION_KHZ,
        inputs.real("sampRate")?,
    )))
}

fn video_taps(inputs: &Inputs<'_>) -> Result<Value, String> {
    let taps = firdes::low_pass(
        1.0,
        inputs.real("sampRate")?,
        NTSC_VIDEO_CUTOFF_HZ,
        NTSC_VIDEO_TRANSITION_HZ,
        Window::Hamming,
    )?;
    Ok(Value::Taps(taps))
}

fn power_gain(inputs: &Inputs<'_>) -> Result<Value, String> {
    Ok(Value::Real(inputs.real("power")?))
}
