//! FM transmitters: recorded audio, noise-masked subcarrier, subcarrier audio

use super::{
    center_freq, fixed_gain, output_ip_addr, samp_rate, switch, usrp_center_freq,
    USRP_SAMP_RATE_SINK,
};
use crate::domain::Kind;
use crate::firdes::{self, Window};
use crate::formulas;
use crate::parameter::{FlowgraphTable, Inputs, ParameterSpec};
use crate::value::Value;

/// Deviation of the main FM carrier in the subcarrier transmitter (kHz)
const MAIN_DEVIATION_KHZ: f64 = 10.0;

const NOISE_TAPS_SINK: &str = "filter_fft_low_pass_filter_0.set_taps";

pub(super) fn audio() -> FlowgraphTable {
    FlowgraphTable::new("fm-audio", "FM Audio Signal Generator")
        .parameter(output_ip_addr())
        .parameter(center_freq(50.0, 2200.0))
        .parameter(usrp_center_freq())
        .parameter(
            samp_rate(2.5e6)
                .with_sink(USRP_SAMP_RATE_SINK)
                .with_sink("analog_sig_source_x_0.set_sampling_freq"),
        )
        .parameter(fixed_gain(0.0))
        .parameter(
            ParameterSpec::primary("inputSelect", Kind::Choice)
                .with_options([0i64, 1, 2])
                .with_default(0i64)
                .with_sink("blocks_selector_0.set_input_index")
                .with_label("Input (audio / sine / none)"),
        )
        .parameter(
            ParameterSpec::primary("freqDev", Kind::Real)
                .with_range(0.0, 1000.0)
                .with_default(100.0)
                .with_label("Frequency Deviation (kHz)"),
        )
        .parameter(
            ParameterSpec::primary("sineFreq", Kind::Real)
                .with_range(1.0, 50_000.0)
                .with_default(1000.0)
                .with_sink("analog_sig_source_x_0.set_frequency")
                .with_label("Sine Frequency (Hz)"),
        )
        .parameter(
            ParameterSpec::derived(
                "fmSensitivity",
                Kind::Real,
                &["freqDev", "sampRate"],
                deviation_sensitivity,
            )
            .with_sink("analog_frequency_modulator_fc_0.set_sensitivity"),
        )
        .parameter(ParameterSpec::fixed("modName", Kind::Text, "FM"))
}

pub(super) fn subcarrier() -> FlowgraphTable {
    FlowgraphTable::new("fm-subcarrier", "FM Subcarrier Generator")
        .parameter(output_ip_addr())
        .parameter(center_freq(50.0, 2200.0))
        .parameter(usrp_center_freq())
        .parameter(
            samp_rate(2e6)
                .with_sink(USRP_SAMP_RATE_SINK)
                .with_sink("analog_sig_source_x_0.set_sampling_freq")
                .with_sink("blocks_throttle_0.set_sample_rate"),
        )
        .parameter(fixed_gain(20.0))
        .parameter(switch("subOnOff", 1).with_label("Subcarrier On / Off"))
        .parameter(
            ParameterSpec::primary("subLevel", Kind::Real)
                .with_range(-50.0, 0.0)
                .with_default(0.0)
                .with_label("Subcarrier Level (dB, display only)"),
        )
        .parameter(
            ParameterSpec::primary("noiseFreq", Kind::Choice)
                .with_options([700i64, 1000, 1500])
                .with_default(1000i64)
                .with_label("Noise Bandwidth (Hz)"),
        )
        .parameter(
            ParameterSpec::primary("noiseAmp", Kind::Real)
                .with_range(0.0, 20.0)
                .with_default(0.0)
                .with_label("Noise Amplitude (dB)"),
        )
        .parameter(
            ParameterSpec::primary("distortion", Kind::Real)
                .with_range(1.0, 10.0)
                .with_default(2.0)
                .with_label("Distortion (display only)"),
        )
        .parameter(
            ParameterSpec::primary("subFreq", Kind::Real)
                .with_range(1.0, 100.0)
                .with_default(60.0)
                .with_label("Subcarrier Frequency (kHz)"),
        )
        .parameter(
            ParameterSpec::derived(
                "noiseAmplitude",
                Kind::Real,
                &["subOnOff", "noiseAmp"],
                noise_amplitude,
            )
            .with_sink("analog_noise_source_x_0.set_amplitude"),
        )
        .parameter(
            ParameterSpec::derived("mainSensitivity", Kind::Real, &["sampRate"], main_sensitivity)
                .with_sink("analog_frequency_modulator_fc_0.set_sensitivity"),
        )
        .parameter(
            ParameterSpec::derived(
                "subSensitivity",
                Kind::Real,
                &["subFreq", "sampRate"],
                sub_tone_sensitivity,
            )
            .with_sink("analog_frequency_modulator_fc_1.set_sensitivity"),
        )
        .parameter(
            ParameterSpec::derived("subToneFreq", Kind::Real, &["subFreq"], sub_tone_hz)
                .with_sink("analog_sig_source_x_0.set_frequency"),
        )
        .parameter(
            ParameterSpec::derived("noiseTaps", Kind::Taps, &["noiseFreq"], masking_noise_taps)
                .with_sink(NOISE_TAPS_SINK),
        )
}

pub(super) fn subcarrier_audio() -> FlowgraphTable {
    FlowgraphTable::new("subcarrier-audio", "Subcarrier Recorded Audio Generator")
        .parameter(output_ip_addr())
        .parameter(center_freq(50.0, 2200.0))
        .parameter(usrp_center_freq())
        .parameter(samp_rate(2e6).with_sink(USRP_SAMP_RATE_SINK))
        .parameter(fixed_gain(0.0))
        .parameter(
            ParameterSpec::primary("subMod", Kind::Choice)
                .with_options([0i64, 1, 2, 3])
                .with_default(0i64)
                .with_sink("blocks_selector_0.set_input_index")
                .with_label("Subcarrier Modulation (FM / DSB / LSB / USB)"),
        )
        .parameter(
            ParameterSpec::primary("scFreq", Kind::Real)
                .with_range(10.0, 100.0)
                .with_default(20.0)
                .with_label("Subcarrier Frequency (kHz)"),
        )
        .parameter(
            switch("scCarrier", 0)
                .with_sink("blocks_add_const_vxx_0.set_k")
                .with_sink("blocks_add_const_vxx_0_0.set_k"),
        )
        .parameter(switch("noiseOnOff", 1).with_sink("blocks_multiply_const_vxx_0.set_k"))
        .parameter(
            ParameterSpec::primary("noiseFreq", Kind::Real)
                .with_range(200.0, 2000.0)
                .with_default(1000.0)
                .with_label("Noise Cutoff (Hz)"),
        )
        .parameter(
            ParameterSpec::derived(
                "subSensitivity",
                Kind::Real,
                &["scFreq", "sampRate"],
                subcarrier_sensitivity,
            )
            .with_sink("analog_frequency_modulator_fc_1.set_sensitivity"),
        )
        .parameter(
            ParameterSpec::derived("subToneFreq", Kind::Real, &["scFreq"], subcarrier_hz)
                .with_sink("analog_sig_source_x_0.set_frequency"),
        )
        .parameter(
            ParameterSpec::derived("noiseTaps", Kind::Taps, &["noiseFreq"], audio_noise_taps)
                .with_sink(NOISE_TAPS_SINK),
        )
}

fn deviation_sensitivity(inputs: &Inputs<'_>) -> Result<Value, String> {
    Ok(Value::Real(formulas::fm_sensitivity(
        inputs.real("freqDev")?,
        inputs.real("sampRate")?,
    )))
}

fn noise_amplitude(inputs: &Inputs<'_>) -> Result<Value, String> {
    Ok(Value::Real(formulas::noise_amplitude(
        inputs.integer("subOnOff")?,
        inputs.real("noiseAmp")?,
    )))
}

fn main_sensitivity(inputs: &Inputs<'_>) -> Result<Value, String> {
    Ok(Value::Real(formulas::fm_sensitivity(
        MAIN_DEVIATION_KHZ,
        inputs.real("sampRate")?,
    )))
}

fn sub_tone_sensitivity(inputs: &Inputs<'_>) -> Result<Value, String> {
    Ok(Value::Real(formulas::fm_sensitivity(
        inputs.real("subFreq")?,
        inputs.real("sampRate")?,
    )))
}

fn sub_tone_hz(inputs: &Inputs<'_>) -> Result<Value, String> {
    Ok(Value::Real(inputs.real("subFreq")? * 1000.0))
}

fn masking_noise_taps(inputs: &Inputs<'_>) -> Result<Value, String> {
    let cutoff = inputs.real("noiseFreq")?;
    let taps = firdes::low_pass(1.0, 50e3, cutoff, cutoff / 10.0, Window::Hamming)?;
    Ok(Value::Taps(taps))
}

fn subcarrier_sensitivity(inputs: &Inputs<'_>) -> Result<Value, String> {
    Ok(Value::Real(formulas::subcarrier_sensitivity(
        inputs.real("scFreq")?,
        inputs.real("sampRate")?,
    )))
}

fn subcarrier_hz(inputs: &Inputs<'_>) -> Result<Value, String> {
    Ok(Value::Real(inputs.real("scFreq")? * 1e3))
}

fn audio_noise_taps(inputs: &Inputs<'_>) -> Result<Value, String> {
    let taps = firdes::low_pass(1.0, 48_000.0, inputs.real("noiseFreq")?, 200.0, Window::Hamming)?;
    Ok(Value::Taps(taps))
}
