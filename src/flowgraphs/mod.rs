//! Transmitter flow-graph tables
//!
//! One declarative parameter table per transmitter variant, plus the
//! `Transmitter` registry used by the CLI. Entries that every USRP
//! transmitter shares (output address, center frequency, sample rate, power
//! control) are built by the helpers in this module.

mod am;
mod atsc;
mod digital;
mod fm;
mod ppm_ook;
mod video;

use crate::config::{ConfigRecord, DEFAULT_USRP_ADDRESS};
use crate::domain::Kind;
use crate::error::GraphResult;
use crate::formulas;
use crate::parameter::{FlowgraphTable, Inputs, ParameterSpec};
use crate::parameter_set::{ParameterGraph, ParameterSet};
use crate::value::Value;
use clap::ValueEnum;
use std::fmt;
use std::sync::Arc;

pub const USRP_CENTER_FREQ_SINK: &str = "uhd_usrp_sink_0.set_center_freq";
pub const USRP_SAMP_RATE_SINK: &str = "uhd_usrp_sink_0.set_samp_rate";
pub const USRP_GAIN_SINK: &str = "uhd_usrp_sink_0.set_gain";

/// Every transmitter flow graph with a parameter table
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum)]
pub enum Transmitter {
    /// AM from the internal audio card or a live microphone stream
    AmAudioLive,
    /// AM modulated by an internal sine tone
    AmSine,
    /// Amplitude-shift keying
    Ask,
    /// Phase-shift keying
    Psk,
    /// Frequency-shift keying with Gaussian shaping
    Fsk,
    /// Wideband FM from recorded audio or a sine tone
    FmAudio,
    /// FM with a noise-masked subcarrier
    FmSubcarrier,
    /// Recorded audio on an FM/DSB/SSB subcarrier
    SubcarrierAudio,
    /// Analog NTSC television from a recorded video file
    NtscVideo,
    /// AM video from a recorded file
    AmVideo,
    /// ATSC 8-VSB from a transport stream
    Atsc,
    /// Pulse-position on-off keying
    PpmOok,
}

impl Transmitter {
    pub fn all() -> &'static [Transmitter] {
        Transmitter::value_variants()
    }

    /// Command-line name, e.g. `am-audio-live`
    pub fn name(self) -> String {
        self.to_possible_value()
            .map(|v| v.get_name().to_string())
            .unwrap_or_default()
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Transmitter::from_str(name, true).ok()
    }

    /// Declarative parameter table of this transmitter
    pub fn table(self) -> FlowgraphTable {
        match self {
            Transmitter::AmAudioLive => am::audio_live(),
            Transmitter::AmSine => am::sine(),
            Transmitter::Ask => digital::ask(),
            Transmitter::Psk => digital::psk(),
            Transmitter::Fsk => digital::fsk(),
            Transmitter::FmAudio => fm::audio(),
            Transmitter::FmSubcarrier => fm::subcarrier(),
            Transmitter::SubcarrierAudio => fm::subcarrier_audio(),
            Transmitter::NtscVideo => video::ntsc(),
            Transmitter::AmVideo => video::am(),
            Transmitter::Atsc => atsc::table(),
            Transmitter::PpmOok => ppm_ook::table(),
        }
    }

    pub fn graph(self) -> GraphResult<ParameterGraph> {
        ParameterGraph::build(self.table())
    }

    /// Build the table and initialize a parameter set from `config`
    pub fn initialize(self, config: &ConfigRecord) -> GraphResult<ParameterSet> {
        ParameterSet::initialize(Arc::new(self.graph()?), config)
    }
}

impl fmt::Display for Transmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// Shared table entries

pub(crate) fn output_ip_addr() -> ParameterSpec {
    ParameterSpec::primary("outputIpAddr", Kind::Text)
        .with_default(DEFAULT_USRP_ADDRESS)
        .with_label("USRP IP Address")
}

/// Required center frequency in MHz
pub(crate) fn center_freq(min: f64, max: f64) -> ParameterSpec {
    ParameterSpec::primary("centerFreq", Kind::Real)
        .with_range(min, max)
        .with_label("Center Frequency (MHz)")
}

pub(crate) fn usrp_center_freq() -> ParameterSpec {
    ParameterSpec::derived("usrpCenterFreq", Kind::Real, &["centerFreq"], usrp_center_freq_hz)
        .with_sink(USRP_CENTER_FREQ_SINK)
        .with_label("USRP Center Frequency (Hz)")
}

fn usrp_center_freq_hz(inputs: &Inputs<'_>) -> Result<Value, String> {
    Ok(Value::Real(formulas::center_frequency_hz(inputs.real("centerFreq")?)))
}

pub(crate) fn samp_rate(default: f64) -> ParameterSpec {
    ParameterSpec::primary("sampRate", Kind::Real)
        .with_range(1e6, 25e6)
        .with_default(default)
        .with_label("Sample Rate (S/s)")
}

/// Required RF output power in dBm
pub(crate) fn rf_power() -> ParameterSpec {
    ParameterSpec::primary("rfPwr", Kind::Real)
        .with_range(-80.0, -30.0)
        .with_label("RF Output Power (dBm)")
}

/// USRP gain from `rfPwr`, hinged at -50 dBm
pub(crate) fn usrp_gain() -> ParameterSpec {
    ParameterSpec::derived("gain", Kind::Real, &["rfPwr"], gain_from_power)
        .with_sink(USRP_GAIN_SINK)
        .with_label("USRP Gain (dB)")
}

fn gain_from_power(inputs: &Inputs<'_>) -> Result<Value, String> {
    Ok(Value::Real(formulas::usrp_gain(inputs.real("rfPwr")?)))
}

/// USRP gain hard-wired by the flow graph
pub(crate) fn fixed_gain(gain: f64) -> ParameterSpec {
    ParameterSpec::fixed("gain", Kind::Real, gain)
        .with_sink(USRP_GAIN_SINK)
        .with_label("USRP Gain (dB)")
}

/// Pre-USRP attenuation with 0.95 head-room
pub(crate) fn amplitude_scale_backed_off(sink: &str) -> ParameterSpec {
    ParameterSpec::derived("amplitudeScale", Kind::Real, &["rfPwr"], backed_off_scale)
        .with_sink(sink)
}

/// Pre-USRP attenuation at full scale
pub(crate) fn amplitude_scale_full(sink: &str) -> ParameterSpec {
    ParameterSpec::derived("amplitudeScale", Kind::Real, &["rfPwr"], full_scale)
        .with_sink(sink)
}

fn backed_off_scale(inputs: &Inputs<'_>) -> Result<Value, String> {
    Ok(Value::Real(formulas::amplitude_scale(inputs.real("rfPwr")?, 0.95)))
}

fn full_scale(inputs: &Inputs<'_>) -> Result<Value, String> {
    Ok(Value::Real(formulas::amplitude_scale(inputs.real("rfPwr")?, 1.0)))
}

/// On/off selection
pub(crate) fn switch(name: &str, default: i64) -> ParameterSpec {
    ParameterSpec::primary(name, Kind::Choice)
        .with_options([0i64, 1])
        .with_default(default)
}

/// Required media file name
pub(crate) fn file_name(name: &str) -> ParameterSpec {
    ParameterSpec::primary(name, Kind::Text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        assert_eq!(Transmitter::AmAudioLive.name(), "am-audio-live");
        assert_eq!(Transmitter::PpmOok.name(), "ppm-ook");
        for &t in Transmitter::all() {
            assert_eq!(Transmitter::from_name(&t.name()), Some(t));
        }
        assert_eq!(Transmitter::from_name("morse"), None);
    }

    #[test]
    fn test_every_table_builds() {
        assert_eq!(Transmitter::all().len(), 12);
        for &t in Transmitter::all() {
            let graph = t.graph().unwrap_or_else(|e| panic!("{}: {}", t, e));
            assert_eq!(graph.name(), t.name());
            for shared in ["outputIpAddr", "centerFreq", "usrpCenterFreq", "sampRate", "gain"] {
                assert!(graph.find(shared).is_some(), "{} lacks {}", t, shared);
            }
            assert!(graph.sink_names().any(|s| s == USRP_CENTER_FREQ_SINK));
            assert!(graph.sink_names().any(|s| s == USRP_GAIN_SINK));
        }
    }
}
