//! End-to-end recomputation behaviour on the real transmitter tables

use txchain::config::ConfigRecord;
use txchain::error::{GraphError, SinkError};
use txchain::flowgraphs::{Transmitter, USRP_CENTER_FREQ_SINK, USRP_GAIN_SINK};
use txchain::formulas;
use txchain::parameter_set::ParameterSet;
use txchain::sink::SinkRecorder;
use txchain::value::Value;

fn am_config() -> ConfigRecord {
    ConfigRecord::new()
        .with("centerFreq", 100.0)
        .with("rfPwr", -60.0)
}

fn psk_config(bits: i64) -> ConfigRecord {
    ConfigRecord::new()
        .with("centerFreq", 915.0)
        .with("rfPwr", -60.0)
        .with("bitsPerSym", bits)
        .with("symRate", 100.0)
}

/// Bind a recorder to every sink the table declares
fn record_all(params: &mut ParameterSet) -> SinkRecorder {
    let recorder = SinkRecorder::new();
    let names: Vec<String> = params.graph().sink_names().map(str::to_string).collect();
    for name in &names {
        params.bind(name, recorder.sink(name)).unwrap();
    }
    recorder
}

#[test]
fn test_center_freq_reaches_usrp_sink() {
    let mut params = Transmitter::AmAudioLive.initialize(&am_config()).unwrap();
    let recorder = record_all(&mut params);

    let changes = params.set("centerFreq", 300.0).unwrap();
    let names: Vec<&str> = changes.iter().map(|c| c.parameter.as_str()).collect();
    assert_eq!(names, vec!["centerFreq", "usrpCenterFreq"]);
    assert_eq!(recorder.values_for(USRP_CENTER_FREQ_SINK), vec![Value::Real(300e6)]);
}

#[test]
fn test_center_freq_out_of_range() {
    let mut params = Transmitter::AmAudioLive.initialize(&am_config()).unwrap();
    let recorder = record_all(&mut params);

    for bad in [49.9, 2200.5, -1.0] {
        let err = params.set("centerFreq", bad).unwrap_err();
        assert!(
            matches!(err, GraphError::InvalidValue { ref parameter, .. } if parameter == "centerFreq"),
            "{} should be rejected, got {}",
            bad,
            err
        );
    }
    assert_eq!(params.real("centerFreq").unwrap(), 100.0);
    assert!(recorder.calls().is_empty());
}

#[test]
fn test_gain_hinge() {
    let mut params = Transmitter::AmSine.initialize(&am_config()).unwrap();
    let recorder = record_all(&mut params);

    params.set("rfPwr", -55.0).unwrap();
    assert_eq!(params.real("gain").unwrap(), 0.0);
    // gain was already 0 at -60 dBm, only the digital scale moves
    assert!(recorder.values_for(USRP_GAIN_SINK).is_empty());

    params.set("rfPwr", -40.0).unwrap();
    assert_eq!(params.real("gain").unwrap(), 10.0);
    assert_eq!(recorder.last(USRP_GAIN_SINK), Some(Value::Real(10.0)));
    assert_eq!(params.real("amplitudeScale").unwrap(), 0.95);
}

#[test]
fn test_achieved_symbol_rate_literal() {
    let mut params = Transmitter::Psk.initialize(&psk_config(2)).unwrap();
    assert_eq!(params.real("achievedSymRate").unwrap(), 100.0);
    assert_eq!(params.get("decimation").unwrap(), &Value::Integer(50));

    params.set("symRate", 77.0).unwrap();
    assert_eq!(params.get("decimation").unwrap(), &Value::Integer(64));
    assert_eq!(params.real("achievedSymRate").unwrap(), 78.125);
}

#[test]
fn test_symbol_rate_chain_order() {
    let mut params = Transmitter::Psk.initialize(&psk_config(2)).unwrap();
    let recorder = record_all(&mut params);

    let changes = params.set("symRate", 77.0).unwrap();
    let names: Vec<&str> = changes.iter().map(|c| c.parameter.as_str()).collect();
    assert_eq!(
        names,
        vec!["symRate", "decimation", "achievedSymRate", "sps", "bitRate", "rrcTaps"]
    );

    let sinks: Vec<String> = recorder.calls().into_iter().map(|c| c.sink).collect();
    assert_eq!(
        sinks,
        vec!["blocks_repeat_0.set_interpolation", "filter_fft_rrc_filter_0.set_taps"]
    );
}

#[test]
fn test_bits_per_symbol_triples_bit_rate() {
    let mut params = Transmitter::Psk.initialize(&psk_config(1)).unwrap();
    let recorder = record_all(&mut params);
    let achieved = params.real("achievedSymRate").unwrap();
    let before = params.real("bitRate").unwrap();

    params.set("bitsPerSym", 3).unwrap();

    assert_eq!(params.real("achievedSymRate").unwrap(), achieved);
    assert_eq!(params.real("bitRate").unwrap(), 3.0 * before);
    assert_eq!(
        recorder.last("blocks_multiply_const_vxx_1.set_k"),
        Some(Value::Complex(formulas::psk_rotation(3)))
    );
    assert_eq!(params.get("modName").unwrap(), &Value::from("8PSK"));
    // symbol timing untouched
    assert!(recorder.values_for("blocks_repeat_0.set_interpolation").is_empty());
}

#[test]
fn test_bits_per_symbol_updates_level_scale() {
    let config = ConfigRecord::new()
        .with("centerFreq", 433.0)
        .with("rfPwr", -45.0)
        .with("bitsPerSym", 1)
        .with("symRate", 100.0);
    let mut params = Transmitter::Ask.initialize(&config).unwrap();
    let recorder = record_all(&mut params);

    params.set("bitsPerSym", 3).unwrap();
    assert_eq!(
        recorder.values_for("blocks_multiply_const_vxx_1.set_k"),
        vec![Value::Real(1.0 / 7.0)]
    );
    assert_eq!(params.real("bitRate").unwrap(), 300.0);
}

#[test]
fn test_missing_center_freq_is_configuration_error() {
    let config = ConfigRecord::new().with("rfPwr", -60.0);
    let err = Transmitter::AmAudioLive.initialize(&config).unwrap_err();
    assert!(matches!(err, GraphError::Configuration { ref parameter, .. } if parameter == "centerFreq"));
}

#[test]
fn test_unknown_and_derived_config_keys() {
    let err = Transmitter::AmSine
        .initialize(&am_config().with("bogus", 1.0))
        .unwrap_err();
    assert!(matches!(err, GraphError::Configuration { ref parameter, .. } if parameter == "bogus"));

    let err = Transmitter::AmSine
        .initialize(&am_config().with("gain", 3.0))
        .unwrap_err();
    assert!(matches!(err, GraphError::Configuration { ref parameter, .. } if parameter == "gain"));
}

#[test]
fn test_repeated_set_has_no_effect() {
    let mut params = Transmitter::Fsk
        .initialize(
            &ConfigRecord::new()
                .with("centerFreq", 915.0)
                .with("rfPwr", -50.0)
                .with("bitsPerSym", 2)
                .with("symRate", 50.0)
                .with("excursion", 25.0),
        )
        .unwrap();
    let recorder = record_all(&mut params);

    assert!(!params.set("excursion", 40.0).unwrap().is_empty());
    recorder.clear();
    assert!(params.set("excursion", 40.0).unwrap().is_empty());
    assert!(recorder.calls().is_empty());
}

#[test]
fn test_filter_design_failure_is_atomic() {
    let config = ConfigRecord::new()
        .with("centerFreq", 200.0)
        .with("rfPwr", -60.0)
        .with("videoFileName", "test.bin");
    let mut params = Transmitter::NtscVideo.initialize(&config).unwrap();
    let recorder = record_all(&mut params);
    let before: Vec<Value> = params.values().into_iter().map(|(_, v)| v.clone()).collect();

    // 2.475 MHz video cutoff needs at least 4.95 Msps
    let err = params.set("sampRate", 2e6).unwrap_err();
    assert!(matches!(err, GraphError::Evaluation { ref parameter, .. } if parameter == "videoTaps"));

    let after: Vec<Value> = params.values().into_iter().map(|(_, v)| v.clone()).collect();
    assert_eq!(before, after);
    assert!(recorder.calls().is_empty());
}

#[test]
fn test_sink_failure_propagates_after_commit() {
    let mut params = Transmitter::AmAudioLive.initialize(&am_config()).unwrap();
    let recorder = SinkRecorder::new();
    params
        .bind(USRP_CENTER_FREQ_SINK, |_: &Value| -> Result<(), SinkError> {
            Err("USRP not responding".into())
        })
        .unwrap();
    params
        .bind(USRP_GAIN_SINK, recorder.sink(USRP_GAIN_SINK))
        .unwrap();

    let err = params.set("centerFreq", 915.0).unwrap_err();
    match err {
        GraphError::Sink { sink, parameter, source } => {
            assert_eq!(sink, USRP_CENTER_FREQ_SINK);
            assert_eq!(parameter, "usrpCenterFreq");
            assert_eq!(source.to_string(), "USRP not responding");
        }
        other => panic!("expected sink error, got {}", other),
    }
    assert_eq!(params.real("usrpCenterFreq").unwrap(), 915e6);
}

#[test]
fn test_bind_unknown_sink() {
    let mut params = Transmitter::AmAudioLive.initialize(&am_config()).unwrap();
    let recorder = SinkRecorder::new();
    let err = params
        .bind("uhd_usrp_sink_0.set_antenna", recorder.sink("x"))
        .unwrap_err();
    assert!(matches!(err, GraphError::UnknownSink(_)));
}

#[test]
fn test_apply_initial_sinks_pushes_everything_bound() {
    let mut params = Transmitter::Atsc
        .initialize(
            &ConfigRecord::new()
                .with("centerFreq", 600.0)
                .with("rfPwr", -70.0)
                .with("tsFileName", "stream.ts"),
        )
        .unwrap();
    let recorder = record_all(&mut params);
    let bound = params.bound_sinks().len();

    assert_eq!(params.apply_initial_sinks().unwrap(), bound);
    assert_eq!(recorder.calls().len(), bound);
    assert_eq!(
        recorder.last("blocks_file_source_0.open"),
        Some(Value::from("stream.ts"))
    );
}

fn sink_calls_after(
    transmitter: Transmitter,
    config: &ConfigRecord,
    name: &str,
    value: f64,
) -> Vec<String> {
    let mut params = transmitter.initialize(config).unwrap();
    let recorder = record_all(&mut params);
    params.set(name, value).unwrap();
    recorder.calls().into_iter().map(|c| c.sink).collect()
}

#[test]
fn test_sample_rate_retunes_every_source() {
    assert_eq!(
        sink_calls_after(Transmitter::AmSine, &am_config(), "sampRate", 8e6),
        vec![
            "uhd_usrp_sink_0.set_samp_rate",
            "analog_sig_source_x_1.set_sampling_freq",
        ]
    );

    let fm = ConfigRecord::new().with("centerFreq", 100.0);
    assert_eq!(
        sink_calls_after(Transmitter::FmAudio, &fm, "sampRate", 8e6),
        vec![
            "uhd_usrp_sink_0.set_samp_rate",
            "analog_sig_source_x_0.set_sampling_freq",
            "analog_frequency_modulator_fc_0.set_sensitivity",
        ]
    );
    assert_eq!(
        sink_calls_after(Transmitter::FmSubcarrier, &fm, "sampRate", 8e6),
        vec![
            "uhd_usrp_sink_0.set_samp_rate",
            "analog_sig_source_x_0.set_sampling_freq",
            "blocks_throttle_0.set_sample_rate",
            "analog_frequency_modulator_fc_0.set_sensitivity",
            "analog_frequency_modulator_fc_1.set_sensitivity",
        ]
    );

    let ntsc = ConfigRecord::new()
        .with("centerFreq", 200.0)
        .with("rfPwr", -60.0)
        .with("videoFileName", "test.bin");
    assert_eq!(
        sink_calls_after(Transmitter::NtscVideo, &ntsc, "sampRate", 8e6),
        vec![
            "analog_sig_source_x_0.set_sampling_freq",
            "analog_sig_source_x_0_0.set_sampling_freq",
            "analog_sig_source_x_0_0_0.set_sampling_freq",
            "uhd_usrp_sink_0.set_samp_rate",
            "analog_sig_source_x_1.set_sampling_freq",
            "analog_frequency_modulator_fc_0.set_sensitivity",
            "filter_fft_low_pass_filter_0.set_taps",
        ]
    );
}

#[test]
fn test_ntsc_mixer_runs_at_usrp_rate() {
    let config = ConfigRecord::new()
        .with("centerFreq", 200.0)
        .with("rfPwr", -60.0)
        .with("videoFileName", "test.bin");
    let mut params = Transmitter::NtscVideo.initialize(&config).unwrap();
    let recorder = record_all(&mut params);

    params.set("sampRate", 8e6).unwrap();
    assert_eq!(
        recorder.values_for("analog_sig_source_x_1.set_sampling_freq"),
        vec![Value::Real(16e6)]
    );
    assert_eq!(
        recorder.values_for("analog_sig_source_x_0.set_sampling_freq"),
        vec![Value::Real(8e6)]
    );
}

#[test]
fn test_ppm_source_index_drives_its_own_selector() {
    let mut params = Transmitter::PpmOok
        .initialize(&ConfigRecord::new().with("centerFreq", 915.0))
        .unwrap();
    let recorder = record_all(&mut params);

    let changes = params.set("sourceIndex", 1).unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(
        recorder.values_for("blocks_selector_1.set_input_index"),
        vec![Value::Integer(1)]
    );
    assert!(recorder.values_for("blocks_selector_0.set_input_index").is_empty());

    params.set("coherence", 1).unwrap();
    assert_eq!(
        recorder.last("blocks_selector_0.set_input_index"),
        Some(Value::Integer(1))
    );
    assert_eq!(recorder.values_for("blocks_selector_1.set_input_index").len(), 1);
}

#[test]
fn test_fsk_excursion_defaults_to_100_khz() {
    let config = ConfigRecord::new()
        .with("centerFreq", 915.0)
        .with("rfPwr", -50.0)
        .with("bitsPerSym", 1)
        .with("symRate", 50.0);
    let params = Transmitter::Fsk.initialize(&config).unwrap();
    assert_eq!(params.real("excursion").unwrap(), 100.0);
    assert_eq!(
        params.real("fmSensitivity").unwrap(),
        formulas::fsk_sensitivity(100.0, params.real("sampRate").unwrap())
    );
}
