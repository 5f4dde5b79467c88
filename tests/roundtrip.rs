//! End-to-end encode → decode round trips on clean signals.


use rustywspr::message::CallsignHashCache;
use rustywspr::{decode, encode, encode_to_frequencies, DecodeError, DecoderConfig};
use test_utils::window_with_signal;

#[test]
fn q0qqq_roundtrip() {
    let pcm = encode("Q0QQQ", "FN20", 30, 0, false).unwrap();
    assert_eq!(pcm.len(), 2_654_208);

    // First non-zero sample stays inside the quarter-scale amplitude.
    let first = pcm
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]))
        .find(|&s| s != 0)
        .unwrap();
    assert!(first.unsigned_abs() <= 4095);

    // The encoder's own output is long enough to decode directly.
    let mut cache = CallsignHashCache::new();
    let results = decode(&pcm, 14.0956, false, &mut cache, &DecoderConfig::default()).unwrap();
    assert_eq!(results.len(), 1);
    let r = &results[0];
    assert_eq!(r.callsign, "Q0QQQ");
    assert_eq!(r.grid, "FN20");
    assert_eq!(r.power_dbm, 30);
    assert_eq!(r.message, "Q0QQQ FN20 30");
}

#[test]
fn k1jt_measurements_are_tight() {
    let pcm = encode("K1JT", "FN20", 37, 0, false).unwrap();
    let window = window_with_signal(&pcm, 0.0);

    let mut cache = CallsignHashCache::new();
    let results = decode(&window, 14.0956, false, &mut cache, &DecoderConfig::default()).unwrap();
    assert_eq!(results.len(), 1);
    let r = &results[0];
    assert_eq!(r.message, "K1JT FN20 37");
    assert!(r.freq_offset_hz.abs() < 1.5, "freq {}", r.freq_offset_hz);
    assert!(r.time_offset_s.abs() < 0.1, "time {}", r.time_offset_s);
    assert!(r.drift_hz_s.abs() < 0.01, "drift {}", r.drift_hz_s);
    assert!(r.snr_db > 20.0, "snr {}", r.snr_db);
    assert!((r.freq_mhz - 14.0971).abs() < 2e-5, "label {}", r.freq_mhz);
}

#[test]
fn offset_and_delay_are_recovered() {
    let pcm = encode("W1ABC", "FN20", 30, 87, false).unwrap();
    let window = window_with_signal(&pcm, 0.7);

    let mut cache = CallsignHashCache::new();
    let results = decode(&window, 14.0956, false, &mut cache, &DecoderConfig::default()).unwrap();
    assert_eq!(results.len(), 1);
    let r = &results[0];
    assert_eq!(r.message, "W1ABC FN20 30");
    assert!((r.freq_offset_hz - 87.0).abs() < 1.5, "freq {}", r.freq_offset_hz);
    assert!((r.time_offset_s - 0.7).abs() < 0.1, "time {}", r.time_offset_s);
}

#[test]
fn lsb_roundtrip() {
    let pcm = encode("G8XYZ", "IO91", 23, 0, true).unwrap();
    let window = window_with_signal(&pcm, 0.0);

    let mut cache = CallsignHashCache::new();
    let results = decode(&window, 7.0386, true, &mut cache, &DecoderConfig::default()).unwrap();
    assert_eq!(results.len(), 1);
    let r = &results[0];
    assert_eq!(r.callsign, "G8XYZ");
    assert_eq!(r.grid, "IO91");
    assert_eq!(r.power_dbm, 23);
    assert!(r.freq_offset_hz.abs() < 1.5, "freq {}", r.freq_offset_hz);
}

#[test]
fn power_snaps_through_the_roundtrip() {
    // 29 dBm is not a legal level; it must come back as 30.
    let pcm = encode("K1JT", "FN20", 29, 0, false).unwrap();
    let window = window_with_signal(&pcm, 0.0);
    let mut cache = CallsignHashCache::new();
    let results = decode(&window, 14.0956, false, &mut cache, &DecoderConfig::default()).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].power_dbm, 30);
}

#[test]
fn offset_moves_every_frequency_by_exactly_100000_centihertz() {
    let base = encode_to_frequencies("K1JT", "FN20", 37, 0, false).unwrap();
    let moved = encode_to_frequencies("K1JT", "FN20", 37, 1000, false).unwrap();
    for (b, m) in base.iter().zip(moved.iter()) {
        assert_eq!(m - b, 100_000);
    }
}

#[test]
fn silence_decodes_to_nothing() {
    let window = vec![0u8; test_utils::WINDOW_SAMPLES * 2];
    let mut cache = CallsignHashCache::new();
    let results = decode(&window, 14.0956, false, &mut cache, &DecoderConfig::default()).unwrap();
    assert!(results.is_empty());
}

#[test]
fn short_capture_is_rejected() {
    let mut cache = CallsignHashCache::new();
    let pcm = vec![0u8; 2_000_000]; // 1M samples < one transmission
    assert!(matches!(
        decode(&pcm, 14.0956, false, &mut cache, &DecoderConfig::default()),
        Err(DecodeError::InsufficientData { .. })
    ));
}

#[test]
fn no_duplicate_tuples_in_output() {
    let pcm = encode("K1JT", "FN20", 37, 0, false).unwrap();
    let window = window_with_signal(&pcm, 0.0);
    let mut cache = CallsignHashCache::new();
    let results = decode(&window, 14.0956, false, &mut cache, &DecoderConfig::default()).unwrap();
    for i in 0..results.len() {
        for j in i + 1..results.len() {
            let (a, b) = (&results[i], &results[j]);
            let same = a.callsign == b.callsign
                && a.grid == b.grid
                && a.power_dbm == b.power_dbm
                && ((a.snr_db - b.snr_db) * 10.0).round() == 0.0;
            assert!(!same, "duplicate decode at {} and {}", i, j);
        }
    }
}
