//! Demo CLI: encode a report to a WAV file, or decode one.

use std::env;
use std::process::ExitCode;

use rustywspr::message::CallsignHashCache;
use rustywspr::{decode, encode_to_samples, tracing_init, DecoderConfig};

fn main() -> ExitCode {
    tracing_init::init_tracing();

    let mut args: Vec<String> = env::args().skip(1).collect();
    let lsb = args.iter().any(|a| a == "--lsb");
    args.retain(|a| a != "--lsb");

    let result = match args.first().map(|s| s.as_str()) {
        Some("encode") if args.len() >= 5 => {
            let offset = args.get(5).and_then(|a| a.parse().ok()).unwrap_or(0);
            cmd_encode(&args[1], &args[2], &args[3], &args[4], offset, lsb)
        }
        Some("decode") if args.len() >= 2 => {
            let dial = args.get(2).and_then(|a| a.parse().ok()).unwrap_or(14.0956);
            cmd_decode(&args[1], dial, lsb)
        }
        _ => {
            eprintln!("usage: rustywspr encode CALL GRID POWER OUT.wav [OFFSET_HZ] [--lsb]");
            eprintln!("       rustywspr decode IN.wav [DIAL_MHZ] [--lsb]");
            return ExitCode::FAILURE;
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_encode(
    call: &str,
    grid: &str,
    power: &str,
    path: &str,
    offset_hz: i32,
    lsb: bool,
) -> Result<(), String> {
    let power: i32 = power.parse().map_err(|_| format!("bad power '{}'", power))?;
    let samples = encode_to_samples(call, grid, power, offset_hz, lsb).map_err(|e| e.to_string())?;

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 12_000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).map_err(|e| e.to_string())?;
    for s in samples {
        writer.write_sample(s).map_err(|e| e.to_string())?;
    }
    writer.finalize().map_err(|e| e.to_string())?;
    println!("wrote {}", path);
    Ok(())
}

fn cmd_decode(path: &str, dial_mhz: f64, lsb: bool) -> Result<(), String> {
    let mut reader = hound::WavReader::open(path).map_err(|e| e.to_string())?;
    let spec = reader.spec();
    if spec.sample_rate != 12_000 || spec.channels != 1 || spec.bits_per_sample != 16 {
        return Err(format!(
            "expected 12 kHz mono 16-bit WAV, got {} Hz / {} ch / {} bit",
            spec.sample_rate, spec.channels, spec.bits_per_sample
        ));
    }

    let mut pcm = Vec::new();
    for s in reader.samples::<i16>() {
        let s = s.map_err(|e| e.to_string())?;
        pcm.extend_from_slice(&s.to_le_bytes());
    }

    let mut cache = CallsignHashCache::new();
    let results = decode(&pcm, dial_mhz, lsb, &mut cache, &DecoderConfig::default())
        .map_err(|e| e.to_string())?;

    if results.is_empty() {
        println!("no decodes");
    }
    for r in results {
        println!(
            "{:>6.1} dB  {:>10.4} MHz  {:+5.1} s  {:+6.3} Hz/s  {}",
            r.snr_db, r.freq_mhz, r.time_offset_s, r.drift_hz_s, r.message
        );
    }
    Ok(())
}
