//! Fano sequential decoder for the rate-1/2 convolutional code.
//!
//! Depth-first trellis search with a moving threshold: advance while the
//! path metric stays above the threshold, tighten it on first visits, back
//! up and try sibling branches when the metric dips, and loosen the
//! threshold when no predecessor survives. The 31-bit flush tail is built
//! into the trellis — beyond the information bits only the zero branch
//! exists — so any returned path carries a valid tail.
//!
//! Branch metrics come from a table over the 0..=255 soft-symbol range,
//! derived from a sigmoid LLR model with the code-rate bias subtracted, so
//! the correct path drifts upward and random paths drift firmly down.

use crate::constants::{PAYLOAD_BITS, SYMBOL_COUNT, TAIL_BITS};
use crate::fec::convolutional::{parity32, POLY_1, POLY_2};

/// Branches in one full path: 50 information bits plus the flush tail.
const BRANCHES: usize = PAYLOAD_BITS + TAIL_BITS;

/// Tuning knobs for the sequential search.
#[derive(Debug, Clone)]
pub struct FanoConfig {
    /// Threshold spacing. Larger values back up less but follow bad paths
    /// further.
    pub delta: i32,
    /// Abandon the candidate after this many search steps.
    pub max_cycles: usize,
    /// Code-rate bias subtracted from each channel bit's metric, in bits.
    pub metric_bias: f64,
    /// LLR carried by one step of the soft-symbol scale.
    pub metric_slope: f64,
}

impl Default for FanoConfig {
    fn default() -> Self {
        Self {
            delta: 64,
            max_cycles: 100_000,
            metric_bias: 0.45,
            metric_slope: 0.03,
        }
    }
}

/// A successfully decoded path.
#[derive(Debug, Clone, Copy)]
pub struct FanoOutcome {
    /// The 50 recovered information bits.
    pub payload: u64,
    /// Search steps spent.
    pub cycles: usize,
}

/// Integer branch-metric table indexed by `[expected_bit][soft_symbol]`.
///
/// Soft symbols map through a sigmoid to a bit-1 probability, and the
/// metric is `10·(log2(2p) − bias)`: positive only when the observation
/// genuinely supports the hypothesis.
pub fn metric_table(config: &FanoConfig) -> [[i32; 256]; 2] {
    let mut table = [[0i32; 256]; 2];
    for s in 0..256usize {
        let llr = config.metric_slope * (s as f64 - 128.0);
        let p1 = (1.0 / (1.0 + libm::exp(-llr))).clamp(1e-6, 1.0 - 1e-6);
        table[1][s] = (10.0 * ((2.0 * p1).log2() - config.metric_bias)).round() as i32;
        table[0][s] = (10.0 * ((2.0 * (1.0 - p1)).log2() - config.metric_bias)).round() as i32;
    }
    table
}

/// Branch hypotheses at one node, best metric first.
#[derive(Debug, Clone, Copy, Default)]
struct Branches {
    metric: [i32; 2],
    bit: [u8; 2],
    count: usize,
}

fn expand(
    depth: usize,
    state: u32,
    observed: &[u8; SYMBOL_COUNT],
    table: &[[i32; 256]; 2],
) -> Branches {
    let o0 = observed[2 * depth] as usize;
    let o1 = observed[2 * depth + 1] as usize;
    let count = if depth < PAYLOAD_BITS { 2 } else { 1 };

    let mut out = Branches { metric: [i32::MIN / 2; 2], bit: [0; 2], count };
    for b in 0..count as u32 {
        let next = (state << 1) | b;
        let e0 = parity32(next & POLY_1) as usize;
        let e1 = parity32(next & POLY_2) as usize;
        let m = table[e0][o0] + table[e1][o1];
        out.metric[b as usize] = m;
        out.bit[b as usize] = b as u8;
    }
    if count == 2 && out.metric[1] > out.metric[0] {
        out.metric.swap(0, 1);
        out.bit.swap(0, 1);
    }
    out
}

/// Run the Fano search over stream-ordered soft symbols.
///
/// Returns `None` when the cycle budget is exhausted; the caller moves on
/// to its next candidate.
pub fn decode(
    observed: &[u8; SYMBOL_COUNT],
    table: &[[i32; 256]; 2],
    config: &FanoConfig,
) -> Option<FanoOutcome> {
    let mut gamma = [0i32; BRANCHES + 1];
    let mut state = [0u32; BRANCHES + 1];
    let mut tried = [0usize; BRANCHES + 1];
    let mut branches = [Branches::default(); BRANCHES + 1];
    let mut bits = [0u8; BRANCHES];

    let mut threshold: i32 = 0;
    let mut depth: usize = 0;
    branches[0] = expand(0, 0, observed, table);

    for cycle in 1..=config.max_cycles {
        let here = branches[depth];
        let next_gamma = gamma[depth].saturating_add(here.metric[tried[depth]]);

        if next_gamma >= threshold {
            // First visit to this region: pull the threshold up as far as
            // the new path metric allows.
            if gamma[depth] < threshold + config.delta {
                while next_gamma >= threshold + config.delta {
                    threshold += config.delta;
                }
            }

            let bit = here.bit[tried[depth]];
            bits[depth] = bit;
            state[depth + 1] = (state[depth] << 1) | bit as u32;
            gamma[depth + 1] = next_gamma;
            depth += 1;

            if depth == BRANCHES {
                let mut payload = 0u64;
                for &b in bits.iter().take(PAYLOAD_BITS) {
                    payload = (payload << 1) | b as u64;
                }
                return Some(FanoOutcome { payload, cycles: cycle });
            }

            tried[depth] = 0;
            branches[depth] = expand(depth, state[depth], observed, table);
        } else {
            // Retreat until a predecessor still clears the threshold and
            // has an untried sibling; failing that, loosen the threshold
            // and retry from here.
            loop {
                if depth == 0 || gamma[depth - 1] < threshold {
                    threshold -= config.delta;
                    tried[depth] = 0;
                    break;
                }
                depth -= 1;
                if tried[depth] + 1 < branches[depth].count {
                    tried[depth] += 1;
                    break;
                }
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fec::convolutional;
    use crate::message::Message;

    fn observed_from_stream(stream: &[u8; SYMBOL_COUNT]) -> [u8; SYMBOL_COUNT] {
        let mut obs = [0u8; SYMBOL_COUNT];
        for (o, &b) in obs.iter_mut().zip(stream.iter()) {
            *o = if b == 1 { 255 } else { 0 };
        }
        obs
    }

    #[test]
    fn metric_table_polarity() {
        let table = metric_table(&FanoConfig::default());
        assert!(table[1][255] > 0);
        assert!(table[0][0] > 0);
        assert!(table[1][0] < -30);
        assert!(table[0][255] < -30);
        // An uninformative symbol must cost a little (the rate bias).
        assert!(table[1][128] < 0);
        assert!(table[0][128] < 0);
    }

    #[test]
    fn decodes_clean_symbols_in_minimum_cycles() {
        let message = Message::new("K1JT", "FN20", 37).unwrap();
        let stream = convolutional::encode(&message.pack());
        let obs = observed_from_stream(&stream);

        let config = FanoConfig::default();
        let table = metric_table(&config);
        let outcome = decode(&obs, &table, &config).expect("clean decode");
        assert_eq!(outcome.payload, message.payload());
        // One forward step per branch, no backtracking.
        assert_eq!(outcome.cycles, BRANCHES);
    }

    #[test]
    fn corrects_corrupted_symbols() {
        let message = Message::new("Q0QQQ", "FN20", 30).unwrap();
        let stream = convolutional::encode(&message.pack());
        let mut obs = observed_from_stream(&stream);

        // Erase a few positions and push a few others the wrong way.
        for &k in &[3usize, 40, 77, 118, 150] {
            obs[k] = 128;
        }
        for &k in &[15usize, 90, 141] {
            obs[k] = if stream[k] == 1 { 40 } else { 215 };
        }

        let config = FanoConfig::default();
        let table = metric_table(&config);
        let outcome = decode(&obs, &table, &config).expect("corrected decode");
        assert_eq!(outcome.payload, message.payload());
        assert!(outcome.cycles >= BRANCHES);
    }

    #[test]
    fn budget_below_path_length_always_exhausts() {
        let message = Message::new("K1JT", "FN20", 37).unwrap();
        let stream = convolutional::encode(&message.pack());
        let obs = observed_from_stream(&stream);

        // Reaching depth 81 needs at least 81 forward steps.
        let config = FanoConfig { max_cycles: 50, ..FanoConfig::default() };
        let table = metric_table(&config);
        assert!(decode(&obs, &table, &config).is_none());
    }
}
