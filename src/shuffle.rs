//! Deterministic shuffling: a small LCG, a string hash to derive seeds, and Fisher–Yates.
//!
//! The same user must see the same option order across reloads without the order being
//! stored anywhere, so every piece here is pure integer arithmetic and reproducible in any
//! runtime (including the browser client, which computes the same seeds).

const LCG_MULTIPLIER: u32 = 1_664_525;
const LCG_INCREMENT: u32 = 1_013_904_223;
const TWO_POW_32: f64 = 4_294_967_296.0;

/// Linear-congruential generator. Construct one per call; never share.
#[derive(Debug, Clone)]
pub struct SeededRandom {
  state: u32,
}

impl SeededRandom {
  pub fn new(seed: u32) -> Self {
    Self { state: seed }
  }

  /// Advance the state and return a float in [0, 1).
  pub fn next_f64(&mut self) -> f64 {
    self.state = self.state.wrapping_mul(LCG_MULTIPLIER).wrapping_add(LCG_INCREMENT);
    self.state as f64 / TWO_POW_32
  }
}

/// Rolling `hash * 31 + unit` over UTF-16 code units, wrapped to i32, absolute value.
pub fn generate_seed(input: &str) -> u32 {
  let mut hash: i32 = 0;
  for unit in input.encode_utf16() {
    hash = hash.wrapping_mul(31).wrapping_add(unit as i32);
  }
  hash.unsigned_abs()
}

/// Fisher–Yates from the last index down to 1. Returns a new vector.
pub fn shuffle<T: Clone>(items: &[T], seed: u32) -> Vec<T> {
  let mut out = items.to_vec();
  let mut rng = SeededRandom::new(seed);
  for i in (1..out.len()).rev() {
    let j = (rng.next_f64() * (i + 1) as f64).floor() as usize;
    out.swap(i, j);
  }
  out
}
