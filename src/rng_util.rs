use std::collections::HashSet;

/// Generate a random `f64` in the range `[low, high)`.
#[inline]
pub(crate) fn f64_range(rng: &mut fastrand::Rng, low: f64, high: f64) -> f64 {
    low + rng.f64() * (high - low)
}

/// Select `k` distinct indices from `0..n` using a partial Fisher-Yates shuffle.
///
/// The result is in selection order, not sorted.
pub(crate) fn partial_shuffle(n: usize, k: usize, rng: &mut fastrand::Rng) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..n).collect();
    let k = k.min(n);
    for i in 0..k {
        let j = rng.usize(i..n);
        indices.swap(i, j);
    }
    indices.truncate(k);
    indices
}

/// Draw `min(k, n)` distinct indices from `0..n` in random order.
///
/// Floyd's algorithm: memory grows with `k`, never with `n`.
pub(crate) fn sample_distinct(n: usize, k: usize, rng: &mut fastrand::Rng) -> Vec<usize> {
    let k = k.min(n);
    let mut seen = HashSet::with_capacity(k);
    let mut picked = Vec::with_capacity(k);
    for j in n - k..n {
        let t = rng.usize(..=j);
        // `j` exceeds every earlier pick, so it is always fresh.
        let pick = if seen.contains(&t) { j } else { t };
        seen.insert(pick);
        picked.push(pick);
    }
    rng.shuffle(&mut picked);
    picked
}

/// Derive an independent seed from a base seed and a stream index.
///
/// Used to give nested searches their own reproducible generators.
#[inline]
pub(crate) fn derive_seed(base: u64, stream: u64) -> u64 {
    // splitmix64 finaliser
    let mut z = base ^ stream.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
