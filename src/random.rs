use sha2::{Digest, Sha256};

/// Seeded generator that counts every value it hands out.
///
/// All randomness that shapes the search trajectory flows through this type.
/// Each draw is exactly one `f64` from the underlying generator, so a run can
/// be resumed by re-seeding and discarding `draws` values.
#[derive(Debug, Clone)]
pub struct DeterministicRandom {
    seed: String,
    draws: u64,
    rng: fastrand::Rng,
}

impl DeterministicRandom {
    pub fn new(seed: impl Into<String>) -> Self {
        let seed = seed.into();
        let rng = fastrand::Rng::with_seed(hash_seed(&seed));
        Self {
            seed,
            draws: 0,
            rng,
        }
    }

    /// Fresh 16-hex-char seed taken from the thread-local entropy source.
    pub fn from_entropy() -> Self {
        Self::new(random_id())
    }

    /// Rebuilds a generator and fast-forwards it past `draws` values.
    pub fn restore(seed: impl Into<String>, draws: u64) -> Self {
        let mut random = Self::new(seed);
        for _ in 0..draws {
            random.rng.f64();
        }
        random.draws = draws;
        random
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }

    pub fn draws(&self) -> u64 {
        self.draws
    }

    /// Uniform value in `[0, 1)`.
    #[inline]
    pub fn next_f64(&mut self) -> f64 {
        self.draws += 1;
        self.rng.f64()
    }

    /// Uniform index in `0..n` from a single draw. `n` must be non-zero.
    #[inline]
    pub fn below(&mut self, n: usize) -> usize {
        debug_assert!(n > 0);
        let idx = (self.next_f64() * n as f64) as usize;
        idx.min(n.saturating_sub(1))
    }
}

/// Random 8-byte hex identifier. Not part of the reproducible trajectory.
pub fn random_id() -> String {
    hex::encode(fastrand::u64(..).to_be_bytes())
}

fn hash_seed(seed: &str) -> u64 {
    let digest = Sha256::digest(seed.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = DeterministicRandom::new("nanocomp");
        let mut b = DeterministicRandom::new("nanocomp");
        for _ in 0..100 {
            assert_eq!(a.next_f64().to_bits(), b.next_f64().to_bits());
        }
        assert_eq!(a.draws(), 100);
    }

    #[test]
    fn test_restore_continues_sequence() {
        let mut live = DeterministicRandom::new("resume-me");
        for _ in 0..37 {
            live.next_f64();
        }
        let mut restored = DeterministicRandom::restore("resume-me", live.draws());
        for _ in 0..50 {
            assert_eq!(live.next_f64().to_bits(), restored.next_f64().to_bits());
        }
        assert_eq!(live.draws(), restored.draws());
    }

    #[test]
    fn test_below_stays_in_range() {
        let mut r = DeterministicRandom::new("range");
        for _ in 0..1000 {
            assert!(r.below(7) < 7);
        }
        assert_eq!(r.below(1), 0);
    }

    #[test]
    fn test_random_id_is_hex() {
        let id = random_id();
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
