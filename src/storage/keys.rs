//! Push-key generation
//!
//! Keys are 20 ASCII characters: 8 encode the creation time in milliseconds
//! (base 64, most significant first) and 12 are random. The alphabet is in
//! ASCII order, so keys sort lexicographically by creation time. Within one
//! millisecond the random suffix is incremented instead of redrawn, keeping
//! keys generated by one process strictly increasing.

use rand::Rng;
use std::sync::Mutex;

const PUSH_CHARS: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

const TIME_CHARS: usize = 8;
const RANDOM_CHARS: usize = 12;

/// Length of every generated key.
pub const PUSH_KEY_LEN: usize = TIME_CHARS + RANDOM_CHARS;

#[derive(Debug, Default)]
struct KeyState {
    last_ms: i64,
    /// Indices into `PUSH_CHARS`.
    suffix: [u8; RANDOM_CHARS],
}

/// Thread-safe generator of time-ordered keys.
#[derive(Debug, Default)]
pub struct PushKeyGenerator {
    state: Mutex<KeyState>,
}

impl PushKeyGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a key for the current wall-clock time.
    pub fn generate(&self) -> String {
        self.generate_at(crate::types::now_millis())
    }

    /// Generate a key for an explicit timestamp (milliseconds since epoch).
    pub fn generate_at(&self, now_ms: i64) -> String {
        let mut state = self.state.lock().unwrap_or_else(|e| {
            tracing::warn!("Push key state mutex poisoned, recovering");
            e.into_inner()
        });

        if now_ms == state.last_ms {
            increment_suffix(&mut state.suffix);
        } else {
            let mut rng = rand::thread_rng();
            for slot in &mut state.suffix {
                *slot = rng.gen_range(0..64);
            }
            state.last_ms = now_ms;
        }

        let mut key = String::with_capacity(PUSH_KEY_LEN);
        key.push_str(&encode_time(now_ms));
        key.extend(state.suffix.iter().map(|&i| PUSH_CHARS[usize::from(i)] as char));
        key
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn encode_time(now_ms: i64) -> String {
    let mut remaining = now_ms.max(0) as u64;
    let mut chars = [b'-'; TIME_CHARS];
    for slot in chars.iter_mut().rev() {
        *slot = PUSH_CHARS[(remaining % 64) as usize];
        remaining /= 64;
    }
    chars.iter().map(|&c| c as char).collect()
}

/// Base-64 increment with carry, from the last character backwards.
fn increment_suffix(suffix: &mut [u8; RANDOM_CHARS]) {
    for slot in suffix.iter_mut().rev() {
        if *slot == 63 {
            *slot = 0;
        } else {
            *slot += 1;
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_shape() {
        let generator = PushKeyGenerator::new();
        let key = generator.generate_at(1_700_000_000_000);
        assert_eq!(key.len(), PUSH_KEY_LEN);
        assert!(key.bytes().all(|b| PUSH_CHARS.contains(&b)));
    }

    #[test]
    fn test_keys_sort_by_time() {
        let generator = PushKeyGenerator::new();
        let earlier = generator.generate_at(1_000);
        let later = generator.generate_at(2_000);
        assert!(earlier < later);
        assert!(encode_time(1_000) < encode_time(2_000));
    }

    #[test]
    fn test_same_millisecond_keys_strictly_increase() {
        let generator = PushKeyGenerator::new();
        let mut previous = generator.generate_at(5_000);
        for _ in 0..500 {
            let next = generator.generate_at(5_000);
            assert!(next > previous, "{next} should sort after {previous}");
            previous = next;
        }
    }

    #[test]
    fn test_increment_carries() {
        let mut suffix = [0u8; RANDOM_CHARS];
        suffix[RANDOM_CHARS - 1] = 63;
        increment_suffix(&mut suffix);
        assert_eq!(suffix[RANDOM_CHARS - 1], 0);
        assert_eq!(suffix[RANDOM_CHARS - 2], 1);
    }
}
