//! The handful of wall-clock reads the core needs for signing and
//! policy deadlines — isolated here so callers never reach for
//! `SystemTime` directly.

use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds since the Unix epoch, as the wire protocol expects for an
/// upload policy's `deadline` and a CDN signature's `t` parameter.
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the Unix epoch")
        .as_secs() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_a_plausible_epoch_value() {
        let now = unix_now();
        assert!(now > 1_700_000_000);
    }
}
