//! Token-bucket rate limiter. One token per packet; `rate == 0` disables
//! the limiter entirely.

use std::time::Instant;

pub struct TokenBucket {
    rate: f64,
    tokens: f64,
    timestamp: Instant,
}

impl TokenBucket {
    pub fn new(rate: u64) -> Self {
        TokenBucket {
            rate: rate as f64,
            tokens: rate as f64,
            timestamp: Instant::now(),
        }
    }

    /// Busy-waits until at least one token is available, then deducts one.
    /// A `rate` of zero means unlimited: returns immediately.
    pub fn consume(&mut self) {
        if self.rate == 0.0 {
            return;
        }

        loop {
            let now = Instant::now();
            let accrued = now.duration_since(self.timestamp).as_secs_f64() * self.rate;

            if accrued >= 1.0 {
                self.tokens = (self.tokens + accrued).min(self.rate);
                self.timestamp = now;
                break;
            }

            std::hint::spin_loop();
        }

        self.tokens -= 1.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rate_never_blocks() {
        let mut bucket = TokenBucket::new(0);
        let start = Instant::now();
        for _ in 0..1000 {
            bucket.consume();
        }
        assert!(start.elapsed().as_millis() < 50);
    }

    #[test]
    fn starts_full_so_first_consume_is_immediate() {
        let mut bucket = TokenBucket::new(100);
        let start = Instant::now();
        bucket.consume();
        assert!(start.elapsed().as_millis() < 20);
    }

    #[test]
    fn high_rate_consumes_many_tokens_quickly() {
        let mut bucket = TokenBucket::new(100_000);
        let start = Instant::now();
        for _ in 0..100 {
            bucket.consume();
        }
        assert!(start.elapsed().as_millis() < 100);
    }
}
