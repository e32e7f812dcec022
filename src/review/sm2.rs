use serde::{Deserialize, Serialize};

pub const MIN_EASE_FACTOR: f64 = 1.3;
pub const INITIAL_EASE_FACTOR: f64 = 2.5;
/// Longest gap between reviews, about a hundred years.
pub const MAX_INTERVAL_DAYS: u32 = 36_500;

/// SM-2 scheduling state of one review item.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Sm2State {
    pub ease_factor: f64,
    pub interval_days: u32,
    pub repetitions: u32,
}

impl Default for Sm2State {
    fn default() -> Self {
        Sm2State {
            ease_factor: INITIAL_EASE_FACTOR,
            interval_days: 1,
            repetitions: 0,
        }
    }
}

impl Sm2State {
    /// Apply one review of quality `q` (0..=5). Callers validate the range.
    pub fn review(self, quality: u8) -> Sm2State {
        let q = quality.min(5) as f64;
        let miss = 5.0 - q;
        let ease_factor = (self.ease_factor + (0.1 - miss * (0.08 + miss * 0.02))).max(MIN_EASE_FACTOR);

        if quality < 3 {
            return Sm2State {
                ease_factor,
                interval_days: 1,
                repetitions: 0,
            };
        }

        let repetitions = self.repetitions + 1;
        let interval_days = match repetitions {
            1 => 1,
            2 => 6,
            _ => (self.interval_days as f64 * ease_factor)
                .round()
                .clamp(1.0, MAX_INTERVAL_DAYS as f64) as u32,
        };

        Sm2State {
            ease_factor,
            interval_days,
            repetitions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_first_review() {
        let next = Sm2State::default().review(5);
        assert_eq!(next.repetitions, 1);
        assert_eq!(next.interval_days, 1);
        assert!((next.ease_factor - 2.6).abs() < 1e-9);
    }

    #[test]
    fn second_and_third_reviews() {
        let s = Sm2State::default().review(4).review(4);
        assert_eq!(s.repetitions, 2);
        assert_eq!(s.interval_days, 6);
        let third = s.review(4);
        assert_eq!(third.repetitions, 3);
        // quality 4 leaves EF at 2.5: round(6 * 2.5) = 15
        assert_eq!(third.interval_days, 15);
    }

    #[test]
    fn failed_review_resets() {
        let s = Sm2State { ease_factor: 2.2, interval_days: 20, repetitions: 5 };
        let next = s.review(2);
        assert_eq!(next.repetitions, 0);
        assert_eq!(next.interval_days, 1);
        assert!(next.ease_factor < 2.2);
        assert!(next.ease_factor >= MIN_EASE_FACTOR);
    }

    #[test]
    fn ease_factor_floor() {
        let mut s = Sm2State::default();
        for _ in 0..20 {
            s = s.review(0);
        }
        assert_eq!(s.ease_factor, MIN_EASE_FACTOR);
    }

    #[test]
    fn interval_is_capped_under_long_streaks() {
        let mut s = Sm2State::default();
        for _ in 0..40 {
            s = s.review(5);
            assert!(s.interval_days <= MAX_INTERVAL_DAYS);
        }
        assert_eq!(s.interval_days, MAX_INTERVAL_DAYS);
        assert_eq!(s.repetitions, 40);
    }
}
