//! Running transfer statistics - the single durable aggregate

/// Running stats over every transfer folded so far, plus the resume cursor.
///
/// `last_round` is the highest round whose effects are durably reflected in
/// the aggregate; 0 means no round has been processed yet. `min` starts at
/// the `i64::MAX` sentinel and `max` at 0 so the first observed amount
/// replaces both. The average is derived (`sum / count`), never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub count: i64,
    pub sum: i64,
    pub min: i64,
    pub max: i64,
    pub last_round: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            count: 0,
            sum: 0,
            min: i64::MAX,
            max: 0,
            last_round: 0,
        }
    }

    /// Fold one transfer amount into the running stats.
    pub fn update(&mut self, amount: i64, round: u64) {
        self.count += 1;
        self.sum += amount;
        if amount < self.min {
            self.min = amount;
        }
        if amount > self.max {
            self.max = amount;
        }
        if round > self.last_round {
            self.last_round = round;
        }
    }

    /// Mean transfer amount, 0.0 before any transfer has been observed.
    pub fn average(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.sum as f64 / self.count as f64
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinels_before_first_update() {
        let m = Metrics::new();
        assert_eq!(m.count, 0);
        assert_eq!(m.sum, 0);
        assert_eq!(m.min, i64::MAX);
        assert_eq!(m.max, 0);
        assert_eq!(m.last_round, 0);
    }

    #[test]
    fn test_first_update_replaces_both_sentinels() {
        let mut m = Metrics::new();
        m.update(500, 3);

        assert_eq!(m.min, 500);
        assert_eq!(m.max, 500);
        assert_eq!(m.count, 1);
        assert_eq!(m.sum, 500);
        assert_eq!(m.last_round, 3);
    }

    #[test]
    fn test_fold_sequence_matches_true_stats() {
        let mut m = Metrics::new();
        let amounts = [1000_i64, 7, 250, 7, 99999];

        for (i, amount) in amounts.iter().enumerate() {
            m.update(*amount, (i + 1) as u64);
        }

        assert_eq!(m.count, amounts.len() as i64);
        assert_eq!(m.sum, amounts.iter().sum::<i64>());
        assert_eq!(m.min, 7);
        assert_eq!(m.max, 99999);
        assert_eq!(m.last_round, 5);
    }

    #[test]
    fn test_last_round_keeps_maximum_seen() {
        let mut m = Metrics::new();
        m.update(10, 8);
        m.update(20, 2);

        assert_eq!(m.last_round, 8);
    }

    #[test]
    fn test_average_zero_count_guards_division() {
        let m = Metrics::new();
        assert_eq!(m.average(), 0.0);
    }

    #[test]
    fn test_average_is_idempotent_read() {
        let mut m = Metrics::new();
        m.update(1000, 1);
        m.update(500, 1);

        assert_eq!(m.average(), 750.0);
        assert_eq!(m.average(), 750.0);
    }
}
