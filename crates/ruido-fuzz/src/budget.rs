//! Per-function synthesis budget

#[derive(Debug, Clone, Copy)]
pub struct Budget {
    limit: u32,
    remaining: u32,
}

impl Budget {
    pub fn new(limit: u32) -> Self {
        Self { limit, remaining: limit }
    }

    /// Restores the full allowance for the next function
    pub fn reset(&mut self) {
        self.remaining = self.limit;
    }

    /// Takes one unit; returns false once the allowance is used up
    pub fn consume(&mut self) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining > 0
    }

    pub fn spent(&self) -> u32 {
        self.limit - self.remaining
    }

    pub fn exhausted(&self) -> bool {
        self.remaining == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consume_saturates() {
        let mut budget = Budget::new(3);
        assert!(budget.consume());
        assert!(budget.consume());
        assert!(!budget.consume());
        assert!(budget.exhausted());
        assert!(!budget.consume());
        assert_eq!(budget.spent(), 3);
    }

    #[test]
    fn test_reset() {
        let mut budget = Budget::new(3);
        budget.consume();
        budget.reset();
        assert_eq!(budget.spent(), 0);

        let mut single = Budget::new(1);
        assert!(!single.consume());
        let mut empty = Budget::new(0);
        assert!(!empty.consume());
        assert_eq!(empty.spent(), 0);
    }
}
