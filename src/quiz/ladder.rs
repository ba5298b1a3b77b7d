use std::time::Duration;

/// Rupee reward for each ladder position, 0-based.
pub const LADDER: [u64; 15] = [
    1_000, 2_000, 3_000, 5_000, 10_000, 20_000, 40_000, 80_000, 160_000, 320_000, 640_000,
    1_250_000, 2_500_000, 5_000_000, 10_000_000,
];

/// 5th, 10th and 15th questions
pub const CHECKPOINTS: [usize; 3] = [4, 9, 14];

/// Time budget per question in the text front-end.
pub const TEXT_TIME_LIMIT: Duration = Duration::from_secs(30);

pub fn reward_at(position: usize) -> Option<u64> {
    LADDER.get(position).copied()
}

pub fn is_checkpoint(position: usize) -> bool {
    CHECKPOINTS.contains(&position)
}

pub fn top_prize() -> u64 {
    LADDER[LADDER.len() - 1]
}

/// What a player walks away with after a wrong answer, a timeout or an
/// exhausted category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PayoutRule {
    /// Last checkpoint amount reached.
    Guaranteed,
    /// Everything won so far.
    Accumulated,
}

impl PayoutRule {
    pub fn payout(&self, score: u64, guaranteed: u64) -> u64 {
        match self {
            PayoutRule::Guaranteed => guaranteed,
            PayoutRule::Accumulated => score,
        }
    }
}

/// Per front-end knobs of an otherwise shared rule engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GameRules {
    pub time_limit: Option<Duration>,
    pub payout: PayoutRule,
}

impl GameRules {
    /// Console game: 30 seconds per question, checkpoint payout.
    pub fn text() -> Self {
        Self {
            time_limit: Some(TEXT_TIME_LIMIT),
            payout: PayoutRule::Guaranteed,
        }
    }

    /// Button game: no clock, keeps the accumulated score.
    pub fn graphical() -> Self {
        Self {
            time_limit: None,
            payout: PayoutRule::Accumulated,
        }
    }

    pub fn with_time_limit(mut self, time_limit: Option<Duration>) -> Self {
        self.time_limit = time_limit;
        self
    }

    pub fn is_timed_out(&self, elapsed: Duration) -> bool {
        match self.time_limit {
            Some(limit) => elapsed > limit,
            None => false,
        }
    }
}

impl Default for GameRules {
    fn default() -> Self {
        Self::text()
    }
}

/// Formats an amount with Indian digit grouping, e.g. `₹1,00,00,000`.
pub fn format_rupees(amount: u64) -> String {
    let digits = amount.to_string();
    if digits.len() <= 3 {
        return format!("₹{}", digits);
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();
    format!("₹{},{}", groups.join(","), tail)
}
