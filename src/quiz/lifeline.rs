use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;

/// One-time aids, each usable once per session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub enum Lifeline {
    FiftyFifty,
    Hint,
}

impl Lifeline {
    pub const ALL: [Lifeline; 2] = [Lifeline::FiftyFifty, Lifeline::Hint];

    pub fn label(&self) -> &'static str {
        match self {
            Lifeline::FiftyFifty => "50-50",
            Lifeline::Hint => "Hint",
        }
    }

    pub fn from_label(label: &str) -> Option<Lifeline> {
        Self::ALL
            .into_iter()
            .find(|l| l.label().eq_ignore_ascii_case(label.trim()))
    }
}

impl fmt::Display for Lifeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifelineEffect {
    /// Two wrong options taken away; `remaining` keeps display order.
    FiftyFifty {
        removed: Vec<String>,
        remaining: Vec<String>,
    },
    Hint { first_letter: char },
}

/// Picks two of the wrong options to remove, uniformly at random.
pub fn fifty_fifty<R: Rng + ?Sized>(options: &[String], answer: &str, rng: &mut R) -> Vec<String> {
    let wrong: Vec<&String> = options.iter().filter(|o| o.as_str() != answer).collect();
    wrong
        .choose_multiple(rng, 2)
        .map(|o| (*o).clone())
        .collect()
}

pub fn first_letter(answer: &str) -> Option<char> {
    answer.chars().next()
}
