pub mod bank;
pub mod ladder;
pub mod lifeline;
pub mod session;

pub use bank::{Category, QuestionBank};
pub use ladder::{GameRules, PayoutRule};
pub use lifeline::{Lifeline, LifelineEffect};
pub use session::{select_category, Outcome, Presented, Session, Step, Termination};

use std::fmt;
use std::str::FromStr;

/// Every question is asked with exactly this many options.
pub const OPTIONS_PER_QUESTION: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Tier band for a ladder position: 0..=4 easy, 5..=9 medium, 10..=14 hard.
    pub fn for_position(position: usize) -> Option<Difficulty> {
        match position {
            0..=4 => Some(Difficulty::Easy),
            5..=9 => Some(Difficulty::Medium),
            10..=14 => Some(Difficulty::Hard),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty \"{}\"", other)),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Question {
    pub text: String,
    pub options: Vec<String>,
    pub answer: String,
    pub difficulty: Difficulty,
}

impl Question {
    pub fn new(text: String, options: Vec<String>, answer: String, difficulty: Difficulty) -> Self {
        Self {
            text,
            options,
            answer,
            difficulty,
        }
    }

    /// Checks the record invariants: four distinct options, one of which is the
    /// (non-empty) answer.
    pub fn validate(&self) -> Result<(), String> {
        if self.options.len() != OPTIONS_PER_QUESTION {
            return Err(format!(
                "question \"{}\" has {} options, expected {}",
                self.text,
                self.options.len(),
                OPTIONS_PER_QUESTION
            ));
        }
        for (i, option) in self.options.iter().enumerate() {
            if self.options[..i].contains(option) {
                return Err(format!(
                    "question \"{}\" lists option \"{}\" twice",
                    self.text, option
                ));
            }
        }
        // The hint lifeline needs a first letter to reveal
        if self.answer.is_empty() {
            return Err(format!("question \"{}\" has an empty answer", self.text));
        }
        if !self.options.contains(&self.answer) {
            return Err(format!(
                "answer \"{}\" of question \"{}\" is not one of its options",
                self.answer, self.text
            ));
        }
        Ok(())
    }
}
