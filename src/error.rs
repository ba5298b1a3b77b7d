use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::quiz::Lifeline;

#[derive(Debug)]
pub enum GameError {
    // Fatal: the front-end reports it and exits
    QuestionFileMissing(PathBuf),
    QuestionFileMalformed {
        path: Option<PathBuf>,
        reason: String,
    },
    InvalidConfig(String),
    Io(io::Error),

    // Recoverable: report and re-prompt
    InvalidUserInput(String),
    LifelineAlreadyUsed(Lifeline),
    UnknownCategory(String),
    NoActiveQuestion,
}

impl GameError {
    /// Whether the game can go on after reporting this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            GameError::InvalidUserInput(_)
                | GameError::LifelineAlreadyUsed(_)
                | GameError::UnknownCategory(_)
                | GameError::NoActiveQuestion
        )
    }
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::QuestionFileMissing(path) => {
                write!(f, "Questions file not found: {}", path.display())
            }
            GameError::QuestionFileMalformed {
                path: Some(path),
                reason,
            } => write!(f, "Invalid question file {}: {}", path.display(), reason),
            GameError::QuestionFileMalformed { path: None, reason } => {
                write!(f, "Invalid question file: {}", reason)
            }
            GameError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            GameError::Io(err) => write!(f, "IO error: {}", err),
            GameError::InvalidUserInput(msg) => write!(f, "Invalid input: {}", msg),
            GameError::LifelineAlreadyUsed(kind) => {
                write!(f, "You have already used the {} lifeline.", kind)
            }
            GameError::UnknownCategory(name) => write!(f, "Unknown category \"{}\"", name),
            GameError::NoActiveQuestion => write!(f, "No question is waiting for an answer"),
        }
    }
}

impl std::error::Error for GameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GameError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for GameError {
    fn from(err: io::Error) -> Self {
        GameError::Io(err)
    }
}
