//! Kaun Banega Crorepati style trivia quiz.
//!
//! The [`quiz`] module holds the rule engine shared by both front-ends: the
//! console game (`kbc`) and the Telegram button game (`kbc-bot`).

pub mod config;
pub mod console;
pub mod error;
pub mod quiz;

pub use error::GameError;
