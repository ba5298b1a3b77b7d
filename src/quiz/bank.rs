use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::GameError;
use crate::quiz::{Difficulty, Question};

/// Questions of one category, in file order.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Category {
    pub name: String,
    pub questions: Vec<Question>,
}

impl Category {
    pub fn new(name: String, questions: Vec<Question>) -> Self {
        Self { name, questions }
    }

    /// Name with the first letter upper-cased, the way menus show it.
    pub fn display_name(&self) -> String {
        let mut chars = self.name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

/// The question file as it is laid out on disk.
#[derive(Debug, Clone, serde::Deserialize)]
struct JsonQuestion {
    question: String,
    options: Vec<String>,
    answer: String,
    difficulty: String,
}

impl JsonQuestion {
    fn into_question(self) -> Result<Question, String> {
        let difficulty: Difficulty = self.difficulty.parse()?;
        let question = Question::new(self.question, self.options, self.answer, difficulty);
        question.validate()?;
        Ok(question)
    }
}

/// Read-only bank of categorized questions, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct QuestionBank {
    categories: Vec<Category>,
}

impl QuestionBank {
    pub fn new(categories: Vec<Category>) -> Self {
        Self { categories }
    }

    /// Loads and validates the question file at `path`.
    pub fn open(path: &Path) -> Result<Self, GameError> {
        let file = File::open(path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => GameError::QuestionFileMissing(path.to_path_buf()),
            _ => GameError::Io(err),
        })?;
        let bank = Self::from_reader(BufReader::new(file)).map_err(|err| match err {
            GameError::QuestionFileMalformed { path: None, reason } => {
                GameError::QuestionFileMalformed {
                    path: Some(path.to_path_buf()),
                    reason,
                }
            }
            other => other,
        })?;
        log::info!(
            "Loaded {} categories ({} questions) from {}",
            bank.categories.len(),
            bank.question_count(),
            path.display()
        );
        Ok(bank)
    }

    /// Parses a `{ category: [ {question, options, answer, difficulty}, ... ] }` document.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, GameError> {
        let malformed = |reason: String| GameError::QuestionFileMalformed { path: None, reason };

        let document: Map<String, Value> =
            serde_json::from_reader(reader).map_err(|err| malformed(err.to_string()))?;
        if document.is_empty() {
            return Err(malformed("the file contains no categories".to_string()));
        }

        let mut categories = Vec::with_capacity(document.len());
        for (name, records) in document {
            let records: Vec<JsonQuestion> = serde_json::from_value(records)
                .map_err(|err| malformed(format!("category \"{}\": {}", name, err)))?;
            let questions = records
                .into_iter()
                .map(|record| record.into_question())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|reason| malformed(format!("category \"{}\": {}", name, reason)))?;
            if questions.is_empty() {
                log::warn!("Category \"{}\" has no questions", name);
            }
            categories.push(Category::new(name, questions));
        }
        Ok(Self { categories })
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    /// Looks a category up by its stored name or its menu label, ignoring case.
    pub fn find_category(&self, label: &str) -> Option<&Category> {
        let label = label.trim();
        self.category(label).or_else(|| {
            self.categories
                .iter()
                .find(|c| c.name.eq_ignore_ascii_case(label) || c.display_name() == label)
        })
    }

    pub fn question_count(&self) -> usize {
        self.categories.iter().map(|c| c.questions.len()).sum()
    }
}
