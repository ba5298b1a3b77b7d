//! Text-prompt front-end. Reads answers line by line and prints the game to
//! any `Write`, so it runs against stdin/stdout or a script in tests.

use std::io::{self, BufRead, Write};
use std::time::Instant;

use log::{info, warn};
use rand::Rng;

use crate::error::GameError;
use crate::quiz::ladder::format_rupees;
use crate::quiz::{
    select_category, Category, GameRules, Lifeline, LifelineEffect, Outcome, Presented,
    QuestionBank, Session, Step, Termination,
};

const OPTION_LABELS: [char; 4] = ['a', 'b', 'c', 'd'];

pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn prompt(&mut self, text: &str) -> Result<String, GameError> {
        write!(self.output, "{}", text)?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(GameError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed",
            )));
        }
        Ok(line.trim().to_string())
    }

    /// Numbered category menu, repeated until a valid number is entered.
    pub fn select_category<'a>(&mut self, bank: &'a QuestionBank) -> Result<&'a Category, GameError> {
        let categories = bank.categories();
        loop {
            writeln!(self.output, "Choose a category:")?;
            for (i, category) in categories.iter().enumerate() {
                writeln!(self.output, "{}. {}", i + 1, category.display_name())?;
            }

            let line = self.prompt("Enter category number: ")?;
            match line.parse::<usize>() {
                Ok(n) if (1..=categories.len()).contains(&n) => {
                    return select_category(bank, &categories[n - 1].name);
                }
                Ok(n) => {
                    warn!("Category number {} out of range", n);
                    writeln!(
                        self.output,
                        "Invalid choice. Please select a valid category number."
                    )?;
                }
                Err(_) => {
                    warn!("Category input is not a number: {:?}", line);
                    writeln!(self.output, "Invalid input. Please enter a number.")?;
                }
            }
        }
    }

    /// Plays one full game and returns how it ended.
    pub fn play<G: Rng + ?Sized>(
        &mut self,
        bank: &QuestionBank,
        rules: GameRules,
        rng: &mut G,
    ) -> Result<Termination, GameError> {
        let category = self.select_category(bank)?;
        info!("Starting a game in \"{}\"", category.name);
        let mut session = Session::new(category, rules);

        let termination = loop {
            let presented = match session.next_question(bank, rng)? {
                Step::Question(presented) => presented.clone(),
                Step::Ended(termination) => break termination,
            };
            match self.ask(&mut session, &presented, rng)? {
                Outcome::Correct => writeln!(
                    self.output,
                    "Correct! Your score: {}",
                    format_rupees(session.score())
                )?,
                Outcome::TimedOut => writeln!(self.output, "Time's up! You took too long.")?,
                Outcome::Incorrect => writeln!(self.output, "Wrong answer! Game Over.")?,
            }
        };

        info!("Game in \"{}\" ended: {:?}", session.category(), termination);
        self.report(termination)?;
        Ok(termination)
    }

    fn ask<G: Rng + ?Sized>(
        &mut self,
        session: &mut Session,
        presented: &Presented,
        rng: &mut G,
    ) -> Result<Outcome, GameError> {
        writeln!(
            self.output,
            "\nQuestion for {}",
            format_rupees(presented.reward)
        )?;
        writeln!(self.output, "{}", presented.text)?;
        let mut visible = presented.options.clone();
        self.show_options(&visible)?;
        self.show_lifelines(session)?;

        // The clock is only checked once a line comes back
        let started = Instant::now();
        loop {
            let line = self
                .prompt(&format!(
                    "Your answer ({}) or lifeline (1/2): ",
                    label_list(visible.len())
                ))?
                .to_lowercase();

            let elapsed = started.elapsed();
            if session.rules().is_timed_out(elapsed) {
                return session.submit_answer(&line, elapsed);
            }

            if let Some(kind) = lifeline_for_key(&line) {
                match session.apply_lifeline(kind, rng) {
                    Ok(LifelineEffect::FiftyFifty { remaining, .. }) => {
                        writeln!(self.output, "Updated options after lifeline:")?;
                        visible = remaining;
                        self.show_options(&visible)?;
                    }
                    Ok(LifelineEffect::Hint { first_letter }) => {
                        writeln!(
                            self.output,
                            "Hint: The correct answer starts with {}",
                            first_letter
                        )?;
                    }
                    Err(GameError::LifelineAlreadyUsed(kind)) => {
                        warn!("Lifeline {} requested again", kind);
                        writeln!(self.output, "Lifeline already used.")?;
                    }
                    Err(err) => return Err(err),
                }
                continue;
            }

            match option_for_label(&line, &visible) {
                Some(option) => return session.submit_answer(option, elapsed),
                None => {
                    warn!("Unrecognised answer {:?}", line);
                    writeln!(
                        self.output,
                        "Invalid choice. Please enter {} for options or 1/2 for lifelines.",
                        label_list(visible.len())
                    )?;
                }
            }
        }
    }

    fn show_options(&mut self, options: &[String]) -> Result<(), GameError> {
        for (label, option) in OPTION_LABELS.iter().zip(options) {
            writeln!(self.output, "{}. {}", label, option)?;
        }
        Ok(())
    }

    fn show_lifelines(&mut self, session: &Session) -> Result<(), GameError> {
        let available: Vec<String> = Lifeline::ALL
            .iter()
            .enumerate()
            .filter(|(_, kind)| session.is_lifeline_available(**kind))
            .map(|(i, kind)| format!("{}. {}", i + 1, kind))
            .collect();
        if available.is_empty() {
            writeln!(self.output, "No lifelines left.")?;
        } else {
            writeln!(self.output, "Available Lifelines: {}", available.join("  "))?;
        }
        Ok(())
    }

    fn report(&mut self, termination: Termination) -> Result<(), GameError> {
        match termination {
            Termination::Won { .. } => {
                writeln!(self.output, "Congratulations! You have won ₹1 Crore!")?;
            }
            Termination::Lost { payout, .. } => {
                writeln!(
                    self.output,
                    "You have secured {} as your final reward.",
                    format_rupees(payout)
                )?;
            }
            Termination::Aborted { payout } => {
                writeln!(self.output, "No more questions left in this category.")?;
                writeln!(
                    self.output,
                    "You have secured {} as your final reward.",
                    format_rupees(payout)
                )?;
            }
        }
        Ok(())
    }
}

fn lifeline_for_key(key: &str) -> Option<Lifeline> {
    match key {
        "1" => Some(Lifeline::FiftyFifty),
        "2" => Some(Lifeline::Hint),
        _ => None,
    }
}

fn option_for_label<'a>(label: &str, visible: &'a [String]) -> Option<&'a String> {
    let mut chars = label.chars();
    let index = match (chars.next(), chars.next()) {
        (Some(c), None) => OPTION_LABELS.iter().position(|l| *l == c)?,
        _ => return None,
    };
    visible.get(index)
}

fn label_list(count: usize) -> String {
    OPTION_LABELS[..count.min(OPTION_LABELS.len())]
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join("/")
}
