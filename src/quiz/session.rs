//! The quiz session engine.
//!
//! A [`Session`] holds everything about one game in one category and is the
//! only place where answers are judged, money is awarded and the game is
//! ended. Front-ends render its state and feed the player's choices back in.
//! All randomness comes from the `rng` handed to each call.

use std::collections::BTreeSet;
use std::time::Duration;

use log::debug;
use rand::seq::{IteratorRandom, SliceRandom};
use rand::Rng;

use crate::error::GameError;
use crate::quiz::bank::{Category, QuestionBank};
use crate::quiz::ladder::{self, GameRules};
use crate::quiz::lifeline::{self, Lifeline, LifelineEffect};
use crate::quiz::Difficulty;

/// Membership check over the bank's categories.
pub fn select_category<'a>(bank: &'a QuestionBank, name: &str) -> Result<&'a Category, GameError> {
    bank.category(name)
        .ok_or_else(|| GameError::UnknownCategory(name.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Outcome {
    Correct,
    Incorrect,
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Termination {
    /// Every rung of the ladder answered.
    Won { payout: u64 },
    /// Wrong answer or timeout.
    Lost { payout: u64, timed_out: bool },
    /// Ran out of questions before the top of the ladder.
    Aborted { payout: u64 },
}

impl Termination {
    pub fn payout(&self) -> u64 {
        match self {
            Termination::Won { payout }
            | Termination::Lost { payout, .. }
            | Termination::Aborted { payout } => *payout,
        }
    }
}

/// The question currently on screen.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Presented {
    /// Index into the category's question list.
    pub index: usize,
    pub position: usize,
    pub reward: u64,
    pub text: String,
    /// Shuffled display order.
    pub options: Vec<String>,
    answer: String,
    eliminated: Vec<String>,
    hint: Option<char>,
}

impl Presented {
    /// Options still selectable, in display order.
    pub fn visible_options(&self) -> Vec<&str> {
        self.options
            .iter()
            .filter(|o| !self.eliminated.contains(o))
            .map(|o| o.as_str())
            .collect()
    }

    pub fn is_visible(&self, option: &str) -> bool {
        self.options.iter().any(|o| o == option) && !self.eliminated.iter().any(|o| o == option)
    }

    pub fn hint(&self) -> Option<char> {
        self.hint
    }

    /// Question number as shown to players, starting at 1.
    pub fn number(&self) -> usize {
        self.position + 1
    }
}

#[derive(Debug)]
pub enum Step<'a> {
    Question(&'a Presented),
    Ended(Termination),
}

/// State of one game. Serializable so chat front-ends can keep it between
/// messages.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Session {
    category: String,
    rules: GameRules,
    position: usize,
    score: u64,
    guaranteed: u64,
    lifelines_used: BTreeSet<Lifeline>,
    asked: BTreeSet<usize>,
    current: Option<Presented>,
    ended: Option<Termination>,
}

impl Session {
    pub fn new(category: &Category, rules: GameRules) -> Self {
        Self {
            category: category.name.clone(),
            rules,
            position: 0,
            score: 0,
            guaranteed: 0,
            lifelines_used: BTreeSet::new(),
            asked: BTreeSet::new(),
            current: None,
            ended: None,
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    /// Ladder position of the next (or current) question.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn guaranteed(&self) -> u64 {
        self.guaranteed
    }

    pub fn lifelines_used(&self) -> &BTreeSet<Lifeline> {
        &self.lifelines_used
    }

    pub fn is_lifeline_available(&self, kind: Lifeline) -> bool {
        !self.lifelines_used.contains(&kind)
    }

    pub fn asked(&self) -> &BTreeSet<usize> {
        &self.asked
    }

    pub fn current(&self) -> Option<&Presented> {
        self.current.as_ref()
    }

    pub fn termination(&self) -> Option<Termination> {
        self.ended
    }

    pub fn is_over(&self) -> bool {
        self.ended.is_some()
    }

    /// Puts the next unseen question of the current tier band on screen, or
    /// ends the session when the ladder or the band runs out.
    ///
    /// Calling it again while a question is still unanswered returns that same
    /// question.
    pub fn next_question<R: Rng + ?Sized>(
        &mut self,
        bank: &QuestionBank,
        rng: &mut R,
    ) -> Result<Step<'_>, GameError> {
        if let Some(termination) = self.ended {
            return Ok(Step::Ended(termination));
        }
        if self.current.is_none() {
            if let Some(termination) = self.present_next(bank, rng)? {
                return Ok(Step::Ended(termination));
            }
        }
        match &self.current {
            Some(presented) => Ok(Step::Question(presented)),
            None => Err(GameError::NoActiveQuestion),
        }
    }

    fn present_next<R: Rng + ?Sized>(
        &mut self,
        bank: &QuestionBank,
        rng: &mut R,
    ) -> Result<Option<Termination>, GameError> {
        let category = select_category(bank, &self.category)?;

        let (band, reward) = match (
            Difficulty::for_position(self.position),
            ladder::reward_at(self.position),
        ) {
            (Some(band), Some(reward)) => (band, reward),
            _ => {
                return Ok(Some(self.finish(Termination::Won {
                    payout: ladder::top_prize(),
                })));
            }
        };

        let picked = category
            .questions
            .iter()
            .enumerate()
            .filter(|(i, q)| q.difficulty == band && !self.asked.contains(i))
            .choose(rng);
        let (index, question) = match picked {
            Some(found) => found,
            None => {
                debug!(
                    "No {} questions left in \"{}\" at position {}",
                    band, self.category, self.position
                );
                let payout = self.rules.payout.payout(self.score, self.guaranteed);
                return Ok(Some(self.finish(Termination::Aborted { payout })));
            }
        };

        let mut options = question.options.clone();
        options.shuffle(rng);

        debug!(
            "Question {} ({}) for position {}: {:?}",
            index, band, self.position, question.text
        );
        self.asked.insert(index);
        self.current = Some(Presented {
            index,
            position: self.position,
            reward,
            text: question.text.clone(),
            options,
            answer: question.answer.clone(),
            eliminated: Vec::new(),
            hint: None,
        });
        Ok(None)
    }

    /// Uses a lifeline on the question on screen. A lifeline already spent is
    /// reported and changes nothing.
    pub fn apply_lifeline<R: Rng + ?Sized>(
        &mut self,
        kind: Lifeline,
        rng: &mut R,
    ) -> Result<LifelineEffect, GameError> {
        let current = self.current.as_mut().ok_or(GameError::NoActiveQuestion)?;
        if self.lifelines_used.contains(&kind) {
            return Err(GameError::LifelineAlreadyUsed(kind));
        }

        let effect = match kind {
            Lifeline::FiftyFifty => {
                let removed = lifeline::fifty_fifty(&current.options, &current.answer, rng);
                current.eliminated = removed.clone();
                let remaining = current
                    .visible_options()
                    .into_iter()
                    .map(String::from)
                    .collect();
                LifelineEffect::FiftyFifty { removed, remaining }
            }
            Lifeline::Hint => {
                // Loaded banks never get here: validation rejects empty answers
                let first_letter = lifeline::first_letter(&current.answer).ok_or_else(|| {
                    GameError::QuestionFileMalformed {
                        path: None,
                        reason: format!("question \"{}\" has an empty answer", current.text),
                    }
                })?;
                current.hint = Some(first_letter);
                LifelineEffect::Hint { first_letter }
            }
        };
        self.lifelines_used.insert(kind);
        debug!("Lifeline {} used at position {}", kind, self.position);
        Ok(effect)
    }

    /// Judges `chosen` for the question on screen. `elapsed` is the time the
    /// player took; it only matters when the rules carry a time budget.
    pub fn submit_answer(&mut self, chosen: &str, elapsed: Duration) -> Result<Outcome, GameError> {
        let current = self.current.as_ref().ok_or(GameError::NoActiveQuestion)?;
        let timed_out = self.rules.is_timed_out(elapsed);
        if !timed_out && !current.is_visible(chosen) {
            return Err(GameError::InvalidUserInput(format!(
                "\"{}\" is not one of the options",
                chosen
            )));
        }

        let correct = !timed_out && current.answer == chosen;
        let reward = current.reward;
        self.current = None;

        let outcome = if timed_out {
            Outcome::TimedOut
        } else if correct {
            Outcome::Correct
        } else {
            Outcome::Incorrect
        };
        debug!("Answer at position {}: {:?}", self.position, outcome);

        match outcome {
            Outcome::Correct => {
                self.score = reward;
                if ladder::is_checkpoint(self.position) {
                    self.guaranteed = self.score;
                }
                self.position += 1;
            }
            Outcome::Incorrect | Outcome::TimedOut => {
                let payout = self.rules.payout.payout(self.score, self.guaranteed);
                self.finish(Termination::Lost {
                    payout,
                    timed_out: outcome == Outcome::TimedOut,
                });
            }
        }
        Ok(outcome)
    }

    fn finish(&mut self, termination: Termination) -> Termination {
        self.current = None;
        self.ended = Some(termination);
        termination
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::ladder::{PayoutRule, LADDER};
    use crate::quiz::Question;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn question(text: &str, difficulty: Difficulty) -> Question {
        Question::new(
            text.to_string(),
            vec![
                format!("{} right", text),
                format!("{} wrong 1", text),
                format!("{} wrong 2", text),
                format!("{} wrong 3", text),
            ],
            format!("{} right", text),
            difficulty,
        )
    }

    fn bank(easy: usize, medium: usize, hard: usize) -> QuestionBank {
        let mut questions = Vec::new();
        for i in 0..easy {
            questions.push(question(&format!("easy {}", i), Difficulty::Easy));
        }
        for i in 0..medium {
            questions.push(question(&format!("medium {}", i), Difficulty::Medium));
        }
        for i in 0..hard {
            questions.push(question(&format!("hard {}", i), Difficulty::Hard));
        }
        QuestionBank::new(vec![Category::new("general".to_string(), questions)])
    }

    fn start(bank: &QuestionBank, rules: GameRules) -> Session {
        Session::new(select_category(bank, "general").unwrap(), rules)
    }

    fn present(session: &mut Session, bank: &QuestionBank, rng: &mut StdRng) -> Presented {
        match session.next_question(bank, rng).unwrap() {
            Step::Question(presented) => presented.clone(),
            Step::Ended(t) => panic!("session ended early: {:?}", t),
        }
    }

    fn right_answer(presented: &Presented) -> String {
        format!("{} right", presented.text)
    }

    fn wrong_answer(presented: &Presented) -> String {
        format!("{} wrong 1", presented.text)
    }

    #[test]
    fn unknown_category_is_rejected() {
        let bank = bank(1, 0, 0);
        assert!(matches!(
            select_category(&bank, "history"),
            Err(GameError::UnknownCategory(_))
        ));
    }

    #[test]
    fn questions_follow_the_tier_bands() {
        let bank = bank(5, 5, 5);
        let mut rng = StdRng::seed_from_u64(7);
        let mut session = start(&bank, GameRules::text());
        let questions = &bank.categories()[0].questions;

        for position in 0..15 {
            let presented = present(&mut session, &bank, &mut rng);
            assert_eq!(presented.position, position);
            assert_eq!(
                Some(questions[presented.index].difficulty),
                Difficulty::for_position(position)
            );
            let outcome = session
                .submit_answer(&right_answer(&presented), Duration::from_secs(1))
                .unwrap();
            assert_eq!(outcome, Outcome::Correct);
        }
    }

    #[test]
    fn no_question_repeats_within_a_session() {
        let bank = bank(5, 5, 5);
        let mut rng = StdRng::seed_from_u64(11);
        let mut session = start(&bank, GameRules::graphical());
        let mut seen = BTreeSet::new();
        while let Step::Question(presented) = session.next_question(&bank, &mut rng).unwrap() {
            let presented = presented.clone();
            assert!(seen.insert(presented.index), "question repeated");
            assert_eq!(session.asked().len(), seen.len());
            session
                .submit_answer(&right_answer(&presented), Duration::ZERO)
                .unwrap();
        }
        assert_eq!(seen.len(), 15);
    }

    #[test]
    fn asking_twice_returns_the_same_question() {
        let bank = bank(5, 0, 0);
        let mut rng = StdRng::seed_from_u64(3);
        let mut session = start(&bank, GameRules::text());
        let first = present(&mut session, &bank, &mut rng);
        let again = present(&mut session, &bank, &mut rng);
        assert_eq!(first, again);
        assert_eq!(session.asked().len(), 1);
    }

    #[test]
    fn options_keep_the_answer_after_shuffle() {
        let bank = bank(5, 0, 0);
        let mut rng = StdRng::seed_from_u64(5);
        let mut session = start(&bank, GameRules::text());
        let presented = present(&mut session, &bank, &mut rng);
        assert_eq!(presented.options.len(), 4);
        assert!(presented.options.contains(&right_answer(&presented)));
    }

    #[test]
    fn score_and_checkpoint_advance_on_correct_answers() {
        let bank = bank(5, 5, 5);
        let mut rng = StdRng::seed_from_u64(1);
        let mut session = start(&bank, GameRules::text());
        let mut last_score = 0;

        for position in 0..10 {
            let presented = present(&mut session, &bank, &mut rng);
            session
                .submit_answer(&right_answer(&presented), Duration::from_secs(2))
                .unwrap();
            assert!(session.score() >= last_score);
            last_score = session.score();
            assert_eq!(session.score(), LADDER[position]);
            let expected_guaranteed = match position {
                0..=3 => 0,
                4..=8 => LADDER[4],
                _ => LADDER[9],
            };
            assert_eq!(session.guaranteed(), expected_guaranteed);
        }
        assert_eq!(session.position(), 10);
    }

    #[test]
    fn wrong_answer_pays_the_guaranteed_amount_under_text_rules() {
        let bank = bank(5, 5, 5);
        let mut rng = StdRng::seed_from_u64(2);
        let mut session = start(&bank, GameRules::text());
        for _ in 0..7 {
            let presented = present(&mut session, &bank, &mut rng);
            session
                .submit_answer(&right_answer(&presented), Duration::ZERO)
                .unwrap();
        }
        let presented = present(&mut session, &bank, &mut rng);
        let outcome = session
            .submit_answer(&wrong_answer(&presented), Duration::ZERO)
            .unwrap();
        assert_eq!(outcome, Outcome::Incorrect);
        assert_eq!(
            session.termination(),
            Some(Termination::Lost {
                payout: LADDER[4],
                timed_out: false
            })
        );
        assert_eq!(session.score(), LADDER[6]);
        assert!(matches!(
            session.next_question(&bank, &mut rng).unwrap(),
            Step::Ended(Termination::Lost { .. })
        ));
    }

    #[test]
    fn wrong_answer_pays_the_score_under_graphical_rules() {
        let bank = bank(5, 5, 5);
        let mut rng = StdRng::seed_from_u64(2);
        let mut session = start(&bank, GameRules::graphical());
        for _ in 0..3 {
            let presented = present(&mut session, &bank, &mut rng);
            session
                .submit_answer(&right_answer(&presented), Duration::from_secs(600))
                .unwrap();
        }
        let presented = present(&mut session, &bank, &mut rng);
        session
            .submit_answer(&wrong_answer(&presented), Duration::ZERO)
            .unwrap();
        assert_eq!(session.termination().unwrap().payout(), LADDER[2]);
        assert_eq!(session.rules().payout, PayoutRule::Accumulated);
    }

    #[test]
    fn slow_answer_times_out_even_when_right() {
        let bank = bank(5, 5, 5);
        let mut rng = StdRng::seed_from_u64(4);
        let mut session = start(&bank, GameRules::text());
        let presented = present(&mut session, &bank, &mut rng);
        let outcome = session
            .submit_answer(&right_answer(&presented), Duration::from_secs(31))
            .unwrap();
        assert_eq!(outcome, Outcome::TimedOut);
        assert_eq!(
            session.termination(),
            Some(Termination::Lost {
                payout: 0,
                timed_out: true
            })
        );
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn choice_outside_the_options_changes_nothing() {
        let bank = bank(5, 0, 0);
        let mut rng = StdRng::seed_from_u64(6);
        let mut session = start(&bank, GameRules::text());
        present(&mut session, &bank, &mut rng);
        let before = session.clone();
        assert!(matches!(
            session.submit_answer("Mars", Duration::ZERO),
            Err(GameError::InvalidUserInput(_))
        ));
        assert_eq!(session, before);
    }

    #[test]
    fn eliminated_option_cannot_be_chosen() {
        let bank = bank(5, 0, 0);
        let mut rng = StdRng::seed_from_u64(8);
        let mut session = start(&bank, GameRules::text());
        present(&mut session, &bank, &mut rng);
        let removed = match session
            .apply_lifeline(Lifeline::FiftyFifty, &mut rng)
            .unwrap()
        {
            LifelineEffect::FiftyFifty { removed, .. } => removed,
            other => panic!("unexpected effect: {:?}", other),
        };
        assert!(matches!(
            session.submit_answer(&removed[0], Duration::ZERO),
            Err(GameError::InvalidUserInput(_))
        ));
    }

    #[test]
    fn fifty_fifty_leaves_answer_and_one_wrong_option() {
        let bank = bank(5, 0, 0);
        for seed in 0..32 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut session = start(&bank, GameRules::text());
            let presented = present(&mut session, &bank, &mut rng);
            let effect = session
                .apply_lifeline(Lifeline::FiftyFifty, &mut rng)
                .unwrap();
            let remaining = match effect {
                LifelineEffect::FiftyFifty { remaining, .. } => remaining,
                other => panic!("unexpected effect: {:?}", other),
            };
            assert_eq!(remaining.len(), 2);
            assert!(remaining.contains(&right_answer(&presented)));
            let visible = session.current().unwrap().visible_options();
            assert_eq!(visible, remaining.iter().map(String::as_str).collect::<Vec<_>>());
        }
    }

    #[test]
    fn lifeline_reuse_is_reported_and_has_no_effect() {
        let bank = bank(5, 0, 0);
        let mut rng = StdRng::seed_from_u64(9);
        let mut session = start(&bank, GameRules::text());
        let presented = present(&mut session, &bank, &mut rng);
        session
            .apply_lifeline(Lifeline::FiftyFifty, &mut rng)
            .unwrap();
        let after_first = session.clone();
        assert!(matches!(
            session.apply_lifeline(Lifeline::FiftyFifty, &mut rng),
            Err(GameError::LifelineAlreadyUsed(Lifeline::FiftyFifty))
        ));
        assert_eq!(session, after_first);

        // The other kind is still available, and stays spent on later questions
        assert!(session.is_lifeline_available(Lifeline::Hint));
        session
            .submit_answer(&right_answer(&presented), Duration::ZERO)
            .unwrap();
        present(&mut session, &bank, &mut rng);
        assert!(matches!(
            session.apply_lifeline(Lifeline::FiftyFifty, &mut rng),
            Err(GameError::LifelineAlreadyUsed(_))
        ));
        assert_eq!(session.current().unwrap().visible_options().len(), 4);
    }

    #[test]
    fn hint_reveals_first_letter_only() {
        let bank = QuestionBank::new(vec![Category::new(
            "science".to_string(),
            vec![Question::new(
                "How do plants make food?".to_string(),
                vec![
                    "Respiration".to_string(),
                    "Photosynthesis".to_string(),
                    "Digestion".to_string(),
                    "Transpiration".to_string(),
                ],
                "Photosynthesis".to_string(),
                Difficulty::Easy,
            )],
        )]);
        let mut rng = StdRng::seed_from_u64(10);
        let mut session = Session::new(&bank.categories()[0], GameRules::text());
        let before = present(&mut session, &bank, &mut rng);

        let effect = session.apply_lifeline(Lifeline::Hint, &mut rng).unwrap();
        assert_eq!(effect, LifelineEffect::Hint { first_letter: 'P' });
        let after = session.current().unwrap();
        assert_eq!(after.options, before.options);
        assert_eq!(after.visible_options().len(), 4);
        assert_eq!(after.hint(), Some('P'));
    }

    #[test]
    fn lifeline_needs_a_question_on_screen() {
        let bank = bank(5, 0, 0);
        let mut rng = StdRng::seed_from_u64(12);
        let mut session = start(&bank, GameRules::text());
        assert!(matches!(
            session.apply_lifeline(Lifeline::Hint, &mut rng),
            Err(GameError::NoActiveQuestion)
        ));
        assert!(session.lifelines_used().is_empty());
        assert!(matches!(
            session.submit_answer("anything", Duration::ZERO),
            Err(GameError::NoActiveQuestion)
        ));
    }

    #[test]
    fn running_out_of_band_questions_aborts_with_guaranteed_payout() {
        let bank = bank(5, 2, 5);
        let mut rng = StdRng::seed_from_u64(13);
        let mut session = start(&bank, GameRules::text());
        for _ in 0..7 {
            let presented = present(&mut session, &bank, &mut rng);
            session
                .submit_answer(&right_answer(&presented), Duration::ZERO)
                .unwrap();
        }
        match session.next_question(&bank, &mut rng).unwrap() {
            Step::Ended(termination) => {
                assert_eq!(termination, Termination::Aborted { payout: LADDER[4] })
            }
            Step::Question(q) => panic!("unexpected question: {:?}", q),
        }
        assert!(session.is_over());
    }

    #[test]
    fn empty_category_aborts_immediately() {
        let bank = QuestionBank::new(vec![Category::new("empty".to_string(), vec![])]);
        let mut rng = StdRng::seed_from_u64(14);
        let mut session = Session::new(&bank.categories()[0], GameRules::text());
        assert!(matches!(
            session.next_question(&bank, &mut rng).unwrap(),
            Step::Ended(Termination::Aborted { payout: 0 })
        ));
    }

    #[test]
    fn hint_on_an_unvalidated_empty_answer_is_a_malformed_question() {
        let mut question = question("blank", Difficulty::Easy);
        question.answer = String::new();
        question.options[0] = String::new();
        let bank = QuestionBank::new(vec![Category::new("general".to_string(), vec![question])]);
        let mut rng = StdRng::seed_from_u64(15);
        let mut session = start(&bank, GameRules::text());
        present(&mut session, &bank, &mut rng);

        assert!(matches!(
            session.apply_lifeline(Lifeline::Hint, &mut rng),
            Err(GameError::QuestionFileMalformed { path: None, .. })
        ));
        assert!(session.is_lifeline_available(Lifeline::Hint));
        assert!(session.current().unwrap().hint().is_none());
    }
}
