use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;

use kbc_quiz::config::Config;
use kbc_quiz::quiz::ladder::format_rupees;
use kbc_quiz::quiz::{
    GameRules, Lifeline, LifelineEffect, Outcome, Presented, QuestionBank, Session, Step,
};
use kbc_quiz::GameError;
use log::{info, warn};
use teloxide::{
    dispatching::dialogue::{serializer::Json, ErasedStorage, InMemStorage, SqliteStorage, Storage},
    prelude::*,
    types::{KeyboardButton, KeyboardMarkup},
};

type QuizDialogue = Dialogue<State, ErasedStorage<State>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;
type QuizStorage = Arc<ErasedStorage<State>>;

#[derive(Clone, Default, serde::Serialize, serde::Deserialize)]
pub enum State {
    #[default]
    Start,
    ReceiveCategory,
    InGame {
        session: Session,
    },
    GameOver,
}

const EXIT_BUTTON: &str = "Exit";

fn exit_with(err: impl Display) -> ! {
    log::error!("{}", err);
    eprintln!("Error: {}", err);
    std::process::exit(1);
}

#[tokio::main]
async fn main() {
    pretty_env_logger::init();
    info!("Starting quiz bot...");

    let config = Config::from_env().unwrap_or_else(|err| exit_with(err));
    let bank = QuestionBank::open(&config.questions_path()).unwrap_or_else(|err| exit_with(err));
    let bank = Arc::new(bank);

    if std::env::var("TELOXIDE_TOKEN").is_err() {
        exit_with("TELOXIDE_TOKEN is not set");
    }
    let bot = Bot::from_env();

    let storage: QuizStorage = match &config.dialogue_db {
        Some(path) => {
            info!("Opening dialogue database {}", path.display());
            SqliteStorage::open(&path.to_string_lossy(), Json)
                .await
                .unwrap_or_else(|err| exit_with(err))
                .erase()
        }
        None => InMemStorage::<State>::new().erase(),
    };

    let bank_for_start = bank.clone();
    let bank_for_category = bank.clone();
    let bank_for_game = bank.clone();
    let bank_for_game_over = bank;

    Dispatcher::builder(
        bot,
        Update::filter_message()
            .enter_dialogue::<Message, ErasedStorage<State>, State>()
            .branch(dptree::case![State::Start].endpoint(
                move |bot: Bot, dialogue: QuizDialogue, msg: Message| {
                    start(bank_for_start.clone(), bot, dialogue, msg)
                },
            ))
            .branch(dptree::case![State::ReceiveCategory].endpoint(
                move |bot: Bot, dialogue: QuizDialogue, msg: Message| {
                    receive_category(bank_for_category.clone(), bot, dialogue, msg)
                },
            ))
            .branch(dptree::case![State::InGame { session }].endpoint(
                move |bot: Bot, dialogue: QuizDialogue, session: Session, msg: Message| {
                    in_game(bank_for_game.clone(), bot, dialogue, session, msg)
                },
            ))
            .branch(dptree::case![State::GameOver].endpoint(
                move |bot: Bot, dialogue: QuizDialogue, msg: Message| {
                    game_over(bank_for_game_over.clone(), bot, dialogue, msg)
                },
            )),
    )
    .dependencies(dptree::deps![storage])
    .enable_ctrlc_handler()
    .build()
    .dispatch()
    .await;
}

fn category_keyboard(bank: &QuestionBank) -> KeyboardMarkup {
    KeyboardMarkup::new(
        bank.categories()
            .iter()
            .map(|c| vec![KeyboardButton::new(c.display_name())])
            .collect::<Vec<_>>(),
    )
}

/// One row per option still in play, then the two lifelines.
fn question_keyboard(presented: &Presented) -> KeyboardMarkup {
    let mut rows: Vec<Vec<KeyboardButton>> = presented
        .visible_options()
        .into_iter()
        .map(|option| vec![KeyboardButton::new(option)])
        .collect();
    rows.push(
        Lifeline::ALL
            .iter()
            .map(|kind| KeyboardButton::new(kind.label()))
            .collect(),
    );
    KeyboardMarkup::new(rows)
}

fn question_text(session: &Session, presented: &Presented) -> String {
    let mut text = format!(
        "Question {}\n\n{}\n\nScore: {}",
        presented.number(),
        presented.text,
        format_rupees(session.score())
    );
    if let Some(first_letter) = presented.hint() {
        text.push_str(&format!(
            "\nHint: The correct answer starts with '{}'",
            first_letter
        ));
    }
    text
}

/// What a message sent during a game asks for.
#[derive(Debug, PartialEq, Eq)]
enum Request {
    Answer,
    Lifeline(Lifeline),
}

/// Option texts win over lifeline labels, so an option called "Hint" stays
/// answerable.
fn request_for(session: &Session, text: &str) -> Request {
    let is_option = session
        .current()
        .map_or(false, |presented| presented.is_visible(text));
    match Lifeline::from_label(text) {
        Some(kind) if !is_option => Request::Lifeline(kind),
        _ => Request::Answer,
    }
}

async fn start(
    bank: Arc<QuestionBank>,
    bot: Bot,
    dialogue: QuizDialogue,
    msg: Message,
) -> HandlerResult {
    bot.send_message(msg.chat.id, "Choose a Category")
        .reply_markup(category_keyboard(&bank))
        .await?;

    dialogue.update(State::ReceiveCategory).await?;
    Ok(())
}

async fn receive_category(
    bank: Arc<QuestionBank>,
    bot: Bot,
    dialogue: QuizDialogue,
    msg: Message,
) -> HandlerResult {
    let session = match msg.text().and_then(|text| bank.find_category(text)) {
        Some(category) => {
            info!("Chat {} starts a game in \"{}\"", msg.chat.id.0, category.name);
            Session::new(category, GameRules::graphical())
        }
        None => {
            bot.send_message(msg.chat.id, "Please choose one of the categories")
                .reply_markup(category_keyboard(&bank))
                .await?;
            return Ok(());
        }
    };

    show_next_question(&bank, &bot, &dialogue, msg.chat.id, session).await
}

async fn show_next_question(
    bank: &QuestionBank,
    bot: &Bot,
    dialogue: &QuizDialogue,
    chat_id: ChatId,
    mut session: Session,
) -> HandlerResult {
    let presented = {
        let mut rng = rand::thread_rng();
        session
            .next_question(bank, &mut rng)
            .map(|step| match step {
                Step::Question(presented) => Some(presented.clone()),
                Step::Ended(_) => None,
            })
    };
    let presented = match presented {
        Ok(presented) => presented,
        // e.g. a stored session whose category left the question file
        Err(err) if err.is_recoverable() => {
            warn!("Chat {} cannot continue its game: {}", chat_id.0, err);
            bot.send_message(chat_id, format!("{}\n\nChoose a Category", err))
                .reply_markup(category_keyboard(bank))
                .await?;
            dialogue.update(State::ReceiveCategory).await?;
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    match presented {
        Some(presented) => {
            bot.send_message(chat_id, question_text(&session, &presented))
                .reply_markup(question_keyboard(&presented))
                .await?;
            dialogue.update(State::InGame { session }).await?;
        }
        None => show_result(bot, dialogue, chat_id, &session).await?,
    }
    Ok(())
}

async fn show_result(
    bot: &Bot,
    dialogue: &QuizDialogue,
    chat_id: ChatId,
    session: &Session,
) -> HandlerResult {
    let payout = match session.termination() {
        Some(termination) => termination.payout(),
        None => session.score(),
    };
    info!(
        "Chat {} finished \"{}\": {:?}",
        chat_id.0,
        session.category(),
        session.termination()
    );

    bot.send_message(
        chat_id,
        format!("Game Over!\n\nYou won {}", format_rupees(payout)),
    )
    .reply_markup(KeyboardMarkup::new(vec![vec![KeyboardButton::new(
        EXIT_BUTTON,
    )]]))
    .await?;

    dialogue.update(State::GameOver).await?;
    Ok(())
}

async fn in_game(
    bank: Arc<QuestionBank>,
    bot: Bot,
    dialogue: QuizDialogue,
    mut session: Session,
    msg: Message,
) -> HandlerResult {
    let text = match msg.text() {
        Some(text) => text.to_string(),
        None => {
            bot.send_message(msg.chat.id, "Please press one of the buttons")
                .await?;
            return Ok(());
        }
    };

    if let Request::Lifeline(kind) = request_for(&session, &text) {
        let effect = {
            let mut rng = rand::thread_rng();
            session.apply_lifeline(kind, &mut rng)
        };
        match effect {
            Ok(LifelineEffect::FiftyFifty { .. }) => {
                if let Some(presented) = session.current() {
                    bot.send_message(msg.chat.id, question_text(&session, presented))
                        .reply_markup(question_keyboard(presented))
                        .await?;
                }
            }
            Ok(LifelineEffect::Hint { first_letter }) => {
                bot.send_message(
                    msg.chat.id,
                    format!("Hint: The correct answer starts with '{}'", first_letter),
                )
                .await?;
            }
            Err(GameError::LifelineAlreadyUsed(kind)) => {
                warn!("Chat {} asked for {} again", msg.chat.id.0, kind);
                bot.send_message(msg.chat.id, "You have already used this lifeline.")
                    .await?;
            }
            Err(err) if err.is_recoverable() => {
                warn!("Chat {} lifeline {} refused: {}", msg.chat.id.0, kind, err);
                bot.send_message(msg.chat.id, err.to_string()).await?;
            }
            Err(err) => return Err(err.into()),
        }
        dialogue.update(State::InGame { session }).await?;
        return Ok(());
    }

    // No clock on this front-end
    match session.submit_answer(&text, Duration::ZERO) {
        Ok(Outcome::Correct) => {
            show_next_question(&bank, &bot, &dialogue, msg.chat.id, session).await
        }
        Ok(Outcome::Incorrect | Outcome::TimedOut) => {
            show_result(&bot, &dialogue, msg.chat.id, &session).await
        }
        Err(GameError::InvalidUserInput(reason)) => {
            warn!("Chat {} sent an unknown answer: {}", msg.chat.id.0, reason);
            bot.send_message(msg.chat.id, "Please choose one of the options")
                .await?;
            Ok(())
        }
        Err(err) if err.is_recoverable() => {
            warn!("Chat {} answer refused: {}", msg.chat.id.0, err);
            bot.send_message(msg.chat.id, err.to_string()).await?;
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

async fn game_over(
    bank: Arc<QuestionBank>,
    bot: Bot,
    dialogue: QuizDialogue,
    msg: Message,
) -> HandlerResult {
    if msg.text() != Some(EXIT_BUTTON) {
        bot.send_message(msg.chat.id, "Thanks for playing!").await?;
    }
    start(bank, bot, dialogue, msg).await
}
