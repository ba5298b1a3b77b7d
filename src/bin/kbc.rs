use std::io;
use std::process::ExitCode;

use kbc_quiz::config::Config;
use kbc_quiz::console::Console;
use kbc_quiz::quiz::{GameRules, QuestionBank};
use kbc_quiz::GameError;

fn run() -> Result<(), GameError> {
    let config = Config::from_env()?;
    let questions_path = config.questions_path();
    log::info!("Loading questions from {}", questions_path.display());
    let bank = QuestionBank::open(&questions_path)?;

    let rules = GameRules::text().with_time_limit(config.time_limit);
    let stdin = io::stdin();
    let mut console = Console::new(stdin.lock(), io::stdout());
    console.play(&bank, rules, &mut rand::thread_rng())?;
    Ok(())
}

fn main() -> ExitCode {
    pretty_env_logger::init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", err);
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}
