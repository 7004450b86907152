//! Interactive chat command.
//!
//! History lives in this loop and is passed to every question explicitly.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use crate::rag::{ConversationTurn, ModelChoice};
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// Run the interactive chat command.
pub async fn run_chat(smart: bool, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(settings)?;
    let model = ModelChoice::from_smart(smart);

    let mut history: Vec<ConversationTurn> = Vec::new();
    let mut last_answer: Option<String> = None;

    println!("\n{}", style("docbrain chat").bold().cyan());
    println!(
        "{}\n",
        style("Ask about your documents. '/email' drafts an email from the last answer, '/clear' resets, 'exit' quits.").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("/clear") {
            history.clear();
            last_answer = None;
            Output::info("Conversation history cleared.");
            continue;
        }

        if input.eq_ignore_ascii_case("/email") {
            let Some(answer_text) = last_answer.as_deref() else {
                Output::warning("Ask a question first; the email is drafted from the last answer.");
                continue;
            };

            let spinner = Output::spinner("Drafting email...");
            let result = orchestrator.draft_email(answer_text, model).await;
            spinner.finish_and_clear();

            match result {
                Ok(email) => {
                    Output::header("Draft email");
                    println!("\n{}\n", email.answer);
                }
                Err(e) => Output::error(&format!("Error: {}", e)),
            }
            continue;
        }

        let spinner = Output::spinner("Thinking...");
        let result = orchestrator.answer(input, &history, model).await;
        spinner.finish_and_clear();

        match result {
            Ok(answer) => {
                Output::answer(&answer);
                println!();
                history.push(ConversationTurn::user(input));
                history.push(ConversationTurn::assistant(answer.answer.clone()));
                last_answer = Some(answer.answer);
            }
            Err(e) => {
                // History is only extended on success.
                Output::error(&format!("Error: {}", e));
            }
        }
    }

    Ok(())
}
