//! Ask command handler.
//!
//! Builds the pipeline once and answers each question in order.

use clap::Args;
use medbot_core::{config::AppConfig, AppError, AppResult};
use medbot_knowledge::{AnswerGenerator, ConversationTurn};

/// Answer questions from the command line
#[derive(Args, Debug)]
pub struct AskCommand {
    /// Questions to ask
    #[arg(required = true)]
    pub questions: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command ({} questions)", self.questions.len());

        let questions: Vec<&str> = self.questions.iter().map(|q| q.trim()).collect();
        if questions.iter().any(|q| q.is_empty()) {
            return Err(AppError::Validation("Question cannot be empty.".to_string()));
        }

        let pipeline = medbot_knowledge::build_pipeline(config).await?;
        let mut turns = Vec::with_capacity(questions.len());

        for question in questions {
            let turn = pipeline.chain.answer(question).await?;
            if !self.json {
                print_turn(&turn);
            }
            turns.push(turn);
        }

        if self.json {
            println!("{}", serde_json::to_string_pretty(&turns)?);
        }

        Ok(())
    }
}

fn print_turn(turn: &ConversationTurn) {
    println!("Q: {}", turn.question);
    println!("A: {}", turn.answer);
    println!();
}
