//! Operator confirmation gate.
//!
//! The interactive confirm/skip loop is a blocking request/response protocol
//! with a human. It is abstracted behind a decision-provider capability so
//! the interactive implementation can be swapped for an automated policy.

use crate::error::Result;
use std::io::{BufRead, Write};

/// Decision provider consulted before any edit is applied.
pub trait Confirmer {
    /// Present a prompt and return whether the operator accepted it.
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

/// Interactive confirmer reading `y`/`n` answers from standard input.
///
/// Invalid input is rejected and the question repeated; the process blocks
/// indefinitely at the prompt.
#[derive(Debug, Default)]
pub struct StdinConfirmer;

impl StdinConfirmer {
    /// Create a new interactive confirmer.
    pub fn new() -> Self {
        StdinConfirmer
    }
}

impl Confirmer for StdinConfirmer {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();

        println!("{}", prompt);

        loop {
            write!(stdout, "> (y/n) : ")?;
            stdout.flush()?;

            let mut answer = String::new();
            stdin.lock().read_line(&mut answer)?;

            match answer.trim() {
                "y" => return Ok(true),
                "n" => return Ok(false),
                other => println!("Invalid input {:?}, try again", other),
            }
        }
    }
}

/// Non-interactive policy that accepts every prompt.
#[derive(Debug, Default)]
pub struct AcceptAll;

impl Confirmer for AcceptAll {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        log::debug!("auto-accepting: {}", prompt.lines().next().unwrap_or(""));
        Ok(true)
    }
}
