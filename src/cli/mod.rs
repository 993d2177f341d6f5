//! Command line interface
//!
//! - `serve`: HTTP server for `POST /ask` (default deployment)
//! - `ask`: answer one question in-process
//! - `chat`: interactive client for a running server
//! - `demo`: run the built-in question sets in-process

pub mod ask;
pub mod chat;
pub mod demo;
pub mod serve;

use clap::{Parser, Subcommand};

/// Semantic Cache QA - answers questions from a semantic cache in front of an LLM
#[derive(Parser)]
#[command(name = "semantic-cache-qa")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP server
    Serve,

    /// Answer a single question and exit
    Ask(ask::AskArgs),

    /// Chat with a running server from the terminal
    Chat(chat::ChatArgs),

    /// Run the built-in question sets
    Demo,
}
