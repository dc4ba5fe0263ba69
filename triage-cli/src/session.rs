//! Interactive review session over stdin.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::info;

use triage_core::refresh::RefreshHandle;
use triage_core::{DocumentId, RefreshCoordinator, RefreshRequest, ReviewController};

use crate::render;

/// One line typed by the reviewer.
#[derive(Parser, Debug)]
#[command(
    no_binary_name = true,
    disable_help_subcommand = true,
    disable_help_flag = true,
    disable_version_flag = true
)]
struct SessionLine {
    #[command(subcommand)]
    command: SessionCommand,
}

#[derive(Subcommand, Debug, PartialEq)]
enum SessionCommand {
    /// Show documents with their current decision
    #[command(alias = "ls")]
    List,
    /// Confirm the predicted category of a document
    Validate { id: u64 },
    /// Assign a different category to a document
    Correct { id: u64, category: String },
    /// Submit all pending decisions
    Save,
    /// Show the summary view
    Dashboard,
    /// Refresh the summary view in the background
    Refresh,
    /// Wait for the background refresh to finish
    Wait,
    /// List commands
    Help,
    /// End the session
    #[command(alias = "exit")]
    Quit,
}

fn parse_line(line: &str) -> Result<Option<SessionCommand>, clap::Error> {
    let words: Vec<&str> = line.split_whitespace().collect();
    if words.is_empty() {
        return Ok(None);
    }
    SessionLine::try_parse_from(words).map(|parsed| Some(parsed.command))
}

const HELP: &str = "\
commands:
  list                      show documents
  validate <id>             confirm the predicted category
  correct <id> <category>   assign a different category
  save                      submit pending decisions
  dashboard                 show the summary view
  refresh                   refresh the summary in the background
  wait                      wait for the running refresh
  quit                      end the session";

pub struct Session {
    controller: ReviewController,
    coordinator: RefreshCoordinator,
    pending_refresh: Option<RefreshHandle>,
}

impl Session {
    pub fn new(controller: ReviewController, coordinator: RefreshCoordinator) -> Self {
        Self {
            controller,
            coordinator,
            pending_refresh: None,
        }
    }

    pub async fn run<R: AsyncBufRead + Unpin>(mut self, input: R) -> Result<()> {
        let session = self.coordinator.engine().begin_session().await;
        info!("Review {} started", session);

        println!("{}", render::review_list(&self.controller));
        println!("Type 'help' for commands.");

        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            let command = match parse_line(&line) {
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(e) => {
                    println!("{}", e.render());
                    continue;
                }
            };

            if command == SessionCommand::Quit {
                break;
            }
            let output = self.execute(command).await;
            println!("{}", output);
        }

        info!("Review {} ended", session);
        Ok(())
    }

    async fn execute(&mut self, command: SessionCommand) -> String {
        match command {
            SessionCommand::List => render::review_list(&self.controller),
            SessionCommand::Validate { id } => match self.controller.validate(DocumentId(id)) {
                Ok(()) => format!("Document #{} validated. {}", id, self.pending_line()),
                Err(e) => format!("Error: {}", e),
            },
            SessionCommand::Correct { id, category } => {
                match self.controller.correct(DocumentId(id), &category) {
                    Ok(()) => format!(
                        "Document #{} corrected to {}. {}",
                        id,
                        category,
                        self.pending_line()
                    ),
                    Err(e) => format!("Error: {}", e),
                }
            }
            SessionCommand::Save => match self.controller.commit().await {
                Ok(receipt) => format!("Saved {} annotation(s).", receipt.submitted),
                Err(e) => format!("Error: {}", e),
            },
            SessionCommand::Dashboard => {
                let snapshot = self.coordinator.engine().snapshot().await;
                let mut out = render::dashboard(
                    &snapshot,
                    self.controller.average_confidence_percent(),
                );
                if !self.coordinator.trigger_enabled() {
                    out.push_str("\n(refreshing...)");
                }
                out
            }
            SessionCommand::Refresh => match self.coordinator.request_refresh() {
                RefreshRequest::Started(handle) => {
                    let sequence = handle.token().sequence;
                    self.pending_refresh = Some(handle);
                    format!("Refresh {} started.", sequence)
                }
                RefreshRequest::AlreadyInProgress => "A refresh is already in progress.".to_string(),
            },
            SessionCommand::Wait => match self.pending_refresh.take() {
                Some(handle) => render::refresh_outcome(&handle.wait().await),
                None => "No refresh started from this session.".to_string(),
            },
            SessionCommand::Help => HELP.to_string(),
            SessionCommand::Quit => String::new(),
        }
    }

    fn pending_line(&self) -> String {
        format!("{} pending.", self.controller.pending_count())
    }
}
