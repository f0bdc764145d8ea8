//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "gemini-panel")]
#[command(about = "A terminal chat panel for Google Gemini")]
#[command(
    long_about = "gemini-panel is a full-screen terminal chat with Google Gemini.\n\n\
On first start it asks for a Gemini API key, checks it against the API and \
stores it locally. After that it opens straight into the chat.\n\n\
Controls:\n\
  Enter             Save the key / send the message\n\
  Ctrl+V            Show or hide the key while typing it\n\
  Ctrl+L            Clear the key field and the stored key\n\
  Ctrl+O            Open the page for creating a key\n\
  Ctrl+B            Sign out (forget the stored key)\n\
  Up/Down/PgUp/PgDn Scroll the conversation\n\
  Esc, Ctrl+C       Quit\n\n\
Environment:\n\
  GEMINI_MODEL      Override the chat model\n\
  GEMINI_API_BASE   Override the API base URL\n\
  RUST_LOG          Log filter (default gemini_panel=info)"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config file to use instead of ~/.config/gemini-panel/config.toml
    #[arg(short = 'c', long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Credential store file to use instead of the default location
    #[arg(short = 's', long, global = true, value_name = "PATH")]
    pub store: Option<PathBuf>,

    /// Write logs to this file
    #[arg(short = 'l', long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Subcommand, PartialEq, Eq)]
pub enum Commands {
    /// Start the chat panel (default)
    Chat,
    /// Forget the stored API key
    SignOut,
}

impl Args {
    pub fn subcommand(&self) -> &Commands {
        self.command.as_ref().unwrap_or(&Commands::Chat)
    }
}
