use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "job-tracker", version, about = "Job application tracking service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Apply migrations and start the HTTP server (default)
    Serve,
    /// Apply pending database migrations and exit
    Migrate,
}

impl Cli {
    pub fn resolved_command(&self) -> Command {
        self.command.unwrap_or(Command::Serve)
    }
}
