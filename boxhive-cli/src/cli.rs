//! Command-line surface: global flags, subcommands, dispatch.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::commands;

#[derive(Parser, Debug)]
#[command(
    name = "boxhive",
    version,
    about = "Box lifecycle and branching snapshot management",
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalFlags,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug)]
pub struct GlobalFlags {
    /// Runtime home directory (defaults to ~/.boxhive)
    #[arg(long, global = true, env = "BOXHIVE_HOME")]
    pub home: Option<PathBuf>,
}

impl GlobalFlags {
    /// Build a runtime honoring the `--home` override.
    pub fn create_runtime(&self) -> anyhow::Result<boxhive::BoxhiveRuntime> {
        let runtime = match &self.home {
            Some(home) => boxhive::BoxhiveRuntime::new(boxhive::BoxhiveOptions::with_home(
                std::path::absolute(home)?,
            ))?,
            None => boxhive::BoxhiveRuntime::with_defaults()?,
        };
        Ok(runtime)
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List boxes, or the snapshots of one box
    List(commands::list::ListArgs),
    /// Freeze a box's live content into a new snapshot
    Take(commands::take::TakeArgs),
    /// Remove a snapshot, folding it into its successor when one exists
    Remove(commands::remove::RemoveArgs),
    /// Re-base a box's live content onto a snapshot
    Select(commands::select::SelectArgs),
    /// Update a snapshot's name or description
    SetInfo(commands::set_info::SetInfoArgs),
    /// Delete all of a box's on-disk content
    Clean(commands::clean::CleanArgs),
    /// Rename a box (its content must be cleaned first)
    Rename(commands::rename::RenameArgs),
    /// Drop a box's configuration (its content must be cleaned first)
    RemoveBox(commands::remove_box::RemoveBoxArgs),
}

impl Command {
    pub async fn execute(self, global: &GlobalFlags) -> anyhow::Result<()> {
        match self {
            Command::List(args) => commands::list::execute(args, global).await,
            Command::Take(args) => commands::take::execute(args, global).await,
            Command::Remove(args) => commands::remove::execute(args, global).await,
            Command::Select(args) => commands::select::execute(args, global).await,
            Command::SetInfo(args) => commands::set_info::execute(args, global).await,
            Command::Clean(args) => commands::clean::execute(args, global).await,
            Command::Rename(args) => commands::rename::execute(args, global).await,
            Command::RemoveBox(args) => commands::remove_box::execute(args, global).await,
        }
    }
}
