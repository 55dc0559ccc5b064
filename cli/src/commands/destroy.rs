mod runner;
use crate::runner::{Runnable, Runner};
use clap::ArgAction;
use runner::DestroyRunner;

#[derive(clap::Args, Clone)]
pub(crate) struct DestroyCommand {
    /// Do not ask for confirmation
    #[arg(short, long, action = ArgAction::SetTrue)]
    force: bool,
}

impl Runnable for DestroyCommand {
    fn runner(&self) -> impl Runner {
        DestroyRunner {
            command: self.clone(),
        }
    }
}
