mod runner;
use crate::runner::{Runnable, Runner};
use runner::StatusRunner;

#[derive(clap::Args, Clone)]
pub(crate) struct StatusCommand {
    /// Also list the failure reasons of individual resources
    #[arg(short, long, action = clap::ArgAction::SetTrue)]
    verbose: bool,
}

impl Runnable for StatusCommand {
    fn runner(&self) -> impl Runner {
        StatusRunner {
            command: self.clone(),
        }
    }
}
