mod runner;
use crate::runner::{Runnable, Runner};
use runner::DeployRunner;

#[derive(clap::Args, Clone)]
pub(crate) struct DeployCommand {
    /// Assets bucket, overrides stack.assets_bucket from user-manager.toml
    #[arg(short, long)]
    bucket: Option<String>,
}

impl Runnable for DeployCommand {
    fn runner(&self) -> impl Runner {
        DeployRunner {
            command: self.clone(),
        }
    }
}
