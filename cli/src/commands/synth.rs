mod runner;
use crate::runner::{Runnable, Runner};
use runner::SynthRunner;
use std::path::PathBuf;

#[derive(clap::Args, Clone)]
pub(crate) struct SynthCommand {
    /// Where to write the synthesized template
    #[arg(short, long, default_value = "template.json")]
    output: PathBuf,
}

impl Runnable for SynthCommand {
    fn runner(&self) -> impl Runner {
        SynthRunner {
            command: self.clone(),
        }
    }
}
