pub mod deploy;
pub mod destroy;
pub mod status;
pub mod synth;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum Commands {
    /// Synthesize the deployment template
    Synth(synth::SynthCommand),

    /// Deploy the stack to AWS
    Deploy(deploy::DeployCommand),

    /// Delete the deployed stack
    Destroy(destroy::DestroyCommand),

    /// Show the status of the deployed stack
    Status(status::StatusCommand),
}
