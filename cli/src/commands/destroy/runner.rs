use crate::commands::destroy::DestroyCommand;
use crate::environment;
use crate::error::Error;
use crate::runner::Runner;
use eyre::WrapErr;
use std::io::Write;

pub(crate) struct DestroyRunner {
    pub(crate) command: DestroyCommand,
}

impl Runner for DestroyRunner {
    async fn run(&mut self) -> Result<(), Error> {
        let config = self.config()?;
        let name = config.stack.name.clone();

        if !self.command.force && !confirm(&name)? {
            println!("{}", console::style("Aborted").yellow().bold());
            return Ok(());
        }

        let shared = environment::load().await;
        let client = aws_sdk_cloudformation::Client::new(&shared);

        client
            .delete_stack()
            .stack_name(&name)
            .send()
            .await
            .wrap_err("Failed to delete stack")?;

        println!(
            "{} {}",
            console::style("Destroying").green().bold(),
            name
        );

        Ok(())
    }
}

/// Ask the user to type the stack name back before deleting it
fn confirm(name: &str) -> eyre::Result<bool> {
    print!(
        "Type the stack name ({}) to confirm deletion: ",
        console::style(name).bold()
    );
    std::io::stdout().flush().wrap_err("Failed to flush stdout")?;

    let mut input = String::new();

    std::io::stdin()
        .read_line(&mut input)
        .wrap_err("Failed to read the confirmation")?;

    Ok(input.trim() == name)
}
