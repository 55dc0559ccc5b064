use crate::commands::status::StatusCommand;
use crate::environment;
use crate::error::Error;
use crate::runner::Runner;
use eyre::{ContextCompat, WrapErr};

pub(crate) struct StatusRunner {
    pub(crate) command: StatusCommand,
}

impl Runner for StatusRunner {
    async fn run(&mut self) -> Result<(), Error> {
        let config = self.config()?;
        let name = config.stack.name.clone();

        let shared = environment::load().await;
        let client = aws_sdk_cloudformation::Client::new(&shared);

        let stacks = client
            .describe_stacks()
            .stack_name(&name)
            .send()
            .await
            .wrap_err("Failed to describe stack, is it deployed?")?;

        let stack = stacks.stacks().first().wrap_err("Stack is not deployed")?;
        let status = stack.stack_status().wrap_err("Missing stack status")?;
        let status = status.as_str();

        let is_failed = status.contains("FAILED") || status.contains("ROLLBACK");

        let styled = if is_failed {
            console::style(status).red().bold()
        } else if status.ends_with("_COMPLETE") {
            console::style(status).green().bold()
        } else {
            console::style(status).yellow().bold()
        };

        println!("{} {styled}", console::style(&name).bold());

        if is_failed || self.command.verbose {
            self.print_failed_events(&client, &name).await?;
        }

        Ok(())
    }
}

impl StatusRunner {
    /// List resource events that explain a failed deployment
    async fn print_failed_events(
        &self,
        client: &aws_sdk_cloudformation::Client,
        name: &str,
    ) -> eyre::Result<()> {
        let response = client
            .describe_stack_events()
            .stack_name(name)
            .send()
            .await
            .wrap_err("Failed to describe stack events")?;

        for event in response.stack_events() {
            let status = match event.resource_status() {
                Some(status) => status.as_str(),
                None => continue,
            };

            if !status.contains("FAILED") {
                continue;
            }

            println!(
                "{} {}",
                console::style(event.logical_resource_id().unwrap_or_default()).bold(),
                console::style(event.resource_status_reason().unwrap_or_default()).dim()
            );
        }

        Ok(())
    }
}
