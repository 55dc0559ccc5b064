use crate::commands::synth::SynthCommand;
use crate::environment;
use crate::error::Error;
use crate::runner::Runner;
use eyre::WrapErr;
use user_manager_stack::app::App;
use user_manager_stack::stack::UserManagerStack;

pub(crate) struct SynthRunner {
    pub(crate) command: SynthCommand,
}

impl Runner for SynthRunner {
    async fn run(&mut self) -> Result<(), Error> {
        let config = self.config()?;
        let shared = environment::load().await;
        let env = environment::resolve(&shared, &config).await?;

        let mut app = App::new();
        app.add_stack(UserManagerStack::new(&config.stack.name, env));

        let assembly = app.synth()?;
        let template = assembly.template(&config.stack.name)?;

        std::fs::write(&self.command.output, template.to_json_pretty()?)
            .wrap_err("Failed to write the template")?;

        println!(
            "{} {}",
            console::style("Synthesized").green().bold(),
            self.command.output.display()
        );

        Ok(())
    }
}
