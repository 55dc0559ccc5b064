use crate::asset::Asset;
use crate::commands::deploy::DeployCommand;
use crate::environment;
use crate::error::Error;
use crate::logger::Logger;
use crate::runner::Runner;
use aws_sdk_cloudformation::types::{Capability, Parameter};
use eyre::WrapErr;
use user_manager_stack::app::App;
use user_manager_stack::stack::UserManagerStack;
use user_manager_stack::template::{ASSETS_BUCKET_PARAM, ASSETS_KEY_PARAM};

pub(crate) struct DeployRunner {
    pub(crate) command: DeployCommand,
}

impl Runner for DeployRunner {
    async fn run(&mut self) -> Result<(), Error> {
        let config = self.config()?;

        let bucket = self
            .command
            .bucket
            .clone()
            .or(config.stack.assets_bucket.clone());

        let Some(bucket) = bucket else {
            return Err(self.error(
                Some("Missing assets bucket"),
                Some("Set stack.assets_bucket in user-manager.toml or pass --bucket"),
                None,
            ));
        };

        let shared = environment::load().await;
        let env = environment::resolve(&shared, &config).await?;

        let mut app = App::new();
        let stack = UserManagerStack::new(&config.stack.name, env);
        let asset = Asset::new(stack.handler.code.path.clone());
        app.add_stack(stack);

        let assembly = app.synth()?;
        let template = assembly.template(&config.stack.name)?;

        let progress = Logger::multi_progress().add(indicatif::ProgressBar::new_spinner());
        progress.enable_steady_tick(std::time::Duration::from_millis(100));

        progress.set_message(format!(
            "{} handler bundle",
            console::style("   Uploading").green().bold()
        ));

        let s3 = aws_sdk_s3::Client::new(&shared);
        let key = asset.upload(&s3, &bucket).await?;

        progress.set_message(format!(
            "{} {}",
            console::style("Provisioning").green().bold(),
            config.stack.name
        ));

        self.provision(&shared, &config.stack.name, template, &bucket, &key)
            .await?;

        progress.finish_and_clear();

        println!("{}", console::style("Done").green().bold());
        Ok(())
    }
}

impl DeployRunner {
    /// Provision the template in CloudFormation
    async fn provision(
        &self,
        shared: &aws_config::SdkConfig,
        name: &str,
        template: &user_manager_stack::template::Template,
        bucket: &str,
        key: &str,
    ) -> eyre::Result<()> {
        let client = aws_sdk_cloudformation::Client::new(shared);
        let capabilities = Capability::CapabilityIam;
        let template_string = template.to_json_pretty()?;

        let parameters = vec![
            Parameter::builder()
                .parameter_key(ASSETS_BUCKET_PARAM)
                .parameter_value(bucket)
                .build(),
            Parameter::builder()
                .parameter_key(ASSETS_KEY_PARAM)
                .parameter_value(key)
                .build(),
        ];

        if is_exists(&client, name).await? {
            client
                .update_stack()
                .capabilities(capabilities)
                .stack_name(name)
                .template_body(template_string)
                .set_parameters(Some(parameters))
                .send()
                .await
                .wrap_err("Failed to update stack")?;
        } else {
            client
                .create_stack()
                .capabilities(capabilities)
                .stack_name(name)
                .template_body(template_string)
                .set_parameters(Some(parameters))
                .send()
                .await
                .wrap_err("Failed to create stack")?;
        }

        Ok(())
    }
}

/// Check if the stack already exists
async fn is_exists(client: &aws_sdk_cloudformation::Client, name: &str) -> eyre::Result<bool> {
    let result = client
        .describe_stacks()
        .set_stack_name(Some(name.into()))
        .send()
        .await;

    if let Err(e) = &result {
        if let aws_sdk_cloudformation::error::SdkError::ServiceError(err) = e {
            if err
                .err()
                .meta()
                .code()
                .unwrap_or_default()
                .eq("ValidationError")
            {
                return Ok(false);
            }

            return Err(eyre::eyre!("Service error while describing stack: {err:?}"));
        }

        return Err(eyre::eyre!("Failed to describe stack: {e:?}"));
    }

    Ok(true)
}
