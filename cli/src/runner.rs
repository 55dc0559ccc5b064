use crate::config::Config;
use crate::error::Error;
use std::error::Error as StdError;

pub(crate) trait Runner {
    /// Stack configuration from the current directory
    fn config(&self) -> Result<Config, Error> {
        let config = Config::from_current_dir();

        if config.is_err() {
            return Err(self.error(
                Some("Invalid configuration"),
                Some("Check user-manager.toml in the current directory"),
                None,
            ));
        }

        Ok(config?)
    }

    /// Run the command
    ///
    /// Returns an error shown to the user in case of failure
    async fn run(&mut self) -> Result<(), Error>;

    /// Construct an error shown to the user
    fn error(
        &self,
        title: Option<&str>,
        description: Option<&str>,
        origin: Option<Box<dyn StdError>>,
    ) -> Error {
        if let Some(origin) = origin {
            log::error!("{origin:?}");
        }

        if let Some(title) = title {
            Error::new(title, description)
        } else {
            Error::new("Failed to run the command", None)
        }
    }
}

/// Return a runner for a command
pub(crate) trait Runnable {
    fn runner(&self) -> impl Runner;
}
