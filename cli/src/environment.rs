use crate::config::Config;
use aws_config::BehaviorVersion;
use aws_config::SdkConfig;
use eyre::{ContextCompat, WrapErr};
use user_manager_stack::stack::Env;

pub(crate) async fn load() -> SdkConfig {
    aws_config::defaults(BehaviorVersion::v2025_01_17())
        .load()
        .await
}

/// Resolve the deployment environment the stack is synthesized for
///
/// Values pinned in user-manager.toml win; anything missing comes from the
/// credentials provider chain and the STS caller identity.
pub(crate) async fn resolve(shared: &SdkConfig, config: &Config) -> eyre::Result<Env> {
    let region = match config.stack.region.clone() {
        Some(region) => region,

        None => shared
            .region()
            .map(|region| region.to_string())
            .wrap_err("No AWS region configured")?,
    };

    let account = match config.stack.account.clone() {
        Some(account) => account,

        None => {
            let client = aws_sdk_sts::Client::new(shared);

            let identity = client
                .get_caller_identity()
                .send()
                .await
                .wrap_err("Failed to resolve the caller identity")?;

            identity
                .account()
                .wrap_err("Failed to get AWS account ID")?
                .to_string()
        }
    };

    log::debug!("Resolved environment: account {account}, region {region}");

    Ok(Env::new(account, region))
}
