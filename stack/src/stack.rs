use crate::api::{Cors, RestApi};
use crate::function::{Architecture, AssetCode, Function, Runtime};
use crate::policy::{Arn, PolicyStatement};
use crate::table::{Attribute, Billing, GlobalSecondaryIndex, Projection, Table};
use std::collections::BTreeMap;
use std::time::Duration;

/// Secrets live in the SSM parameter store, the handler reads them at startup
pub const JWT_SECRET_PARAM: &str = "/user-manager/app/jwt-secret";
pub const API_KEY_PARAM: &str = "/user-manager/app/api-key";

/// Deployment environment a stack is synthesized for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Env {
    pub account: String,
    pub region: String,
}

impl Env {
    pub fn new(account: impl Into<String>, region: impl Into<String>) -> Self {
        Env {
            account: account.into(),
            region: region.into(),
        }
    }
}

/// The user-manager resource graph
///
/// One handler function, one users table, one API front door, and the
/// permission statements wiring them together. Construction builds the
/// in-memory graph only; synthesis and deployment happen elsewhere.
#[derive(Debug, Clone)]
pub struct UserManagerStack {
    pub name: String,
    pub env: Env,
    pub handler: Function,
    pub users_table: Table,
    pub api: RestApi,
}

impl UserManagerStack {
    pub fn new(name: &str, env: Env) -> Self {
        let mut handler = Function {
            logical_id: "UserManagerHandler".into(),
            function_name: format!("{name}-handler"),
            runtime: Runtime::ProvidedAl2023,
            handler: "bootstrap".into(),
            architecture: Architecture::Arm64,
            memory_size: 512,
            timeout: Duration::from_secs(15),
            code: AssetCode::from_asset("lambdas"),
            environment: BTreeMap::from([
                ("APP_ENV".into(), "production".into()),
                ("APP_PORT".into(), "8080".into()),
                ("APP_BASE_URL".into(), "http://user-manager.com".into()),
                ("APP_JWT_SECRET_PARAM".into(), JWT_SECRET_PARAM.into()),
                ("APP_API_KEY_PARAM".into(), API_KEY_PARAM.into()),
                ("MAIL_FROM_EMAIL".into(), "dangeschichte@gmail.com".into()),
                ("SES_REGION".into(), "eu-central-1".into()),
            ]),
            policies: Vec::new(),
        };

        // Read access to the secret parameters, nothing else in the store
        handler.add_to_role_policy(PolicyStatement::new(
            &["ssm:GetParameter"],
            vec![
                Arn::literal(parameter_arn(&env, JWT_SECRET_PARAM)),
                Arn::literal(parameter_arn(&env, API_KEY_PARAM)),
            ],
        ));

        handler.add_to_role_policy(PolicyStatement::new(
            &["ses:SendEmail", "ses:SendRawEmail"],
            vec![Arn::literal("*")],
        ));

        let users_table = Table {
            logical_id: "UserManagerUsersTable".into(),
            table_name: "users".into(),
            partition_key: Attribute::string("id"),
            billing: Billing::OnDemand,
            global_secondary_indexes: vec![GlobalSecondaryIndex {
                index_name: "email-index".into(),
                partition_key: Attribute::string("email"),
                projection: Projection::All,
            }],
        };

        users_table.grant_read_write_data(&mut handler);

        let mut api = RestApi::new(
            "UserManagerApi",
            format!("{name}-api"),
            Cors {
                allow_origins: vec!["*".into()],
                allow_methods: vec![
                    "OPTIONS".into(),
                    "GET".into(),
                    "POST".into(),
                    "PUT".into(),
                    "DELETE".into(),
                ],
                allow_headers: vec!["Content-Type".into(), "Authorization".into()],
                allow_credentials: false,
            },
        );

        api.add_proxy(&handler);

        handler.add_environment("APP_STAGE", "prod");

        UserManagerStack {
            name: name.to_string(),
            env,
            handler,
            users_table,
            api,
        }
    }
}

fn parameter_arn(env: &Env, name: &str) -> String {
    format!(
        "arn:aws:ssm:{region}:{account}:parameter{name}",
        region = env.region,
        account = env.account,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack() -> UserManagerStack {
        UserManagerStack::new("user-manager", Env::new("111111111111", "eu-central-1"))
    }

    #[test]
    fn handler_declares_the_full_environment_contract() {
        let stack = stack();
        let names = stack
            .handler
            .environment
            .keys()
            .map(|k| k.as_str())
            .collect::<Vec<&str>>();

        assert_eq!(
            names,
            vec![
                "APP_API_KEY_PARAM",
                "APP_BASE_URL",
                "APP_ENV",
                "APP_JWT_SECRET_PARAM",
                "APP_PORT",
                "APP_STAGE",
                "MAIL_FROM_EMAIL",
                "SES_REGION",
            ]
        );
    }

    #[test]
    fn handler_is_granted_secrets_email_and_table_access() {
        let stack = stack();
        let policies = &stack.handler.policies;

        assert_eq!(policies.len(), 3);
        assert_eq!(policies[0].actions, vec!["ssm:GetParameter"]);
        assert_eq!(
            policies[0].resources[0],
            Arn::literal(
                "arn:aws:ssm:eu-central-1:111111111111:parameter/user-manager/app/jwt-secret"
            )
        );
        assert_eq!(policies[1].actions, vec!["ses:SendEmail", "ses:SendRawEmail"]);
        assert!(policies[2].actions.iter().all(|a| a.starts_with("dynamodb:")));
    }

    #[test]
    fn api_proxies_to_the_handler() {
        let stack = stack();
        assert_eq!(stack.api.proxy_target(), Some("UserManagerHandler"));
    }
}
