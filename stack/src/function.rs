use crate::policy::PolicyStatement;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Managed runtime image the function executes in
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum Runtime {
    #[serde(rename = "provided.al2023")]
    ProvidedAl2023,

    #[serde(rename = "provided.al2")]
    ProvidedAl2,
}

impl Runtime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Runtime::ProvidedAl2023 => "provided.al2023",
            Runtime::ProvidedAl2 => "provided.al2",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum Architecture {
    #[serde(rename = "arm64")]
    Arm64,

    #[serde(rename = "x86_64")]
    X86_64,
}

/// Code asset for the function
///
/// The artifact is built outside of this repository and referenced by path.
/// Bundling and uploading happen at deploy time, the template itself only
/// carries parameters for the resulting S3 location.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetCode {
    pub path: PathBuf,
}

impl AssetCode {
    pub fn from_asset(path: impl Into<PathBuf>) -> Self {
        AssetCode { path: path.into() }
    }
}

/// Compute resource invoked on demand by the API front door
#[derive(Debug, Clone)]
pub struct Function {
    pub logical_id: String,
    pub function_name: String,
    pub runtime: Runtime,
    pub handler: String,
    pub architecture: Architecture,
    pub memory_size: u32,
    pub timeout: Duration,
    pub code: AssetCode,
    pub environment: BTreeMap<String, String>,
    pub policies: Vec<PolicyStatement>,
}

impl Function {
    /// Logical id of the function's execution role
    pub fn role_logical_id(&self) -> String {
        format!("{}Role", self.logical_id)
    }

    /// Attach a statement to the function's execution role
    pub fn add_to_role_policy(&mut self, statement: PolicyStatement) {
        self.policies.push(statement);
    }

    /// Set an environment variable, overwriting a previous value
    pub fn add_environment(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.environment.insert(name.into(), value.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{Arn, PolicyStatement};

    fn function() -> Function {
        Function {
            logical_id: "Handler".into(),
            function_name: "handler".into(),
            runtime: Runtime::ProvidedAl2023,
            handler: "bootstrap".into(),
            architecture: Architecture::Arm64,
            memory_size: 128,
            timeout: Duration::from_secs(3),
            code: AssetCode::from_asset("lambdas"),
            environment: BTreeMap::new(),
            policies: Vec::new(),
        }
    }

    #[test]
    fn add_environment_overwrites_existing_value() {
        let mut function = function();
        function.add_environment("APP_STAGE", "dev");
        function.add_environment("APP_STAGE", "prod");

        assert_eq!(function.environment.get("APP_STAGE").unwrap(), "prod");
    }

    #[test]
    fn role_statements_accumulate() {
        let mut function = function();
        function.add_to_role_policy(PolicyStatement::new(
            &["ses:SendEmail"],
            vec![Arn::literal("*")],
        ));
        function.add_to_role_policy(PolicyStatement::new(
            &["ssm:GetParameter"],
            vec![Arn::literal("arn:aws:ssm:::parameter/x")],
        ));

        assert_eq!(function.policies.len(), 2);
        assert_eq!(function.role_logical_id(), "HandlerRole");
    }
}
