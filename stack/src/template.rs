use crate::api::RestApi;
use crate::function::Function;
use crate::stack::UserManagerStack;
use crate::table::Billing;
use eyre::{ContextCompat, WrapErr};
use serde_json::{json, Value};

/// Template parameters carrying the S3 location of the handler artifact
///
/// Keeping the location out of the resource bodies makes synthesis
/// deterministic; the deploy step passes the actual bucket and the
/// content-hash key as parameter values.
pub const ASSETS_BUCKET_PARAM: &str = "AssetsBucketName";
pub const ASSETS_KEY_PARAM: &str = "AssetsObjectKey";

/// Synthesized deployment template of a stack
#[derive(Clone, Debug, PartialEq)]
pub struct Template {
    template: Value,
}

#[derive(Clone, Debug)]
pub struct CfnResource {
    name: String,
    resource: Value,
}

impl Template {
    /// Synthesize the stack's resource graph into a CloudFormation document
    pub fn from_stack(stack: &UserManagerStack) -> eyre::Result<Self> {
        let mut template = Template {
            template: json!({
                "AWSTemplateFormatVersion": "2010-09-09",
                "Parameters": {
                    (ASSETS_BUCKET_PARAM): {
                        "Type": "String",
                        "Description": "Bucket holding the handler artifact"
                    },
                    (ASSETS_KEY_PARAM): {
                        "Type": "String",
                        "Description": "Object key of the handler artifact"
                    }
                },
                "Resources": {}
            }),
        };

        for resource in Self::function(&stack.handler)? {
            template.add_resource(resource);
        }

        template.add_resource(Self::table(stack));

        for resource in Self::api(stack).wrap_err("Failed to build the API template")? {
            template.add_resource(resource);
        }

        template.validate_references()?;

        log::debug!(
            "Synthesized {} resources for stack {}",
            template.resources().len(),
            stack.name
        );

        Ok(template)
    }

    pub fn value(&self) -> &Value {
        &self.template
    }

    pub fn to_json_pretty(&self) -> eyre::Result<String> {
        serde_json::to_string_pretty(&self.template).wrap_err("Failed to serialize the template")
    }

    pub(crate) fn resources(&self) -> &serde_json::Map<String, Value> {
        self.template
            .get("Resources")
            .and_then(|r| r.as_object())
            .expect("template is created with a Resources object")
    }

    /// Add a resource to the CFN template
    fn add_resource(&mut self, CfnResource { name, resource }: CfnResource) {
        self.template
            .get_mut("Resources")
            .unwrap()
            .as_object_mut()
            .unwrap()
            .insert(name, resource);
    }

    /// CFN template for the compute resource: the function itself and its role
    fn function(function: &Function) -> eyre::Result<Vec<CfnResource>> {
        let name = &function.logical_id;
        let role_name = function.role_logical_id();

        let variables = serde_json::to_value(&function.environment)
            .wrap_err("Failed to serialize environment variables")?;

        let statements = function
            .policies
            .iter()
            .map(|s| s.to_json())
            .collect::<Vec<Value>>();

        let policies = vec![
            json!({
                "PolicyName": "AppendToLogsPolicy",
                "PolicyDocument": {
                    "Version": "2012-10-17",
                    "Statement": [{
                        "Effect": "Allow",
                        "Action": [
                            "logs:CreateLogGroup",
                            "logs:CreateLogStream",
                            "logs:PutLogEvents"
                        ],
                        "Resource": "*"
                    }]
                }
            }),
            json!({
                "PolicyName": format!("{name}Policy"),
                "PolicyDocument": {
                    "Version": "2012-10-17",
                    "Statement": statements
                }
            }),
        ];

        Ok(vec![
            CfnResource {
                name: name.clone(),
                resource: json!({
                    "Type": "AWS::Lambda::Function",
                    "Properties": {
                        "FunctionName": function.function_name,
                        "Handler": function.handler,
                        "Runtime": function.runtime,
                        "Architectures": [function.architecture],
                        "MemorySize": function.memory_size,
                        "Timeout": function.timeout.as_secs(),
                        "Environment": {"Variables": variables},
                        "Role": {
                            "Fn::GetAtt": [role_name, "Arn"]
                        },
                        "Code": {
                            "S3Bucket": {"Ref": ASSETS_BUCKET_PARAM},
                            "S3Key": {"Ref": ASSETS_KEY_PARAM}
                        }
                    }
                }),
            },
            CfnResource {
                name: function.role_logical_id(),
                resource: json!({
                    "Type": "AWS::IAM::Role",
                    "Properties": {
                        "AssumeRolePolicyDocument": {
                            "Version": "2012-10-17",
                            "Statement": [{
                                "Effect": "Allow",
                                "Principal": {
                                    "Service": ["lambda.amazonaws.com"]
                                },
                                "Action": ["sts:AssumeRole"]
                            }]
                        },
                        "Path": "/",
                        "Policies": policies
                    }
                }),
            },
        ])
    }

    /// CFN template for the users table
    fn table(stack: &UserManagerStack) -> CfnResource {
        let table = &stack.users_table;

        let attribute_definitions = table
            .attribute_definitions()
            .iter()
            .map(|a| json!({"AttributeName": a.name, "AttributeType": a.kind}))
            .collect::<Vec<Value>>();

        let indexes = table
            .global_secondary_indexes
            .iter()
            .map(|index| {
                json!({
                    "IndexName": index.index_name,
                    "KeySchema": [{
                        "AttributeName": index.partition_key.name,
                        "KeyType": "HASH"
                    }],
                    "Projection": {"ProjectionType": index.projection}
                })
            })
            .collect::<Vec<Value>>();

        let mut replica = json!({"Region": stack.env.region});

        let billing_mode = match table.billing {
            Billing::OnDemand => "PAY_PER_REQUEST",
            Billing::Provisioned { read, .. } => {
                replica["ReadProvisionedThroughputSettings"] =
                    json!({"ReadCapacityUnits": read});
                "PROVISIONED"
            }
        };

        let mut properties = json!({
            "TableName": table.table_name,
            "AttributeDefinitions": attribute_definitions,
            "KeySchema": [{
                "AttributeName": table.partition_key.name,
                "KeyType": "HASH"
            }],
            "BillingMode": billing_mode,
            "GlobalSecondaryIndexes": indexes,
            "Replicas": [replica]
        });

        if let Billing::Provisioned { write, .. } = table.billing {
            properties["WriteProvisionedThroughputSettings"] = json!({
                "WriteCapacityAutoScalingSettings": {
                    "MinCapacity": 1,
                    "MaxCapacity": write,
                    "TargetTrackingScalingPolicyConfiguration": {"TargetValue": 70.0}
                }
            });
        }

        CfnResource {
            name: table.logical_id.clone(),
            resource: json!({
                "Type": "AWS::DynamoDB::GlobalTable",
                "Properties": properties
            }),
        }
    }

    /// CFN template for the API front door
    ///
    /// A REST API with a catch-all proxy route to the handler, CORS
    /// preflight on the root and proxy resources, a deployment with its
    /// prod stage, and the permission letting API Gateway invoke the
    /// function.
    fn api(stack: &UserManagerStack) -> eyre::Result<Vec<CfnResource>> {
        let api = &stack.api;
        let api_id = &api.logical_id;

        let target = api
            .proxy_target()
            .wrap_err("The API declares no proxy route")?;

        let proxy_id = format!("{api_id}ProxyResource");
        let any_method_id = format!("{api_id}ProxyAnyMethod");
        let root_preflight_id = format!("{api_id}RootPreflight");
        let proxy_preflight_id = format!("{api_id}ProxyPreflight");
        let deployment_id = format!("{api_id}Deployment");

        let root_resource = json!({"Fn::GetAtt": [api_id, "RootResourceId"]});

        let mut resources = vec![
            CfnResource {
                name: api_id.clone(),
                resource: json!({
                    "Type": "AWS::ApiGateway::RestApi",
                    "Properties": {
                        "Name": api.name
                    }
                }),
            },
            CfnResource {
                name: proxy_id.clone(),
                resource: json!({
                    "Type": "AWS::ApiGateway::Resource",
                    "Properties": {
                        "RestApiId": {"Ref": api_id},
                        "ParentId": root_resource,
                        "PathPart": "{proxy+}"
                    }
                }),
            },
            CfnResource {
                name: any_method_id.clone(),
                resource: json!({
                    "Type": "AWS::ApiGateway::Method",
                    "Properties": {
                        "RestApiId": {"Ref": api_id},
                        "ResourceId": {"Ref": proxy_id},
                        "HttpMethod": "ANY",
                        "AuthorizationType": "NONE",
                        "Integration": {
                            "Type": "AWS_PROXY",
                            "IntegrationHttpMethod": "POST",
                            "Uri": {
                                "Fn::Join": ["", [
                                    "arn:aws:apigateway:",
                                    {"Ref": "AWS::Region"},
                                    ":lambda:path/2015-03-31/functions/",
                                    {"Fn::GetAtt": [target, "Arn"]},
                                    "/invocations"
                                ]]
                            }
                        }
                    }
                }),
            },
            Self::preflight(api, &root_preflight_id, root_resource.clone()),
            Self::preflight(api, &proxy_preflight_id, json!({"Ref": proxy_id})),
            CfnResource {
                name: deployment_id.clone(),
                resource: json!({
                    "Type": "AWS::ApiGateway::Deployment",
                    "DependsOn": [any_method_id, root_preflight_id, proxy_preflight_id],
                    "Properties": {
                        "RestApiId": {"Ref": api_id}
                    }
                }),
            },
            CfnResource {
                name: format!("{api_id}ProdStage"),
                resource: json!({
                    "Type": "AWS::ApiGateway::Stage",
                    "Properties": {
                        "RestApiId": {"Ref": api_id},
                        "DeploymentId": {"Ref": deployment_id},
                        "StageName": "prod"
                    }
                }),
            },
        ];

        resources.push(CfnResource {
            name: format!("{api_id}InvokePermission"),
            resource: json!({
                "Type": "AWS::Lambda::Permission",
                "Properties": {
                    "Action": "lambda:InvokeFunction",
                    "FunctionName": {"Fn::GetAtt": [target, "Arn"]},
                    "Principal": "apigateway.amazonaws.com",
                    "SourceArn": {
                        "Fn::Join": ["", [
                            "arn:aws:execute-api:",
                            {"Ref": "AWS::Region"},
                            ":",
                            {"Ref": "AWS::AccountId"},
                            ":",
                            {"Ref": api_id},
                            "/*/*"
                        ]]
                    }
                }
            }),
        });

        Ok(resources)
    }

    /// CORS preflight method answered by API Gateway itself
    fn preflight(api: &RestApi, name: &str, resource_id: Value) -> CfnResource {
        let cors = &api.cors;

        let mut response_parameters = json!({
            "method.response.header.Access-Control-Allow-Origin":
                format!("'{}'", cors.allow_origins.join(",")),
            "method.response.header.Access-Control-Allow-Methods":
                format!("'{}'", cors.allow_methods.join(",")),
            "method.response.header.Access-Control-Allow-Headers":
                format!("'{}'", cors.allow_headers.join(","))
        });

        if cors.allow_credentials {
            response_parameters["method.response.header.Access-Control-Allow-Credentials"] =
                json!("'true'");
        }

        let method_parameters = response_parameters
            .as_object()
            .expect("response parameters are built as an object")
            .keys()
            .map(|header| (header.clone(), json!(true)))
            .collect::<serde_json::Map<String, Value>>();

        CfnResource {
            name: name.to_string(),
            resource: json!({
                "Type": "AWS::ApiGateway::Method",
                "Properties": {
                    "RestApiId": {"Ref": api.logical_id},
                    "ResourceId": resource_id,
                    "HttpMethod": "OPTIONS",
                    "AuthorizationType": "NONE",
                    "Integration": {
                        "Type": "MOCK",
                        "RequestTemplates": {
                            "application/json": "{ \"statusCode\": 200 }"
                        },
                        "IntegrationResponses": [{
                            "StatusCode": "204",
                            "ResponseParameters": response_parameters
                        }]
                    },
                    "MethodResponses": [{
                        "StatusCode": "204",
                        "ResponseParameters": method_parameters
                    }]
                }
            }),
        }
    }

    /// Fail on any reference that does not resolve within the template
    ///
    /// Checks `Ref`, `Fn::GetAtt` and `DependsOn` targets against the
    /// declared resources, template parameters, and `AWS::` pseudo
    /// parameters.
    fn validate_references(&self) -> eyre::Result<()> {
        let known = |name: &str| {
            name.starts_with("AWS::")
                || self.resources().contains_key(name)
                || self
                    .template
                    .get("Parameters")
                    .and_then(|p| p.as_object())
                    .is_some_and(|p| p.contains_key(name))
        };

        fn walk(value: &Value, known: &dyn Fn(&str) -> bool) -> eyre::Result<()> {
            match value {
                Value::Object(object) => {
                    for (key, inner) in object {
                        match (key.as_str(), inner) {
                            ("Ref", Value::String(name)) if !known(name) => {
                                eyre::bail!("Reference to unknown resource \"{name}\"")
                            }

                            ("Fn::GetAtt", Value::Array(parts)) => {
                                let name = parts
                                    .first()
                                    .and_then(|n| n.as_str())
                                    .wrap_err("Malformed Fn::GetAtt")?;

                                if !known(name) {
                                    eyre::bail!("Fn::GetAtt to unknown resource \"{name}\"")
                                }
                            }

                            ("DependsOn", Value::Array(names)) => {
                                for name in names {
                                    let name =
                                        name.as_str().wrap_err("Malformed DependsOn entry")?;

                                    if !known(name) {
                                        eyre::bail!("DependsOn unknown resource \"{name}\"")
                                    }
                                }
                            }

                            _ => walk(inner, known)?,
                        }
                    }
                }

                Value::Array(items) => {
                    for item in items {
                        walk(item, known)?;
                    }
                }

                _ => {}
            }

            Ok(())
        }

        walk(&self.template, &known)
    }
}

impl std::fmt::Display for Template {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.template.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::{Architecture, AssetCode, Function, Runtime};
    use crate::stack::{Env, UserManagerStack};
    use std::collections::BTreeMap;
    use std::time::Duration;

    fn stack() -> UserManagerStack {
        UserManagerStack::new("user-manager", Env::new("111111111111", "eu-central-1"))
    }

    #[test]
    fn synthesis_produces_the_expected_resource_set() {
        let template = Template::from_stack(&stack()).unwrap();
        let types = template
            .resources()
            .values()
            .map(|r| r["Type"].as_str().unwrap().to_string())
            .collect::<Vec<String>>();

        assert!(types.contains(&"AWS::Lambda::Function".to_string()));
        assert!(types.contains(&"AWS::IAM::Role".to_string()));
        assert!(types.contains(&"AWS::DynamoDB::GlobalTable".to_string()));
        assert!(types.contains(&"AWS::ApiGateway::RestApi".to_string()));
        assert!(types.contains(&"AWS::ApiGateway::Deployment".to_string()));
        assert!(types.contains(&"AWS::Lambda::Permission".to_string()));
    }

    #[test]
    fn proxy_route_to_a_resource_outside_the_stack_fails_synthesis() {
        let mut stack = stack();

        let ghost = Function {
            logical_id: "GhostHandler".into(),
            function_name: "ghost".into(),
            runtime: Runtime::ProvidedAl2023,
            handler: "bootstrap".into(),
            architecture: Architecture::Arm64,
            memory_size: 128,
            timeout: Duration::from_secs(3),
            code: AssetCode::from_asset("lambdas"),
            environment: BTreeMap::new(),
            policies: Vec::new(),
        };

        stack.api.add_proxy(&ghost);

        let result = Template::from_stack(&stack);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("GhostHandler"));
    }

    #[test]
    fn api_without_proxy_route_fails_synthesis() {
        let mut stack = stack();
        stack.api = crate::api::RestApi::new(
            "UserManagerApi",
            "user-manager-api",
            stack.api.cors.clone(),
        );

        assert!(Template::from_stack(&stack).is_err());
    }

    #[test]
    fn code_location_is_parameterized() {
        let template = Template::from_stack(&stack()).unwrap();
        let code = &template.resources()["UserManagerHandler"]["Properties"]["Code"];

        assert_eq!(code["S3Bucket"], serde_json::json!({"Ref": ASSETS_BUCKET_PARAM}));
        assert_eq!(code["S3Key"], serde_json::json!({"Ref": ASSETS_KEY_PARAM}));
    }
}
