use serde_json::json;
use user_manager_stack::app::App;
use user_manager_stack::stack::{Env, UserManagerStack};
use user_manager_stack::template::Template;

fn synth() -> Template {
    let mut app = App::new();
    app.add_stack(UserManagerStack::new(
        "user-manager-test",
        Env::new("111111111111", "eu-central-1"),
    ));

    app.synth()
        .expect("synthesis should succeed")
        .template("user-manager-test")
        .expect("the stack should be in the assembly")
        .clone()
}

#[test]
fn lambda_is_created_with_expected_properties() {
    let template = synth();

    template
        .has_resource_properties(
            "AWS::Lambda::Function",
            &json!({
                "Runtime": "provided.al2023",
                "Handler": "bootstrap",
                "Environment": {
                    "Variables": {
                        "APP_JWT_SECRET_PARAM": "/user-manager/app/jwt-secret"
                    }
                }
            }),
        )
        .unwrap();
}

#[test]
fn api_gateway_method_integrates_with_lambda() {
    let template = synth();

    template
        .has_resource_properties(
            "AWS::ApiGateway::Method",
            &json!({
                "HttpMethod": "ANY",
                "Integration": {
                    "Type": "AWS_PROXY",
                    "IntegrationHttpMethod": "POST"
                }
            }),
        )
        .unwrap();

    // The integration URI is a joined invocation ARN
    let methods = template.find_resources("AWS::ApiGateway::Method");
    let any_method = methods
        .values()
        .find(|m| m["Properties"]["HttpMethod"] == json!("ANY"))
        .expect("the catch-all method should exist");

    assert!(any_method["Properties"]["Integration"]["Uri"]["Fn::Join"].is_array());
}

#[test]
fn api_gateway_can_invoke_the_lambda() {
    let template = synth();

    template
        .has_resource_properties(
            "AWS::Lambda::Permission",
            &json!({
                "Action": "lambda:InvokeFunction",
                "Principal": "apigateway.amazonaws.com"
            }),
        )
        .unwrap();
}

#[test]
fn users_table_with_email_index() {
    let template = synth();

    template
        .has_resource_properties(
            "AWS::DynamoDB::GlobalTable",
            &json!({
                "TableName": "users",
                "KeySchema": [{"AttributeName": "id", "KeyType": "HASH"}],
                "GlobalSecondaryIndexes": [{"IndexName": "email-index"}]
            }),
        )
        .unwrap();
}

#[test]
fn synthesis_is_deterministic() {
    assert_eq!(synth().value(), synth().value());
}
