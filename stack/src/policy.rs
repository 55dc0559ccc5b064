use serde_json::{json, Value};

/// Reference to a resource an IAM statement applies to.
#[derive(Debug, Clone, PartialEq)]
pub enum Arn {
    /// A fully formed ARN, or a wildcard
    Literal(String),

    /// Attribute of another resource in the same template
    GetAtt { logical_id: String, attribute: String },

    /// Concatenation of segments, e.g. a resource ARN plus a suffix
    Join(Vec<Arn>),
}

impl Arn {
    pub fn literal(arn: impl Into<String>) -> Self {
        Arn::Literal(arn.into())
    }

    pub fn get_att(logical_id: impl Into<String>, attribute: impl Into<String>) -> Self {
        Arn::GetAtt {
            logical_id: logical_id.into(),
            attribute: attribute.into(),
        }
    }

    pub(crate) fn to_json(&self) -> Value {
        match self {
            Arn::Literal(arn) => json!(arn),

            Arn::GetAtt {
                logical_id,
                attribute,
            } => json!({"Fn::GetAtt": [logical_id, attribute]}),

            Arn::Join(parts) => {
                let parts = parts.iter().map(Arn::to_json).collect::<Vec<Value>>();
                json!({"Fn::Join": ["", parts]})
            }
        }
    }
}

/// Declarative grant of specific actions on specific resources
///
/// Statements are attached to the compute resource's role and are purely
/// additive.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyStatement {
    pub actions: Vec<String>,
    pub resources: Vec<Arn>,
}

impl PolicyStatement {
    pub fn new(actions: &[&str], resources: Vec<Arn>) -> Self {
        PolicyStatement {
            actions: actions.iter().map(|a| a.to_string()).collect(),
            resources,
        }
    }

    pub(crate) fn to_json(&self) -> Value {
        let resources = self
            .resources
            .iter()
            .map(Arn::to_json)
            .collect::<Vec<Value>>();

        json!({
            "Effect": "Allow",
            "Action": self.actions,
            "Resource": resources
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statement_renders_allow_with_actions_and_resources() {
        let statement = PolicyStatement::new(
            &["ssm:GetParameter"],
            vec![Arn::literal("arn:aws:ssm:eu-central-1:111111111111:parameter/x")],
        );

        assert_eq!(
            statement.to_json(),
            json!({
                "Effect": "Allow",
                "Action": ["ssm:GetParameter"],
                "Resource": ["arn:aws:ssm:eu-central-1:111111111111:parameter/x"]
            })
        );
    }

    #[test]
    fn joined_arn_concatenates_segments() {
        let arn = Arn::Join(vec![
            Arn::get_att("UsersTable", "Arn"),
            Arn::literal("/index/*"),
        ]);

        assert_eq!(
            arn.to_json(),
            json!({"Fn::Join": ["", [{"Fn::GetAtt": ["UsersTable", "Arn"]}, "/index/*"]]})
        );
    }
}
