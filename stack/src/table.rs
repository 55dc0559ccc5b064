use crate::function::Function;
use crate::policy::{Arn, PolicyStatement};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum AttributeType {
    #[serde(rename = "S")]
    String,

    #[serde(rename = "N")]
    Number,
}

/// Key attribute of a table or index
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub kind: AttributeType,
}

impl Attribute {
    pub fn string(name: impl Into<String>) -> Self {
        Attribute {
            name: name.into(),
            kind: AttributeType::String,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Billing {
    /// Pay per request
    OnDemand,

    Provisioned { read: u32, write: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum Projection {
    #[serde(rename = "ALL")]
    All,

    #[serde(rename = "KEYS_ONLY")]
    KeysOnly,
}

/// Secondary index, a fixed structural property of the table once declared
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalSecondaryIndex {
    pub index_name: String,
    pub partition_key: Attribute,
    pub projection: Projection,
}

/// Managed key-value store entity
#[derive(Debug, Clone)]
pub struct Table {
    pub logical_id: String,
    pub table_name: String,
    pub partition_key: Attribute,
    pub billing: Billing,
    pub global_secondary_indexes: Vec<GlobalSecondaryIndex>,
}

impl Table {
    /// Allow the function full read/write on the table and its indexes
    pub fn grant_read_write_data(&self, function: &mut Function) {
        function.add_to_role_policy(PolicyStatement::new(
            &[
                "dynamodb:BatchGetItem",
                "dynamodb:BatchWriteItem",
                "dynamodb:ConditionCheckItem",
                "dynamodb:PutItem",
                "dynamodb:DescribeTable",
                "dynamodb:DeleteItem",
                "dynamodb:GetItem",
                "dynamodb:Scan",
                "dynamodb:Query",
                "dynamodb:UpdateItem",
            ],
            vec![
                Arn::get_att(&self.logical_id, "Arn"),
                Arn::Join(vec![
                    Arn::get_att(&self.logical_id, "Arn"),
                    Arn::literal("/index/*"),
                ]),
            ],
        ));
    }

    /// Attribute definitions for the table: the partition key plus every
    /// index key, without duplicates
    pub(crate) fn attribute_definitions(&self) -> Vec<&Attribute> {
        let mut attributes = vec![&self.partition_key];

        for index in self.global_secondary_indexes.iter() {
            if !attributes.iter().any(|a| a.name == index.partition_key.name) {
                attributes.push(&index.partition_key);
            }
        }

        attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::{Architecture, AssetCode, Runtime};
    use std::collections::BTreeMap;
    use std::time::Duration;

    fn table() -> Table {
        Table {
            logical_id: "UsersTable".into(),
            table_name: "users".into(),
            partition_key: Attribute::string("id"),
            billing: Billing::OnDemand,
            global_secondary_indexes: vec![GlobalSecondaryIndex {
                index_name: "email-index".into(),
                partition_key: Attribute::string("email"),
                projection: Projection::All,
            }],
        }
    }

    #[test]
    fn grant_covers_table_and_indexes() {
        let mut function = Function {
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
        };

        table().grant_read_write_data(&mut function);

        let statement = &function.policies[0];
        assert!(statement.actions.contains(&"dynamodb:Query".to_string()));
        assert_eq!(statement.resources.len(), 2);
        assert_eq!(statement.resources[0], Arn::get_att("UsersTable", "Arn"));
    }

    #[test]
    fn attribute_definitions_include_index_keys_once() {
        let mut table = table();
        table.global_secondary_indexes.push(GlobalSecondaryIndex {
            index_name: "id-index".into(),
            partition_key: Attribute::string("id"),
            projection: Projection::KeysOnly,
        });

        let names = table
            .attribute_definitions()
            .iter()
            .map(|a| a.name.clone())
            .collect::<Vec<String>>();

        assert_eq!(names, vec!["id".to_string(), "email".to_string()]);
    }
}
