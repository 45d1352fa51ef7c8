/// DynamoDB-backed user repository
use async_trait::async_trait;
use aws_sdk_dynamodb::{types::AttributeValue, Client};
use serde_dynamo::aws_sdk_dynamodb_1::{from_item, to_item};

use super::dynamo::{describe_table, map_sdk_error};
use super::{StoreError, StoreResult, UserStore};
use crate::models::User;

#[derive(Clone)]
pub struct DynamoUserStore {
    client: Client,
    table: String,
}

impl DynamoUserStore {
    pub fn new(client: Client, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }
}

#[async_trait]
impl UserStore for DynamoUserStore {
    async fn get_user(&self, email: &str) -> StoreResult<Option<User>> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table)
            .key("email", AttributeValue::S(email.to_string()))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| map_sdk_error("get_user", e))?;

        output
            .item
            .map(|item| from_item(item).map_err(|e| StoreError::Serialization(e.to_string())))
            .transpose()
    }

    async fn create_user(&self, user: &User) -> StoreResult<()> {
        let item = to_item(user).map_err(|e| StoreError::Serialization(e.to_string()))?;

        self.client
            .put_item()
            .table_name(&self.table)
            .set_item(Some(item))
            .condition_expression("attribute_not_exists(#email)")
            .expression_attribute_names("#email", "email")
            .send()
            .await
            .map_err(|e| map_sdk_error("create_user", e))?;
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        describe_table(&self.client, &self.table).await
    }
}
