/// DynamoDB client setup and shared helpers
use std::collections::HashMap;

use aws_config::{meta::region::RegionProviderChain, BehaviorVersion};
use aws_sdk_dynamodb::{
    config::{http::HttpResponse, Region},
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    types::{AttributeValue, Select},
    Client,
};

use super::{StoreError, StoreResult};
use crate::config::StorageConfig;

pub type Item = HashMap<String, AttributeValue>;

/// Create an AWS SDK DynamoDB client
///
/// Credentials come from the default provider chain (`AWS_ACCESS_KEY_ID`,
/// `AWS_SECRET_ACCESS_KEY`, profile, instance role).
pub async fn create_client(config: &StorageConfig) -> Client {
    let region_provider = RegionProviderChain::first_try(Some(Region::new(config.region.clone())))
        .or_default_provider();

    let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(region_provider);
    if let Some(endpoint) = &config.endpoint_url {
        tracing::info!(%endpoint, "using custom DynamoDB endpoint");
        loader = loader.endpoint_url(endpoint);
    }

    Client::new(&loader.load().await)
}

/// Translate an SDK error into a `StoreError`
pub(crate) fn map_sdk_error<E>(operation: &'static str, err: SdkError<E, HttpResponse>) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    match err.code() {
        Some("ConditionalCheckFailedException") => StoreError::ConditionFailed,
        Some("ProvisionedThroughputExceededException")
        | Some("RequestLimitExceeded")
        | Some("ThrottlingException") => {
            StoreError::Throttled(format!("{}: {}", operation, DisplayErrorContext(&err)))
        }
        _ => StoreError::Backend(format!("{}: {}", operation, DisplayErrorContext(&err))),
    }
}

/// A scan filter expression with its placeholder bindings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanFilter {
    pub expression: String,
    pub names: HashMap<String, String>,
    pub values: Item,
}

/// Scan a whole table, following `LastEvaluatedKey` until exhausted
pub(crate) async fn scan_all(
    client: &Client,
    table: &str,
    filter: Option<&ScanFilter>,
) -> StoreResult<Vec<Item>> {
    let mut items = Vec::new();
    let mut start_key: Option<Item> = None;

    loop {
        let mut request = client
            .scan()
            .table_name(table)
            .set_exclusive_start_key(start_key.take());

        if let Some(filter) = filter {
            request = request
                .filter_expression(&filter.expression)
                .set_expression_attribute_names(Some(filter.names.clone()))
                .set_expression_attribute_values(Some(filter.values.clone()));
        }

        let output = request
            .send()
            .await
            .map_err(|e| map_sdk_error("scan", e))?;

        if let Some(page) = output.items {
            items.extend(page);
        }

        match output.last_evaluated_key {
            Some(key) if !key.is_empty() => start_key = Some(key),
            _ => break,
        }
    }

    Ok(items)
}

/// Count a whole table with `Select::Count`, summing across pages
pub(crate) async fn count_all(client: &Client, table: &str) -> StoreResult<usize> {
    let mut total = 0usize;
    let mut start_key: Option<Item> = None;

    loop {
        let output = client
            .scan()
            .table_name(table)
            .select(Select::Count)
            .set_exclusive_start_key(start_key.take())
            .send()
            .await
            .map_err(|e| map_sdk_error("count", e))?;

        total += output.count.max(0) as usize;

        match output.last_evaluated_key {
            Some(key) if !key.is_empty() => start_key = Some(key),
            _ => break,
        }
    }

    Ok(total)
}

/// Confirm the table exists and is reachable
pub(crate) async fn describe_table(client: &Client, table: &str) -> StoreResult<()> {
    client
        .describe_table()
        .table_name(table)
        .send()
        .await
        .map_err(|e| map_sdk_error("describe_table", e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_dynamodb::{error::ErrorMetadata, operation::scan::ScanError};

    fn service_error(code: &str) -> SdkError<ScanError, HttpResponse> {
        let status = 400u16.try_into().expect("status");
        SdkError::service_error(
            ScanError::generic(ErrorMetadata::builder().code(code).message("boom").build()),
            HttpResponse::new(status, "".into()),
        )
    }

    #[test]
    fn conditional_check_failures_map_to_condition_failed() {
        let err = map_sdk_error("put_post", service_error("ConditionalCheckFailedException"));
        assert!(matches!(err, StoreError::ConditionFailed));
    }

    #[test]
    fn throttling_codes_map_to_throttled() {
        for code in [
            "ProvisionedThroughputExceededException",
            "RequestLimitExceeded",
            "ThrottlingException",
        ] {
            match map_sdk_error("scan", service_error(code)) {
                StoreError::Throttled(message) => {
                    assert!(message.starts_with("scan: "), "{}", message)
                }
                other => panic!("{} mapped to {:?}", code, other),
            }
        }
    }

    #[test]
    fn unknown_codes_map_to_backend() {
        match map_sdk_error("get_user", service_error("ResourceNotFoundException")) {
            StoreError::Backend(message) => assert!(message.starts_with("get_user: ")),
            other => panic!("unexpected {:?}", other),
        }
    }
}
