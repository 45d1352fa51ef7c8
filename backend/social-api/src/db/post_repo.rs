/// DynamoDB-backed post repository
///
/// Search, like and comment are pushed into scan filters and update expressions;
/// the functions building those expressions are pure so they can be tested without
/// a table.
use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::{
    types::{AttributeValue, ReturnValue},
    Client,
};
use serde_dynamo::aws_sdk_dynamodb_1::from_item;

use super::dynamo::{count_all, describe_table, map_sdk_error, scan_all, Item, ScanFilter};
use super::{PostStore, StoreError, StoreResult};
use crate::models::{Post, PostSearch, PostUpdate};

/// An update expression with its placeholder bindings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateSpec {
    pub expression: String,
    pub condition: String,
    pub names: HashMap<String, String>,
    pub values: Item,
}

/// `contains(title, :q) OR contains(tags, :tag0) OR ...`
pub fn search_filter(search: &PostSearch) -> Option<ScanFilter> {
    if search.is_empty() {
        return None;
    }

    let mut clauses = Vec::new();
    let mut names = HashMap::new();
    let mut values = HashMap::new();

    if let Some(title) = &search.title {
        names.insert("#title".to_string(), "title".to_string());
        values.insert(":title".to_string(), AttributeValue::S(title.clone()));
        clauses.push("contains(#title, :title)".to_string());
    }

    if !search.tags.is_empty() {
        names.insert("#tags".to_string(), "tags".to_string());
        for (i, tag) in search.tags.iter().enumerate() {
            let placeholder = format!(":tag{}", i);
            clauses.push(format!("contains(#tags, {})", placeholder));
            values.insert(placeholder, AttributeValue::S(tag.clone()));
        }
    }

    Some(ScanFilter {
        expression: clauses.join(" OR "),
        names,
        values,
    })
}

/// `#name = :name`
pub fn creator_filter(name: &str) -> ScanFilter {
    ScanFilter {
        expression: "#name = :name".to_string(),
        names: HashMap::from([("#name".to_string(), "name".to_string())]),
        values: HashMap::from([(":name".to_string(), AttributeValue::S(name.to_string()))]),
    }
}

/// SET the editable fields, REMOVE the attachment when cleared
pub fn update_spec(update: &PostUpdate) -> UpdateSpec {
    let names = HashMap::from([
        ("#id".to_string(), "id".to_string()),
        ("#title".to_string(), "title".to_string()),
        ("#message".to_string(), "message".to_string()),
        ("#name".to_string(), "name".to_string()),
        ("#tags".to_string(), "tags".to_string()),
        ("#selectedFile".to_string(), "selectedFile".to_string()),
    ]);
    let mut values = HashMap::from([
        (":title".to_string(), AttributeValue::S(update.title.clone())),
        (":message".to_string(), AttributeValue::S(update.message.clone())),
        (":name".to_string(), AttributeValue::S(update.name.clone())),
        (":tags".to_string(), string_list(&update.tags)),
    ]);

    let mut expression =
        "SET #title = :title, #message = :message, #name = :name, #tags = :tags".to_string();
    match &update.selected_file {
        Some(file) => {
            expression.push_str(", #selectedFile = :selectedFile");
            values.insert(":selectedFile".to_string(), AttributeValue::S(file.clone()));
        }
        None => expression.push_str(" REMOVE #selectedFile"),
    }

    UpdateSpec {
        expression,
        condition: "attribute_exists(#id)".to_string(),
        names,
        values,
    }
}

/// `ADD #likes :user` on a string set
pub fn like_spec(user_id: &str) -> UpdateSpec {
    UpdateSpec {
        expression: "ADD #likes :user".to_string(),
        condition: "attribute_exists(#id)".to_string(),
        names: HashMap::from([
            ("#id".to_string(), "id".to_string()),
            ("#likes".to_string(), "likes".to_string()),
        ]),
        values: HashMap::from([(
            ":user".to_string(),
            AttributeValue::Ss(vec![user_id.to_string()]),
        )]),
    }
}

/// `SET #comments = list_append(if_not_exists(#comments, :empty), :comment)`
pub fn comment_spec(comment: &str) -> UpdateSpec {
    UpdateSpec {
        expression: "SET #comments = list_append(if_not_exists(#comments, :empty), :comment)"
            .to_string(),
        condition: "attribute_exists(#id)".to_string(),
        names: HashMap::from([
            ("#id".to_string(), "id".to_string()),
            ("#comments".to_string(), "comments".to_string()),
        ]),
        values: HashMap::from([
            (":empty".to_string(), AttributeValue::L(vec![])),
            (
                ":comment".to_string(),
                AttributeValue::L(vec![AttributeValue::S(comment.to_string())]),
            ),
        ]),
    }
}

/// Build the item written for a new post
///
/// Likes are written as a string set so `ADD` keeps working; DynamoDB rejects
/// empty sets, so empty likes and comments are left out.
pub fn post_to_item(post: &Post) -> Item {
    let mut item = HashMap::from([
        ("id".to_string(), AttributeValue::S(post.id.clone())),
        ("title".to_string(), AttributeValue::S(post.title.clone())),
        ("message".to_string(), AttributeValue::S(post.message.clone())),
        ("name".to_string(), AttributeValue::S(post.name.clone())),
        ("creator".to_string(), AttributeValue::S(post.creator.clone())),
        ("tags".to_string(), string_list(&post.tags)),
        (
            "createdAt".to_string(),
            AttributeValue::S(post.created_at.to_rfc3339()),
        ),
    ]);

    if let Some(file) = &post.selected_file {
        item.insert("selectedFile".to_string(), AttributeValue::S(file.clone()));
    }
    if !post.likes.is_empty() {
        item.insert("likes".to_string(), AttributeValue::Ss(post.likes.clone()));
    }
    if !post.comments.is_empty() {
        item.insert("comments".to_string(), string_list(&post.comments));
    }

    item
}

pub fn post_from_item(item: Item) -> StoreResult<Post> {
    from_item(item).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn string_list(values: &[String]) -> AttributeValue {
    AttributeValue::L(values.iter().cloned().map(AttributeValue::S).collect())
}

fn posts_from_items(items: Vec<Item>) -> StoreResult<Vec<Post>> {
    items.into_iter().map(post_from_item).collect()
}

#[derive(Clone)]
pub struct DynamoPostStore {
    client: Client,
    table: String,
}

impl DynamoPostStore {
    pub fn new(client: Client, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }

    async fn apply_update(&self, id: &str, spec: UpdateSpec, op: &'static str) -> StoreResult<Post> {
        let output = self
            .client
            .update_item()
            .table_name(&self.table)
            .key("id", AttributeValue::S(id.to_string()))
            .update_expression(spec.expression)
            .condition_expression(spec.condition)
            .set_expression_attribute_names(Some(spec.names))
            .set_expression_attribute_values(Some(spec.values))
            .return_values(ReturnValue::AllNew)
            .send()
            .await
            .map_err(|e| missing_on_condition(map_sdk_error(op, e)))?;

        let attributes = output
            .attributes
            .ok_or_else(|| StoreError::Backend(format!("{}: no attributes returned", op)))?;
        post_from_item(attributes)
    }
}

/// The only condition on item updates is that the item exists
fn missing_on_condition(err: StoreError) -> StoreError {
    match err {
        StoreError::ConditionFailed => StoreError::NotFound,
        other => other,
    }
}

#[async_trait]
impl PostStore for DynamoPostStore {
    async fn count_posts(&self) -> StoreResult<usize> {
        count_all(&self.client, &self.table).await
    }

    async fn scan_posts(&self) -> StoreResult<Vec<Post>> {
        posts_from_items(scan_all(&self.client, &self.table, None).await?)
    }

    async fn search_posts(&self, search: &PostSearch) -> StoreResult<Vec<Post>> {
        match search_filter(search) {
            Some(filter) => {
                posts_from_items(scan_all(&self.client, &self.table, Some(&filter)).await?)
            }
            None => Ok(Vec::new()),
        }
    }

    async fn posts_by_creator_name(&self, name: &str) -> StoreResult<Vec<Post>> {
        let filter = creator_filter(name);
        posts_from_items(scan_all(&self.client, &self.table, Some(&filter)).await?)
    }

    async fn get_post(&self, id: &str) -> StoreResult<Option<Post>> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table)
            .key("id", AttributeValue::S(id.to_string()))
            .send()
            .await
            .map_err(|e| map_sdk_error("get_post", e))?;

        output.item.map(post_from_item).transpose()
    }

    async fn put_post(&self, post: &Post) -> StoreResult<()> {
        self.client
            .put_item()
            .table_name(&self.table)
            .set_item(Some(post_to_item(post)))
            .condition_expression("attribute_not_exists(#id)")
            .expression_attribute_names("#id", "id")
            .send()
            .await
            .map_err(|e| map_sdk_error("put_post", e))?;
        Ok(())
    }

    async fn update_post(&self, id: &str, update: &PostUpdate) -> StoreResult<Post> {
        self.apply_update(id, update_spec(update), "update_post").await
    }

    async fn delete_post(&self, id: &str, creator: &str) -> StoreResult<()> {
        self.client
            .delete_item()
            .table_name(&self.table)
            .key("id", AttributeValue::S(id.to_string()))
            .condition_expression("#creator = :creator")
            .expression_attribute_names("#creator", "creator")
            .expression_attribute_values(":creator", AttributeValue::S(creator.to_string()))
            .send()
            .await
            .map_err(|e| map_sdk_error("delete_post", e))?;
        Ok(())
    }

    async fn add_like(&self, id: &str, user_id: &str) -> StoreResult<Post> {
        self.apply_update(id, like_spec(user_id), "add_like").await
    }

    async fn append_comment(&self, id: &str, comment: &str) -> StoreResult<Post> {
        self.apply_update(id, comment_spec(comment), "append_comment").await
    }

    async fn health_check(&self) -> StoreResult<()> {
        describe_table(&self.client, &self.table).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample_post() -> Post {
        Post {
            id: "1700000000000".into(),
            title: "Beach trip".into(),
            message: "Sunny".into(),
            name: "Ada Lovelace".into(),
            creator: "ada@example.com".into(),
            tags: vec!["sea".into(), "sun".into()],
            selected_file: None,
            likes: vec![],
            comments: vec![],
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn search_filter_title_and_tags() {
        let search = PostSearch::from_query(Some("trip"), Some("sea,sun"));
        let filter = search_filter(&search).expect("filter");

        assert_eq!(
            filter.expression,
            "contains(#title, :title) OR contains(#tags, :tag0) OR contains(#tags, :tag1)"
        );
        assert_eq!(filter.names.get("#tags").map(String::as_str), Some("tags"));
        assert_eq!(
            filter.values.get(":tag1"),
            Some(&AttributeValue::S("sun".into()))
        );
        assert_eq!(
            filter.values.get(":title"),
            Some(&AttributeValue::S("trip".into()))
        );
    }

    #[test]
    fn search_filter_tags_only() {
        let search = PostSearch::from_query(None, Some("sea"));
        let filter = search_filter(&search).expect("filter");

        assert_eq!(filter.expression, "contains(#tags, :tag0)");
        assert!(!filter.names.contains_key("#title"));
    }

    #[test]
    fn search_filter_empty_is_none() {
        assert!(search_filter(&PostSearch::default()).is_none());
    }

    #[test]
    fn creator_filter_binds_name() {
        let filter = creator_filter("Ada Lovelace");
        assert_eq!(filter.expression, "#name = :name");
        assert_eq!(
            filter.values.get(":name"),
            Some(&AttributeValue::S("Ada Lovelace".into()))
        );
    }

    #[test]
    fn update_spec_sets_or_removes_attachment() {
        let mut update = PostUpdate {
            title: "New".into(),
            message: "Body".into(),
            name: "Ada".into(),
            tags: vec!["a".into()],
            selected_file: Some("https://cdn.example.com/a.png".into()),
        };
        let spec = update_spec(&update);
        assert!(spec.expression.ends_with("#selectedFile = :selectedFile"));
        assert!(!spec.expression.contains("likes"));
        assert!(!spec.expression.contains("comments"));
        assert_eq!(spec.condition, "attribute_exists(#id)");

        update.selected_file = None;
        let spec = update_spec(&update);
        assert!(spec.expression.ends_with("REMOVE #selectedFile"));
        assert!(!spec.values.contains_key(":selectedFile"));
    }

    #[test]
    fn like_spec_uses_string_set() {
        let spec = like_spec("ada@example.com");
        assert_eq!(spec.expression, "ADD #likes :user");
        assert_eq!(
            spec.values.get(":user"),
            Some(&AttributeValue::Ss(vec!["ada@example.com".into()]))
        );
    }

    #[test]
    fn comment_spec_appends_list() {
        let spec = comment_spec("Ada: lovely");
        assert!(spec.expression.contains("list_append(if_not_exists(#comments, :empty), :comment)"));
        assert_eq!(
            spec.values.get(":comment"),
            Some(&AttributeValue::L(vec![AttributeValue::S("Ada: lovely".into())]))
        );
    }

    #[test]
    fn new_post_item_omits_empty_collections() {
        let item = post_to_item(&sample_post());

        assert!(!item.contains_key("likes"));
        assert!(!item.contains_key("comments"));
        assert!(!item.contains_key("selectedFile"));
        assert_eq!(
            item.get("createdAt"),
            Some(&AttributeValue::S("2024-05-01T12:00:00+00:00".into()))
        );
    }

    #[test]
    fn item_with_string_set_likes_reads_back() {
        let mut post = sample_post();
        post.likes = vec!["grace@example.com".into()];
        post.comments = vec!["Grace: nice".into()];
        post.selected_file = Some("https://cdn.example.com/a.png".into());

        let item = post_to_item(&post);
        assert!(matches!(item.get("likes"), Some(AttributeValue::Ss(_))));

        let read = post_from_item(item).expect("post");
        assert_eq!(read, post);
    }

    #[test]
    fn failed_update_condition_means_missing_post() {
        assert!(matches!(
            missing_on_condition(StoreError::ConditionFailed),
            StoreError::NotFound
        ));
        assert!(matches!(
            missing_on_condition(StoreError::Throttled("add_like".into())),
            StoreError::Throttled(_)
        ));
    }
}
