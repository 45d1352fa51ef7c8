/// In-process stores
///
/// Mirror the conditions and update semantics of the DynamoDB repositories so the
/// service and HTTP layers can run without AWS. Data lives only as long as the process.
use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{PostStore, StoreError, StoreResult, UserStore};
use crate::models::{Post, PostSearch, PostUpdate, User};

#[derive(Default)]
pub struct MemoryPostStore {
    posts: RwLock<HashMap<String, Post>>,
}

impl MemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PostStore for MemoryPostStore {
    async fn count_posts(&self) -> StoreResult<usize> {
        Ok(self.posts.read().await.len())
    }

    async fn scan_posts(&self) -> StoreResult<Vec<Post>> {
        Ok(self.posts.read().await.values().cloned().collect())
    }

    async fn search_posts(&self, search: &PostSearch) -> StoreResult<Vec<Post>> {
        if search.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .posts
            .read()
            .await
            .values()
            .filter(|post| search.matches(post))
            .cloned()
            .collect())
    }

    async fn posts_by_creator_name(&self, name: &str) -> StoreResult<Vec<Post>> {
        Ok(self
            .posts
            .read()
            .await
            .values()
            .filter(|post| post.name == name)
            .cloned()
            .collect())
    }

    async fn get_post(&self, id: &str) -> StoreResult<Option<Post>> {
        Ok(self.posts.read().await.get(id).cloned())
    }

    async fn put_post(&self, post: &Post) -> StoreResult<()> {
        let mut posts = self.posts.write().await;
        if posts.contains_key(&post.id) {
            return Err(StoreError::ConditionFailed);
        }
        posts.insert(post.id.clone(), post.clone());
        Ok(())
    }

    async fn update_post(&self, id: &str, update: &PostUpdate) -> StoreResult<Post> {
        let mut posts = self.posts.write().await;
        let post = posts.get_mut(id).ok_or(StoreError::NotFound)?;

        post.title = update.title.clone();
        post.message = update.message.clone();
        post.name = update.name.clone();
        post.tags = update.tags.clone();
        post.selected_file = update.selected_file.clone();

        Ok(post.clone())
    }

    async fn delete_post(&self, id: &str, creator: &str) -> StoreResult<()> {
        let mut posts = self.posts.write().await;
        match posts.get(id) {
            Some(post) if post.creator == creator => {
                posts.remove(id);
                Ok(())
            }
            _ => Err(StoreError::ConditionFailed),
        }
    }

    async fn add_like(&self, id: &str, user_id: &str) -> StoreResult<Post> {
        let mut posts = self.posts.write().await;
        let post = posts.get_mut(id).ok_or(StoreError::NotFound)?;

        // String-set semantics: adding an existing member is a no-op
        if !post.is_liked_by(user_id) {
            post.likes.push(user_id.to_string());
        }

        Ok(post.clone())
    }

    async fn append_comment(&self, id: &str, comment: &str) -> StoreResult<Post> {
        let mut posts = self.posts.write().await;
        let post = posts.get_mut(id).ok_or(StoreError::NotFound)?;
        post.comments.push(comment.to_string());
        Ok(post.clone())
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<String, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn get_user(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.get(email).cloned())
    }

    async fn create_user(&self, user: &User) -> StoreResult<()> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.email) {
            return Err(StoreError::ConditionFailed);
        }
        users.insert(user.email.clone(), user.clone());
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn post(id: &str, creator: &str) -> Post {
        Post {
            id: id.into(),
            title: format!("Post {}", id),
            message: String::new(),
            name: "Ada".into(),
            creator: creator.into(),
            tags: vec![],
            selected_file: None,
            likes: vec![],
            comments: vec![],
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn put_rejects_duplicate_id() {
        let store = MemoryPostStore::new();
        store.put_post(&post("1", "ada")).await.expect("first put");

        let err = store.put_post(&post("1", "ada")).await.unwrap_err();
        assert!(matches!(err, StoreError::ConditionFailed));
        assert_eq!(store.count_posts().await.expect("count"), 1);
    }

    #[tokio::test]
    async fn likes_behave_like_a_set() {
        let store = MemoryPostStore::new();
        store.put_post(&post("1", "ada")).await.expect("put");

        store.add_like("1", "grace").await.expect("like");
        let liked = store.add_like("1", "grace").await.expect("like again");
        assert_eq!(liked.likes, vec!["grace".to_string()]);

        let err = store.add_like("missing", "grace").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }

    #[tokio::test]
    async fn delete_requires_creator() {
        let store = MemoryPostStore::new();
        store.put_post(&post("1", "ada")).await.expect("put");

        let err = store.delete_post("1", "mallory").await.unwrap_err();
        assert!(matches!(err, StoreError::ConditionFailed));

        store.delete_post("1", "ada").await.expect("delete");
        assert!(store.get_post("1").await.expect("get").is_none());
    }

    #[tokio::test]
    async fn users_are_unique_by_email() {
        let store = MemoryUserStore::new();
        let user = User {
            email: "ada@example.com".into(),
            password: "hash".into(),
            name: "Ada Lovelace".into(),
        };

        store.create_user(&user).await.expect("create");
        assert!(matches!(
            store.create_user(&user).await.unwrap_err(),
            StoreError::ConditionFailed
        ));
        assert_eq!(
            store.get_user("ada@example.com").await.expect("get"),
            Some(user)
        );
    }
}
