/// Data models for posts and users
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A post as stored in the `posts` table and returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Millisecond timestamp string assigned at creation
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub message: String,
    /// Display name of the author
    #[serde(default)]
    pub name: String,
    /// User id of the author
    #[serde(default)]
    pub creator: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Inline data URL or public blob URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_file: Option<String>,
    /// User ids that liked the post
    #[serde(default)]
    pub likes: Vec<String>,
    #[serde(default)]
    pub comments: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.creator == user_id
    }

    pub fn is_liked_by(&self, user_id: &str) -> bool {
        self.likes.iter().any(|id| id == user_id)
    }
}

/// Editable post fields, as applied by an update
#[derive(Debug, Clone, PartialEq)]
pub struct PostUpdate {
    pub title: String,
    pub message: String,
    pub name: String,
    pub tags: Vec<String>,
    pub selected_file: Option<String>,
}

/// Search criteria for `GET /posts/search`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostSearch {
    /// Substring of the title
    pub title: Option<String>,
    /// A post matches when it carries any of these tags
    pub tags: Vec<String>,
}

impl PostSearch {
    /// Build criteria from the raw query string values
    ///
    /// The client sends `searchQuery=none` when the box is empty and tags as a
    /// comma-separated list.
    pub fn from_query(search_query: Option<&str>, tags: Option<&str>) -> Self {
        let title = search_query
            .map(str::trim)
            .filter(|q| !q.is_empty() && *q != "none")
            .map(str::to_string);

        let mut tag_list: Vec<String> = Vec::new();
        for tag in tags.unwrap_or_default().split(',') {
            let tag = tag.trim();
            if !tag.is_empty() && !tag_list.iter().any(|t| t == tag) {
                tag_list.push(tag.to_string());
            }
        }

        Self {
            title,
            tags: tag_list,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.tags.is_empty()
    }

    /// Same predicate the table store evaluates for the scan filter
    pub fn matches(&self, post: &Post) -> bool {
        let title_hit = self
            .title
            .as_deref()
            .map(|q| post.title.contains(q))
            .unwrap_or(false);
        let tag_hit = self.tags.iter().any(|tag| post.tags.contains(tag));
        title_hit || tag_hit
    }
}

/// A user as stored in the `users` table
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Partition key and user id
    pub email: String,
    /// Argon2 PHC hash string, or bcrypt for older accounts
    pub password: String,
    pub name: String,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("email", &self.email)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Public view of a user, without the password hash
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub name: String,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.email.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
        }
    }
}
