use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Post entity - a blog publication.
///
/// `pub_date` may lie in the future, in which case the post stays hidden
/// from everyone but its author until that moment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub is_published: bool,
    pub category_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Author-editable post fields, already validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostFields {
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub is_published: bool,
    pub category_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub image: Option<String>,
}

impl Post {
    /// Create a new post owned by `author_id`.
    pub fn new(author_id: Uuid, fields: PostFields) -> Self {
        let mut post = Self {
            id: Uuid::new_v4(),
            author_id,
            title: String::new(),
            text: String::new(),
            pub_date: fields.pub_date,
            is_published: true,
            category_id: None,
            location_id: None,
            image: None,
            created_at: Utc::now(),
        };
        post.apply(fields);
        post
    }

    /// Overwrite the editable fields. Author and id stay untouched.
    pub fn apply(&mut self, fields: PostFields) {
        self.title = fields.title;
        self.text = fields.text;
        self.pub_date = fields.pub_date;
        self.is_published = fields.is_published;
        self.category_id = fields.category_id;
        self.location_id = fields.location_id;
        self.image = fields.image;
    }

    pub fn is_authored_by(&self, user_id: Uuid) -> bool {
        self.author_id == user_id
    }
}
