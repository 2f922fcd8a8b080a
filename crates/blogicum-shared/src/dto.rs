//! Data Transfer Objects - request/response types for the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use blogicum_core::domain::{Category, Comment, Post, User};
use blogicum_core::pagination::Page;
use blogicum_core::services::{
    CategoryListing, CommentEntry, PostCard, PostDetail, ProfileListing,
};

/// Request to login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response containing authentication tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub user: ProfileResponse,
}

impl AuthResponse {
    pub fn bearer(access_token: String, expires_in: i64, user: &User) -> Self {
        Self {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: expires_in.max(0) as u64,
            user: ProfileResponse::from_user(user, true),
        }
    }
}

/// A user's public profile. The email is only filled in for its owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub date_joined: DateTime<Utc>,
}

impl ProfileResponse {
    pub fn from_user(user: &User, is_owner: bool) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            full_name: user.display_name(),
            email: is_owner.then(|| user.email.clone()),
            date_joined: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorRef {
    pub id: Uuid,
    pub username: String,
}

impl From<&User> for AuthorRef {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRef {
    pub slug: String,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryResponse {
    pub slug: String,
    pub title: String,
    pub description: String,
}

impl From<&Category> for CategoryResponse {
    fn from(category: &Category) -> Self {
        Self {
            slug: category.slug.clone(),
            title: category.title.clone(),
            description: category.description.clone(),
        }
    }
}

/// A post card as listings and the detail page render it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: Uuid,
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub is_published: bool,
    pub author: AuthorRef,
    pub category: Option<CategoryRef>,
    pub location: Option<String>,
    pub image: Option<String>,
    pub comment_count: u64,
    pub created_at: DateTime<Utc>,
}

impl From<PostCard> for PostResponse {
    fn from(card: PostCard) -> Self {
        let PostCard {
            post,
            author,
            category,
            location,
            comment_count,
        } = card;

        Self {
            id: post.id,
            title: post.title,
            text: post.text,
            pub_date: post.pub_date,
            is_published: post.is_published,
            author: AuthorRef::from(&author),
            category: category.map(|c| CategoryRef {
                slug: c.slug,
                title: c.title,
            }),
            location: location.map(|l| l.name),
            image: post.image,
            comment_count,
            created_at: post.created_at,
        }
    }
}

/// The stored fields of a post, as returned by create, edit and delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub is_published: bool,
    pub category: Option<Uuid>,
    pub location: Option<Uuid>,
    pub image: Option<String>,
}

impl From<Post> for PostRecord {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            author_id: post.author_id,
            title: post.title,
            text: post.text,
            pub_date: post.pub_date,
            is_published: post.is_published,
            category: post.category_id,
            location: post.location_id,
            image: post.image,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentResponse {
    pub id: Uuid,
    pub post_id: Uuid,
    pub text: String,
    pub author: AuthorRef,
    pub created_at: DateTime<Utc>,
}

impl CommentResponse {
    pub fn new(comment: Comment, author: AuthorRef) -> Self {
        Self {
            id: comment.id,
            post_id: comment.post_id,
            text: comment.text,
            author,
            created_at: comment.created_at,
        }
    }
}

impl From<CommentEntry> for CommentResponse {
    fn from(entry: CommentEntry) -> Self {
        let author = AuthorRef::from(&entry.author);
        Self::new(entry.comment, author)
    }
}

/// One page of a listing, with navigation hints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub per_page: u64,
    pub total_items: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T, U: Into<T>> From<Page<U>> for PageResponse<T> {
    fn from(page: Page<U>) -> Self {
        let has_next = page.has_next();
        let has_previous = page.has_previous();
        let page = page.map(Into::into);

        Self {
            items: page.items,
            page: page.number,
            per_page: page.per_page,
            total_items: page.total_items,
            total_pages: page.total_pages,
            has_next,
            has_previous,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDetailResponse {
    pub post: PostResponse,
    pub comments: Vec<CommentResponse>,
}

impl From<PostDetail> for PostDetailResponse {
    fn from(detail: PostDetail) -> Self {
        Self {
            post: detail.card.into(),
            comments: detail.comments.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryPageResponse {
    pub category: CategoryResponse,
    pub posts: PageResponse<PostResponse>,
}

impl From<CategoryListing> for CategoryPageResponse {
    fn from(listing: CategoryListing) -> Self {
        Self {
            category: CategoryResponse::from(&listing.category),
            posts: listing.posts.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfilePageResponse {
    pub profile: ProfileResponse,
    pub is_owner: bool,
    pub posts: PageResponse<PostResponse>,
}

impl From<ProfileListing> for ProfilePageResponse {
    fn from(listing: ProfileListing) -> Self {
        Self {
            profile: ProfileResponse::from_user(&listing.user, listing.is_owner),
            is_owner: listing.is_owner,
            posts: listing.posts.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blogicum_core::domain::{Location, PostFields};
    use blogicum_core::pagination::PageRequest;

    fn card(location: Option<Location>) -> PostCard {
        let author = User::new("leo".into(), "leo@example.com".into(), "hash".into());
        let post = Post::new(
            author.id,
            PostFields {
                title: "Hello".into(),
                text: "World".into(),
                pub_date: Utc::now(),
                is_published: true,
                category_id: None,
                location_id: location.as_ref().map(|l| l.id),
                image: None,
            },
        );
        PostCard {
            post,
            author,
            category: None,
            location,
            comment_count: 3,
        }
    }

    #[test]
    fn test_post_response_flattens_card() {
        let response = PostResponse::from(card(Some(Location::new("Moscow".into()))));

        assert_eq!(response.author.username, "leo");
        assert_eq!(response.location.as_deref(), Some("Moscow"));
        assert_eq!(response.comment_count, 3);
        assert!(response.category.is_none());
    }

    #[test]
    fn test_profile_hides_email_from_others() {
        let user = User::new("leo".into(), "leo@example.com".into(), "hash".into());

        let public = serde_json::to_value(ProfileResponse::from_user(&user, false)).unwrap();
        assert!(public.get("email").is_none());

        let own = ProfileResponse::from_user(&user, true);
        assert_eq!(own.email.as_deref(), Some("leo@example.com"));
    }

    #[test]
    fn test_page_response_navigation() {
        let cards: Vec<PostCard> = (0..25).map(|_| card(None)).collect();
        let page = Page::from_vec(cards, &PageRequest::number(2));

        let response: PageResponse<PostResponse> = page.into();
        assert_eq!(response.page, 2);
        assert_eq!(response.items.len(), 10);
        assert_eq!(response.total_pages, 3);
        assert!(response.has_next);
        assert!(response.has_previous);
    }
}
