use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{Category, Comment, Location, Post, PostFields, User};
use crate::error::DomainError;
use crate::forms::{CommentForm, PostForm, ProfileForm};
use crate::pagination::{Page, PageRequest};
use crate::policy::{OwnershipPolicy, Viewer, Visibility, VisibilityPolicy};
use crate::ports::{
    CategoryRepository, Clock, CommentRepository, LocationRepository, PostFilter, PostRepository,
    UserRepository,
};

/// Every store the blog reads from or writes to.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub locations: Arc<dyn LocationRepository>,
}

/// A post together with what listings show next to it.
#[derive(Debug, Clone)]
pub struct PostCard {
    pub post: Post,
    pub author: User,
    pub category: Option<Category>,
    /// Only set while the location is published.
    pub location: Option<Location>,
    pub comment_count: u64,
}

#[derive(Debug, Clone)]
pub struct CommentEntry {
    pub comment: Comment,
    pub author: User,
}

#[derive(Debug, Clone)]
pub struct PostDetail {
    pub card: PostCard,
    pub comments: Vec<CommentEntry>,
}

#[derive(Debug, Clone)]
pub struct CategoryListing {
    pub category: Category,
    pub posts: Page<PostCard>,
}

#[derive(Debug, Clone)]
pub struct ProfileListing {
    pub user: User,
    pub is_owner: bool,
    pub posts: Page<PostCard>,
}

/// Memoizes related rows while assembling a page of cards.
#[derive(Default)]
struct Related {
    users: HashMap<Uuid, User>,
    categories: HashMap<Uuid, Option<Category>>,
    locations: HashMap<Uuid, Option<Location>>,
}

/// The blog's use cases: listings, post detail, and owner-only mutations.
pub struct BlogService {
    repos: Repositories,
    clock: Arc<dyn Clock>,
    visibility: VisibilityPolicy,
}

impl BlogService {
    pub fn new(repos: Repositories, clock: Arc<dyn Clock>, visibility: VisibilityPolicy) -> Self {
        Self {
            repos,
            clock,
            visibility,
        }
    }

    /// Front page: every publicly visible post.
    pub async fn index(&self, page: PageRequest) -> Result<Page<PostCard>, DomainError> {
        let filter = PostFilter::public(self.visibility.window(self.clock.now()));
        let posts = self.repos.posts.list(&filter, &page).await?;
        self.cards(posts).await
    }

    /// Publicly visible posts of a published category.
    pub async fn category_posts(
        &self,
        slug: &str,
        page: PageRequest,
    ) -> Result<CategoryListing, DomainError> {
        let category = self
            .repos
            .categories
            .find_by_slug(slug)
            .await?
            .filter(|c| c.is_published)
            .ok_or_else(|| DomainError::not_found("category", slug))?;

        let filter =
            PostFilter::public(self.visibility.window(self.clock.now())).in_category(category.id);
        let posts = self.repos.posts.list(&filter, &page).await?;

        Ok(CategoryListing {
            category,
            posts: self.cards(posts).await?,
        })
    }

    /// A user's posts. The owner sees drafts and scheduled posts as well.
    pub async fn profile(
        &self,
        viewer: Option<&Viewer>,
        username: &str,
        page: PageRequest,
    ) -> Result<ProfileListing, DomainError> {
        let user = self.user_by_username(username).await?;
        let is_owner = viewer.is_some_and(|v| v.user_id == user.id);

        let filter = if is_owner {
            PostFilter::default().by_author(user.id)
        } else {
            PostFilter::public(self.visibility.window(self.clock.now())).by_author(user.id)
        };
        let posts = self.repos.posts.list(&filter, &page).await?;

        Ok(ProfileListing {
            user,
            is_owner,
            posts: self.cards(posts).await?,
        })
    }

    pub async fn post_detail(
        &self,
        viewer: Option<&Viewer>,
        post_id: Uuid,
    ) -> Result<PostDetail, DomainError> {
        let post = self.visible_post(viewer, post_id).await?;

        let comments = self.repos.comments.list_for_post(post.id).await?;
        let mut related = Related::default();
        let mut entries = Vec::with_capacity(comments.len());
        for comment in comments {
            let author = self.author(comment.author_id, &mut related).await?;
            entries.push(CommentEntry { comment, author });
        }

        let counts = HashMap::from([(post.id, entries.len() as u64)]);
        let card = self.card(post, &counts, &mut related).await?;

        Ok(PostDetail {
            card,
            comments: entries,
        })
    }

    pub async fn create_post(&self, viewer: &Viewer, form: PostForm) -> Result<Post, DomainError> {
        let fields = form.clean()?;
        self.check_choices(&fields).await?;

        let post = self
            .repos
            .posts
            .save(Post::new(viewer.user_id, fields))
            .await?;
        tracing::info!(post_id = %post.id, author = %viewer.username, "Post created");
        Ok(post)
    }

    /// The post as its author is about to edit or delete it.
    pub async fn post_for_edit(&self, viewer: &Viewer, post_id: Uuid) -> Result<Post, DomainError> {
        let post = self.post(post_id).await?;
        OwnershipPolicy::post(viewer, &post).require()?;
        Ok(post)
    }

    pub async fn update_post(
        &self,
        viewer: &Viewer,
        post_id: Uuid,
        form: PostForm,
    ) -> Result<Post, DomainError> {
        let mut post = self.post_for_edit(viewer, post_id).await?;
        let fields = form.clean()?;
        self.check_choices(&fields).await?;

        post.apply(fields);
        let post = self.repos.posts.save(post).await?;
        tracing::info!(post_id = %post.id, "Post updated");
        Ok(post)
    }

    /// Deletes the post and, with it, all of its comments.
    pub async fn delete_post(&self, viewer: &Viewer, post_id: Uuid) -> Result<Post, DomainError> {
        let post = self.post_for_edit(viewer, post_id).await?;
        self.repos.posts.delete(post.id).await?;
        tracing::info!(post_id = %post.id, "Post deleted");
        Ok(post)
    }

    /// Comment on a post the viewer can see.
    pub async fn add_comment(
        &self,
        viewer: &Viewer,
        post_id: Uuid,
        form: CommentForm,
    ) -> Result<Comment, DomainError> {
        let post = self.visible_post(Some(viewer), post_id).await?;
        let text = form.clean()?;

        let comment = self
            .repos
            .comments
            .save(Comment::new(post.id, viewer.user_id, text))
            .await?;
        tracing::info!(comment_id = %comment.id, post_id = %post.id, "Comment added");
        Ok(comment)
    }

    /// The comment as its author is about to edit or delete it. It must
    /// belong to `post_id`.
    pub async fn comment_for_edit(
        &self,
        viewer: &Viewer,
        post_id: Uuid,
        comment_id: Uuid,
    ) -> Result<Comment, DomainError> {
        let comment = self
            .repos
            .comments
            .find_by_id(comment_id)
            .await?
            .filter(|c| c.post_id == post_id)
            .ok_or_else(|| DomainError::not_found("comment", comment_id))?;

        OwnershipPolicy::comment(viewer, &comment, post_id).require()?;
        Ok(comment)
    }

    pub async fn update_comment(
        &self,
        viewer: &Viewer,
        post_id: Uuid,
        comment_id: Uuid,
        form: CommentForm,
    ) -> Result<Comment, DomainError> {
        let mut comment = self.comment_for_edit(viewer, post_id, comment_id).await?;
        comment.text = form.clean()?;
        Ok(self.repos.comments.save(comment).await?)
    }

    pub async fn delete_comment(
        &self,
        viewer: &Viewer,
        post_id: Uuid,
        comment_id: Uuid,
    ) -> Result<Comment, DomainError> {
        let comment = self.comment_for_edit(viewer, post_id, comment_id).await?;
        self.repos.comments.delete(comment.id).await?;
        tracing::info!(comment_id = %comment.id, "Comment deleted");
        Ok(comment)
    }

    pub async fn profile_for_edit(
        &self,
        viewer: &Viewer,
        username: &str,
    ) -> Result<User, DomainError> {
        let user = self.user_by_username(username).await?;
        OwnershipPolicy::profile(viewer, username).require()?;
        Ok(user)
    }

    pub async fn update_profile(
        &self,
        viewer: &Viewer,
        username: &str,
        form: ProfileForm,
    ) -> Result<User, DomainError> {
        let mut user = self.profile_for_edit(viewer, username).await?;
        user.apply_profile(form.clean()?);
        Ok(self.repos.users.save(user).await?)
    }

    async fn post(&self, post_id: Uuid) -> Result<Post, DomainError> {
        self.repos
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| DomainError::not_found("post", post_id))
    }

    async fn visible_post(&self, viewer: Option<&Viewer>, post_id: Uuid) -> Result<Post, DomainError> {
        let post = self.post(post_id).await?;
        let category = match post.category_id {
            Some(id) => self.repos.categories.find_by_id(id).await?,
            None => None,
        };

        let visibility = self.visibility.check(
            viewer.map(|v| v.user_id),
            &post,
            category.as_ref(),
            self.clock.now(),
        );
        match visibility {
            Visibility::Visible => Ok(post),
            Visibility::NotFound => Err(DomainError::not_found("post", post_id)),
        }
    }

    async fn user_by_username(&self, username: &str) -> Result<User, DomainError> {
        self.repos
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::not_found("user", username))
    }

    /// Category and location must point at existing rows.
    async fn check_choices(&self, fields: &PostFields) -> Result<(), DomainError> {
        let mut errors = Vec::new();
        if let Some(id) = fields.category_id {
            if self.repos.categories.find_by_id(id).await?.is_none() {
                errors.push("category: select a valid choice".to_string());
            }
        }
        if let Some(id) = fields.location_id {
            if self.repos.locations.find_by_id(id).await?.is_none() {
                errors.push("location: select a valid choice".to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(errors))
        }
    }

    async fn cards(&self, posts: Page<Post>) -> Result<Page<PostCard>, DomainError> {
        let Page {
            items,
            number,
            per_page,
            total_items,
            total_pages,
        } = posts;

        let ids: Vec<Uuid> = items.iter().map(|p| p.id).collect();
        let counts = self.repos.comments.count_for_posts(&ids).await?;

        let mut related = Related::default();
        let mut cards = Vec::with_capacity(items.len());
        for post in items {
            cards.push(self.card(post, &counts, &mut related).await?);
        }

        Ok(Page {
            items: cards,
            number,
            per_page,
            total_items,
            total_pages,
        })
    }

    async fn card(
        &self,
        post: Post,
        counts: &HashMap<Uuid, u64>,
        related: &mut Related,
    ) -> Result<PostCard, DomainError> {
        let author = self.author(post.author_id, related).await?;

        let category = match post.category_id {
            Some(id) => {
                if !related.categories.contains_key(&id) {
                    let found = self.repos.categories.find_by_id(id).await?;
                    related.categories.insert(id, found);
                }
                related.categories.get(&id).cloned().flatten()
            }
            None => None,
        };

        let location = match post.location_id {
            Some(id) => {
                if !related.locations.contains_key(&id) {
                    let found = self.repos.locations.find_by_id(id).await?;
                    related.locations.insert(id, found);
                }
                related
                    .locations
                    .get(&id)
                    .cloned()
                    .flatten()
                    .filter(|l| l.is_published)
            }
            None => None,
        };

        Ok(PostCard {
            comment_count: counts.get(&post.id).copied().unwrap_or(0),
            post,
            author,
            category,
            location,
        })
    }

    async fn author(&self, user_id: Uuid, related: &mut Related) -> Result<User, DomainError> {
        if let Some(user) = related.users.get(&user_id) {
            return Ok(user.clone());
        }

        let user = self
            .repos
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| DomainError::Internal(format!("author {} is missing", user_id)))?;
        related.users.insert(user_id, user.clone());
        Ok(user)
    }
}
