//! In-memory store - used when no database is configured, and in tests.
//!
//! All five tables sit behind one async `RwLock`, so a delete and its
//! cascades happen in a single critical section.
//! Note: Data is lost on process restart.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use blogicum_core::domain::{Category, Comment, Location, Post, User};
use blogicum_core::error::RepoError;
use blogicum_core::pagination::{Page, PageRequest};
use blogicum_core::ports::{
    BaseRepository, CategoryRepository, CommentRepository, LocationRepository, PostFilter,
    PostRepository, UserRepository,
};
use blogicum_core::services::Repositories;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    categories: HashMap<Uuid, Category>,
    locations: HashMap<Uuid, Location>,
    posts: HashMap<Uuid, Post>,
    comments: HashMap<Uuid, Comment>,
}

impl Tables {
    fn remove_post(&mut self, post_id: Uuid) -> Option<Post> {
        let post = self.posts.remove(&post_id)?;
        self.comments.retain(|_, c| c.post_id != post_id);
        Some(post)
    }

    fn matches(&self, post: &Post, filter: &PostFilter) -> bool {
        if filter.author_id.is_some_and(|id| post.author_id != id) {
            return false;
        }
        if filter.category_id.is_some_and(|id| post.category_id != Some(id)) {
            return false;
        }
        match filter.public {
            Some(window) => {
                let category = post.category_id.and_then(|id| self.categories.get(&id));
                window.admits(post, category)
            }
            None => true,
        }
    }
}

/// Shared handle to the in-memory tables. Cheap to clone.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository handles backed by this store.
    pub fn repositories(&self) -> Repositories {
        Repositories {
            users: Arc::new(InMemoryUserRepository::new(self.clone())),
            posts: Arc::new(InMemoryPostRepository::new(self.clone())),
            comments: Arc::new(InMemoryCommentRepository::new(self.clone())),
            categories: Arc::new(InMemoryCategoryRepository::new(self.clone())),
            locations: Arc::new(InMemoryLocationRepository::new(self.clone())),
        }
    }
}

macro_rules! store_repository {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        pub struct $name {
            store: InMemoryStore,
        }

        impl $name {
            pub fn new(store: InMemoryStore) -> Self {
                Self { store }
            }
        }
    };
}

store_repository!(
    /// In-memory users. Deleting a user removes their posts and comments.
    InMemoryUserRepository
);
store_repository!(
    /// In-memory categories. Deleting a category detaches its posts.
    InMemoryCategoryRepository
);
store_repository!(
    /// In-memory locations. Deleting a location detaches its posts.
    InMemoryLocationRepository
);
store_repository!(
    /// In-memory posts. Deleting a post removes its comments.
    InMemoryPostRepository
);
store_repository!(
    /// In-memory comments.
    InMemoryCommentRepository
);

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.store.tables.read().await.users.get(&id).cloned())
    }

    async fn save(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.store.tables.write().await;
        if tables
            .users
            .values()
            .any(|u| u.id != user.id && u.username == user.username)
        {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.store.tables.write().await;
        tables.users.remove(&id).ok_or(RepoError::NotFound)?;

        let authored: Vec<Uuid> = tables
            .posts
            .values()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();
        for post_id in authored {
            tables.remove_post(post_id);
        }
        tables.comments.retain(|_, c| c.author_id != id);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }
}

#[async_trait]
impl BaseRepository<Category, Uuid> for InMemoryCategoryRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>, RepoError> {
        Ok(self.store.tables.read().await.categories.get(&id).cloned())
    }

    async fn save(&self, category: Category) -> Result<Category, RepoError> {
        let mut tables = self.store.tables.write().await;
        if tables
            .categories
            .values()
            .any(|c| c.id != category.id && c.slug == category.slug)
        {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }
        tables.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.store.tables.write().await;
        tables.categories.remove(&id).ok_or(RepoError::NotFound)?;
        for post in tables.posts.values_mut() {
            if post.category_id == Some(id) {
                post.category_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CategoryRepository for InMemoryCategoryRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables.categories.values().find(|c| c.slug == slug).cloned())
    }
}

#[async_trait]
impl BaseRepository<Location, Uuid> for InMemoryLocationRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Location>, RepoError> {
        Ok(self.store.tables.read().await.locations.get(&id).cloned())
    }

    async fn save(&self, location: Location) -> Result<Location, RepoError> {
        let mut tables = self.store.tables.write().await;
        tables.locations.insert(location.id, location.clone());
        Ok(location)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.store.tables.write().await;
        tables.locations.remove(&id).ok_or(RepoError::NotFound)?;
        for post in tables.posts.values_mut() {
            if post.location_id == Some(id) {
                post.location_id = None;
            }
        }
        Ok(())
    }
}

impl LocationRepository for InMemoryLocationRepository {}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.store.tables.read().await.posts.get(&id).cloned())
    }

    async fn save(&self, post: Post) -> Result<Post, RepoError> {
        let mut tables = self.store.tables.write().await;
        if !tables.users.contains_key(&post.author_id) {
            return Err(RepoError::Constraint("Unknown author".to_string()));
        }
        if post
            .category_id
            .is_some_and(|id| !tables.categories.contains_key(&id))
        {
            return Err(RepoError::Constraint("Unknown category".to_string()));
        }
        if post
            .location_id
            .is_some_and(|id| !tables.locations.contains_key(&id))
        {
            return Err(RepoError::Constraint("Unknown location".to_string()));
        }
        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.store.tables.write().await;
        tables.remove_post(id).ok_or(RepoError::NotFound)?;
        Ok(())
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn list(&self, filter: &PostFilter, page: &PageRequest) -> Result<Page<Post>, RepoError> {
        let tables = self.store.tables.read().await;
        let mut posts: Vec<Post> = tables
            .posts
            .values()
            .filter(|p| tables.matches(p, filter))
            .cloned()
            .collect();
        posts.sort_by(|a, b| {
            b.pub_date
                .cmp(&a.pub_date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });

        Ok(Page::from_vec(posts, page))
    }
}

#[async_trait]
impl BaseRepository<Comment, Uuid> for InMemoryCommentRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, RepoError> {
        Ok(self.store.tables.read().await.comments.get(&id).cloned())
    }

    async fn save(&self, comment: Comment) -> Result<Comment, RepoError> {
        let mut tables = self.store.tables.write().await;
        if !tables.posts.contains_key(&comment.post_id)
            || !tables.users.contains_key(&comment.author_id)
        {
            return Err(RepoError::Constraint("Unknown post or author".to_string()));
        }
        tables.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.store.tables.write().await;
        tables.comments.remove(&id).ok_or(RepoError::NotFound)?;
        Ok(())
    }
}

#[async_trait]
impl CommentRepository for InMemoryCommentRepository {
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let tables = self.store.tables.read().await;
        let mut comments: Vec<Comment> = tables
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by_key(|c| c.created_at);
        Ok(comments)
    }

    async fn count_for_posts(&self, post_ids: &[Uuid]) -> Result<HashMap<Uuid, u64>, RepoError> {
        let tables = self.store.tables.read().await;
        let mut counts = HashMap::new();
        for comment in tables.comments.values() {
            if post_ids.contains(&comment.post_id) {
                *counts.entry(comment.post_id).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blogicum_core::domain::PostFields;
    use blogicum_core::policy::VisibilityPolicy;
    use chrono::{Duration, Utc};

    fn fields(category: Option<Uuid>, location: Option<Uuid>) -> PostFields {
        PostFields {
            title: "Title".into(),
            text: "Text".into(),
            pub_date: Utc::now() - Duration::hours(1),
            is_published: true,
            category_id: category,
            location_id: location,
            image: None,
        }
    }

    async fn seed_user(repos: &Repositories, name: &str) -> User {
        repos
            .users
            .save(User::new(name.into(), String::new(), "hash".into()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_deleting_post_removes_its_comments() {
        let repos = InMemoryStore::new().repositories();
        let author = seed_user(&repos, "author").await;
        let post = repos
            .posts
            .save(Post::new(author.id, fields(None, None)))
            .await
            .unwrap();
        let other = repos
            .posts
            .save(Post::new(author.id, fields(None, None)))
            .await
            .unwrap();
        for _ in 0..3 {
            repos
                .comments
                .save(Comment::new(post.id, author.id, "hi".into()))
                .await
                .unwrap();
        }
        let kept = repos
            .comments
            .save(Comment::new(other.id, author.id, "stay".into()))
            .await
            .unwrap();

        repos.posts.delete(post.id).await.unwrap();

        assert!(repos.comments.list_for_post(post.id).await.unwrap().is_empty());
        assert!(repos.comments.find_by_id(kept.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_deleting_user_cascades() {
        let repos = InMemoryStore::new().repositories();
        let author = seed_user(&repos, "author").await;
        let reader = seed_user(&repos, "reader").await;
        let own = repos
            .posts
            .save(Post::new(author.id, fields(None, None)))
            .await
            .unwrap();
        let readers = repos
            .posts
            .save(Post::new(reader.id, fields(None, None)))
            .await
            .unwrap();
        let comment = repos
            .comments
            .save(Comment::new(readers.id, author.id, "hey".into()))
            .await
            .unwrap();

        repos.users.delete(author.id).await.unwrap();

        assert!(repos.posts.find_by_id(own.id).await.unwrap().is_none());
        assert!(repos.comments.find_by_id(comment.id).await.unwrap().is_none());
        assert!(repos.posts.find_by_id(readers.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_deleting_category_and_location_detaches_posts() {
        let repos = InMemoryStore::new().repositories();
        let author = seed_user(&repos, "author").await;
        let category = repos
            .categories
            .save(Category::new("T".into(), "D".into(), "t".into()))
            .await
            .unwrap();
        let location = repos
            .locations
            .save(Location::new("Island".into()))
            .await
            .unwrap();
        let post = repos
            .posts
            .save(Post::new(
                author.id,
                fields(Some(category.id), Some(location.id)),
            ))
            .await
            .unwrap();

        repos.categories.delete(category.id).await.unwrap();
        repos.locations.delete(location.id).await.unwrap();

        let post = repos.posts.find_by_id(post.id).await.unwrap().unwrap();
        assert_eq!(post.category_id, None);
        assert_eq!(post.location_id, None);
    }

    #[tokio::test]
    async fn test_post_with_dangling_category_or_location_rejected() {
        let repos = InMemoryStore::new().repositories();
        let author = seed_user(&repos, "author").await;

        let result = repos
            .posts
            .save(Post::new(author.id, fields(Some(Uuid::new_v4()), None)))
            .await;
        assert!(matches!(result, Err(RepoError::Constraint(_))));

        let result = repos
            .posts
            .save(Post::new(author.id, fields(None, Some(Uuid::new_v4()))))
            .await;
        assert!(matches!(result, Err(RepoError::Constraint(_))));

        let filter = PostFilter::default();
        let page = repos.posts.list(&filter, &PageRequest::first()).await.unwrap();
        assert_eq!(page.total_items, 0);
    }

    #[tokio::test]
    async fn test_duplicate_username_and_slug_rejected() {
        let repos = InMemoryStore::new().repositories();
        seed_user(&repos, "taken").await;
        let dup = repos
            .users
            .save(User::new("taken".into(), String::new(), "hash".into()))
            .await;
        assert!(matches!(dup, Err(RepoError::Constraint(_))));

        repos
            .categories
            .save(Category::new("A".into(), "".into(), "slug".into()))
            .await
            .unwrap();
        let dup = repos
            .categories
            .save(Category::new("B".into(), "".into(), "slug".into()))
            .await;
        assert!(matches!(dup, Err(RepoError::Constraint(_))));
    }

    #[tokio::test]
    async fn test_public_listing_prefilters_and_orders() {
        let repos = InMemoryStore::new().repositories();
        let author = seed_user(&repos, "author").await;
        let hidden = repos
            .categories
            .save(Category::new("H".into(), "".into(), "hidden".into()).unpublished())
            .await
            .unwrap();
        let now = Utc::now();

        let mut older = fields(None, None);
        older.pub_date = now - Duration::days(2);
        let mut newer = fields(None, None);
        newer.pub_date = now - Duration::days(1);
        let mut future = fields(None, None);
        future.pub_date = now + Duration::hours(1);
        let mut draft = fields(None, None);
        draft.is_published = false;
        let in_hidden = fields(Some(hidden.id), None);

        let older = repos.posts.save(Post::new(author.id, older)).await.unwrap();
        let newer = repos.posts.save(Post::new(author.id, newer)).await.unwrap();
        for f in [future, draft, in_hidden] {
            repos.posts.save(Post::new(author.id, f)).await.unwrap();
        }

        let window = VisibilityPolicy::default().window(now);
        let page = repos
            .posts
            .list(&PostFilter::public(window), &PageRequest::first())
            .await
            .unwrap();
        let ids: Vec<Uuid> = page.items.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![newer.id, older.id]);

        let everything = repos
            .posts
            .list(
                &PostFilter::default().by_author(author.id),
                &PageRequest::first(),
            )
            .await
            .unwrap();
        assert_eq!(everything.total_items, 5);
    }

    #[tokio::test]
    async fn test_count_for_posts() {
        let repos = InMemoryStore::new().repositories();
        let author = seed_user(&repos, "author").await;
        let a = repos
            .posts
            .save(Post::new(author.id, fields(None, None)))
            .await
            .unwrap();
        let b = repos
            .posts
            .save(Post::new(author.id, fields(None, None)))
            .await
            .unwrap();
        for _ in 0..2 {
            repos
                .comments
                .save(Comment::new(a.id, author.id, "x".into()))
                .await
                .unwrap();
        }

        let counts = repos.comments.count_for_posts(&[a.id, b.id]).await.unwrap();
        assert_eq!(counts.get(&a.id), Some(&2));
        assert_eq!(counts.get(&b.id), None);
    }
}
