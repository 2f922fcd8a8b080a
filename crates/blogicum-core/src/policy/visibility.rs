use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Category, Post};

/// Outcome of a detail-page access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    NotFound,
}

/// The public-visibility predicate, frozen at one instant.
///
/// Repositories receive this to pre-filter listings, so listings and detail
/// pages always agree on what the public may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicWindow {
    pub now: DateTime<Utc>,
    pub include_uncategorized: bool,
}

impl PublicWindow {
    /// `category` must be the post's own category, if it has one.
    pub fn admits(&self, post: &Post, category: Option<&Category>) -> bool {
        post.is_published && post.pub_date <= self.now && self.category_admits(post, category)
    }

    fn category_admits(&self, post: &Post, category: Option<&Category>) -> bool {
        match (post.category_id, category) {
            (None, _) => self.include_uncategorized,
            (Some(id), Some(category)) => category.id == id && category.is_published,
            // Dangling reference.
            (Some(_), None) => false,
        }
    }
}

/// Decides which posts a viewer may see.
#[derive(Debug, Clone, Copy, Default)]
pub struct VisibilityPolicy {
    /// Treat posts without a category as unpublished.
    pub hide_uncategorized: bool,
}

impl VisibilityPolicy {
    pub fn new(hide_uncategorized: bool) -> Self {
        Self { hide_uncategorized }
    }

    pub fn window(&self, now: DateTime<Utc>) -> PublicWindow {
        PublicWindow {
            now,
            include_uncategorized: !self.hide_uncategorized,
        }
    }

    /// Authors always see their own posts; everyone else only sees posts
    /// inside the public window.
    pub fn check(
        &self,
        viewer: Option<Uuid>,
        post: &Post,
        category: Option<&Category>,
        now: DateTime<Utc>,
    ) -> Visibility {
        if viewer.is_some_and(|id| post.is_authored_by(id)) {
            return Visibility::Visible;
        }

        if self.window(now).admits(post, category) {
            Visibility::Visible
        } else {
            Visibility::NotFound
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PostFields;
    use chrono::Duration;

    fn post(author: Uuid, category: Option<&Category>, pub_date: DateTime<Utc>) -> Post {
        Post::new(
            author,
            PostFields {
                title: "Title".to_string(),
                text: "Body".to_string(),
                pub_date,
                is_published: true,
                category_id: category.map(|c| c.id),
                location_id: None,
                image: None,
            },
        )
    }

    fn category() -> Category {
        Category::new("Travel".into(), "Trips".into(), "travel".into())
    }

    #[test]
    fn test_future_post_hidden_from_others_visible_to_author() {
        let now = Utc::now();
        let author = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let category = category();
        let post = post(author, Some(&category), now + Duration::hours(1));
        let policy = VisibilityPolicy::default();

        assert_eq!(
            policy.check(Some(stranger), &post, Some(&category), now),
            Visibility::NotFound
        );
        assert_eq!(
            policy.check(None, &post, Some(&category), now),
            Visibility::NotFound
        );
        assert_eq!(
            policy.check(Some(author), &post, Some(&category), now),
            Visibility::Visible
        );
    }

    #[test]
    fn test_unpublished_post_hidden_from_others() {
        let now = Utc::now();
        let author = Uuid::new_v4();
        let category = category();
        let mut post = post(author, Some(&category), now - Duration::hours(1));
        post.is_published = false;
        let policy = VisibilityPolicy::default();

        assert_eq!(
            policy.check(Some(Uuid::new_v4()), &post, Some(&category), now),
            Visibility::NotFound
        );
        assert_eq!(
            policy.check(Some(author), &post, Some(&category), now),
            Visibility::Visible
        );
    }

    #[test]
    fn test_unpublished_category_hides_post() {
        let now = Utc::now();
        let category = category().unpublished();
        let post = post(Uuid::new_v4(), Some(&category), now - Duration::minutes(5));

        assert_eq!(
            VisibilityPolicy::default().check(None, &post, Some(&category), now),
            Visibility::NotFound
        );
    }

    #[test]
    fn test_pub_date_equal_to_now_is_visible() {
        let now = Utc::now();
        let category = category();
        let post = post(Uuid::new_v4(), Some(&category), now);

        assert_eq!(
            VisibilityPolicy::default().check(None, &post, Some(&category), now),
            Visibility::Visible
        );
    }

    #[test]
    fn test_uncategorized_post_follows_configuration() {
        let now = Utc::now();
        let post = post(Uuid::new_v4(), None, now - Duration::days(1));

        assert_eq!(
            VisibilityPolicy::new(false).check(None, &post, None, now),
            Visibility::Visible
        );
        assert_eq!(
            VisibilityPolicy::new(true).check(None, &post, None, now),
            Visibility::NotFound
        );
    }

    #[test]
    fn test_dangling_category_reference_is_hidden() {
        let now = Utc::now();
        let category = category();
        let post = post(Uuid::new_v4(), Some(&category), now - Duration::days(1));

        assert!(!VisibilityPolicy::default().window(now).admits(&post, None));
    }
}
