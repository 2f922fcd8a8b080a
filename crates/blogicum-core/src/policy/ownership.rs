use std::fmt;

use uuid::Uuid;

use super::Viewer;
use crate::domain::{Comment, Post};
use crate::error::DomainError;

/// Safe page a denied viewer is sent to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectTarget {
    Index,
    PostDetail(Uuid),
    Profile(String),
}

impl fmt::Display for RedirectTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RedirectTarget::Index => write!(f, "/"),
            RedirectTarget::PostDetail(id) => write!(f, "/posts/{}/", id),
            RedirectTarget::Profile(username) => {
                write!(f, "/profile/{}/", urlencoding::encode(username))
            }
        }
    }
}

/// Outcome of an ownership check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Authorized,
    Redirect(RedirectTarget),
}

impl Access {
    pub fn is_authorized(&self) -> bool {
        matches!(self, Access::Authorized)
    }

    /// Turn a denial into `DomainError::Unauthorized` so callers can `?` it
    /// before touching anything.
    pub fn require(self) -> Result<(), DomainError> {
        match self {
            Access::Authorized => Ok(()),
            Access::Redirect(redirect) => Err(DomainError::Unauthorized { redirect }),
        }
    }
}

/// Gatekeeper for every mutating operation.
pub struct OwnershipPolicy;

impl OwnershipPolicy {
    pub fn post(viewer: &Viewer, post: &Post) -> Access {
        Self::decide(
            post.is_authored_by(viewer.user_id),
            RedirectTarget::PostDetail(post.id),
        )
    }

    /// `post_id` is the post the request was addressed to; denial lands there.
    pub fn comment(viewer: &Viewer, comment: &Comment, post_id: Uuid) -> Access {
        Self::decide(
            comment.is_authored_by(viewer.user_id),
            RedirectTarget::PostDetail(post_id),
        )
    }

    pub fn profile(viewer: &Viewer, username: &str) -> Access {
        Self::decide(
            viewer.username == username,
            RedirectTarget::Profile(username.to_string()),
        )
    }

    fn decide(owner: bool, fallback: RedirectTarget) -> Access {
        if owner {
            Access::Authorized
        } else {
            tracing::debug!(redirect = %fallback, "Ownership check denied");
            Access::Redirect(fallback)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PostFields;
    use chrono::Utc;

    fn viewer() -> Viewer {
        Viewer::new(Uuid::new_v4(), "alice")
    }

    fn post_by(author: Uuid) -> Post {
        Post::new(
            author,
            PostFields {
                title: "t".into(),
                text: "b".into(),
                pub_date: Utc::now(),
                is_published: true,
                category_id: None,
                location_id: None,
                image: None,
            },
        )
    }

    #[test]
    fn test_post_author_is_authorized() {
        let alice = viewer();
        let post = post_by(alice.user_id);
        assert_eq!(OwnershipPolicy::post(&alice, &post), Access::Authorized);
    }

    #[test]
    fn test_post_stranger_redirected_to_detail() {
        let alice = viewer();
        let post = post_by(Uuid::new_v4());
        assert_eq!(
            OwnershipPolicy::post(&alice, &post),
            Access::Redirect(RedirectTarget::PostDetail(post.id))
        );
    }

    #[test]
    fn test_comment_stranger_redirected_to_addressed_post() {
        let alice = viewer();
        let post_id = Uuid::new_v4();
        let comment = Comment::new(post_id, Uuid::new_v4(), "hi".into());

        let access = OwnershipPolicy::comment(&alice, &comment, post_id);
        assert!(!access.is_authorized());
        assert!(matches!(
            access.require(),
            Err(DomainError::Unauthorized {
                redirect: RedirectTarget::PostDetail(id)
            }) if id == post_id
        ));
    }

    #[test]
    fn test_comment_author_is_authorized() {
        let alice = viewer();
        let comment = Comment::new(Uuid::new_v4(), alice.user_id, "hi".into());
        assert!(OwnershipPolicy::comment(&alice, &comment, comment.post_id).is_authorized());
    }

    #[test]
    fn test_profile_compares_usernames() {
        let alice = viewer();
        assert!(OwnershipPolicy::profile(&alice, "alice").is_authorized());
        assert_eq!(
            OwnershipPolicy::profile(&alice, "bob"),
            Access::Redirect(RedirectTarget::Profile("bob".into()))
        );
    }

    #[test]
    fn test_redirect_target_paths() {
        let id = Uuid::nil();
        assert_eq!(RedirectTarget::Index.to_string(), "/");
        assert_eq!(
            RedirectTarget::PostDetail(id).to_string(),
            format!("/posts/{}/", id)
        );
        assert_eq!(
            RedirectTarget::Profile("bob".into()).to_string(),
            "/profile/bob/"
        );
        assert_eq!(
            RedirectTarget::Profile("jo+1@home".into()).to_string(),
            "/profile/jo%2B1%40home/"
        );
        assert_eq!(
            RedirectTarget::Profile("жора".into()).to_string(),
            "/profile/%D0%B6%D0%BE%D1%80%D0%B0/"
        );
    }
}
