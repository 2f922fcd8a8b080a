//! Application services - use cases composed from policies and ports.

mod blog;

pub use blog::{
    BlogService, CategoryListing, CommentEntry, PostCard, PostDetail, ProfileListing,
    Repositories,
};
