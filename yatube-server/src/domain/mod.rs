pub mod comment;
pub mod error;
pub mod follow;
pub mod group;
pub mod pagination;
pub mod post;
pub mod relations;
pub mod user;
