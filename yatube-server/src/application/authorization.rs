use uuid::Uuid;

use crate::domain::post::Post;

/// Only the author of a post may change it.
pub fn can_edit(acting_user: Uuid, post: &Post) -> bool {
    post.is_authored_by(acting_user)
}
