//! Deletion policy between stored entities.
//!
//! The in-memory store walks [`DELETION_POLICY`] whenever a row is removed;
//! the Postgres schema declares the same rules as `ON DELETE` clauses.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    User,
    Group,
    Post,
    Comment,
    Follow,
}

/// A foreign reference held by a child row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference {
    PostAuthor,
    PostGroup,
    CommentPost,
    CommentAuthor,
    FollowUser,
    FollowAuthor,
}

impl Reference {
    pub fn child(self) -> Entity {
        match self {
            Reference::PostAuthor | Reference::PostGroup => Entity::Post,
            Reference::CommentPost | Reference::CommentAuthor => Entity::Comment,
            Reference::FollowUser | Reference::FollowAuthor => Entity::Follow,
        }
    }

    pub fn parent(self) -> Entity {
        match self {
            Reference::PostGroup => Entity::Group,
            Reference::CommentPost => Entity::Post,
            Reference::PostAuthor
            | Reference::CommentAuthor
            | Reference::FollowUser
            | Reference::FollowAuthor => Entity::User,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnDelete {
    /// Remove the referencing rows as well.
    Cascade,
    /// Keep the referencing rows and clear the reference.
    SetNull,
}

#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub reference: Reference,
    pub on_delete: OnDelete,
}

pub const DELETION_POLICY: &[Rule] = &[
    Rule {
        reference: Reference::PostAuthor,
        on_delete: OnDelete::Cascade,
    },
    Rule {
        reference: Reference::PostGroup,
        on_delete: OnDelete::SetNull,
    },
    Rule {
        reference: Reference::CommentPost,
        on_delete: OnDelete::Cascade,
    },
    Rule {
        reference: Reference::CommentAuthor,
        on_delete: OnDelete::Cascade,
    },
    Rule {
        reference: Reference::FollowUser,
        on_delete: OnDelete::Cascade,
    },
    Rule {
        reference: Reference::FollowAuthor,
        on_delete: OnDelete::Cascade,
    },
];

/// Rules triggered by deleting a row of `parent`.
pub fn rules_for(parent: Entity) -> impl Iterator<Item = &'static Rule> {
    DELETION_POLICY
        .iter()
        .filter(move |rule| rule.reference.parent() == parent)
}
