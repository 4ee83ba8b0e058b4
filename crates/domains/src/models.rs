//! # Domain Models
//!
//! These structs represent the core entities of agora.
//! We use UUID v7 for time-ordered, globally unique identification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DomainError, Result};

/// Role level carried on every user. Ordering matters: moderation rules
/// compare levels, never raw integers scattered through handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Moderator,
    Admin,
}

impl Role {
    /// Integer form stored in the database (0/1/2).
    pub fn as_i16(self) -> i16 {
        match self {
            Role::User => 0,
            Role::Moderator => 1,
            Role::Admin => 2,
        }
    }

    pub fn from_i16(level: i16) -> Result<Self> {
        match level {
            0 => Ok(Role::User),
            1 => Ok(Role::Moderator),
            2 => Ok(Role::Admin),
            other => Err(DomainError::validation(format!("unknown role level {other}"))),
        }
    }

    pub fn is_staff(self) -> bool {
        self >= Role::Moderator
    }

    /// Whether a holder of this role may ban `target`.
    ///
    /// Moderators cannot touch other staff; admins cannot ban admins.
    pub fn can_ban(self, target: Role) -> bool {
        match self {
            Role::User => false,
            Role::Moderator => target == Role::User,
            Role::Admin => target != Role::Admin,
        }
    }
}

/// A registered account. `reputation` is derived from the stats of owned
/// threads and comments and is never writable through the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub reputation: i64,
    pub is_banned: bool,
    pub created_at: DateTime<Utc>,
}

/// A discussion thread. `stats` is the raw JSON counter bucket as stored;
/// use [`ThreadStats::from_value`] for a typed view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    pub id: Uuid,
    pub author_id: Uuid,
    pub category_id: Uuid,
    pub title: String,
    pub content: String,
    pub stats: serde_json::Value,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
}

/// A comment under a thread, optionally replying to another comment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub thread_id: Uuid,
    pub author_id: Uuid,
    pub parent_comment_id: Option<Uuid>,
    pub content: String,
    pub stats: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// The fixed-shape counter record embedded on a thread.
///
/// Invariant: every field equals the count of live interactions (or
/// comments) of the matching kind referencing the thread.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThreadStats {
    pub upvotes: i64,
    pub downvotes: i64,
    pub followers: i64,
    pub comments: i64,
}

impl ThreadStats {
    pub fn from_value(value: &serde_json::Value) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_value(value.clone())
    }

    pub fn to_value(self) -> serde_json::Value {
        serde_json::json!({
            "upvotes": self.upvotes,
            "downvotes": self.downvotes,
            "followers": self.followers,
            "comments": self.comments,
        })
    }

    /// This thread's contribution to its author's reputation.
    /// Net votes are floored at zero per entity, not on the total.
    pub fn reputation(self) -> i64 {
        (self.upvotes - self.downvotes).max(0) + self.followers + self.comments
    }
}

/// The fixed-shape counter record embedded on a comment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentStats {
    pub upvotes: i64,
    pub downvotes: i64,
}

impl CommentStats {
    pub fn from_value(value: &serde_json::Value) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_value(value.clone())
    }

    pub fn to_value(self) -> serde_json::Value {
        serde_json::json!({ "upvotes": self.upvotes, "downvotes": self.downvotes })
    }

    pub fn reputation(self) -> i64 {
        (self.upvotes - self.downvotes).max(0)
    }
}

/// Which kind of entity an interaction points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Thread,
    Comment,
}

/// A validated reference to exactly one thread or one comment.
///
/// Constructed through [`TargetRef::from_parts`], so the
/// "exactly one of thread/comment" invariant holds by type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetRef {
    Thread(Uuid),
    Comment(Uuid),
}

impl TargetRef {
    /// Builds a target from the wire-level optional pair, rejecting
    /// zero-or-both with a validation error.
    pub fn from_parts(thread_id: Option<Uuid>, comment_id: Option<Uuid>) -> Result<Self> {
        match (thread_id, comment_id) {
            (Some(id), None) => Ok(TargetRef::Thread(id)),
            (None, Some(id)) => Ok(TargetRef::Comment(id)),
            _ => Err(DomainError::validation(
                "either thread_id or comment_id must be provided, but not both",
            )),
        }
    }

    pub fn kind(self) -> TargetKind {
        match self {
            TargetRef::Thread(_) => TargetKind::Thread,
            TargetRef::Comment(_) => TargetKind::Comment,
        }
    }

    pub fn thread_id(self) -> Option<Uuid> {
        match self {
            TargetRef::Thread(id) => Some(id),
            TargetRef::Comment(_) => None,
        }
    }

    pub fn comment_id(self) -> Option<Uuid> {
        match self {
            TargetRef::Thread(_) => None,
            TargetRef::Comment(id) => Some(id),
        }
    }
}

/// What a user did to a target. `Upvote` and `Downvote` compete for the
/// single vote slot; `Follow` occupies its own independent slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    Upvote,
    Downvote,
    Follow,
}

impl InteractionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            InteractionKind::Upvote => "upvote",
            InteractionKind::Downvote => "downvote",
            InteractionKind::Follow => "follow",
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        match raw {
            "upvote" => Ok(InteractionKind::Upvote),
            "downvote" => Ok(InteractionKind::Downvote),
            "follow" => Ok(InteractionKind::Follow),
            _ => Err(DomainError::validation(format!(
                "invalid interaction type: {raw}"
            ))),
        }
    }

    pub fn is_vote(self) -> bool {
        matches!(self, InteractionKind::Upvote | InteractionKind::Downvote)
    }

    /// The counter this kind maintains on its target.
    pub fn stat_field(self) -> StatField {
        match self {
            InteractionKind::Upvote => StatField::Upvotes,
            InteractionKind::Downvote => StatField::Downvotes,
            InteractionKind::Follow => StatField::Followers,
        }
    }
}

/// Closed set of counter names in a stats block. Counter updates are
/// keyed by this enum, never by request-supplied strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatField {
    Upvotes,
    Downvotes,
    Followers,
    Comments,
}

impl StatField {
    pub fn as_str(self) -> &'static str {
        match self {
            StatField::Upvotes => "upvotes",
            StatField::Downvotes => "downvotes",
            StatField::Followers => "followers",
            StatField::Comments => "comments",
        }
    }

    /// Comments only carry vote counters; threads carry all four.
    pub fn allowed_on(self, kind: TargetKind) -> bool {
        match kind {
            TargetKind::Thread => true,
            TargetKind::Comment => {
                matches!(self, StatField::Upvotes | StatField::Downvotes)
            }
        }
    }
}

/// A single row in the interaction ledger: one user's vote or follow
/// against one target. Rows are deleted on undo and mutated in place on a
/// vote switch; there is no soft deletion here.
#[derive(Debug, Clone, PartialEq)]
pub struct Interaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub target: TargetRef,
    pub kind: InteractionKind,
    pub created_at: DateTime<Utc>,
}

// ── Creation payloads (id/timestamps assigned by the adapter) ───────────────

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewThread {
    pub author_id: Uuid,
    pub category_id: Uuid,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub thread_id: Uuid,
    pub author_id: Uuid,
    pub parent_comment_id: Option<Uuid>,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct NewInteraction {
    pub user_id: Uuid,
    pub target: TargetRef,
    pub kind: InteractionKind,
}
