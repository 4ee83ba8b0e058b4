//! # Core Ports
//!
//! Storage contracts implemented by the adapter crates. Any backend must
//! implement these traits to be wired into the binary.
//!
//! The interaction port is deliberately coarse: each ledger transition is a
//! single method so an adapter can run the row mutation and its counter
//! delta inside one transaction. A port split into `insert` + `adjust`
//! would make that atomicity impossible to guarantee from the service side.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    Category, Comment, Interaction, InteractionKind, NewComment, NewInteraction, NewThread,
    NewUser, Role, TargetRef, Thread, User,
};

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Inserts a new account. Returns `Conflict` when the username is taken.
    async fn create(&self, new_user: NewUser) -> Result<User>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<()>;
    async fn set_role(&self, id: Uuid, role: Role) -> Result<()>;
    async fn set_banned(&self, id: Uuid, banned: bool) -> Result<()>;
    /// Writes the derived reputation score. Only the reputation engine calls this.
    async fn set_reputation(&self, id: Uuid, reputation: i64) -> Result<()>;
    async fn list_ids(&self) -> Result<Vec<Uuid>>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ThreadRepo: Send + Sync {
    async fn create(&self, new_thread: NewThread) -> Result<Thread>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Thread>>;
    async fn list_by_category(
        &self,
        category_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Thread>>;
    /// All live threads owned by a user, with their current stats blocks.
    async fn list_by_author(&self, author_id: Uuid) -> Result<Vec<Thread>>;
    async fn soft_delete(&self, id: Uuid) -> Result<()>;
    async fn soft_delete_by_author(&self, author_id: Uuid) -> Result<()>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CommentRepo: Send + Sync {
    /// Inserts the comment and increments the owning thread's `comments`
    /// counter in the same transaction.
    async fn create_with_stats(&self, new_comment: NewComment) -> Result<Comment>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>>;
    async fn list_by_thread(&self, thread_id: Uuid, limit: i64, offset: i64)
        -> Result<Vec<Comment>>;
    async fn list_by_author(&self, author_id: Uuid) -> Result<Vec<Comment>>;
    /// Soft-deletes the comment and decrements the owning thread's
    /// `comments` counter in the same transaction.
    async fn soft_delete_with_stats(&self, id: Uuid) -> Result<()>;
    async fn soft_delete_by_author(&self, author_id: Uuid) -> Result<()>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CategoryRepo: Send + Sync {
    async fn list(&self) -> Result<Vec<Category>>;
    /// Returns `Conflict` when the name already exists.
    async fn create(&self, name: &str) -> Result<Category>;
}

/// The interaction ledger's storage contract.
///
/// Each `*_with_stats` method is one atomic unit of work: the interaction
/// row and the target's counter must never be observably inconsistent.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait InteractionRepo: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Interaction>>;
    /// A user's live interactions against one target (at most one vote and
    /// one follow).
    async fn list_for_target(&self, user_id: Uuid, target: TargetRef)
        -> Result<Vec<Interaction>>;
    /// Inserts the row and applies `+1` to the matching counter. Returns
    /// `Conflict` when the vote or follow slot is already occupied; the
    /// occupancy check runs inside the same transaction as the insert.
    async fn create_with_stats(&self, new_interaction: NewInteraction) -> Result<Interaction>;
    /// Deletes the row and applies `-1` to the matching counter.
    async fn remove_with_stats(&self, interaction: &Interaction) -> Result<()>;
    /// Mutates the row's kind in place and moves one unit between the two
    /// vote counters. Callers must pass a vote-kind row and a vote kind.
    async fn switch_vote_with_stats(
        &self,
        interaction: &Interaction,
        new_kind: InteractionKind,
    ) -> Result<Interaction>;
}
