//! Test support for cross-crate scenarios: a complete in-memory
//! implementation of the storage ports plus an [`AppState`] builder.
//!
//! The fake honors the same contracts the PostgreSQL adapter does: slot
//! occupancy checked atomically with the insert, counter deltas applied in
//! the same critical section as the row mutation. The ledger's
//! invariants can be exercised end-to-end, including under concurrency,
//! without a database.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use secrecy::SecretString;
use uuid::Uuid;

use configs::AuthConfig;
use domains::{
    Category, CategoryRepo, Comment, CommentRepo, CommentStats, DomainError, Interaction,
    InteractionKind, InteractionRepo, NewComment, NewInteraction, NewThread, NewUser, Result,
    Role, StatField, TargetRef, Thread, ThreadRepo, ThreadStats, User, UserRepo,
};
#[cfg(feature = "web-axum")]
use api_adapters::{AppState, CookieSettings};
#[cfg(feature = "web-axum")]
use auth_adapters::JwtSessionManager;
#[cfg(feature = "web-axum")]
use services::{InteractionService, ReputationService};

pub const TEST_JWT_SECRET: &str = "integration-test-secret";

pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: SecretString::from(TEST_JWT_SECRET),
        access_ttl_secs: 15 * 60,
        refresh_ttl_secs: 7 * 24 * 60 * 60,
        cookie_domain: "localhost".into(),
        cookie_secure: false,
    }
}

#[derive(Default)]
struct ForumState {
    users: HashMap<Uuid, User>,
    categories: HashMap<Uuid, Category>,
    threads: HashMap<Uuid, Thread>,
    comments: HashMap<Uuid, Comment>,
    interactions: HashMap<Uuid, Interaction>,
}

impl ForumState {
    /// Counter delta with the same "row must exist" semantics as the SQL
    /// aggregator. Runs under the store lock, so row and counter move
    /// together from any observer's point of view.
    fn adjust(&mut self, target: TargetRef, field: StatField, delta: i64) -> Result<()> {
        match target {
            TargetRef::Thread(id) => {
                let thread = self
                    .threads
                    .get_mut(&id)
                    .ok_or_else(|| DomainError::not_found("thread"))?;
                let mut stats =
                    ThreadStats::from_value(&thread.stats).map_err(DomainError::internal)?;
                match field {
                    StatField::Upvotes => stats.upvotes += delta,
                    StatField::Downvotes => stats.downvotes += delta,
                    StatField::Followers => stats.followers += delta,
                    StatField::Comments => stats.comments += delta,
                }
                thread.stats = stats.to_value();
            }
            TargetRef::Comment(id) => {
                let comment = self
                    .comments
                    .get_mut(&id)
                    .ok_or_else(|| DomainError::not_found("comment"))?;
                let mut stats =
                    CommentStats::from_value(&comment.stats).map_err(DomainError::internal)?;
                match field {
                    StatField::Upvotes => stats.upvotes += delta,
                    StatField::Downvotes => stats.downvotes += delta,
                    StatField::Followers | StatField::Comments => {
                        return Err(DomainError::internal("field not valid for comments"));
                    }
                }
                comment.stats = stats.to_value();
            }
        }
        Ok(())
    }
}

/// In-memory forum backend; one instance backs all five ports.
#[derive(Default)]
pub struct InMemoryForum {
    state: Mutex<ForumState>,
}

impl InMemoryForum {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, ForumState> {
        self.state.lock().expect("forum state lock poisoned")
    }

    // ── Seeding and inspection helpers ──────────────────────────────────

    pub fn seed_user(&self, username: &str, password_hash: &str, role: Role) -> User {
        let user = User {
            id: Uuid::now_v7(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            role,
            reputation: 0,
            is_banned: false,
            created_at: Utc::now(),
        };
        self.lock().users.insert(user.id, user.clone());
        user
    }

    pub fn seed_category(&self, name: &str) -> Category {
        let category = Category {
            id: Uuid::now_v7(),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        self.lock().categories.insert(category.id, category.clone());
        category
    }

    pub fn thread_stats(&self, id: Uuid) -> ThreadStats {
        let state = self.lock();
        let thread = state.threads.get(&id).expect("unknown thread");
        ThreadStats::from_value(&thread.stats).expect("unreadable thread stats")
    }

    pub fn comment_stats(&self, id: Uuid) -> CommentStats {
        let state = self.lock();
        let comment = state.comments.get(&id).expect("unknown comment");
        CommentStats::from_value(&comment.stats).expect("unreadable comment stats")
    }

    pub fn user(&self, id: Uuid) -> User {
        self.lock().users.get(&id).expect("unknown user").clone()
    }

    /// Replaces a thread's stats block with unparseable garbage, for the
    /// reputation engine's skip-and-continue path.
    pub fn corrupt_thread_stats(&self, id: Uuid) {
        let mut state = self.lock();
        let thread = state.threads.get_mut(&id).expect("unknown thread");
        thread.stats = serde_json::json!("corrupted");
    }
}

#[async_trait]
impl UserRepo for InMemoryForum {
    async fn create(&self, new_user: NewUser) -> Result<User> {
        let mut state = self.lock();
        if state.users.values().any(|u| u.username == new_user.username) {
            return Err(DomainError::conflict("username already exists"));
        }
        let user = User {
            id: Uuid::now_v7(),
            username: new_user.username,
            password_hash: new_user.password_hash,
            role: Role::User,
            reputation: 0,
            is_banned: false,
            created_at: Utc::now(),
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.lock().users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .lock()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<()> {
        self.with_user(id, |user| user.password_hash = password_hash.to_string())
    }

    async fn set_role(&self, id: Uuid, role: Role) -> Result<()> {
        self.with_user(id, |user| user.role = role)
    }

    async fn set_banned(&self, id: Uuid, banned: bool) -> Result<()> {
        self.with_user(id, |user| user.is_banned = banned)
    }

    async fn set_reputation(&self, id: Uuid, reputation: i64) -> Result<()> {
        self.with_user(id, |user| user.reputation = reputation)
    }

    async fn list_ids(&self) -> Result<Vec<Uuid>> {
        let mut users: Vec<_> = self.lock().users.values().cloned().collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users.into_iter().map(|u| u.id).collect())
    }
}

impl InMemoryForum {
    fn with_user(&self, id: Uuid, mutate: impl FnOnce(&mut User)) -> Result<()> {
        let mut state = self.lock();
        let user = state
            .users
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("user"))?;
        mutate(user);
        Ok(())
    }
}

#[async_trait]
impl ThreadRepo for InMemoryForum {
    async fn create(&self, new_thread: NewThread) -> Result<Thread> {
        let now = Utc::now();
        let thread = Thread {
            id: Uuid::now_v7(),
            author_id: new_thread.author_id,
            category_id: new_thread.category_id,
            title: new_thread.title,
            content: new_thread.content,
            stats: ThreadStats::default().to_value(),
            tags: new_thread.tags,
            created_at: now,
            updated_at: now,
            is_deleted: false,
        };
        self.lock().threads.insert(thread.id, thread.clone());
        Ok(thread)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Thread>> {
        Ok(self
            .lock()
            .threads
            .get(&id)
            .filter(|t| !t.is_deleted)
            .cloned())
    }

    async fn list_by_category(
        &self,
        category_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Thread>> {
        let mut threads: Vec<_> = self
            .lock()
            .threads
            .values()
            .filter(|t| t.category_id == category_id && !t.is_deleted)
            .cloned()
            .collect();
        threads.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(threads
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn list_by_author(&self, author_id: Uuid) -> Result<Vec<Thread>> {
        Ok(self
            .lock()
            .threads
            .values()
            .filter(|t| t.author_id == author_id && !t.is_deleted)
            .cloned()
            .collect())
    }

    async fn soft_delete(&self, id: Uuid) -> Result<()> {
        let mut state = self.lock();
        let thread = state
            .threads
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("thread"))?;
        thread.is_deleted = true;
        Ok(())
    }

    async fn soft_delete_by_author(&self, author_id: Uuid) -> Result<()> {
        let mut state = self.lock();
        for thread in state.threads.values_mut() {
            if thread.author_id == author_id {
                thread.is_deleted = true;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CommentRepo for InMemoryForum {
    async fn create_with_stats(&self, new_comment: NewComment) -> Result<Comment> {
        let now = Utc::now();
        let comment = Comment {
            id: Uuid::now_v7(),
            thread_id: new_comment.thread_id,
            author_id: new_comment.author_id,
            parent_comment_id: new_comment.parent_comment_id,
            content: new_comment.content,
            stats: CommentStats::default().to_value(),
            created_at: now,
            updated_at: now,
            is_deleted: false,
        };

        let mut state = self.lock();
        // Same unit of work as the insert: a missing thread aborts both.
        state.adjust(TargetRef::Thread(comment.thread_id), StatField::Comments, 1)?;
        state.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>> {
        Ok(self
            .lock()
            .comments
            .get(&id)
            .filter(|c| !c.is_deleted)
            .cloned())
    }

    async fn list_by_thread(
        &self,
        thread_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Comment>> {
        let mut comments: Vec<_> = self
            .lock()
            .comments
            .values()
            .filter(|c| c.thread_id == thread_id && !c.is_deleted)
            .cloned()
            .collect();
        comments.sort_by_key(|c| c.created_at);
        Ok(comments
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn list_by_author(&self, author_id: Uuid) -> Result<Vec<Comment>> {
        Ok(self
            .lock()
            .comments
            .values()
            .filter(|c| c.author_id == author_id && !c.is_deleted)
            .cloned()
            .collect())
    }

    async fn soft_delete_with_stats(&self, id: Uuid) -> Result<()> {
        let mut state = self.lock();
        let comment = state
            .comments
            .get_mut(&id)
            .filter(|c| !c.is_deleted)
            .ok_or_else(|| DomainError::not_found("comment"))?;
        comment.is_deleted = true;
        let thread_id = comment.thread_id;
        state.adjust(TargetRef::Thread(thread_id), StatField::Comments, -1)
    }

    async fn soft_delete_by_author(&self, author_id: Uuid) -> Result<()> {
        let mut state = self.lock();
        let mut retracted: Vec<Uuid> = Vec::new();
        for comment in state.comments.values_mut() {
            if comment.author_id == author_id && !comment.is_deleted {
                comment.is_deleted = true;
                retracted.push(comment.thread_id);
            }
        }
        for thread_id in retracted {
            state.adjust(TargetRef::Thread(thread_id), StatField::Comments, -1)?;
        }
        Ok(())
    }
}

#[async_trait]
impl CategoryRepo for InMemoryForum {
    async fn list(&self) -> Result<Vec<Category>> {
        let mut categories: Vec<_> = self.lock().categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn create(&self, name: &str) -> Result<Category> {
        let mut state = self.lock();
        if state.categories.values().any(|c| c.name == name) {
            return Err(DomainError::conflict("category already exists"));
        }
        let category = Category {
            id: Uuid::now_v7(),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        state.categories.insert(category.id, category.clone());
        Ok(category)
    }
}

#[async_trait]
impl InteractionRepo for InMemoryForum {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Interaction>> {
        Ok(self.lock().interactions.get(&id).cloned())
    }

    async fn list_for_target(&self, user_id: Uuid, target: TargetRef) -> Result<Vec<Interaction>> {
        let mut interactions: Vec<_> = self
            .lock()
            .interactions
            .values()
            .filter(|i| i.user_id == user_id && i.target == target)
            .cloned()
            .collect();
        interactions.sort_by_key(|i| i.created_at);
        Ok(interactions)
    }

    async fn create_with_stats(&self, new_interaction: NewInteraction) -> Result<Interaction> {
        let NewInteraction { user_id, target, kind } = new_interaction;
        let mut state = self.lock();

        let occupied = state.interactions.values().any(|i| {
            i.user_id == user_id && i.target == target && i.kind.is_vote() == kind.is_vote()
        });
        if occupied {
            return Err(DomainError::conflict(if kind.is_vote() {
                "user has already voted on this target"
            } else {
                "already following this thread"
            }));
        }

        // Counter first: a missing target rejects the insert too.
        state.adjust(target, kind.stat_field(), 1)?;

        let interaction = Interaction {
            id: Uuid::now_v7(),
            user_id,
            target,
            kind,
            created_at: Utc::now(),
        };
        state.interactions.insert(interaction.id, interaction.clone());
        Ok(interaction)
    }

    async fn remove_with_stats(&self, interaction: &Interaction) -> Result<()> {
        let mut state = self.lock();
        let matches = state
            .interactions
            .get(&interaction.id)
            .is_some_and(|i| i.kind == interaction.kind);
        if !matches {
            return Err(DomainError::not_found("interaction"));
        }
        state.interactions.remove(&interaction.id);
        state.adjust(interaction.target, interaction.kind.stat_field(), -1)
    }

    async fn switch_vote_with_stats(
        &self,
        interaction: &Interaction,
        new_kind: InteractionKind,
    ) -> Result<Interaction> {
        let mut state = self.lock();
        let row = state
            .interactions
            .get_mut(&interaction.id)
            .filter(|i| i.kind == interaction.kind)
            .ok_or_else(|| DomainError::not_found("interaction"))?;
        row.kind = new_kind;
        let switched = row.clone();
        state.adjust(interaction.target, interaction.kind.stat_field(), -1)?;
        state.adjust(interaction.target, new_kind.stat_field(), 1)?;
        Ok(switched)
    }
}

/// An [`AppState`] wired entirely to one in-memory forum.
#[cfg(feature = "web-axum")]
pub fn test_state(forum: Arc<InMemoryForum>) -> AppState {
    let users: Arc<dyn UserRepo> = forum.clone();
    let threads: Arc<dyn ThreadRepo> = forum.clone();
    let comments: Arc<dyn CommentRepo> = forum.clone();
    AppState {
        users: users.clone(),
        threads: threads.clone(),
        comments: comments.clone(),
        categories: forum.clone(),
        interactions: Arc::new(InteractionService::new(forum.clone())),
        reputation: Arc::new(ReputationService::new(users, threads, comments)),
        sessions: Arc::new(JwtSessionManager::new(&test_auth_config())),
        cookies: CookieSettings { domain: "localhost".into(), secure: false },
    }
}
