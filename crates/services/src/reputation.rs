//! # Reputation Engine
//!
//! Recomputes a user's aggregate reputation from the current counters of
//! everything they own. Scores are always re-derived in full, never patched
//! incrementally, so a missed ledger event can't cause permanent drift.

use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use domains::{CommentRepo, CommentStats, Result, ThreadRepo, ThreadStats, UserRepo};

/// Tally of one batch pass. A skipped user is logged, never fatal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub updated: usize,
    pub skipped: usize,
}

pub struct ReputationService {
    users: Arc<dyn UserRepo>,
    threads: Arc<dyn ThreadRepo>,
    comments: Arc<dyn CommentRepo>,
}

impl ReputationService {
    pub fn new(
        users: Arc<dyn UserRepo>,
        threads: Arc<dyn ThreadRepo>,
        comments: Arc<dyn CommentRepo>,
    ) -> Self {
        Self { users, threads, comments }
    }

    /// Pure function of the user's current counters:
    /// `Σ threads max(up-down, 0) + followers + comments  +  Σ comments max(up-down, 0)`.
    ///
    /// An entity whose stats block fails to parse is skipped with a warning;
    /// one corrupt row never zeroes out the rest of the account.
    pub async fn compute(&self, user_id: Uuid) -> Result<i64> {
        let mut total = 0i64;

        for thread in self.threads.list_by_author(user_id).await? {
            match ThreadStats::from_value(&thread.stats) {
                Ok(stats) => total += stats.reputation(),
                Err(err) => {
                    warn!(thread_id = %thread.id, error = %err, "skipping unreadable thread stats");
                }
            }
        }

        for comment in self.comments.list_by_author(user_id).await? {
            match CommentStats::from_value(&comment.stats) {
                Ok(stats) => total += stats.reputation(),
                Err(err) => {
                    warn!(comment_id = %comment.id, error = %err, "skipping unreadable comment stats");
                }
            }
        }

        Ok(total)
    }

    /// Computes and persists the score onto the user record.
    pub async fn assign(&self, user_id: Uuid) -> Result<i64> {
        let reputation = self.compute(user_id).await?;
        self.users.set_reputation(user_id, reputation).await?;
        Ok(reputation)
    }

    /// One full pass over every account. Runs at startup and on the daily
    /// schedule; reads counters only, so it never blocks live ledger
    /// traffic. A per-user failure is captured and the loop proceeds;
    /// only failing to enumerate users at all fails the run.
    pub async fn run_batch(&self) -> Result<BatchOutcome> {
        let user_ids = self.users.list_ids().await?;

        let mut outcome = BatchOutcome::default();
        for user_id in user_ids {
            match self.assign(user_id).await {
                Ok(_) => outcome.updated += 1,
                Err(err) => {
                    outcome.skipped += 1;
                    warn!(%user_id, error = %err, "reputation refresh failed for user");
                }
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domains::{
        Comment, DomainError, MockCommentRepo, MockThreadRepo, MockUserRepo, Thread,
    };
    use mockall::predicate::eq;

    fn thread_with_stats(author_id: Uuid, stats: serde_json::Value) -> Thread {
        Thread {
            id: Uuid::now_v7(),
            author_id,
            category_id: Uuid::now_v7(),
            title: "t".into(),
            content: "c".into(),
            stats,
            tags: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
            is_deleted: false,
        }
    }

    fn comment_with_stats(author_id: Uuid, stats: serde_json::Value) -> Comment {
        Comment {
            id: Uuid::now_v7(),
            thread_id: Uuid::now_v7(),
            author_id,
            parent_comment_id: None,
            content: "c".into(),
            stats,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            is_deleted: false,
        }
    }

    fn service_for(
        threads: Vec<Thread>,
        comments: Vec<Comment>,
    ) -> (ReputationService, Uuid) {
        let user_id = Uuid::now_v7();

        let users = MockUserRepo::new();
        let mut thread_repo = MockThreadRepo::new();
        thread_repo
            .expect_list_by_author()
            .with(eq(user_id))
            .returning(move |_| Ok(threads.clone()));
        let mut comment_repo = MockCommentRepo::new();
        comment_repo
            .expect_list_by_author()
            .with(eq(user_id))
            .returning(move |_| Ok(comments.clone()));

        (
            ReputationService::new(
                Arc::new(users),
                Arc::new(thread_repo),
                Arc::new(comment_repo),
            ),
            user_id,
        )
    }

    #[tokio::test]
    async fn compute_sums_thread_and_comment_contributions() {
        let author = Uuid::now_v7();
        let threads = vec![thread_with_stats(
            author,
            serde_json::json!({ "upvotes": 5, "downvotes": 2, "followers": 3, "comments": 4 }),
        )];
        let comments = vec![comment_with_stats(
            author,
            serde_json::json!({ "upvotes": 4, "downvotes": 1 }),
        )];

        let (service, user_id) = service_for(threads, comments);
        // (5-2)+3+4 = 10 from the thread, (4-1) = 3 from the comment.
        assert_eq!(service.compute(user_id).await.unwrap(), 13);
    }

    #[tokio::test]
    async fn compute_is_idempotent_over_unchanged_counters() {
        let author = Uuid::now_v7();
        let threads = vec![thread_with_stats(
            author,
            serde_json::json!({ "upvotes": 1, "downvotes": 9, "followers": 2, "comments": 0 }),
        )];

        let (service, user_id) = service_for(threads, vec![]);
        let first = service.compute(user_id).await.unwrap();
        let second = service.compute(user_id).await.unwrap();
        assert_eq!(first, 2); // net votes floored at zero, followers still count
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn corrupt_stats_block_is_skipped_not_fatal() {
        let author = Uuid::now_v7();
        let threads = vec![
            thread_with_stats(author, serde_json::json!("garbage")),
            thread_with_stats(
                author,
                serde_json::json!({ "upvotes": 2, "downvotes": 0, "followers": 1, "comments": 0 }),
            ),
        ];

        let (service, user_id) = service_for(threads, vec![]);
        assert_eq!(service.compute(user_id).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn assign_persists_the_computed_score() {
        let author = Uuid::now_v7();

        let mut users = MockUserRepo::new();
        users
            .expect_set_reputation()
            .withf(|_, reputation| *reputation == 7)
            .times(1)
            .returning(|_, _| Ok(()));
        let mut thread_repo = MockThreadRepo::new();
        thread_repo.expect_list_by_author().returning(move |_| {
            Ok(vec![thread_with_stats(
                author,
                serde_json::json!({ "upvotes": 7, "downvotes": 0, "followers": 0, "comments": 0 }),
            )])
        });
        let mut comment_repo = MockCommentRepo::new();
        comment_repo.expect_list_by_author().returning(|_| Ok(vec![]));

        let service = ReputationService::new(
            Arc::new(users),
            Arc::new(thread_repo),
            Arc::new(comment_repo),
        );
        assert_eq!(service.assign(author).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn batch_continues_past_a_poisoned_user() {
        let healthy = Uuid::now_v7();
        let poisoned = Uuid::now_v7();

        let mut users = MockUserRepo::new();
        users
            .expect_list_ids()
            .returning(move || Ok(vec![poisoned, healthy]));
        users
            .expect_set_reputation()
            .with(eq(healthy), eq(0))
            .times(1)
            .returning(|_, _| Ok(()));

        let mut thread_repo = MockThreadRepo::new();
        thread_repo
            .expect_list_by_author()
            .with(eq(poisoned))
            .returning(|_| Err(DomainError::internal("relation lost")));
        thread_repo
            .expect_list_by_author()
            .with(eq(healthy))
            .returning(|_| Ok(vec![]));
        let mut comment_repo = MockCommentRepo::new();
        comment_repo.expect_list_by_author().returning(|_| Ok(vec![]));

        let service = ReputationService::new(
            Arc::new(users),
            Arc::new(thread_repo),
            Arc::new(comment_repo),
        );
        let outcome = service.run_batch().await.unwrap();
        assert_eq!(outcome, BatchOutcome { updated: 1, skipped: 1 });
    }

    #[tokio::test]
    async fn batch_fails_only_when_users_cannot_be_enumerated() {
        let mut users = MockUserRepo::new();
        users
            .expect_list_ids()
            .returning(|| Err(DomainError::internal("connection refused")));

        let service = ReputationService::new(
            Arc::new(users),
            Arc::new(MockThreadRepo::new()),
            Arc::new(MockCommentRepo::new()),
        );
        assert!(service.run_batch().await.is_err());
    }
}
