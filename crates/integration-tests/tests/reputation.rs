//! Reputation recomputation through the full stack: votes land in the
//! ledger, counters move, the batch derives scores from them.

use std::sync::Arc;

use domains::{CommentRepo, InteractionKind, NewComment, NewThread, Role, TargetRef, ThreadRepo};
use integration_tests::InMemoryForum;
use services::{BatchOutcome, InteractionService, ReputationService};

fn reputation_service(forum: &Arc<InMemoryForum>) -> ReputationService {
    ReputationService::new(forum.clone(), forum.clone(), forum.clone())
}

#[tokio::test]
async fn batch_derives_scores_from_live_counters() {
    let forum = InMemoryForum::new();
    let ledger = InteractionService::new(forum.clone());
    let reputation = reputation_service(&forum);

    let author = forum.seed_user("author", "", Role::User);
    let commenter = forum.seed_user("commenter", "", Role::User);
    let category = forum.seed_category("general");

    let thread = ThreadRepo::create(
        &*forum,
        NewThread {
            author_id: author.id,
            category_id: category.id,
            title: "derivations".into(),
            content: "content".into(),
            tags: vec![],
        },
    )
    .await
    .unwrap();

    // Shape the counters: 5 up, 2 down, 3 followers, 4 comments.
    for i in 0..5 {
        let voter = forum.seed_user(&format!("up-{i}"), "", Role::User);
        ledger
            .create(voter.id, TargetRef::Thread(thread.id), InteractionKind::Upvote)
            .await
            .unwrap();
    }
    for i in 0..2 {
        let voter = forum.seed_user(&format!("down-{i}"), "", Role::User);
        ledger
            .create(voter.id, TargetRef::Thread(thread.id), InteractionKind::Downvote)
            .await
            .unwrap();
    }
    for i in 0..3 {
        let follower = forum.seed_user(&format!("follow-{i}"), "", Role::User);
        ledger
            .create(follower.id, TargetRef::Thread(thread.id), InteractionKind::Follow)
            .await
            .unwrap();
    }
    let mut comment_id = None;
    for _ in 0..4 {
        let comment = forum
            .create_with_stats(NewComment {
                thread_id: thread.id,
                author_id: commenter.id,
                parent_comment_id: None,
                content: "reply".into(),
            })
            .await
            .unwrap();
        comment_id = Some(comment.id);
    }

    // The commenter's last comment picks up a couple of votes too.
    let comment_target = TargetRef::Comment(comment_id.unwrap());
    for i in 0..2 {
        let voter = forum.seed_user(&format!("cup-{i}"), "", Role::User);
        ledger
            .create(voter.id, comment_target, InteractionKind::Upvote)
            .await
            .unwrap();
    }

    reputation.run_batch().await.unwrap();

    // (5-2) + 3 + 4 = 10 for the thread author.
    assert_eq!(forum.user(author.id).reputation, 10);
    // max(2-0, 0) = 2 across the commenter's comments.
    assert_eq!(forum.user(commenter.id).reputation, 2);
}

#[tokio::test]
async fn recomputation_is_idempotent_and_corruption_is_contained() {
    let forum = InMemoryForum::new();
    let ledger = InteractionService::new(forum.clone());
    let reputation = reputation_service(&forum);

    let author = forum.seed_user("author", "", Role::User);
    let category = forum.seed_category("general");

    let healthy = ThreadRepo::create(
        &*forum,
        NewThread {
            author_id: author.id,
            category_id: category.id,
            title: "healthy".into(),
            content: "content".into(),
            tags: vec![],
        },
    )
    .await
    .unwrap();
    let doomed = ThreadRepo::create(
        &*forum,
        NewThread {
            author_id: author.id,
            category_id: category.id,
            title: "doomed".into(),
            content: "content".into(),
            tags: vec![],
        },
    )
    .await
    .unwrap();

    let voter = forum.seed_user("voter", "", Role::User);
    ledger
        .create(voter.id, TargetRef::Thread(healthy.id), InteractionKind::Upvote)
        .await
        .unwrap();
    forum.corrupt_thread_stats(doomed.id);

    // The corrupt block is skipped, the healthy thread still counts, and
    // the batch reports full success (entity-level skips are not user
    // failures).
    let outcome = reputation.run_batch().await.unwrap();
    assert_eq!(outcome, BatchOutcome { updated: 2, skipped: 0 });
    assert_eq!(forum.user(author.id).reputation, 1);

    // Unchanged counters, unchanged score.
    reputation.run_batch().await.unwrap();
    assert_eq!(forum.user(author.id).reputation, 1);
}
