//! # Interaction Ledger
//!
//! Business rules for the vote/follow ledger. The service validates intent
//! and drives the state machine; every transition it commits goes through a
//! single atomic port operation, so the interaction row and the target's
//! counter move together or not at all.

use std::sync::Arc;

use uuid::Uuid;

use domains::{
    DomainError, Interaction, InteractionKind, InteractionRepo, NewInteraction, Result, TargetKind,
    TargetRef,
};

/// Outcome of [`InteractionService::update`]: resubmitting the held kind
/// empties the slot, a vote of the opposite kind switches in place.
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionUpdate {
    Removed,
    Switched(Interaction),
}

pub struct InteractionService {
    interactions: Arc<dyn InteractionRepo>,
}

impl InteractionService {
    pub fn new(interactions: Arc<dyn InteractionRepo>) -> Self {
        Self { interactions }
    }

    /// Records a new vote or follow.
    ///
    /// An occupied slot is a `Conflict`; creation never implicitly
    /// switches a vote; that transition is only reachable through
    /// [`InteractionService::update`].
    pub async fn create(
        &self,
        user_id: Uuid,
        target: TargetRef,
        kind: InteractionKind,
    ) -> Result<Interaction> {
        if kind == InteractionKind::Follow && target.kind() == TargetKind::Comment {
            return Err(DomainError::validation(
                "follow interaction is not allowed for comments",
            ));
        }

        // Slot occupancy is checked by the adapter inside the same
        // transaction as the insert; a pre-check here would race.
        self.interactions
            .create_with_stats(NewInteraction { user_id, target, kind })
            .await
    }

    /// The toggle/switch state machine over an existing ledger row.
    ///
    /// | existing | requested      | action                      |
    /// |----------|----------------|-----------------------------|
    /// | X        | X (same)       | remove, counter -1          |
    /// | upvote   | downvote       | switch in place, -1/+1      |
    /// | downvote | upvote         | switch in place, -1/+1      |
    /// | vote     | follow (or v.v.)| rejected, independent slots |
    pub async fn update(
        &self,
        user_id: Uuid,
        interaction_id: Uuid,
        requested: InteractionKind,
    ) -> Result<InteractionUpdate> {
        let existing = self
            .interactions
            .find_by_id(interaction_id)
            .await?
            .ok_or_else(|| DomainError::not_found("interaction"))?;

        if existing.user_id != user_id {
            return Err(DomainError::forbidden(
                "only the interaction's owner may change it",
            ));
        }

        if existing.kind == requested {
            self.interactions.remove_with_stats(&existing).await?;
            return Ok(InteractionUpdate::Removed);
        }

        if existing.kind.is_vote() && requested.is_vote() {
            let switched = self
                .interactions
                .switch_vote_with_stats(&existing, requested)
                .await?;
            return Ok(InteractionUpdate::Switched(switched));
        }

        // One side is a follow: the follow slot and the vote slot are
        // independent and never convert into each other.
        Err(DomainError::validation(
            "cannot change between a vote and a follow",
        ))
    }

    /// A user's live interactions against one target, for rendering the
    /// current vote/follow state.
    pub async fn list(&self, user_id: Uuid, target: TargetRef) -> Result<Vec<Interaction>> {
        self.interactions.list_for_target(user_id, target).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domains::MockInteractionRepo;
    use mockall::predicate::eq;

    fn ledger_row(user_id: Uuid, target: TargetRef, kind: InteractionKind) -> Interaction {
        Interaction {
            id: Uuid::now_v7(),
            user_id,
            target,
            kind,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn create_rejects_follow_on_comment() {
        let repo = MockInteractionRepo::new();
        let service = InteractionService::new(Arc::new(repo));

        let err = service
            .create(
                Uuid::now_v7(),
                TargetRef::Comment(Uuid::now_v7()),
                InteractionKind::Follow,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn create_delegates_to_atomic_insert() {
        let user_id = Uuid::now_v7();
        let target = TargetRef::Thread(Uuid::now_v7());

        let mut repo = MockInteractionRepo::new();
        repo.expect_create_with_stats()
            .withf(move |n| {
                n.user_id == user_id && n.target == target && n.kind == InteractionKind::Upvote
            })
            .times(1)
            .returning(move |n| {
                Ok(Interaction {
                    id: Uuid::now_v7(),
                    user_id: n.user_id,
                    target: n.target,
                    kind: n.kind,
                    created_at: Utc::now(),
                })
            });

        let service = InteractionService::new(Arc::new(repo));
        let created = service
            .create(user_id, target, InteractionKind::Upvote)
            .await
            .unwrap();
        assert_eq!(created.kind, InteractionKind::Upvote);
    }

    #[tokio::test]
    async fn create_surfaces_occupied_slot_as_conflict() {
        let mut repo = MockInteractionRepo::new();
        repo.expect_create_with_stats()
            .returning(|_| Err(DomainError::conflict("vote slot already occupied")));

        let service = InteractionService::new(Arc::new(repo));
        let err = service
            .create(
                Uuid::now_v7(),
                TargetRef::Thread(Uuid::now_v7()),
                InteractionKind::Downvote,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn resubmitting_same_kind_removes_the_row() {
        let user_id = Uuid::now_v7();
        let existing = ledger_row(
            user_id,
            TargetRef::Thread(Uuid::now_v7()),
            InteractionKind::Upvote,
        );
        let existing_id = existing.id;

        let mut repo = MockInteractionRepo::new();
        let found = existing.clone();
        repo.expect_find_by_id()
            .with(eq(existing_id))
            .returning(move |_| Ok(Some(found.clone())));
        repo.expect_remove_with_stats()
            .withf(move |i| i.id == existing_id)
            .times(1)
            .returning(|_| Ok(()));

        let service = InteractionService::new(Arc::new(repo));
        let outcome = service
            .update(user_id, existing_id, InteractionKind::Upvote)
            .await
            .unwrap();
        assert_eq!(outcome, InteractionUpdate::Removed);
    }

    #[tokio::test]
    async fn unfollow_goes_through_removal() {
        let user_id = Uuid::now_v7();
        let existing = ledger_row(
            user_id,
            TargetRef::Thread(Uuid::now_v7()),
            InteractionKind::Follow,
        );
        let existing_id = existing.id;

        let mut repo = MockInteractionRepo::new();
        let found = existing.clone();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(found.clone())));
        repo.expect_remove_with_stats().times(1).returning(|_| Ok(()));

        let service = InteractionService::new(Arc::new(repo));
        let outcome = service
            .update(user_id, existing_id, InteractionKind::Follow)
            .await
            .unwrap();
        assert_eq!(outcome, InteractionUpdate::Removed);
    }

    #[tokio::test]
    async fn opposite_vote_switches_in_place() {
        let user_id = Uuid::now_v7();
        let existing = ledger_row(
            user_id,
            TargetRef::Comment(Uuid::now_v7()),
            InteractionKind::Upvote,
        );
        let existing_id = existing.id;

        let mut repo = MockInteractionRepo::new();
        let found = existing.clone();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(found.clone())));
        repo.expect_switch_vote_with_stats()
            .withf(move |i, k| i.id == existing_id && *k == InteractionKind::Downvote)
            .times(1)
            .returning(|i, k| {
                let mut switched = i.clone();
                switched.kind = k;
                Ok(switched)
            });

        let service = InteractionService::new(Arc::new(repo));
        let outcome = service
            .update(user_id, existing_id, InteractionKind::Downvote)
            .await
            .unwrap();
        match outcome {
            InteractionUpdate::Switched(i) => assert_eq!(i.kind, InteractionKind::Downvote),
            other => panic!("expected switch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn vote_and_follow_slots_never_convert() {
        let user_id = Uuid::now_v7();
        let existing = ledger_row(
            user_id,
            TargetRef::Thread(Uuid::now_v7()),
            InteractionKind::Upvote,
        );
        let existing_id = existing.id;

        let mut repo = MockInteractionRepo::new();
        let found = existing.clone();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(found.clone())));
        // No removal, no switch: the request dies in validation.

        let service = InteractionService::new(Arc::new(repo));
        let err = service
            .update(user_id, existing_id, InteractionKind::Follow)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn only_the_owner_may_mutate() {
        let owner = Uuid::now_v7();
        let stranger = Uuid::now_v7();
        let existing = ledger_row(
            owner,
            TargetRef::Thread(Uuid::now_v7()),
            InteractionKind::Upvote,
        );
        let existing_id = existing.id;

        let mut repo = MockInteractionRepo::new();
        let found = existing.clone();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(found.clone())));

        let service = InteractionService::new(Arc::new(repo));
        let err = service
            .update(stranger, existing_id, InteractionKind::Upvote)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }

    #[tokio::test]
    async fn unknown_interaction_id_is_not_found() {
        let mut repo = MockInteractionRepo::new();
        repo.expect_find_by_id().returning(|_| Ok(None));

        let service = InteractionService::new(Arc::new(repo));
        let err = service
            .update(Uuid::now_v7(), Uuid::now_v7(), InteractionKind::Upvote)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
    }
}
