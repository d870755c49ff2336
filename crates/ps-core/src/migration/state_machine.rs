//! Migration state machine.
//!
//! Defines a pure state transition function for reconciling anonymous work
//! with a freshly authenticated account.

use serde::{Deserialize, Serialize};

use super::ledger::{MigrationLedger, PayloadFingerprint};
use super::pending::PendingMigration;
use crate::ids::{ProjectId, UserId};

/// Where promoted anonymous work should land.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MigrationTarget {
    /// Create a new project (subject to the project quota).
    NewProject { title: String },
    /// Overwrite the sections of an existing project.
    Existing(ProjectId),
}

/// Migration flow state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MigrationState {
    /// Nothing to reconcile.
    Idle,
    /// Anonymous work found for a newly signed-in user.
    Detected {
        user_id: UserId,
        pending: PendingMigration,
    },
    /// The offer is visible to the user.
    Offered {
        user_id: UserId,
        pending: PendingMigration,
        /// Reason the previous promotion attempt failed, if any.
        error: Option<String>,
    },
    /// Media promotion and remote write in flight.
    Promoting {
        user_id: UserId,
        pending: PendingMigration,
        target: MigrationTarget,
    },
    Promoted {
        project_id: ProjectId,
        promoted_media: usize,
        failed_media: usize,
    },
    Discarded,
    Deferred,
}

impl MigrationState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            MigrationState::Promoted { .. } | MigrationState::Discarded | MigrationState::Deferred
        )
    }

    pub fn pending(&self) -> Option<&PendingMigration> {
        match self {
            MigrationState::Detected { pending, .. }
            | MigrationState::Offered { pending, .. }
            | MigrationState::Promoting { pending, .. } => Some(pending),
            _ => None,
        }
    }
}

/// Events that drive the migration flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MigrationEvent {
    /// A user signed in; `pending` summarises the anonymous namespace.
    Authenticated {
        user_id: UserId,
        pending: Option<PendingMigration>,
    },
    /// The UI has shown the offer.
    OfferPresented,
    PromoteRequested { target: MigrationTarget },
    PromotionSucceeded {
        project_id: ProjectId,
        promoted_media: usize,
        failed_media: usize,
    },
    PromotionFailed { error: String },
    DiscardRequested,
    DeferRequested,
    /// The editor session is being torn down.
    SessionEnded,
    SignedOut,
}

/// Side effects produced by state transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MigrationAction {
    PresentOffer { pending: PendingMigration },
    PromoteAnonymousWork {
        user_id: UserId,
        target: MigrationTarget,
    },
    ClearAnonymousData,
    ResetEditor,
    RecordSettled { fingerprint: PayloadFingerprint },
}

/// Pure migration state machine.
pub struct MigrationStateMachine;

impl MigrationStateMachine {
    pub fn transition(
        state: MigrationState,
        event: MigrationEvent,
        ledger: &MigrationLedger,
    ) -> (MigrationState, Vec<MigrationAction>) {
        match (state, event) {
            (state, MigrationEvent::Authenticated { user_id, pending })
                if Self::accepts_detection(&state) =>
            {
                match pending {
                    Some(pending)
                        if !pending.is_empty() && !ledger.contains(&pending.fingerprint) =>
                    {
                        (
                            MigrationState::Detected {
                                user_id,
                                pending: pending.clone(),
                            },
                            vec![MigrationAction::PresentOffer { pending }],
                        )
                    }
                    _ => (MigrationState::Idle, Vec::new()),
                }
            }
            (MigrationState::Detected { user_id, pending }, MigrationEvent::OfferPresented) => (
                MigrationState::Offered {
                    user_id,
                    pending,
                    error: None,
                },
                Vec::new(),
            ),
            (
                MigrationState::Offered {
                    user_id, pending, ..
                },
                MigrationEvent::PromoteRequested { target },
            ) => (
                MigrationState::Promoting {
                    user_id: user_id.clone(),
                    pending,
                    target: target.clone(),
                },
                vec![MigrationAction::PromoteAnonymousWork { user_id, target }],
            ),
            (
                MigrationState::Promoting { pending, .. },
                MigrationEvent::PromotionSucceeded {
                    project_id,
                    promoted_media,
                    failed_media,
                },
            ) => (
                MigrationState::Promoted {
                    project_id,
                    promoted_media,
                    failed_media,
                },
                vec![
                    MigrationAction::ClearAnonymousData,
                    MigrationAction::RecordSettled {
                        fingerprint: pending.fingerprint,
                    },
                ],
            ),
            (
                MigrationState::Promoting {
                    user_id, pending, ..
                },
                MigrationEvent::PromotionFailed { error },
            ) => (
                MigrationState::Offered {
                    user_id,
                    pending,
                    error: Some(error),
                },
                Vec::new(),
            ),
            (MigrationState::Offered { pending, .. }, MigrationEvent::DiscardRequested) => (
                MigrationState::Discarded,
                vec![
                    MigrationAction::ClearAnonymousData,
                    MigrationAction::ResetEditor,
                    MigrationAction::RecordSettled {
                        fingerprint: pending.fingerprint,
                    },
                ],
            ),
            (MigrationState::Offered { pending, .. }, MigrationEvent::DeferRequested) => (
                MigrationState::Deferred,
                vec![MigrationAction::RecordSettled {
                    fingerprint: pending.fingerprint,
                }],
            ),
            // An open offer is abandoned without touching storage.
            (
                MigrationState::Detected { .. } | MigrationState::Offered { .. },
                MigrationEvent::SessionEnded | MigrationEvent::SignedOut,
            ) => (MigrationState::Idle, Vec::new()),
            (state, MigrationEvent::SessionEnded | MigrationEvent::SignedOut)
                if state.is_terminal() =>
            {
                (MigrationState::Idle, Vec::new())
            }
            (state, event) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(?state, ?event, "migration event ignored in current state");
                #[cfg(not(feature = "tracing"))]
                let _ = event;
                (state, Vec::new())
            }
        }
    }

    fn accepts_detection(state: &MigrationState) -> bool {
        matches!(state, MigrationState::Idle) || state.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(fp: u64, sections: usize) -> PendingMigration {
        PendingMigration {
            section_count: sections,
            media_count: 0,
            fingerprint: PayloadFingerprint(fp),
        }
    }

    fn offered(fp: u64) -> MigrationState {
        MigrationState::Offered {
            user_id: UserId::from("u-1"),
            pending: pending(fp, 2),
            error: None,
        }
    }

    fn authenticated(p: Option<PendingMigration>) -> MigrationEvent {
        MigrationEvent::Authenticated {
            user_id: UserId::from("u-1"),
            pending: p,
        }
    }

    #[test]
    fn authenticated_with_work_detects_and_presents_offer() {
        let (state, actions) = MigrationStateMachine::transition(
            MigrationState::Idle,
            authenticated(Some(pending(1, 2))),
            &MigrationLedger::new(),
        );
        assert!(matches!(state, MigrationState::Detected { .. }));
        assert_eq!(
            actions,
            vec![MigrationAction::PresentOffer {
                pending: pending(1, 2)
            }]
        );

        let (state, actions) = MigrationStateMachine::transition(
            state,
            MigrationEvent::OfferPresented,
            &MigrationLedger::new(),
        );
        assert_eq!(state, offered(1));
        assert!(actions.is_empty());
    }

    #[test]
    fn empty_or_missing_payload_stays_idle() {
        let ledger = MigrationLedger::new();
        let (state, actions) =
            MigrationStateMachine::transition(MigrationState::Idle, authenticated(None), &ledger);
        assert_eq!(state, MigrationState::Idle);
        assert!(actions.is_empty());

        let (state, _) = MigrationStateMachine::transition(
            MigrationState::Idle,
            authenticated(Some(pending(1, 0))),
            &ledger,
        );
        assert_eq!(state, MigrationState::Idle);
    }

    #[test]
    fn settled_payload_is_not_offered_again() {
        let mut ledger = MigrationLedger::new();
        ledger.record(PayloadFingerprint(9));
        let (state, actions) = MigrationStateMachine::transition(
            MigrationState::Deferred,
            authenticated(Some(pending(9, 1))),
            &ledger,
        );
        assert_eq!(state, MigrationState::Idle);
        assert!(actions.is_empty());
    }

    #[test]
    fn promote_then_success_clears_and_records() {
        let ledger = MigrationLedger::new();
        let target = MigrationTarget::NewProject {
            title: "Imported".into(),
        };
        let (state, actions) = MigrationStateMachine::transition(
            offered(3),
            MigrationEvent::PromoteRequested {
                target: target.clone(),
            },
            &ledger,
        );
        assert!(matches!(state, MigrationState::Promoting { .. }));
        assert_eq!(
            actions,
            vec![MigrationAction::PromoteAnonymousWork {
                user_id: UserId::from("u-1"),
                target
            }]
        );

        let (state, actions) = MigrationStateMachine::transition(
            state,
            MigrationEvent::PromotionSucceeded {
                project_id: ProjectId::from("p-1"),
                promoted_media: 2,
                failed_media: 1,
            },
            &ledger,
        );
        assert_eq!(
            state,
            MigrationState::Promoted {
                project_id: ProjectId::from("p-1"),
                promoted_media: 2,
                failed_media: 1,
            }
        );
        assert_eq!(
            actions,
            vec![
                MigrationAction::ClearAnonymousData,
                MigrationAction::RecordSettled {
                    fingerprint: PayloadFingerprint(3)
                },
            ]
        );
    }

    #[test]
    fn promotion_failure_returns_to_offer_with_error() {
        let ledger = MigrationLedger::new();
        let (state, _) = MigrationStateMachine::transition(
            offered(4),
            MigrationEvent::PromoteRequested {
                target: MigrationTarget::Existing(ProjectId::from("p-9")),
            },
            &ledger,
        );
        let (state, actions) = MigrationStateMachine::transition(
            state,
            MigrationEvent::PromotionFailed {
                error: "project limit of 3 reached".into(),
            },
            &ledger,
        );
        assert!(actions.is_empty());
        assert!(matches!(
            state,
            MigrationState::Offered { error: Some(ref e), .. } if e.contains("limit")
        ));
    }

    #[test]
    fn discard_clears_storage_and_resets_editor() {
        let (state, actions) = MigrationStateMachine::transition(
            offered(5),
            MigrationEvent::DiscardRequested,
            &MigrationLedger::new(),
        );
        assert_eq!(state, MigrationState::Discarded);
        assert_eq!(
            actions,
            vec![
                MigrationAction::ClearAnonymousData,
                MigrationAction::ResetEditor,
                MigrationAction::RecordSettled {
                    fingerprint: PayloadFingerprint(5)
                },
            ]
        );
    }

    #[test]
    fn defer_only_records_settlement() {
        let (state, actions) = MigrationStateMachine::transition(
            offered(6),
            MigrationEvent::DeferRequested,
            &MigrationLedger::new(),
        );
        assert_eq!(state, MigrationState::Deferred);
        assert_eq!(
            actions,
            vec![MigrationAction::RecordSettled {
                fingerprint: PayloadFingerprint(6)
            }]
        );
    }

    #[test]
    fn session_end_abandons_open_offer_without_side_effects() {
        let ledger = MigrationLedger::new();
        for event in [MigrationEvent::SessionEnded, MigrationEvent::SignedOut] {
            let (state, actions) =
                MigrationStateMachine::transition(offered(7), event, &ledger);
            assert_eq!(state, MigrationState::Idle);
            assert!(actions.is_empty());
        }
    }

    #[test]
    fn unrelated_events_are_ignored() {
        let ledger = MigrationLedger::new();
        let (state, actions) = MigrationStateMachine::transition(
            MigrationState::Idle,
            MigrationEvent::DiscardRequested,
            &ledger,
        );
        assert_eq!(state, MigrationState::Idle);
        assert!(actions.is_empty());

        // A repeated sign-in signal must not replace an open offer.
        let (state, actions) = MigrationStateMachine::transition(
            offered(8),
            authenticated(Some(pending(99, 1))),
            &ledger,
        );
        assert_eq!(state, offered(8));
        assert!(actions.is_empty());
    }
}
