// Copyright 2024 Gatehouse Project
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! End-to-end behaviour of the decision engine over in-memory stores.

use chrono::NaiveTime;
use gatehouse_core::store::DEFAULT_EVENT_LIMIT;
use gatehouse_core::test_utils::{at_distance, enrollment, template, TestHarness};
use gatehouse_core::{
    AccessLogger, AccessStatus, ContactDetails, Decision, DenialReason, EngineConfig,
    GatehouseError, IdentityId, TemplateStore, TimeRestrictedLogging,
};
use proptest::prelude::*;

const DIM: usize = 128;

fn harness_at(hour: u32, minute: u32) -> TestHarness {
    TestHarness::new(EngineConfig::default(), hour, minute).unwrap()
}

#[tokio::test]
async fn unrecognized_probe_is_denied_and_logged_once_without_identity() {
    let h = harness_at(10, 15);
    for seed in 1..=3 {
        h.engine
            .enroll(enrollment(
                &format!("E{seed}"),
                "Someone",
                template(DIM, seed),
                "00:00",
                "23:59",
            ))
            .await
            .unwrap();
    }

    let probe = template(DIM, 99);
    let decision = h.engine.decide(Some(&probe)).await;

    assert_eq!(decision, Decision::denied(DenialReason::NotRecognized));
    let events = h.log.list_events(DEFAULT_EVENT_LIMIT).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].identity_id, None);
    assert_eq!(events[0].status, AccessStatus::Denied);
    assert_eq!(events[0].reason, "face not recognized");
}

#[tokio::test]
async fn matching_probe_inside_window_is_granted() {
    let h = harness_at(9, 0);
    let a = template(DIM, 1);
    h.engine
        .enroll(enrollment("A", "Alice", a.clone(), "08:00", "18:00"))
        .await
        .unwrap();

    let decision = h.engine.decide(Some(&at_distance(&a, 0.1))).await;

    assert_eq!(
        decision,
        Decision::Granted {
            identity_id: IdentityId::from("A"),
            display_name: "Alice".to_string()
        }
    );
    let events = h.log.list_events(DEFAULT_EVENT_LIMIT).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].identity_id, Some(IdentityId::from("A")));
    assert_eq!(events[0].status, AccessStatus::Granted);
}

#[tokio::test]
async fn matching_probe_outside_window_is_time_restricted() {
    let h = harness_at(19, 0);
    let a = template(DIM, 1);
    h.engine
        .enroll(enrollment("A", "Alice", a.clone(), "08:00", "18:00"))
        .await
        .unwrap();

    let decision = h.engine.decide(Some(&a)).await;

    assert_eq!(
        decision,
        Decision::Denied {
            reason: DenialReason::TimeRestriction,
            display_name: Some("Alice".to_string())
        }
    );
}

#[tokio::test]
async fn time_restricted_denial_is_recorded_by_default() {
    let h = harness_at(19, 0);
    let a = template(DIM, 1);
    h.engine
        .enroll(enrollment("A", "Alice", a.clone(), "08:00", "18:00"))
        .await
        .unwrap();

    h.engine.decide(Some(&a)).await;

    let events = h.log.list_events(DEFAULT_EVENT_LIMIT).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].identity_id, Some(IdentityId::from("A")));
    assert_eq!(events[0].status, AccessStatus::Denied);
    assert_eq!(events[0].reason, "time restriction");
}

#[tokio::test]
async fn time_restricted_denial_can_be_left_unrecorded() {
    let config = EngineConfig {
        time_restricted_logging: TimeRestrictedLogging::Skip,
        ..EngineConfig::default()
    };
    let h = TestHarness::new(config, 19, 0).unwrap();
    let a = template(DIM, 1);
    h.engine
        .enroll(enrollment("A", "Alice", a.clone(), "08:00", "18:00"))
        .await
        .unwrap();

    let decision = h.engine.decide(Some(&a)).await;

    assert!(matches!(
        decision,
        Decision::Denied {
            reason: DenialReason::TimeRestriction,
            ..
        }
    ));
    assert!(h.log.is_empty().unwrap());

    // Other outcomes are still recorded under this setting.
    h.clock.set(NaiveTime::from_hms_opt(9, 0, 0).unwrap());
    assert!(h.engine.decide(Some(&a)).await.is_granted());
    h.engine.decide(None).await;
    assert_eq!(h.log.len().unwrap(), 2);
}

#[tokio::test]
async fn duplicate_enrollment_fails_and_keeps_one_record() {
    let h = harness_at(9, 0);
    h.engine
        .enroll(enrollment("E1", "First", template(DIM, 1), "08:00", "18:00"))
        .await
        .unwrap();

    let err = h
        .engine
        .enroll(enrollment("E1", "Second", template(DIM, 2), "09:00", "17:00"))
        .await
        .unwrap_err();

    assert_eq!(err, GatehouseError::DuplicateIdentity(IdentityId::from("E1")));
    let all = h.store.list_all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].display_name, "First");
    assert!(h.log.is_empty().unwrap(), "enrollment never touches the log");
}

#[tokio::test]
async fn look_alikes_resolve_to_first_enrolled() {
    let h = harness_at(12, 0);
    let probe = template(DIM, 5);
    // B is closer to the probe than A, but A was enrolled first.
    h.engine
        .enroll(enrollment("A", "Alice", at_distance(&probe, 0.5), "00:00", "23:59"))
        .await
        .unwrap();
    h.engine
        .enroll(enrollment("B", "Bea", at_distance(&probe, 0.05), "00:00", "23:59"))
        .await
        .unwrap();

    for _ in 0..20 {
        match h.engine.decide(Some(&probe)).await {
            Decision::Granted { identity_id, .. } => assert_eq!(identity_id.as_str(), "A"),
            other => panic!("Expected Granted, got {other:?}"),
        }
    }
    assert_eq!(h.log.len().unwrap(), 20);
}

#[tokio::test]
async fn enrolled_identity_round_trips_through_list_all() {
    let h = harness_at(9, 0);
    let mut request = enrollment("A", "Alice", template(DIM, 1), "07:30", "16:45");
    request.contact = ContactDetails {
        email: Some("alice@example.com".to_string()),
        contact_info: Some("ext. 4411".to_string()),
        date_of_birth: Some("1988-02-29".to_string()),
        photo_path: Some("A_alice.png".to_string()),
    };
    let contact = request.contact.clone();
    let enrolled = h.engine.enroll(request).await.unwrap();

    let all = h.store.list_all().await.unwrap();
    assert_eq!(all, vec![enrolled.clone()]);
    assert_eq!(all[0].identity_id.as_str(), "A");
    assert_eq!(all[0].display_name, "Alice");
    assert_eq!(all[0].encoding, template(DIM, 1));
    assert_eq!(all[0].window.start_str(), "07:30");
    assert_eq!(all[0].window.end_str(), "16:45");
    assert_eq!(all[0].contact, contact);
}

#[tokio::test]
async fn enrollment_stores_input_verbatim_or_rejects_it() {
    let h = harness_at(9, 0);
    let err = h
        .engine
        .enroll(enrollment(" E1 ", "Ada", template(DIM, 1), "08:00", "18:00"))
        .await
        .unwrap_err();
    assert!(matches!(err, GatehouseError::ValidationError { .. }));

    for (start, end) in [("8:0", "18:00"), (" 08:00", "18:00")] {
        let err = h
            .engine
            .enroll(enrollment("E1", "Ada", template(DIM, 1), start, end))
            .await
            .unwrap_err();
        assert!(
            matches!(err, GatehouseError::InvalidTimeWindow { .. }),
            "{start:?} gave {err:?}"
        );
    }
    assert_eq!(h.store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn concrete_scenario_e007() {
    let h = harness_at(10, 15);
    let reference = template(DIM, 7);
    h.engine
        .enroll(enrollment("E007", "Grace Hopper", reference.clone(), "08:00", "18:00"))
        .await
        .unwrap();

    assert_eq!(
        h.engine.decide(Some(&at_distance(&reference, 0.3))).await,
        Decision::Granted {
            identity_id: IdentityId::from("E007"),
            display_name: "Grace Hopper".to_string()
        }
    );

    for (hour, minute) in [(10, 15), (3, 0), (23, 30)] {
        h.clock.set(NaiveTime::from_hms_opt(hour, minute, 0).unwrap());
        assert_eq!(
            h.engine.decide(Some(&at_distance(&reference, 0.9))).await,
            Decision::denied(DenialReason::NotRecognized)
        );
    }

    let events = h.log.list_events(DEFAULT_EVENT_LIMIT).await.unwrap();
    assert_eq!(events.len(), 4);
    assert_eq!(
        h.log.events_for(&IdentityId::from("E007")).await.unwrap().len(),
        1
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_decisions_each_leave_exactly_one_event() {
    let h = harness_at(12, 0);
    let a = template(DIM, 1);
    h.engine
        .enroll(enrollment("A", "Alice", a.clone(), "08:00", "18:00"))
        .await
        .unwrap();

    let mut tasks = Vec::new();
    for i in 0..50u64 {
        let engine = h.engine.clone();
        let probe = if i % 2 == 0 { a.clone() } else { template(DIM, 1000 + i) };
        tasks.push(tokio::spawn(async move { engine.decide(Some(&probe)).await }));
    }
    let decisions = futures::future::join_all(tasks).await;

    let granted = decisions
        .iter()
        .filter(|d| d.as_ref().unwrap().is_granted())
        .count();
    assert_eq!(granted, 25);
    let events = h.log.list_events(DEFAULT_EVENT_LIMIT).await.unwrap();
    assert_eq!(events.len(), 50);
    assert_eq!(
        events
            .iter()
            .filter(|e| e.status == AccessStatus::Granted)
            .count(),
        25
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn decisions_during_enrollment_see_whole_identities() {
    let h = harness_at(12, 0);
    let mut tasks = Vec::new();
    for seed in 0..20u64 {
        let engine = h.engine.clone();
        tasks.push(tokio::spawn(async move {
            engine
                .enroll(enrollment(
                    &format!("E{seed}"),
                    "Worker",
                    template(DIM, seed),
                    "00:00",
                    "23:59",
                ))
                .await
                .unwrap();
            engine.decide(Some(&template(DIM, seed))).await
        }));
    }
    for task in tasks {
        // Each probe was enrolled before it was presented, so it must match.
        assert!(task.await.unwrap().is_granted());
    }
    assert_eq!(h.store.count().await.unwrap(), 20);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn no_identity_within_tolerance_means_not_recognized(
        seeds in prop::collection::btree_set(0u64..10_000, 0..6),
        probe_seed in 10_000u64..20_000,
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        runtime.block_on(async {
            let h = harness_at(12, 0);
            for seed in &seeds {
                h.engine
                    .enroll(enrollment(&format!("E{seed}"), "P", template(DIM, *seed), "00:00", "23:59"))
                    .await
                    .unwrap();
            }
            let decision = h.engine.decide(Some(&template(DIM, probe_seed))).await;
            assert_eq!(decision, Decision::denied(DenialReason::NotRecognized));
            let events = h.log.list_events(DEFAULT_EVENT_LIMIT).await.unwrap();
            assert_eq!(events.len(), 1);
            assert!(events[0].identity_id.is_none());
        });
    }
}
