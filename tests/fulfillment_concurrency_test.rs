//! Races on the quantity ledger and the workflow version counter. These run
//! on a multi-thread runtime so dispatches genuinely overlap.

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use assert_matches::assert_matches;
use common::TestApp;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use procurement_api::auth::ActingUser;
use procurement_api::errors::ServiceError;
use procurement_api::models::{ChannelAttributes, RequisitionStatus};
use procurement_api::services::fulfillment::{DispatchFulfillmentRequest, DispatchLineInput};

fn stock_issue_request(line_id: Uuid, quantity: Decimal) -> DispatchFulfillmentRequest {
    DispatchFulfillmentRequest {
        acting_user: ActingUser::new(Uuid::new_v4(), "Concurrent Clerk"),
        attributes: ChannelAttributes::StockIssue {
            warehouse_id: Uuid::new_v4(),
        },
        lines: vec![DispatchLineInput {
            requisition_line_id: line_id,
            quantity,
            unit_rate: None,
        }],
        remarks: None,
        action_date: None,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn competing_full_dispatches_never_double_count() {
    let app = TestApp::new().await;
    let approved = app.seed_approved_requisition(&[dec!(10)]).await;
    let requisition_id = approved.id;
    let line_id = approved.lines[0].id;
    let service = app.state.services.fulfillments.clone();

    let first = {
        let service = service.clone();
        tokio::spawn(async move {
            service
                .dispatch_fulfillment(requisition_id, stock_issue_request(line_id, dec!(10)))
                .await
        })
    };
    let second = tokio::spawn(async move {
        service
            .dispatch_fulfillment(requisition_id, stock_issue_request(line_id, dec!(10)))
            .await
    });

    let outcomes = vec![
        first.await.expect("task joined"),
        second.await.expect("task joined"),
    ];
    let successes = outcomes.iter().filter(|o| o.is_ok()).count();
    assert_eq!(successes, 1, "exactly one of two full dispatches may land");

    // The loser re-reads after the winner commits and is stopped by the
    // dispatch gate; if its header read slipped in before the commit, the
    // fresh line quantities expose the over-fulfillment instead.
    let loser = outcomes
        .into_iter()
        .find_map(Result::err)
        .expect("one dispatch must lose");
    assert_matches!(
        loser,
        ServiceError::InvalidOperation(_) | ServiceError::OverFulfillment { .. }
    );

    let settled = app
        .state
        .services
        .requisitions
        .get_requisition(approved.id)
        .await
        .expect("fetch requisition")
        .expect("requisition exists");
    assert_eq!(settled.status, RequisitionStatus::FullyFulfilled);
    assert_eq!(settled.lines[0].quantity_fulfilled, dec!(10));

    let history = app
        .state
        .services
        .fulfillments
        .list_fulfillments(approved.id)
        .await
        .expect("fetch history");
    assert_eq!(history.len(), 1, "the losing dispatch must leave no record");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn overlapping_partials_cannot_exceed_the_requested_quantity() {
    let app = TestApp::new().await;
    let approved = app.seed_approved_requisition(&[dec!(10)]).await;
    let requisition_id = approved.id;
    let line_id = approved.lines[0].id;
    let service = app.state.services.fulfillments.clone();

    // 6 + 5 exceeds the requested 10; at most one can land.
    let first = {
        let service = service.clone();
        tokio::spawn(async move {
            service
                .dispatch_fulfillment(requisition_id, stock_issue_request(line_id, dec!(6)))
                .await
        })
    };
    let second = tokio::spawn(async move {
        service
            .dispatch_fulfillment(requisition_id, stock_issue_request(line_id, dec!(5)))
            .await
    });

    let outcomes = vec![
        first.await.expect("task joined"),
        second.await.expect("task joined"),
    ];
    let winners: Vec<Decimal> = outcomes
        .iter()
        .filter_map(|o| o.as_ref().ok())
        .map(|record| record.total_quantity)
        .collect();
    assert_eq!(winners.len(), 1);

    let settled = app
        .state
        .services
        .requisitions
        .get_requisition(approved.id)
        .await
        .expect("fetch requisition")
        .expect("requisition exists");
    assert_eq!(settled.lines[0].quantity_fulfilled, winners[0]);
    assert!(settled.lines[0].quantity_fulfilled <= dec!(10));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn disjoint_partials_both_land_through_retries() {
    let app = TestApp::new().await;
    let approved = app.seed_approved_requisition(&[dec!(10)]).await;
    let requisition_id = approved.id;
    let line_id = approved.lines[0].id;
    let service = app.state.services.fulfillments.clone();

    // 3 + 4 fits in 10, so the version-race loser must recover on retry.
    let first = {
        let service = service.clone();
        tokio::spawn(async move {
            service
                .dispatch_fulfillment(requisition_id, stock_issue_request(line_id, dec!(3)))
                .await
        })
    };
    let second = tokio::spawn(async move {
        service
            .dispatch_fulfillment(requisition_id, stock_issue_request(line_id, dec!(4)))
            .await
    });

    let first = first.await.expect("task joined").expect("first dispatch");
    let second = second.await.expect("task joined").expect("second dispatch");

    let references: HashSet<&str> = [
        first.reference_number.as_str(),
        second.reference_number.as_str(),
    ]
    .into_iter()
    .collect();
    assert_eq!(references.len(), 2, "each dispatch gets its own reference");

    let settled = app
        .state
        .services
        .requisitions
        .get_requisition(approved.id)
        .await
        .expect("fetch requisition")
        .expect("requisition exists");
    assert_eq!(settled.lines[0].quantity_fulfilled, dec!(7));
    assert_eq!(settled.status, RequisitionStatus::PartiallyFulfilled);

    let history = app
        .state
        .services
        .fulfillments
        .list_fulfillments(approved.id)
        .await
        .expect("fetch history");
    assert_eq!(history.len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn competing_submits_produce_one_transition() {
    let app = TestApp::new().await;
    let draft = app.seed_draft_requisition(&[dec!(5)]).await;
    let requisition_id = draft.id;
    let service = app.state.services.requisitions.clone();

    let first = {
        let service = service.clone();
        let user = ActingUser::new(Uuid::new_v4(), "First Submitter");
        tokio::spawn(async move { service.submit_requisition(requisition_id, user).await })
    };
    let second = {
        let user = ActingUser::new(Uuid::new_v4(), "Second Submitter");
        tokio::spawn(async move { service.submit_requisition(requisition_id, user).await })
    };

    let outcomes = vec![
        first.await.expect("task joined"),
        second.await.expect("task joined"),
    ];
    let successes = outcomes.iter().filter(|o| o.is_ok()).count();
    assert_eq!(successes, 1);

    // The loser either lost the version race outright or re-read the already
    // submitted document and was stopped by the transition table.
    let loser = outcomes
        .into_iter()
        .find_map(Result::err)
        .expect("one submit must lose");
    assert_matches!(
        loser,
        ServiceError::ConcurrentModification(_) | ServiceError::InvalidTransition { .. }
    );

    let settled = app
        .state
        .services
        .requisitions
        .get_requisition(draft.id)
        .await
        .expect("fetch requisition")
        .expect("requisition exists");
    assert_eq!(settled.status, RequisitionStatus::Submitted);
    assert_eq!(settled.version, draft.version + 1, "exactly one version bump");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_draw_distinct_requisition_numbers() {
    let app = Arc::new(TestApp::new().await);

    let mut handles = Vec::new();
    for _ in 0..4 {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            app.seed_draft_requisition(&[dec!(1)]).await.requisition_number
        }));
    }

    let mut numbers = HashSet::new();
    for handle in handles {
        let number = handle.await.expect("task joined");
        assert!(number.starts_with("PR-"));
        assert!(numbers.insert(number), "requisition numbers must be unique");
    }
    assert_eq!(numbers.len(), 4);
}
