//! Order ledger tests: balance debits, snapshot refunds and the status
//! state machine, driven through `OrderCommandService` against the
//! in-memory store.

mod support;

use canteen::abstract_trait::OrderCommandServiceTrait;
use canteen::domain::requests::{CreateOrderRequest, OrderDishRequest};
use shared::errors::ServiceError;
use shared::model::{OrderStatus, UserRole};
use std::sync::Arc;
use support::{InMemoryBackend, RecordingNotifier, as_cook, as_student, cook, dish, student};

fn order_of(dishes: &[(i32, i32)]) -> CreateOrderRequest {
    CreateOrderRequest {
        dishes: dishes
            .iter()
            .map(|&(dish_id, quantity)| OrderDishRequest { dish_id, quantity })
            .collect(),
        user_id: None,
    }
}

#[tokio::test]
async fn create_order_debits_balance_and_snapshots_prices() {
    let backend = Arc::new(InMemoryBackend::new());
    let notifier = Arc::new(RecordingNotifier::new());
    backend.seed_user(student(1, 100_000)).await;
    backend.seed_dish(dish(1, "Borscht", 15_000)).await;
    backend.seed_dish(dish(2, "Buckwheat", 10_000)).await;
    let service = support::order_command_service(&backend, &notifier).await;

    let response = service
        .create_order(as_student(1), &order_of(&[(1, 1), (2, 2)]))
        .await
        .unwrap();

    assert_eq!(response.data.status, OrderStatus::Paid);
    assert_eq!(response.data.total, 35_000);
    assert_eq!(response.data.dishes.len(), 2);
    assert_eq!(backend.balance_of(1).await, 65_000);

    let lines = backend.lines_of(response.data.id).await;
    assert!(
        lines
            .iter()
            .any(|l| l.dish_id == 1 && l.quantity == 1 && l.unit_price == 15_000)
    );
    assert!(
        lines
            .iter()
            .any(|l| l.dish_id == 2 && l.quantity == 2 && l.unit_price == 10_000)
    );

    let sent = notifier.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].role, Some(UserRole::Cook));
}

#[tokio::test]
async fn create_order_fails_when_balance_is_short() {
    let backend = Arc::new(InMemoryBackend::new());
    let notifier = Arc::new(RecordingNotifier::new());
    backend.seed_user(student(1, 20_000)).await;
    backend.seed_dish(dish(1, "Borscht", 15_000)).await;
    let service = support::order_command_service(&backend, &notifier).await;

    let err = service
        .create_order(as_student(1), &order_of(&[(1, 2)]))
        .await
        .unwrap_err();

    match err {
        ServiceError::InsufficientFunds { needed, available } => {
            assert_eq!(needed, 30_000);
            assert_eq!(available, 20_000);
        }
        other => panic!("expected InsufficientFunds, got {other:?}"),
    }
    assert_eq!(backend.balance_of(1).await, 20_000);
    assert_eq!(backend.order_count().await, 0);
    assert!(notifier.sent().await.is_empty());
}

#[tokio::test]
async fn create_order_rejects_unknown_dishes() {
    let backend = Arc::new(InMemoryBackend::new());
    let notifier = Arc::new(RecordingNotifier::new());
    backend.seed_user(student(1, 100_000)).await;
    backend.seed_dish(dish(1, "Borscht", 15_000)).await;
    let service = support::order_command_service(&backend, &notifier).await;

    let err = service
        .create_order(as_student(1), &order_of(&[(1, 1), (99, 1)]))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::BadRequest(ref msg) if msg.contains("99")));
    assert_eq!(backend.balance_of(1).await, 100_000);
    assert_eq!(backend.order_count().await, 0);
}

#[tokio::test]
async fn create_order_rejects_duplicate_dish_lines() {
    let backend = Arc::new(InMemoryBackend::new());
    let notifier = Arc::new(RecordingNotifier::new());
    backend.seed_user(student(1, 100_000)).await;
    backend.seed_dish(dish(1, "Borscht", 15_000)).await;
    let service = support::order_command_service(&backend, &notifier).await;

    let err = service
        .create_order(as_student(1), &order_of(&[(1, 1), (1, 2)]))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Validation(_)));
    assert_eq!(backend.order_count().await, 0);
}

#[tokio::test]
async fn banned_accounts_cannot_place_orders() {
    let backend = Arc::new(InMemoryBackend::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let mut banned = student(1, 100_000);
    banned.banned = true;
    backend.seed_user(banned).await;
    backend.seed_dish(dish(1, "Borscht", 15_000)).await;
    let service = support::order_command_service(&backend, &notifier).await;

    let err = service
        .create_order(as_student(1), &order_of(&[(1, 1)]))
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Forbidden(_)));
    assert_eq!(backend.balance_of(1).await, 100_000);
}

#[tokio::test]
async fn student_cannot_order_for_another_account() {
    let backend = Arc::new(InMemoryBackend::new());
    let notifier = Arc::new(RecordingNotifier::new());
    backend.seed_user(student(1, 100_000)).await;
    backend.seed_user(student(2, 100_000)).await;
    backend.seed_dish(dish(1, "Borscht", 15_000)).await;
    let service = support::order_command_service(&backend, &notifier).await;

    let mut req = order_of(&[(1, 1)]);
    req.user_id = Some(2);
    let err = service.create_order(as_student(1), &req).await.unwrap_err();

    assert!(matches!(err, ServiceError::Forbidden(_)));
    assert_eq!(backend.order_count().await, 0);
}

#[tokio::test]
async fn cook_can_order_on_behalf_of_a_student() {
    let backend = Arc::new(InMemoryBackend::new());
    let notifier = Arc::new(RecordingNotifier::new());
    backend.seed_user(cook(10)).await;
    backend.seed_user(student(1, 50_000)).await;
    backend.seed_dish(dish(1, "Borscht", 15_000)).await;
    let service = support::order_command_service(&backend, &notifier).await;

    let mut req = order_of(&[(1, 1)]);
    req.user_id = Some(1);
    let response = service.create_order(as_cook(10), &req).await.unwrap();

    assert_eq!(response.data.user_id, 1);
    assert_eq!(backend.balance_of(1).await, 35_000);
    assert_eq!(backend.balance_of(10).await, 0);
}

#[tokio::test]
async fn lost_notification_does_not_roll_back_the_order() {
    let backend = Arc::new(InMemoryBackend::new());
    let notifier = Arc::new(RecordingNotifier::new());
    notifier.set_fail(true).await;
    backend.seed_user(student(1, 100_000)).await;
    backend.seed_dish(dish(1, "Borscht", 15_000)).await;
    let service = support::order_command_service(&backend, &notifier).await;

    let response = service
        .create_order(as_student(1), &order_of(&[(1, 1)]))
        .await
        .unwrap();

    assert_eq!(backend.balance_of(1).await, 85_000);
    assert_eq!(
        backend.stored_order(response.data.id).await.status,
        OrderStatus::Paid
    );
}

#[tokio::test]
async fn cancel_refunds_snapshot_prices_even_after_catalog_changes() {
    let backend = Arc::new(InMemoryBackend::new());
    let notifier = Arc::new(RecordingNotifier::new());
    backend.seed_user(student(1, 100_000)).await;
    backend.seed_dish(dish(1, "Borscht", 15_000)).await;
    let service = support::order_command_service(&backend, &notifier).await;

    let created = service
        .create_order(as_student(1), &order_of(&[(1, 2)]))
        .await
        .unwrap();
    assert_eq!(backend.balance_of(1).await, 70_000);

    backend.set_price(1, 99_000).await;

    let cancelled = service
        .cancel_order(as_student(1), created.data.id)
        .await
        .unwrap();

    assert_eq!(cancelled.data.status, OrderStatus::Cancelled);
    assert_eq!(backend.balance_of(1).await, 100_000);
    assert!(
        backend
            .stored_order(created.data.id)
            .await
            .completed_at
            .is_some()
    );
}

#[tokio::test]
async fn cancel_twice_refunds_exactly_once() {
    let backend = Arc::new(InMemoryBackend::new());
    let notifier = Arc::new(RecordingNotifier::new());
    backend.seed_user(student(1, 1000)).await;
    backend.seed_dish(dish(1, "Compote", 300)).await;
    let service = support::order_command_service(&backend, &notifier).await;

    let created = service
        .create_order(as_student(1), &order_of(&[(1, 1)]))
        .await
        .unwrap();
    assert_eq!(backend.balance_of(1).await, 700);

    service
        .cancel_order(as_student(1), created.data.id)
        .await
        .unwrap();
    assert_eq!(backend.balance_of(1).await, 1000);

    let err = service
        .cancel_order(as_student(1), created.data.id)
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Conflict(ref msg) if msg.contains("already cancelled")));
    assert_eq!(backend.balance_of(1).await, 1000);
}

#[tokio::test]
async fn served_orders_cannot_be_cancelled() {
    let backend = Arc::new(InMemoryBackend::new());
    let notifier = Arc::new(RecordingNotifier::new());
    backend.seed_user(student(1, 100_000)).await;
    backend.seed_dish(dish(1, "Borscht", 15_000)).await;
    let service = support::order_command_service(&backend, &notifier).await;

    let created = service
        .create_order(as_student(1), &order_of(&[(1, 1)]))
        .await
        .unwrap();
    service
        .mark_served(as_student(1), created.data.id)
        .await
        .unwrap();

    let err = service
        .cancel_order(as_student(1), created.data.id)
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Conflict(ref msg) if msg.contains("served")));
    assert_eq!(backend.balance_of(1).await, 85_000);
}

#[tokio::test]
async fn only_staff_can_mark_orders_ready() {
    let backend = Arc::new(InMemoryBackend::new());
    let notifier = Arc::new(RecordingNotifier::new());
    backend.seed_user(student(1, 100_000)).await;
    backend.seed_dish(dish(1, "Borscht", 15_000)).await;
    let service = support::order_command_service(&backend, &notifier).await;

    let created = service
        .create_order(as_student(1), &order_of(&[(1, 1)]))
        .await
        .unwrap();

    let err = service
        .mark_ready(as_student(1), created.data.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));

    let ready = service
        .mark_ready(as_cook(10), created.data.id)
        .await
        .unwrap();
    assert_eq!(ready.data.status, OrderStatus::Ready);
    assert!(backend.stored_order(created.data.id).await.completed_at.is_none());

    let sent = notifier.sent().await;
    assert!(
        sent.iter()
            .any(|n| n.user_id == Some(1) && n.title == "Order ready")
    );
}

#[tokio::test]
async fn mark_ready_requires_a_paid_order() {
    let backend = Arc::new(InMemoryBackend::new());
    let notifier = Arc::new(RecordingNotifier::new());
    backend.seed_user(student(1, 100_000)).await;
    backend.seed_dish(dish(1, "Borscht", 15_000)).await;
    let service = support::order_command_service(&backend, &notifier).await;

    let created = service
        .create_order(as_student(1), &order_of(&[(1, 1)]))
        .await
        .unwrap();
    service.mark_ready(as_cook(10), created.data.id).await.unwrap();

    let err = service
        .mark_ready(as_cook(10), created.data.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[tokio::test]
async fn serving_twice_conflicts() {
    let backend = Arc::new(InMemoryBackend::new());
    let notifier = Arc::new(RecordingNotifier::new());
    backend.seed_user(student(1, 100_000)).await;
    backend.seed_dish(dish(1, "Borscht", 15_000)).await;
    let service = support::order_command_service(&backend, &notifier).await;

    let created = service
        .create_order(as_student(1), &order_of(&[(1, 1)]))
        .await
        .unwrap();

    let served = service
        .mark_served(as_student(1), created.data.id)
        .await
        .unwrap();
    assert_eq!(served.data.status, OrderStatus::Served);
    assert!(served.data.completed_at.is_some());

    let err = service
        .mark_served(as_student(1), created.data.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(ref msg) if msg.contains("already served")));
    assert_eq!(backend.balance_of(1).await, 85_000);
}

#[tokio::test]
async fn ready_orders_can_still_be_served() {
    let backend = Arc::new(InMemoryBackend::new());
    let notifier = Arc::new(RecordingNotifier::new());
    backend.seed_user(student(1, 100_000)).await;
    backend.seed_dish(dish(1, "Borscht", 15_000)).await;
    let service = support::order_command_service(&backend, &notifier).await;

    let created = service
        .create_order(as_student(1), &order_of(&[(1, 1)]))
        .await
        .unwrap();
    service.mark_ready(as_cook(10), created.data.id).await.unwrap();

    let served = service
        .mark_served(as_student(1), created.data.id)
        .await
        .unwrap();
    assert_eq!(served.data.status, OrderStatus::Served);
}

#[tokio::test]
async fn student_cannot_confirm_a_foreign_order() {
    let backend = Arc::new(InMemoryBackend::new());
    let notifier = Arc::new(RecordingNotifier::new());
    backend.seed_user(student(1, 100_000)).await;
    backend.seed_user(student(2, 0)).await;
    backend.seed_dish(dish(1, "Borscht", 15_000)).await;
    let service = support::order_command_service(&backend, &notifier).await;

    let created = service
        .create_order(as_student(1), &order_of(&[(1, 1)]))
        .await
        .unwrap();

    let err = service
        .mark_served(as_student(2), created.data.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));

    let served = service
        .mark_served(as_cook(10), created.data.id)
        .await
        .unwrap();
    assert_eq!(served.data.status, OrderStatus::Served);
}

#[tokio::test]
async fn concurrent_serve_and_cancel_pick_exactly_one_winner() {
    let backend = Arc::new(InMemoryBackend::new());
    let notifier = Arc::new(RecordingNotifier::new());
    backend.seed_user(student(1, 1000)).await;
    backend.seed_dish(dish(1, "Compote", 300)).await;
    let service = support::order_command_service(&backend, &notifier).await;

    let created = service
        .create_order(as_student(1), &order_of(&[(1, 1)]))
        .await
        .unwrap();
    let id = created.data.id;

    let (serve, cancel) = tokio::join!(
        service.mark_served(as_cook(10), id),
        service.cancel_order(as_cook(10), id),
    );

    assert_ne!(serve.is_ok(), cancel.is_ok());

    let order = backend.stored_order(id).await;
    if serve.is_ok() {
        assert_eq!(order.status, OrderStatus::Served);
        assert_eq!(backend.balance_of(1).await, 700);
        assert!(matches!(cancel.unwrap_err(), ServiceError::Conflict(_)));
    } else {
        assert_eq!(order.status, OrderStatus::Cancelled);
        assert_eq!(backend.balance_of(1).await, 1000);
        assert!(matches!(serve.unwrap_err(), ServiceError::Conflict(_)));
    }
}

#[tokio::test]
async fn concurrent_creates_fund_exactly_one_order() {
    let backend = Arc::new(InMemoryBackend::new());
    let notifier = Arc::new(RecordingNotifier::new());
    backend.seed_user(student(1, 500)).await;
    backend.seed_dish(dish(1, "Compote", 300)).await;
    let service = support::order_command_service(&backend, &notifier).await;

    let req = order_of(&[(1, 1)]);
    let (first, second) = tokio::join!(
        service.create_order(as_student(1), &req),
        service.create_order(as_student(1), &req),
    );

    assert_ne!(first.is_ok(), second.is_ok());
    assert_eq!(backend.balance_of(1).await, 200);
    assert_eq!(backend.order_count().await, 1);

    let failed = if first.is_ok() { second } else { first };
    assert!(matches!(
        failed.unwrap_err(),
        ServiceError::InsufficientFunds { .. }
    ));
}
