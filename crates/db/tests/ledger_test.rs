//! Debt ledger engine against a real schema.

mod common;

use common::{setup, transaction};
use futures::future::join_all;
use splittrip_db::LedgerStore;
use splittrip_core::debt::DebtBook;
use splittrip_shared::{AppError, Currency, ErrorKind, Money};

fn eur(amount: &str) -> Money {
    Money::parse(amount, Currency::EUR).unwrap()
}

#[tokio::test]
async fn test_fifty_euro_scenario() {
    let app = setup().await;
    let alice = app.user("alice").await;
    let bob = app.user("bob").await;
    let trip = app.trip(alice).await;
    app.join(trip, alice, bob, "bob").await;

    let created = app.owe(trip, alice, bob, "50.00").await;
    assert_eq!(created.amount, eur("50.00"));
    assert!(!created.is_confirmed);

    assert_eq!(
        app.ledger.balance_between(trip, alice, bob).await.unwrap(),
        eur("50.00")
    );
    assert_eq!(
        app.ledger.balance_between(trip, bob, alice).await.unwrap(),
        eur("-50.00")
    );

    let debts = app.ledger.list_for_trip(bob, trip).await.unwrap();
    assert_eq!(debts.len(), 1);
    assert_eq!(debts[0].creditor.id, alice);
    assert_eq!(debts[0].debtor.id, bob);
    assert_eq!(debts[0].amount.to_string(), "50.00 EUR");

    let position = app.ledger.net_position(trip, bob).await.unwrap();
    assert_eq!(position.debt, eur("50.00"));
    assert_eq!(position.credit, eur("0.00"));
    assert_eq!(position.net, eur("-50.00"));
}

#[tokio::test]
async fn test_delete_restores_exact_balance_and_keeps_row() {
    let app = setup().await;
    let alice = app.user("alice").await;
    let bob = app.user("bob").await;
    let trip = app.trip(alice).await;
    app.join(trip, alice, bob, "bob").await;

    app.owe(trip, bob, alice, "12.34").await;
    let before = app.ledger.records(trip).await.unwrap();

    let tx = app.owe(trip, alice, bob, "7.50").await;
    app.transactions.delete(bob, tx.id).await.unwrap();

    let after = app.ledger.records(trip).await.unwrap();
    assert_eq!(after, before);
    assert_eq!(
        after[0].amount.amount_string(),
        before[0].amount.amount_string()
    );

    assert_eq!(
        app.ledger.balance_between(trip, bob, alice).await.unwrap(),
        eur("12.34")
    );
}

#[tokio::test]
async fn test_settled_pair_keeps_zero_row() {
    let app = setup().await;
    let alice = app.user("alice").await;
    let bob = app.user("bob").await;
    let trip = app.trip(alice).await;
    app.join(trip, alice, bob, "bob").await;

    let tx = app.owe(trip, alice, bob, "20.00").await;
    app.transactions.delete(alice, tx.id).await.unwrap();

    let records = app.ledger.records(trip).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].amount.amount_string(), "0.00");
    let debts = app.ledger.list_for_trip(alice, trip).await.unwrap();
    assert_eq!(debts[0].amount, eur("0.00"));
}

#[tokio::test]
async fn test_both_directions_share_one_row() {
    let app = setup().await;
    let alice = app.user("alice").await;
    let bob = app.user("bob").await;
    let trip = app.trip(alice).await;
    app.join(trip, alice, bob, "bob").await;

    app.owe(trip, alice, bob, "10.00").await;
    app.owe(trip, bob, alice, "4.00").await;

    let records = app.ledger.records(trip).await.unwrap();
    assert_eq!(records.len(), 1);
    assert!(records[0].creditor_id < records[0].debtor_id);
    assert_eq!(
        app.ledger.balance_between(trip, alice, bob).await.unwrap(),
        eur("6.00")
    );
}

#[tokio::test]
async fn test_concurrent_opposite_deltas_converge() {
    let app = setup().await;
    let alice = app.user("alice").await;
    let bob = app.user("bob").await;
    let trip = app.trip(alice).await;
    app.join(trip, alice, bob, "bob").await;

    let first = app.transactions.clone();
    let second = app.transactions.clone();
    let handles = vec![
        tokio::spawn(async move {
            first
                .create(alice, trip, transaction(alice, bob, "10.00"))
                .await
        }),
        tokio::spawn(async move {
            second
                .create(bob, trip, transaction(bob, alice, "4.00"))
                .await
        }),
    ];
    for result in join_all(handles).await {
        result.expect("task panicked").expect("create failed");
    }

    assert_eq!(
        app.ledger.balance_between(trip, alice, bob).await.unwrap(),
        eur("6.00")
    );
    assert_eq!(app.ledger.records(trip).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_many_concurrent_deltas_lose_nothing() {
    let app = setup().await;
    let alice = app.user("alice").await;
    let bob = app.user("bob").await;
    let trip = app.trip(alice).await;
    app.join(trip, alice, bob, "bob").await;

    let handles: Vec<_> = (0..20)
        .map(|i| {
            let lifecycle = app.transactions.clone();
            tokio::spawn(async move {
                if i % 2 == 0 {
                    lifecycle
                        .create(alice, trip, transaction(alice, bob, "1.25"))
                        .await
                } else {
                    lifecycle
                        .create(bob, trip, transaction(bob, alice, "0.25"))
                        .await
                }
            })
        })
        .collect();
    for result in join_all(handles).await {
        result.expect("task panicked").expect("create failed");
    }

    // 10 x 1.25 - 10 x 0.25
    assert_eq!(
        app.ledger.balance_between(trip, alice, bob).await.unwrap(),
        eur("10.00")
    );
}

#[tokio::test]
async fn test_matches_in_memory_book_and_conserves_balance() {
    let app = setup().await;
    let alice = app.user("alice").await;
    let bob = app.user("bob").await;
    let carol = app.user("carol").await;
    let trip = app.trip(alice).await;
    app.join(trip, alice, bob, "bob").await;
    app.join(trip, alice, carol, "carol").await;

    let steps = [
        (alice, bob, "30.00"),
        (bob, carol, "12.50"),
        (carol, alice, "7.25"),
        (bob, alice, "30.00"),
        (alice, carol, "0.01"),
    ];
    let mut book = DebtBook::new(Currency::EUR);
    for (creditor, debtor, amount) in steps {
        app.owe(trip, creditor, debtor, amount).await;
        book.apply(creditor, debtor, eur(amount)).unwrap();
    }

    let mut stored = app.ledger.records(trip).await.unwrap();
    let mut expected: Vec<_> = book.records().collect();
    stored.sort_by_key(|r| (r.creditor_id, r.debtor_id));
    expected.sort_by_key(|r| (r.creditor_id, r.debtor_id));
    assert_eq!(stored, expected);

    let mut total = Money::zero(Currency::EUR);
    for user in [alice, bob, carol] {
        let position = app.ledger.net_position(trip, user).await.unwrap();
        assert_eq!(position, book.net_position(user).unwrap());
        total = total.checked_add(position.net).unwrap();
    }
    assert!(total.is_zero());
}

#[tokio::test]
async fn test_apply_delta_refuses_mixed_currency() {
    let app = setup().await;
    let alice = app.user("alice").await;
    let bob = app.user("bob").await;
    let trip = app.trip(alice).await;
    app.join(trip, alice, bob, "bob").await;
    app.owe(trip, alice, bob, "5.00").await;

    let txn = app.store.begin().await.unwrap();
    let err = app
        .ledger
        .apply_delta(
            &txn,
            trip,
            alice,
            bob,
            Money::parse("5.00", Currency::USD).unwrap(),
        )
        .await
        .unwrap_err();
    LedgerStore::rollback(txn).await.unwrap();

    assert_eq!(err.kind(), ErrorKind::BadRequest);
    assert_eq!(
        app.ledger.balance_between(trip, alice, bob).await.unwrap(),
        eur("5.00")
    );
}

#[tokio::test]
async fn test_apply_delta_rejects_self_pair() {
    let app = setup().await;
    let alice = app.user("alice").await;
    let trip = app.trip(alice).await;

    let txn = app.store.begin().await.unwrap();
    let err = app
        .ledger
        .apply_delta(&txn, trip, alice, alice, eur("1.00"))
        .await
        .unwrap_err();
    LedgerStore::rollback(txn).await.unwrap();

    assert!(matches!(err, AppError::BadRequest(_)));
    assert!(app.ledger.records(trip).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_balance_beyond_limit_is_refused_and_pair_stays_usable() {
    let app = setup().await;
    let alice = app.user("alice").await;
    let bob = app.user("bob").await;
    let trip = app.trip(alice).await;
    app.join(trip, alice, bob, "bob").await;

    let first = app.owe(trip, alice, bob, "600000000000000.00").await;
    let err = app
        .transactions
        .create(alice, trip, transaction(alice, bob, "600000000000000.00"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadRequest);

    assert_eq!(
        app.ledger.balance_between(trip, alice, bob).await.unwrap(),
        eur("600000000000000.00")
    );
    assert_eq!(app.transactions.list_for_trip(alice, trip).await.unwrap().len(), 1);
    let view = app.views.trip_view(bob, trip).await.unwrap();
    assert_eq!(view.position.debt, eur("600000000000000.00"));

    app.transactions.delete(alice, first.id).await.unwrap();
    assert!(
        app.ledger
            .balance_between(trip, alice, bob)
            .await
            .unwrap()
            .is_zero()
    );
}
