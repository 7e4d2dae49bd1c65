use chrono::{Duration, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use uuid::Uuid;

use engine::{
    CreateExpenseCmd, CreateSettlementCmd, EditExpenseCmd, Engine, EngineError, MoneyCents,
    PostKind, PostStatus, SettlementAction,
};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn seed_profile(db: &DatabaseConnection, id: Uuid, first: &str, last: &str) {
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO profiles (id, first_name, last_name, created_at) VALUES (?, ?, ?, ?)",
        vec![
            id.to_string().into(),
            first.into(),
            last.into(),
            Utc::now().into(),
        ],
    ))
    .await
    .unwrap();
}

async fn seed_group(db: &DatabaseConnection, id: Uuid, name: &str) {
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO groups (id, name, created_at) VALUES (?, ?, ?)",
        vec![id.to_string().into(), name.into(), Utc::now().into()],
    ))
    .await
    .unwrap();
}

async fn seed_member(db: &DatabaseConnection, group_id: Uuid, user_id: Uuid, status: &str) {
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO group_members (group_id, user_id, role, status, joined_at) \
         VALUES (?, ?, ?, ?, ?)",
        vec![
            group_id.to_string().into(),
            user_id.to_string().into(),
            "member".into(),
            status.into(),
            Utc::now().into(),
        ],
    ))
    .await
    .unwrap();
}

/// Seeds a group with `names` as active members and returns their ids in
/// the same order.
async fn group_with_members(
    db: &DatabaseConnection,
    names: &[(&str, &str)],
) -> (Uuid, Vec<Uuid>) {
    let group_id = Uuid::new_v4();
    seed_group(db, group_id, "Trip").await;

    let mut member_ids = Vec::with_capacity(names.len());
    for (first, last) in names {
        let user_id = Uuid::new_v4();
        seed_profile(db, user_id, first, last).await;
        seed_member(db, group_id, user_id, "active").await;
        member_ids.push(user_id);
    }
    (group_id, member_ids)
}

fn net_of(balances: &[engine::MemberBalance], member_id: Uuid) -> MoneyCents {
    balances
        .iter()
        .find(|b| b.member_id == member_id)
        .map(|b| b.net)
        .expect("member missing from balances")
}

#[tokio::test]
async fn create_expense_persists_post_splits_and_history() {
    let (engine, db) = engine_with_db().await;
    let (group_id, ids) = group_with_members(&db, &[("Alice", "A"), ("Bob", "B")]).await;
    let (alice, bob) = (ids[0], ids[1]);

    let post_id = engine
        .create_expense(
            CreateExpenseCmd::new(group_id, alice, alice, Utc::now())
                .title("Groceries")
                .total_amount(MoneyCents::new(100_00))
                .split(alice, MoneyCents::new(50_00))
                .split(bob, MoneyCents::new(50_00)),
        )
        .await
        .unwrap();

    let post = engine.post(post_id, bob).await.unwrap();
    assert_eq!(post.kind, PostKind::Expense);
    assert_eq!(post.status, PostStatus::Active);
    assert_eq!(post.total_amount, Some(MoneyCents::new(100_00)));
    assert_eq!(post.payer_id, alice);
    assert_eq!(post.splits.len(), 2);

    let history = engine.post_history(post_id, bob).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].editor_id, alice);
    assert_eq!(history[0].changes["action"], "created");
}

#[tokio::test]
async fn expense_split_sum_must_match_total() {
    let (engine, db) = engine_with_db().await;
    let (group_id, ids) = group_with_members(&db, &[("Alice", "A"), ("Bob", "B")]).await;
    let (alice, bob) = (ids[0], ids[1]);

    let err = engine
        .create_expense(
            CreateExpenseCmd::new(group_id, alice, alice, Utc::now())
                .total_amount(MoneyCents::new(100_00))
                .split(alice, MoneyCents::new(30_00))
                .split(bob, MoneyCents::new(30_00)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidSplit(_)));

    // Nothing may be written when validation fails.
    let posts = engine.group_posts(group_id, alice).await.unwrap();
    assert!(posts.is_empty());
}

#[tokio::test]
async fn non_member_cannot_create_expense() {
    let (engine, db) = engine_with_db().await;
    let (group_id, ids) = group_with_members(&db, &[("Alice", "A"), ("Bob", "B")]).await;
    let alice = ids[0];

    let outsider = Uuid::new_v4();
    seed_profile(&db, outsider, "Oscar", "O").await;

    let err = engine
        .create_expense(
            CreateExpenseCmd::new(group_id, outsider, alice, Utc::now())
                .total_amount(MoneyCents::new(10_00))
                .split(alice, MoneyCents::new(10_00)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Unauthorized(_)));
}

#[tokio::test]
async fn inactive_member_cannot_write_but_stays_in_balances() {
    let (engine, db) = engine_with_db().await;
    let (group_id, ids) = group_with_members(&db, &[("Alice", "A")]).await;
    let alice = ids[0];

    let bob = Uuid::new_v4();
    seed_profile(&db, bob, "Bob", "B").await;
    seed_member(&db, group_id, bob, "inactive").await;

    // A former member can still be an ower on a new expense.
    engine
        .create_expense(
            CreateExpenseCmd::new(group_id, alice, alice, Utc::now())
                .total_amount(MoneyCents::new(40_00))
                .split(bob, MoneyCents::new(40_00)),
        )
        .await
        .unwrap();

    let balances = engine.group_balances(group_id, alice).await.unwrap();
    assert_eq!(net_of(&balances, alice), MoneyCents::new(40_00));
    assert_eq!(net_of(&balances, bob), MoneyCents::new(-40_00));

    // But they cannot author posts themselves.
    let err = engine
        .create_expense(
            CreateExpenseCmd::new(group_id, bob, bob, Utc::now())
                .total_amount(MoneyCents::new(10_00))
                .split(alice, MoneyCents::new(10_00)),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Unauthorized(_)));
}

#[tokio::test]
async fn edit_expense_replaces_splits_wholesale() {
    let (engine, db) = engine_with_db().await;
    let (group_id, ids) = group_with_members(&db, &[("Alice", "A"), ("Bob", "B")]).await;
    let (alice, bob) = (ids[0], ids[1]);

    let post_id = engine
        .create_expense(
            CreateExpenseCmd::new(group_id, alice, alice, Utc::now())
                .total_amount(MoneyCents::new(100_00))
                .split(alice, MoneyCents::new(50_00))
                .split(bob, MoneyCents::new(50_00)),
        )
        .await
        .unwrap();

    let edited = engine
        .edit_expense(
            EditExpenseCmd::new(post_id, alice, Utc::now())
                .total_amount(MoneyCents::new(100_00))
                .split(alice, MoneyCents::new(30_00))
                .split(bob, MoneyCents::new(70_00)),
        )
        .await
        .unwrap();
    assert_eq!(edited.splits.len(), 2);

    // Only the latest splits count; the old ones leave no residue.
    let balances = engine.group_balances(group_id, alice).await.unwrap();
    assert_eq!(net_of(&balances, alice), MoneyCents::new(70_00));
    assert_eq!(net_of(&balances, bob), MoneyCents::new(-70_00));

    let history = engine.post_history(post_id, alice).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].changes["action"], "edited");
}

#[tokio::test]
async fn pending_amount_expense_joins_balances_once_completed() {
    let (engine, db) = engine_with_db().await;
    let (group_id, ids) = group_with_members(&db, &[("Alice", "A"), ("Bob", "B")]).await;
    let (alice, bob) = (ids[0], ids[1]);

    let post_id = engine
        .create_expense(
            CreateExpenseCmd::new(group_id, alice, alice, Utc::now()).title("Dinner"),
        )
        .await
        .unwrap();

    let post = engine.post(post_id, alice).await.unwrap();
    assert_eq!(post.status, PostStatus::PendingAmount);
    assert!(post.splits.is_empty());

    let balances = engine.group_balances(group_id, alice).await.unwrap();
    assert!(balances.iter().all(|b| b.net.is_zero()));

    engine
        .edit_expense(
            EditExpenseCmd::new(post_id, alice, Utc::now())
                .total_amount(MoneyCents::new(60_00))
                .split(alice, MoneyCents::new(30_00))
                .split(bob, MoneyCents::new(30_00)),
        )
        .await
        .unwrap();

    let post = engine.post(post_id, alice).await.unwrap();
    assert_eq!(post.status, PostStatus::Active);

    let balances = engine.group_balances(group_id, alice).await.unwrap();
    assert_eq!(net_of(&balances, alice), MoneyCents::new(30_00));
    assert_eq!(net_of(&balances, bob), MoneyCents::new(-30_00));
}

#[tokio::test]
async fn settlement_counts_only_after_confirmation() {
    let (engine, db) = engine_with_db().await;
    let (group_id, ids) = group_with_members(&db, &[("Alice", "A"), ("Bob", "B")]).await;
    let (alice, bob) = (ids[0], ids[1]);

    engine
        .create_expense(
            CreateExpenseCmd::new(group_id, alice, alice, Utc::now())
                .total_amount(MoneyCents::new(100_00))
                .split(alice, MoneyCents::new(50_00))
                .split(bob, MoneyCents::new(50_00)),
        )
        .await
        .unwrap();

    let settlement_id = engine
        .create_settlement(CreateSettlementCmd::new(
            group_id,
            bob,
            alice,
            MoneyCents::new(50_00),
            Utc::now(),
        ))
        .await
        .unwrap();

    // Pending settlements do not move balances.
    let balances = engine.group_balances(group_id, bob).await.unwrap();
    assert_eq!(net_of(&balances, bob), MoneyCents::new(-50_00));

    engine
        .resolve_settlement(settlement_id, alice, SettlementAction::Confirm, Utc::now())
        .await
        .unwrap();

    let balances = engine.group_balances(group_id, bob).await.unwrap();
    assert!(net_of(&balances, alice).is_zero());
    assert!(net_of(&balances, bob).is_zero());
}

#[tokio::test]
async fn denied_settlement_never_counts() {
    let (engine, db) = engine_with_db().await;
    let (group_id, ids) = group_with_members(&db, &[("Alice", "A"), ("Bob", "B")]).await;
    let (alice, bob) = (ids[0], ids[1]);

    let settlement_id = engine
        .create_settlement(CreateSettlementCmd::new(
            group_id,
            bob,
            alice,
            MoneyCents::new(25_00),
            Utc::now(),
        ))
        .await
        .unwrap();

    let post = engine
        .resolve_settlement(settlement_id, alice, SettlementAction::Deny, Utc::now())
        .await
        .unwrap();
    assert_eq!(post.status, PostStatus::Invalid);

    let balances = engine.group_balances(group_id, alice).await.unwrap();
    assert!(balances.iter().all(|b| b.net.is_zero()));

    // The denied post is retained for history.
    let history = engine.post_history(settlement_id, bob).await.unwrap();
    assert_eq!(history.last().unwrap().changes["resolution"], "denied");
}

#[tokio::test]
async fn only_the_recipient_can_resolve_a_settlement() {
    let (engine, db) = engine_with_db().await;
    let (group_id, ids) =
        group_with_members(&db, &[("Alice", "A"), ("Bob", "B"), ("Carol", "C")]).await;
    let (alice, bob, carol) = (ids[0], ids[1], ids[2]);

    let settlement_id = engine
        .create_settlement(CreateSettlementCmd::new(
            group_id,
            bob,
            alice,
            MoneyCents::new(10_00),
            Utc::now(),
        ))
        .await
        .unwrap();

    for actor in [bob, carol] {
        let err = engine
            .resolve_settlement(settlement_id, actor, SettlementAction::Confirm, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Unauthorized(_)));
    }
}

#[tokio::test]
async fn resolving_twice_fails_instead_of_double_applying() {
    let (engine, db) = engine_with_db().await;
    let (group_id, ids) = group_with_members(&db, &[("Alice", "A"), ("Bob", "B")]).await;
    let (alice, bob) = (ids[0], ids[1]);

    let settlement_id = engine
        .create_settlement(CreateSettlementCmd::new(
            group_id,
            bob,
            alice,
            MoneyCents::new(10_00),
            Utc::now(),
        ))
        .await
        .unwrap();

    engine
        .resolve_settlement(settlement_id, alice, SettlementAction::Confirm, Utc::now())
        .await
        .unwrap();

    for action in [SettlementAction::Confirm, SettlementAction::Deny] {
        let err = engine
            .resolve_settlement(settlement_id, alice, action, Utc::now())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidStatus("settlement already resolved".to_string())
        );
    }

    // Confirmed exactly once.
    let balances = engine.group_balances(group_id, alice).await.unwrap();
    assert_eq!(net_of(&balances, alice), MoneyCents::new(-10_00));
    assert_eq!(net_of(&balances, bob), MoneyCents::new(10_00));
}

#[tokio::test]
async fn settlement_amount_must_be_positive() {
    let (engine, db) = engine_with_db().await;
    let (group_id, ids) = group_with_members(&db, &[("Alice", "A"), ("Bob", "B")]).await;
    let (alice, bob) = (ids[0], ids[1]);

    for cents in [0, -5_00] {
        let err = engine
            .create_settlement(CreateSettlementCmd::new(
                group_id,
                bob,
                alice,
                MoneyCents::new(cents),
                Utc::now(),
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidAmount(_)));
    }

    let err = engine
        .create_settlement(CreateSettlementCmd::new(
            group_id,
            bob,
            bob,
            MoneyCents::new(10_00),
            Utc::now(),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
}

#[tokio::test]
async fn resolving_a_missing_post_is_not_found() {
    let (engine, db) = engine_with_db().await;
    let (_, ids) = group_with_members(&db, &[("Alice", "A")]).await;

    let err = engine
        .resolve_settlement(Uuid::new_v4(), ids[0], SettlementAction::Confirm, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn net_balances_always_sum_to_zero() {
    let (engine, db) = engine_with_db().await;
    let (group_id, ids) =
        group_with_members(&db, &[("Alice", "A"), ("Bob", "B"), ("Carol", "C")]).await;
    let (alice, bob, carol) = (ids[0], ids[1], ids[2]);

    let now = Utc::now();
    engine
        .create_expense(
            CreateExpenseCmd::new(group_id, alice, alice, now)
                .total_amount(MoneyCents::new(90_00))
                .split(alice, MoneyCents::new(30_00))
                .split(bob, MoneyCents::new(30_00))
                .split(carol, MoneyCents::new(30_00)),
        )
        .await
        .unwrap();
    engine
        .create_expense(
            CreateExpenseCmd::new(group_id, bob, bob, now + Duration::seconds(1))
                .total_amount(MoneyCents::new(45_50))
                .split(alice, MoneyCents::new(20_00))
                .split(carol, MoneyCents::new(25_50)),
        )
        .await
        .unwrap();

    let balances = engine.group_balances(group_id, carol).await.unwrap();
    assert_eq!(balances.len(), 3);
    let sum: MoneyCents = balances.iter().map(|b| b.net).sum();
    assert!(sum.is_zero());
}

#[tokio::test]
async fn pairwise_balances_reconcile_for_two_members() {
    let (engine, db) = engine_with_db().await;
    let (group_id, ids) = group_with_members(&db, &[("Alice", "A"), ("Bob", "B")]).await;
    let (alice, bob) = (ids[0], ids[1]);

    let now = Utc::now();
    engine
        .create_expense(
            CreateExpenseCmd::new(group_id, alice, alice, now)
                .total_amount(MoneyCents::new(80_00))
                .split(alice, MoneyCents::new(40_00))
                .split(bob, MoneyCents::new(40_00)),
        )
        .await
        .unwrap();
    engine
        .create_expense(
            CreateExpenseCmd::new(group_id, bob, bob, now + Duration::seconds(1))
                .total_amount(MoneyCents::new(30_00))
                .split(alice, MoneyCents::new(15_00))
                .split(bob, MoneyCents::new(15_00)),
        )
        .await
        .unwrap();

    let of_alice = engine.pairwise_balances(group_id, alice).await.unwrap();
    let of_bob = engine.pairwise_balances(group_id, bob).await.unwrap();
    assert_eq!(of_alice.len(), 1);
    assert_eq!(of_bob.len(), 1);
    assert_eq!(of_alice[0].balance, -of_bob[0].balance);

    let net = engine.group_balances(group_id, alice).await.unwrap();
    assert_eq!(net_of(&net, alice), of_alice[0].balance);
    assert_eq!(of_alice[0].balance, MoneyCents::new(25_00));
}

#[tokio::test]
async fn simplify_zeroes_all_balances_and_records_a_summary() {
    let (engine, db) = engine_with_db().await;
    let (group_id, ids) =
        group_with_members(&db, &[("Alice", "A"), ("Bob", "B"), ("Carol", "C")]).await;
    let (alice, bob, carol) = (ids[0], ids[1], ids[2]);

    // Net positions: Alice -30, Bob +10, Carol +20.
    let now = Utc::now();
    engine
        .create_expense(
            CreateExpenseCmd::new(group_id, carol, carol, now)
                .total_amount(MoneyCents::new(20_00))
                .split(alice, MoneyCents::new(20_00)),
        )
        .await
        .unwrap();
    engine
        .create_expense(
            CreateExpenseCmd::new(group_id, bob, bob, now + Duration::seconds(1))
                .total_amount(MoneyCents::new(10_00))
                .split(alice, MoneyCents::new(10_00)),
        )
        .await
        .unwrap();

    let summary_id = engine
        .simplify_debts(group_id, alice, now + Duration::seconds(2))
        .await
        .unwrap()
        .expect("summary post expected");

    let balances = engine.group_balances(group_id, alice).await.unwrap();
    assert!(balances.iter().all(|b| b.net.is_zero()));

    let summary = engine.post(summary_id, bob).await.unwrap();
    assert_eq!(summary.kind, PostKind::SimplificationEvent);
    assert_eq!(summary.status, PostStatus::Active);
    assert_eq!(summary.total_amount, None);
    let payments = summary.metadata.as_ref().unwrap()["payments"]
        .as_array()
        .unwrap()
        .clone();
    assert_eq!(payments.len(), 2);
    // Largest creditor first under head-only matching: Alice pays Carol,
    // then Alice pays Bob.
    assert_eq!(payments[0]["from"], "Alice A");
    assert_eq!(payments[0]["to"], "Carol C");
    assert_eq!(payments[0]["amount"], "$20.00");
    assert_eq!(payments[1]["to"], "Bob B");
    assert_eq!(payments[1]["amount"], "$10.00");

    // The generated settlements are active immediately, payer = debtor.
    let posts = engine.group_posts(group_id, alice).await.unwrap();
    let settlements: Vec<_> = posts
        .iter()
        .filter(|p| p.kind == PostKind::Settlement)
        .collect();
    assert_eq!(settlements.len(), 2);
    assert!(settlements.iter().all(|p| p.status == PostStatus::Active));
    assert!(settlements.iter().all(|p| p.payer_id == alice));
}

#[tokio::test]
async fn simplify_on_settled_group_writes_nothing() {
    let (engine, db) = engine_with_db().await;
    let (group_id, ids) = group_with_members(&db, &[("Alice", "A"), ("Bob", "B")]).await;
    let alice = ids[0];

    let result = engine
        .simplify_debts(group_id, alice, Utc::now())
        .await
        .unwrap();
    assert_eq!(result, None);

    let posts = engine.group_posts(group_id, alice).await.unwrap();
    assert!(posts.is_empty());
}

#[tokio::test]
async fn simplify_requires_an_active_member() {
    let (engine, db) = engine_with_db().await;
    let (group_id, _) = group_with_members(&db, &[("Alice", "A")]).await;

    let outsider = Uuid::new_v4();
    seed_profile(&db, outsider, "Oscar", "O").await;

    let err = engine
        .simplify_debts(group_id, outsider, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Unauthorized(_)));
}

#[tokio::test]
async fn group_feed_returns_posts_newest_first() {
    let (engine, db) = engine_with_db().await;
    let (group_id, ids) = group_with_members(&db, &[("Alice", "A"), ("Bob", "B")]).await;
    let (alice, bob) = (ids[0], ids[1]);

    let now = Utc::now();
    let first = engine
        .create_expense(
            CreateExpenseCmd::new(group_id, alice, alice, now)
                .title("Breakfast")
                .total_amount(MoneyCents::new(10_00))
                .split(bob, MoneyCents::new(10_00)),
        )
        .await
        .unwrap();
    let second = engine
        .create_expense(
            CreateExpenseCmd::new(group_id, alice, alice, now + Duration::seconds(5))
                .title("Lunch")
                .total_amount(MoneyCents::new(20_00))
                .split(bob, MoneyCents::new(20_00)),
        )
        .await
        .unwrap();

    let posts = engine.group_posts(group_id, bob).await.unwrap();
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].id, second);
    assert_eq!(posts[1].id, first);
    assert_eq!(posts[0].splits.len(), 1);
}
