use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use study_server::entity::user;
use study_server::ledger::{DbLedger, Ledger, LedgerError, TransactionKind};

use crate::common::{TestApp, routes};

mod debit_and_credit {
    use super::*;

    #[tokio::test]
    async fn debit_within_balance_appends_one_entry() {
        let app = TestApp::spawn().await;
        let user = app.create_funded_user("ada@example.com", 10).await;

        let entry = app
            .ledger
            .debit(user.id, 4, "Uploaded an Image: board.png", None)
            .await
            .unwrap();

        assert_eq!(entry.kind, TransactionKind::Debit);
        assert_eq!(entry.amount, 4);
        assert_eq!(entry.balance_after, 6);

        let statement = app.statement(user.id).await;
        assert_eq!(statement.balance, 6);
        assert_eq!(statement.history.len(), 2);
        assert_eq!(statement.history[1].id, entry.id);
        assert_eq!(statement.history[1].reason, "Uploaded an Image: board.png");
        assert_eq!(statement.history[1].balance_after, 6);
    }

    #[tokio::test]
    async fn debit_beyond_balance_changes_nothing() {
        let app = TestApp::spawn().await;
        let user = app.create_funded_user("ada@example.com", 5).await;
        let before = app.statement(user.id).await;

        let err = app
            .ledger
            .debit(user.id, 6, "too much", None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            LedgerError::InsufficientFunds {
                balance: 5,
                requested: 6
            }
        ));
        let after = app.statement(user.id).await;
        assert_eq!(after.balance, 5);
        assert_eq!(after.history, before.history);
    }

    #[tokio::test]
    async fn debit_of_exact_balance_reaches_zero() {
        let app = TestApp::spawn().await;
        let user = app.create_funded_user("ada@example.com", 3).await;

        let entry = app.ledger.debit(user.id, 3, "all in", None).await.unwrap();

        assert_eq!(entry.balance_after, 0);
        assert_eq!(app.balance(user.id).await, 0);
    }

    #[tokio::test]
    async fn non_positive_amounts_are_rejected() {
        let app = TestApp::spawn().await;
        let user = app.create_funded_user("ada@example.com", 5).await;

        for amount in [0, -3] {
            assert!(matches!(
                app.ledger.debit(user.id, amount, "x", None).await,
                Err(LedgerError::InvalidAmount(a)) if a == amount
            ));
            assert!(matches!(
                app.ledger.credit(user.id, amount, "x", None).await,
                Err(LedgerError::InvalidAmount(a)) if a == amount
            ));
        }
        assert_eq!(app.statement(user.id).await.history.len(), 1);
    }

    #[tokio::test]
    async fn unknown_account_is_reported() {
        let app = TestApp::spawn().await;

        assert!(matches!(
            app.ledger.credit(999, 5, "x", None).await,
            Err(LedgerError::AccountNotFound(999))
        ));
        assert!(matches!(
            app.ledger.debit(999, 5, "x", None).await,
            Err(LedgerError::AccountNotFound(999))
        ));
    }
}

mod invariants {
    use super::*;

    #[tokio::test]
    async fn history_explains_balance_after_every_operation() {
        let app = TestApp::spawn().await;
        let user = app.create_user("ada@example.com").await;

        let ops: [(TransactionKind, i64); 8] = [
            (TransactionKind::Credit, 10),
            (TransactionKind::Debit, 3),
            (TransactionKind::Debit, 8),
            (TransactionKind::Credit, 2),
            (TransactionKind::Debit, 9),
            (TransactionKind::Debit, 1),
            (TransactionKind::Credit, 5),
            (TransactionKind::Debit, 5),
        ];

        for (kind, amount) in ops {
            let result = match kind {
                TransactionKind::Credit => app.ledger.credit(user.id, amount, "op", None).await,
                TransactionKind::Debit => app.ledger.debit(user.id, amount, "op", None).await,
            };
            if let Err(e) = result {
                assert!(matches!(e, LedgerError::InsufficientFunds { .. }), "{e}");
            }

            let statement = app.statement(user.id).await;
            assert!(statement.balance >= 0);
            statement.reconcile().unwrap();
            assert_eq!(
                statement.balance,
                statement.total(TransactionKind::Credit) - statement.total(TransactionKind::Debit)
            );
        }

        // 10 - 3 + 2 - 9 + 5 - 5; the debits of 8 and 1 are refused.
        let statement = app.statement(user.id).await;
        assert_eq!(statement.balance, 0);
        assert_eq!(statement.history.len(), 6);
    }

    // The test pool has one connection, so the two debits reach SQLite one
    // after the other. This checks the guarded update's outcome, not row-lock
    // contention between parallel PostgreSQL transactions.
    #[tokio::test]
    async fn concurrent_debits_cannot_overdraw() {
        let app = TestApp::spawn().await;
        let user = app.create_funded_user("ada@example.com", 10).await;
        let ledger = DbLedger::new(app.db.clone());

        let first = {
            let ledger = ledger.clone();
            let user_id = user.id;
            tokio::spawn(async move { ledger.debit(user_id, 7, "first", None).await })
        };
        let second = {
            let ledger = ledger.clone();
            let user_id = user.id;
            tokio::spawn(async move { ledger.debit(user_id, 7, "second", None).await })
        };

        let results = [first.await.unwrap(), second.await.unwrap()];

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            results
                .iter()
                .filter(|r| matches!(r, Err(LedgerError::InsufficientFunds { .. })))
                .count(),
            1
        );

        let statement = app.statement(user.id).await;
        assert_eq!(statement.balance, 3);
        assert_eq!(statement.total(TransactionKind::Debit), 7);
        statement.reconcile().unwrap();
    }

    #[tokio::test]
    async fn mutation_leaving_negative_balance_is_rolled_back() {
        let app = TestApp::spawn().await;
        let user = app.create_user("ada@example.com").await;

        // Corrupt the balance behind the ledger's back.
        user::Entity::update_many()
            .col_expr(user::Column::TokenBalance, Expr::value(-10i64))
            .filter(user::Column::Id.eq(user.id))
            .exec(&app.db)
            .await
            .unwrap();

        let err = app
            .ledger
            .credit(user.id, 3, "top-up", None)
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::InvariantViolation(_)), "{err}");
        let statement = app.statement(user.id).await;
        assert_eq!(statement.balance, -10);
        assert!(statement.history.is_empty());
    }
}

mod statement_endpoint {
    use super::*;

    #[tokio::test]
    async fn lists_entries_in_the_order_they_were_applied() {
        let app = TestApp::spawn().await;
        let user = app.create_funded_user("ada@example.com", 10).await;
        app.ledger.debit(user.id, 4, "first spend", None).await.unwrap();
        app.ledger.credit(user.id, 1, "bonus", None).await.unwrap();

        let res = app.get_with_token(routes::TOKENS, &user.token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["balance"], 7);
        let history = res.body["history"].as_array().unwrap();
        let reasons: Vec<&str> = history
            .iter()
            .map(|e| e["reason"].as_str().unwrap())
            .collect();
        assert_eq!(reasons, ["Top-up", "first spend", "bonus"]);
        let balances: Vec<i64> = history
            .iter()
            .map(|e| e["balance_after"].as_i64().unwrap())
            .collect();
        assert_eq!(balances, [10, 6, 7]);
    }

    #[tokio::test]
    async fn statements_are_private_to_each_user() {
        let app = TestApp::spawn().await;
        let ada = app.create_funded_user("ada@example.com", 10).await;
        let bob = app.create_user("bob@example.com").await;

        let res = app.get_with_token(routes::TOKENS, &bob.token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["balance"], 0);
        assert!(res.body["history"].as_array().unwrap().is_empty());
        assert_eq!(app.balance(ada.id).await, 10);
    }
}
