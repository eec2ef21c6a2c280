use serde_json::json;

use crate::common::{TestApp, TestOptions, routes};

mod registration {
    use super::*;

    #[tokio::test]
    async fn new_user_starts_with_an_empty_account() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({
                    "email": "ada@example.com",
                    "full_name": "Ada Lovelace",
                    "password": "securepass",
                }),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["email"], "ada@example.com");
        assert_eq!(res.body["tokens"], 0);

        let statement = app.statement(res.id()).await;
        assert_eq!(statement.balance, 0);
        assert!(statement.history.is_empty());
    }

    #[tokio::test]
    async fn sign_up_grant_is_recorded_in_the_ledger() {
        let app = TestApp::spawn_with(TestOptions {
            signup_grant: 25,
            ..Default::default()
        })
        .await;

        let user = app.create_user("ada@example.com").await;

        let res = app.get_with_token(routes::TOKENS, &user.token).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["balance"], 25);
        let history = res.body["history"].as_array().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0]["kind"], "Credit");
        assert_eq!(history[0]["amount"], 25);
        assert_eq!(history[0]["reason"], "Sign-up grant");
        assert_eq!(history[0]["balance_after"], 25);
    }

    #[tokio::test]
    async fn failed_grant_leaves_no_account_behind() {
        let app = TestApp::spawn_with(TestOptions {
            signup_grant: 25,
            ..Default::default()
        })
        .await;
        let body = json!({
            "email": "ada@example.com",
            "full_name": "Ada Lovelace",
            "password": "securepass",
        });

        app.ledger.fail_credits(true);
        let res = app.post_without_token(routes::REGISTER, &body).await;
        assert_eq!(res.status, 500, "{}", res.text);
        assert_eq!(res.body["code"], "INTERNAL_ERROR");

        let login = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "ada@example.com", "password": "securepass"}),
            )
            .await;
        assert_eq!(login.status, 401);

        app.ledger.fail_credits(false);
        let res = app.post_without_token(routes::REGISTER, &body).await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["tokens"], 25);

        let statement = app.statement(res.id()).await;
        assert_eq!(statement.balance, 25);
        assert_eq!(statement.history.len(), 1);
        assert_eq!(statement.history[0].reason, "Sign-up grant");
    }

    #[tokio::test]
    async fn cannot_register_the_same_email_twice() {
        let app = TestApp::spawn().await;
        app.create_user("ada@example.com").await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({
                    "email": "ADA@example.com",
                    "full_name": "Someone Else",
                    "password": "securepass",
                }),
            )
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "EMAIL_TAKEN");
    }

    #[tokio::test]
    async fn rejects_invalid_fields() {
        let app = TestApp::spawn().await;

        for body in [
            json!({"email": "not-an-email", "full_name": "Ada", "password": "securepass"}),
            json!({"email": "ada@example.com", "full_name": "", "password": "securepass"}),
            json!({"email": "ada@example.com", "full_name": "Ada", "password": "short"}),
            json!({"email": "ada@example.com"}),
        ] {
            let res = app.post_without_token(routes::REGISTER, &body).await;
            assert_eq!(res.status, 400, "accepted {body}");
            assert_eq!(res.body["code"], "VALIDATION_ERROR");
        }
    }
}

mod login {
    use super::*;

    #[tokio::test]
    async fn login_returns_a_token_that_authenticates() {
        let app = TestApp::spawn().await;
        let user = app.create_user("ada@example.com").await;

        let res = app.get_with_token(routes::ME, &user.token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["id"], user.id);
        assert_eq!(res.body["email"], "ada@example.com");
        assert_eq!(res.body["full_name"], "Test Student");
        assert_eq!(res.body["tokens"], 0);
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let app = TestApp::spawn().await;
        app.create_user("ada@example.com").await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "ada@example.com", "password": "wrongpass"}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn unknown_email_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "nobody@example.com", "password": "securepass"}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }
}

mod tokens {
    use super::*;

    #[tokio::test]
    async fn protected_routes_require_a_token() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::ME).await;
        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");

        let res = app.get_without_token(routes::DOCS).await;
        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get_with_token(routes::TOKENS, "not.a.jwt").await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }
}
