use serde_json::json;

use crate::common::{TestApp, routes};

mod listing {
    use super::*;

    #[tokio::test]
    async fn new_user_has_no_documents_and_an_empty_folder() {
        let app = TestApp::spawn().await;
        let user = app.create_user("ada@example.com").await;

        let docs = app.get_with_token(routes::DOCS, &user.token).await;
        assert_eq!(docs.status, 200, "{}", docs.text);
        assert_eq!(docs.body["total"], 0);
        assert!(docs.body["files"].as_array().unwrap().is_empty());

        let folder = app.get_with_token(routes::FOLDER, &user.token).await;
        assert_eq!(folder.status, 200, "{}", folder.text);
        assert_eq!(folder.body["document_count"], 0);
    }

    #[tokio::test]
    async fn documents_are_listed_oldest_first_with_text() {
        let app = TestApp::spawn().await;
        let user = app.create_funded_user("ada@example.com", 10).await;
        let first = app.upload_image(&user, "Physics", "Optics").await;
        let second = app.upload_image(&user, "Physics", "Waves").await;

        let docs = app.get_with_token(routes::DOCS, &user.token).await;

        assert_eq!(docs.body["total"], 2);
        assert_eq!(docs.body["files"][0]["id"], first.as_str());
        assert_eq!(docs.body["files"][1]["id"], second.as_str());
        assert_eq!(
            docs.body["files"][0]["extracted_text"],
            "Extracted image text from board.png"
        );

        let folder = app.get_with_token(routes::FOLDER, &user.token).await;
        assert_eq!(folder.body["document_count"], 2);
        assert_eq!(folder.body["entries"][0]["document_id"], first.as_str());
        assert_eq!(folder.body["entries"][0]["topic"], "Optics");
        assert_eq!(folder.body["entries"][1]["topic"], "Waves");
    }

    #[tokio::test]
    async fn users_only_see_their_own_documents() {
        let app = TestApp::spawn().await;
        let ada = app.create_funded_user("ada@example.com", 10).await;
        let bob = app.create_user("bob@example.com").await;
        app.upload_image(&ada, "Physics", "Optics").await;

        let docs = app.get_with_token(routes::DOCS, &bob.token).await;
        assert_eq!(docs.body["total"], 0);
        let folder = app.get_with_token(routes::FOLDER, &bob.token).await;
        assert_eq!(folder.body["document_count"], 0);
    }
}

mod update {
    use super::*;

    #[tokio::test]
    async fn update_changes_document_folder_and_index() {
        let app = TestApp::spawn().await;
        let user = app.create_funded_user("ada@example.com", 10).await;
        let id = app.upload_image(&user, "Physics", "Optics").await;

        let res = app
            .put_with_token(
                &routes::doc(&id),
                &json!({"topic": "Geometric Optics", "description": ""}),
                &user.token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["topic"], "Geometric Optics");
        assert_eq!(res.body["course"], "Physics");
        // Empty strings keep the current value.
        assert_eq!(res.body["description"], "whiteboard");

        let folder = app.get_with_token(routes::FOLDER, &user.token).await;
        assert_eq!(folder.body["entries"][0]["topic"], "Geometric Optics");

        let updates = app.gateway.index_updates.lock().unwrap().clone();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].old_topic, "Optics");
        assert_eq!(updates[0].new_topic, "Geometric Optics");
        assert_eq!(updates[0].user_email, "ada@example.com");
        assert_eq!(updates[0].file_type, "image");
    }

    #[tokio::test]
    async fn index_failure_rolls_the_update_back() {
        let app = TestApp::spawn().await;
        let user = app.create_funded_user("ada@example.com", 10).await;
        let id = app.upload_image(&user, "Physics", "Optics").await;
        app.gateway.fail_index_calls(true);

        let res = app
            .put_with_token(&routes::doc(&id), &json!({"topic": "Waves"}), &user.token)
            .await;

        assert_eq!(res.status, 502, "{}", res.text);
        assert_eq!(res.body["code"], "GATEWAY_ERROR");

        let docs = app.get_with_token(routes::DOCS, &user.token).await;
        assert_eq!(docs.body["files"][0]["topic"], "Optics");
        let folder = app.get_with_token(routes::FOLDER, &user.token).await;
        assert_eq!(folder.body["entries"][0]["topic"], "Optics");
    }

    #[tokio::test]
    async fn cannot_update_someone_elses_document() {
        let app = TestApp::spawn().await;
        let ada = app.create_funded_user("ada@example.com", 10).await;
        let bob = app.create_user("bob@example.com").await;
        let id = app.upload_image(&ada, "Physics", "Optics").await;

        let res = app
            .put_with_token(&routes::doc(&id), &json!({"topic": "Mine now"}), &bob.token)
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
        assert!(app.gateway.index_updates.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_overlong_fields() {
        let app = TestApp::spawn().await;
        let user = app.create_funded_user("ada@example.com", 10).await;
        let id = app.upload_image(&user, "Physics", "Optics").await;

        let res = app
            .put_with_token(
                &routes::doc(&id),
                &json!({"name": "x".repeat(300)}),
                &user.token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn delete_removes_document_folder_entry_and_index() {
        let app = TestApp::spawn().await;
        let user = app.create_funded_user("ada@example.com", 10).await;
        let id = app.upload_image(&user, "Physics", "Optics").await;
        let kept = app.upload_image(&user, "Physics", "Waves").await;

        let res = app.delete_with_token(&routes::doc(&id), &user.token).await;
        assert_eq!(res.status, 204, "{}", res.text);

        let docs = app.get_with_token(routes::DOCS, &user.token).await;
        assert_eq!(docs.body["total"], 1);
        assert_eq!(docs.body["files"][0]["id"], kept.as_str());
        let folder = app.get_with_token(routes::FOLDER, &user.token).await;
        assert_eq!(folder.body["document_count"], 1);

        let deletes = app.gateway.index_deletes.lock().unwrap().clone();
        assert_eq!(deletes.len(), 1);
        assert_eq!(deletes[0].course, "Physics");
        assert_eq!(deletes[0].topic, "Optics");

        let again = app.delete_with_token(&routes::doc(&id), &user.token).await;
        assert_eq!(again.status, 404);
    }

    #[tokio::test]
    async fn index_failure_keeps_the_document() {
        let app = TestApp::spawn().await;
        let user = app.create_funded_user("ada@example.com", 10).await;
        let id = app.upload_image(&user, "Physics", "Optics").await;
        app.gateway.fail_index_calls(true);

        let res = app.delete_with_token(&routes::doc(&id), &user.token).await;

        assert_eq!(res.status, 502, "{}", res.text);
        let docs = app.get_with_token(routes::DOCS, &user.token).await;
        assert_eq!(docs.body["total"], 1);
        let folder = app.get_with_token(routes::FOLDER, &user.token).await;
        assert_eq!(folder.body["document_count"], 1);
    }

    #[tokio::test]
    async fn cannot_delete_someone_elses_document() {
        let app = TestApp::spawn().await;
        let ada = app.create_funded_user("ada@example.com", 10).await;
        let bob = app.create_user("bob@example.com").await;
        let id = app.upload_image(&ada, "Physics", "Optics").await;

        let res = app.delete_with_token(&routes::doc(&id), &bob.token).await;
        assert_eq!(res.status, 404);

        let docs = app.get_with_token(routes::DOCS, &ada.token).await;
        assert_eq!(docs.body["total"], 1);
    }

    #[tokio::test]
    async fn unknown_document_is_not_found() {
        let app = TestApp::spawn().await;
        let user = app.create_user("ada@example.com").await;

        let res = app
            .delete_with_token(
                &routes::doc("0190a6c4-0000-7000-8000-000000000000"),
                &user.token,
            )
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}
