use reqwest::multipart::Form;

use crate::common::{TestApp, image_part, routes};

mod template_create {
    use super::*;

    #[tokio::test]
    async fn create_then_fetch_round_trips_fields() {
        let app = TestApp::spawn().await;

        let res = app
            .post_json(
                routes::CREATE,
                &serde_json::json!({
                    "title": "Sale",
                    "content": "<p>Hi</p>",
                    "footer": "Bye",
                    "imageUrls": [],
                }),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        let id = res.id();
        assert!(!id.is_empty());

        let fetched = app.get(&routes::get(&id)).await;
        assert_eq!(fetched.status, 200);
        assert_eq!(fetched.body["id"].as_str().unwrap(), id);
        assert_eq!(fetched.body["title"].as_str().unwrap(), "Sale");
        assert_eq!(fetched.body["content"].as_str().unwrap(), "<p>Hi</p>");
        assert_eq!(fetched.body["footer"].as_str().unwrap(), "Bye");
        assert!(fetched.image_urls().is_empty());
        assert!(fetched.body["createdAt"].as_str().is_some());
    }

    #[tokio::test]
    async fn create_normalizes_relative_image_urls() {
        let app = TestApp::spawn().await;

        let id = app
            .create_template(
                "With images",
                &["/uploads/1.png", "https://cdn.example.com/banner.jpg"],
            )
            .await;

        let fetched = app.get(&routes::get(&id)).await;
        assert_eq!(
            fetched.image_urls(),
            vec![
                app.absolute("/uploads/1.png"),
                "https://cdn.example.com/banner.jpg".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn footer_and_images_are_optional() {
        let app = TestApp::spawn().await;

        let res = app
            .post_json(
                routes::CREATE,
                &serde_json::json!({"title": "Minimal", "content": "<p>x</p>"}),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["footer"].as_str().unwrap(), "");
        assert!(res.image_urls().is_empty());
    }

    #[tokio::test]
    async fn missing_title_or_content_is_rejected_and_not_persisted() {
        let app = TestApp::spawn().await;

        for body in [
            serde_json::json!({"content": "<p>x</p>"}),
            serde_json::json!({"title": "No content"}),
            serde_json::json!({"title": "", "content": "<p>x</p>"}),
            serde_json::json!({"title": "Blank", "content": ""}),
        ] {
            let res = app.post_json(routes::CREATE, &body).await;
            assert_eq!(res.status, 400, "{body} should be rejected");
            assert_eq!(res.body["code"].as_str().unwrap(), "VALIDATION_ERROR");
        }

        let list = app.get(routes::LIST).await;
        assert_eq!(list.status, 200);
        assert_eq!(list.body.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn malformed_json_is_a_validation_error() {
        let app = TestApp::spawn().await;

        let res = app
            .post_raw(routes::CREATE, "application/json", "{\"title\": ")
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"].as_str().unwrap(), "VALIDATION_ERROR");
    }
}

mod template_read {
    use super::*;

    #[tokio::test]
    async fn unknown_or_malformed_id_is_not_found() {
        let app = TestApp::spawn().await;

        for id in ["01936f0e-1234-7abc-8000-000000000001", "64f1c2e9a1b2c3d4e5f60718"] {
            let res = app.get(&routes::get(id)).await;
            assert_eq!(res.status, 404, "{id}");
            assert_eq!(res.body["code"].as_str().unwrap(), "NOT_FOUND");
        }
    }

    #[tokio::test]
    async fn list_returns_all_in_insertion_order() {
        let app = TestApp::spawn().await;

        let first = app.create_template("First", &["/uploads/a.png"]).await;
        let second = app.create_template("Second", &[]).await;
        let third = app.create_template("Third", &[]).await;

        let res = app.get(routes::LIST).await;
        assert_eq!(res.status, 200);

        let items = res.body.as_array().unwrap();
        let ids: Vec<&str> = items.iter().map(|t| t["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec![first.as_str(), second.as_str(), third.as_str()]);
        assert_eq!(
            items[0]["imageUrls"][0].as_str().unwrap(),
            app.absolute("/uploads/a.png")
        );
    }
}

mod template_update {
    use super::*;

    #[tokio::test]
    async fn update_without_image_urls_keeps_stored_images() {
        let app = TestApp::spawn().await;
        let id = app.create_template("Old title", &["/uploads/keep.png"]).await;

        let res = app
            .put_json(
                &routes::update(&id),
                &serde_json::json!({"title": "New title", "footer": "New footer"}),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["title"].as_str().unwrap(), "New title");
        assert_eq!(res.body["footer"].as_str().unwrap(), "New footer");
        assert_eq!(res.body["content"].as_str().unwrap(), "<p>Hello</p>");
        assert_eq!(res.image_urls(), vec![app.absolute("/uploads/keep.png")]);
    }

    #[tokio::test]
    async fn supplied_image_urls_replace_stored_list() {
        let app = TestApp::spawn().await;
        let id = app
            .create_template("Replace", &["/uploads/a.png", "/uploads/b.png"])
            .await;

        let res = app
            .put_json(
                &routes::update(&id),
                &serde_json::json!({"imageUrls": ["https://cdn.example.com/c.png"]}),
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.image_urls(), vec!["https://cdn.example.com/c.png"]);

        let fetched = app.get(&routes::get(&id)).await;
        assert_eq!(fetched.image_urls(), vec!["https://cdn.example.com/c.png"]);
    }

    #[tokio::test]
    async fn update_does_not_require_title_or_content() {
        let app = TestApp::spawn().await;
        let id = app.create_template("Title", &[]).await;

        let res = app
            .put_json(&routes::update(&id), &serde_json::json!({"title": ""}))
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["title"].as_str().unwrap(), "");
    }

    #[tokio::test]
    async fn new_image_is_appended_to_supplied_urls() {
        let app = TestApp::spawn().await;
        let id = app
            .create_template("Multipart", &["/uploads/old.png", "/uploads/dropped.png"])
            .await;

        let form = Form::new()
            .text("title", "Updated")
            .text("imageUrls", "/uploads/old.png")
            .part("image", image_part("new.png", b"NEW_PNG".to_vec()));
        let res = app.put_multipart(&routes::update(&id), form).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["title"].as_str().unwrap(), "Updated");

        let urls = res.image_urls();
        assert_eq!(urls.len(), 2);
        assert_eq!(urls[0], app.absolute("/uploads/old.png"));
        assert!(urls[1].starts_with(&app.absolute("/uploads/")));
        assert!(urls[1].ends_with(".png"));

        let (status, _, bytes) = app.get_bytes(&urls[1]).await;
        assert_eq!(status, 200);
        assert_eq!(bytes, b"NEW_PNG");
    }

    #[tokio::test]
    async fn new_image_without_image_urls_extends_stored_list() {
        let app = TestApp::spawn().await;
        let id = app.create_template("Append", &["/uploads/first.png"]).await;

        let form = Form::new().part("image", image_part("second.gif", b"GIF89a".to_vec()));
        let res = app.put_multipart(&routes::update(&id), form).await;

        assert_eq!(res.status, 200, "{}", res.text);
        let urls = res.image_urls();
        assert_eq!(urls.len(), 2);
        assert_eq!(urls[0], app.absolute("/uploads/first.png"));
        assert!(urls[1].ends_with(".gif"));
        assert_eq!(res.body["title"].as_str().unwrap(), "Append");
    }

    #[tokio::test]
    async fn multipart_image_urls_accept_json_array() {
        let app = TestApp::spawn().await;
        let id = app.create_template("Json field", &[]).await;

        let form = Form::new().text(
            "imageUrls",
            r#"["/uploads/x.png", "https://cdn.example.com/y.png"]"#,
        );
        let res = app.put_multipart(&routes::update(&id), form).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(
            res.image_urls(),
            vec![
                app.absolute("/uploads/x.png"),
                "https://cdn.example.com/y.png".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn empty_image_field_is_ignored() {
        let app = TestApp::spawn().await;
        let id = app.create_template("Empty file", &["/uploads/a.png"]).await;

        let form = Form::new()
            .text("footer", "Changed")
            .part("image", image_part("blank.png", Vec::new()));
        let res = app.put_multipart(&routes::update(&id), form).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.image_urls(), vec![app.absolute("/uploads/a.png")]);
        assert!(app.uploaded_files().is_empty());
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found_and_writes_no_file() {
        let app = TestApp::spawn().await;

        let res = app
            .put_json(
                &routes::update("01936f0e-1234-7abc-8000-000000000001"),
                &serde_json::json!({"title": "Ghost"}),
            )
            .await;
        assert_eq!(res.status, 404);

        let form = Form::new().part("image", image_part("ghost.png", b"BOO".to_vec()));
        let res = app
            .put_multipart(&routes::update("01936f0e-1234-7abc-8000-000000000001"), form)
            .await;
        assert_eq!(res.status, 404);
        assert!(app.uploaded_files().is_empty());
    }
}

mod template_update_timestamps {
    use chrono::{DateTime, Utc};

    use super::*;

    fn timestamp(body: &serde_json::Value, field: &str) -> DateTime<Utc> {
        body[field]
            .as_str()
            .unwrap()
            .parse()
            .unwrap_or_else(|e| panic!("{field} should be RFC 3339: {e}"))
    }

    #[tokio::test]
    async fn update_refreshes_updated_at_and_keeps_created_at() {
        let app = TestApp::spawn().await;
        let id = app.create_template("Stamped", &[]).await;
        let before = app.get(&routes::get(&id)).await;
        let created_at = timestamp(&before.body, "createdAt");

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let res = app
            .put_json(&routes::update(&id), &serde_json::json!({"footer": "Later"}))
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        assert_eq!(timestamp(&res.body, "createdAt"), created_at);
        assert!(timestamp(&res.body, "updatedAt") > created_at);
        assert!(timestamp(&res.body, "updatedAt") > timestamp(&before.body, "updatedAt"));

        let after = app.get(&routes::get(&id)).await;
        assert_eq!(timestamp(&after.body, "createdAt"), created_at);
        assert_eq!(after.body["updatedAt"], res.body["updatedAt"]);
    }
}

mod template_update_concurrency {
    use tokio::task::JoinSet;

    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn parallel_field_updates_all_succeed() {
        let app = TestApp::spawn().await;
        let id = app.create_template("Busy", &["/uploads/keep.png"]).await;

        let mut requests = JoinSet::new();
        for i in 0..16 {
            let client = app.client.clone();
            let url = app.url(&routes::update(&id));
            requests.spawn(async move {
                client
                    .put(url)
                    .json(&serde_json::json!({"footer": format!("f{i}")}))
                    .send()
                    .await
                    .unwrap()
                    .status()
                    .as_u16()
            });
        }
        let statuses = requests.join_all().await;
        assert!(statuses.iter().all(|s| *s == 200), "statuses={statuses:?}");

        let fetched = app.get(&routes::get(&id)).await;
        assert!(fetched.body["footer"].as_str().unwrap().starts_with('f'));
        assert_eq!(fetched.image_urls(), vec![app.absolute("/uploads/keep.png")]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn parallel_image_appends_keep_every_image() {
        let app = TestApp::spawn().await;
        let id = app.create_template("Gallery", &["/uploads/first.png"]).await;

        let mut requests = JoinSet::new();
        for i in 0..6 {
            let client = app.client.clone();
            let url = app.url(&routes::update(&id));
            requests.spawn(async move {
                let form = Form::new().part("image", image_part("shot.png", vec![i as u8 + 1; 8]));
                client
                    .put(url)
                    .multipart(form)
                    .send()
                    .await
                    .unwrap()
                    .status()
                    .as_u16()
            });
        }
        let statuses = requests.join_all().await;
        assert!(statuses.iter().all(|s| *s == 200), "statuses={statuses:?}");

        let urls = app.get(&routes::get(&id)).await.image_urls();
        assert_eq!(urls.len(), 7, "{urls:?}");
        assert_eq!(urls[0], app.absolute("/uploads/first.png"));
        assert_eq!(app.uploaded_files().len(), 6);
    }
}

mod template_delete {
    use super::*;

    #[tokio::test]
    async fn delete_removes_template_and_second_delete_is_not_found() {
        let app = TestApp::spawn().await;
        let keep = app.create_template("Keep", &[]).await;
        let gone = app.create_template("Gone", &[]).await;

        let res = app.delete(&routes::delete(&gone)).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["message"].as_str().unwrap(), "Template deleted");

        let list = app.get(routes::LIST).await;
        let ids: Vec<&str> = list
            .body
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec![keep.as_str()]);

        assert_eq!(app.get(&routes::get(&gone)).await.status, 404);
        assert_eq!(app.delete(&routes::delete(&gone)).await.status, 404);
    }

    #[tokio::test]
    async fn delete_leaves_image_files_in_place() {
        let app = TestApp::spawn().await;

        let upload = app.upload_image("kept.png", b"PNG".to_vec()).await;
        assert_eq!(upload.status, 200, "{}", upload.text);
        let image_url = upload.body["imageUrl"].as_str().unwrap().to_string();

        let id = app.create_template("Has image", &[image_url.as_str()]).await;
        assert_eq!(app.delete(&routes::delete(&id)).await.status, 200);

        assert_eq!(app.uploaded_files().len(), 1);
        let (status, _, bytes) = app.get_bytes(&image_url).await;
        assert_eq!(status, 200);
        assert_eq!(bytes, b"PNG");
    }
}
