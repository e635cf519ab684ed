use std::time::{SystemTime, UNIX_EPOCH};

use social_client::{NewUser, PostPatch, SocialClient, SocialClientError};

fn unique_suffix() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock must be after unix epoch")
        .as_nanos();
    format!("{nanos}")
}

fn new_user(prefix: &str, suffix: &str) -> NewUser {
    NewUser {
        username: format!("{prefix}_{suffix}"),
        email: format!("{prefix}_{suffix}@example.com"),
        password: "password123".to_string(),
        profile: None,
    }
}

#[tokio::test]
#[ignore = "requires running HTTP server"]
async fn http_smoke_flow() {
    let base_url =
        std::env::var("SOCIAL_HTTP_URL").unwrap_or_else(|_| "http://127.0.0.1:8080".to_string());
    let mut client = SocialClient::new(base_url).expect("client must build");
    client.health().await.expect("server must be healthy");

    let suffix = unique_suffix();
    let reader = client
        .register(&new_user("reader", &suffix))
        .await
        .expect("register reader must succeed");
    let author = client
        .register(&new_user("author", &suffix))
        .await
        .expect("register author must succeed");
    assert_eq!(client.actor(), Some(author.id));

    let duplicate = client.register(&new_user("author", &suffix)).await;
    assert!(matches!(duplicate, Err(SocialClientError::Conflict(_))));

    let created = client
        .create_post("smoke title", "smoke content", None)
        .await
        .expect("create_post must succeed");
    assert_eq!(created.author.id, author.id);
    assert_eq!(created.excerpt, "smoke content");

    let fetched = client
        .get_post(created.id)
        .await
        .expect("get_post must succeed");
    assert_eq!(fetched.views, created.views + 1);

    let patched = client
        .patch_post(
            created.id,
            &PostPatch {
                title: Some("smoke title updated".to_string()),
                content: None,
            },
        )
        .await
        .expect("patch_post must succeed");
    assert_eq!(patched.title, "smoke title updated");
    assert_eq!(patched.content, "smoke content");

    client.set_actor(reader.id);

    let forbidden = client.delete_post(created.id).await;
    assert!(matches!(forbidden, Err(SocialClientError::Forbidden(_))));

    let follow = client.follow(author.id).await.expect("follow must succeed");
    assert!(follow.followed);
    assert_eq!(follow.followers_count, 1);

    let like = client
        .toggle_like(created.id)
        .await
        .expect("like must succeed");
    assert!(like.liked);
    assert_eq!(like.likes_count, 1);

    let commented = client
        .add_comment(created.id, "nice post")
        .await
        .expect("comment must succeed");
    assert_eq!(commented.comments_count, 1);

    let by_author = client
        .list_user_posts(author.id, 1, 10)
        .await
        .expect("list_user_posts must succeed");
    assert!(by_author.items.iter().any(|post| post.id == created.id));

    client.set_actor(author.id);
    let deleted = client
        .delete_post(created.id)
        .await
        .expect("delete_post must succeed");
    assert_eq!(deleted.id, created.id);

    let after_delete = client.get_post(created.id).await;
    assert!(matches!(after_delete, Err(SocialClientError::NotFound(_))));

    client
        .delete_user(author.id)
        .await
        .expect("delete author must succeed");
    assert_eq!(client.actor(), None);
    client
        .delete_user(reader.id)
        .await
        .expect("delete reader must succeed");
}
