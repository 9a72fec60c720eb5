//! HTTP surface over a real remote.

use std::time::Duration;

use gitchat::comments::{BlockLayout, Comment, CommentStore};
use gitchat::git::GitSession;
use gitchat::http::Server;
use gitchat::worker::CommentWorker;
use serde_json::{Value, json};
use tokio::sync::oneshot;

use crate::fixtures::git::Remote;

struct Running {
    base: String,
    stop: oneshot::Sender<()>,
    task: tokio::task::JoinHandle<()>,
}

async fn start(remote: &Remote) -> Running {
    let session = GitSession::clone_remote(&remote.settings()).expect("clone");
    let (worker, _join) =
        CommentWorker::spawn(CommentStore::new(session, BlockLayout::default())).unwrap();
    let worker = worker.with_timeout(Some(Duration::from_secs(60)));

    let server = Server::bind("127.0.0.1:0", worker, "v1").await.expect("bind");
    let addr = server.local_addr().expect("local addr");
    let (stop, stopped) = oneshot::channel::<()>();
    let task = tokio::spawn(async move {
        server
            .run_until(async {
                let _ = stopped.await;
            })
            .await
            .expect("server runs");
    });
    Running {
        base: format!("http://{addr}/"),
        stop,
        task,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn post_stores_comment_on_remote() {
    let remote = Remote::seeded();
    let running = start(&remote).await;
    let client = reqwest::Client::new();

    let response = client
        .post(&running.base)
        .json(&json!({
            "version": "v1",
            "author": "alice",
            "text": "over http",
            "color": "#abcdef",
        }))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.expect("json body");
    let returned: Comment = serde_json::from_value(body["data"].clone()).expect("comment");

    let stored: Vec<Comment> = serde_json::from_slice(
        &remote
            .file("data/comments/v1/blocks/1.json")
            .expect("block on remote"),
    )
    .unwrap();
    assert_eq!(stored, vec![returned]);

    let _ = running.stop.send(());
    running.task.await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn invalid_requests_never_reach_the_remote() {
    let remote = Remote::seeded();
    let tip = remote.tip();
    let running = start(&remote).await;
    let client = reqwest::Client::new();

    let response = client
        .post(&running.base)
        .body("definitely not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["message"], "Incorrect body data");

    let response = client
        .post(&running.base)
        .json(&json!({"version": "v9", "author": "a", "text": "b"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["message"], "Incorrect field: version");

    let response = client.get(&running.base).send().await.unwrap();
    assert_eq!(response.status(), 405);

    assert_eq!(remote.tip(), tip);

    let _ = running.stop.send(());
    running.task.await.unwrap();
}
