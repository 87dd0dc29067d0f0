//! Basic example demonstrating GET and POST requests with hooks.
//!
//! This example shows how to:
//! - Create a client and register hooks
//! - Make a GET request decoded from JSON
//! - Make a POST request with a JSON body
//! - Inspect status, headers and the body outcome
//!
//! Run with: `cargo run --example basic_request`

use quester::{Client, Error, LoggingHooks, ResponseBody};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Post {
    #[serde(rename = "userId")]
    user_id: u32,
    id: u32,
    title: String,
    body: String,
}

#[derive(Debug, Serialize)]
struct NewPost {
    title: String,
    body: String,
    #[serde(rename = "userId")]
    user_id: u32,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("quester=debug,quester::trace=info,basic_request=info")
        .init();

    let client = Client::new("https://jsonplaceholder.typicode.com")?;
    client.use_hook(LoggingHooks);

    println!("=== GET Request Example ===");
    let response = client
        .request()
        .path("/posts/1")
        .enable_trace()
        .timeout(Duration::from_secs(10))
        .execute::<Post>()
        .await?;

    println!("Status: {}", response.status_text);
    match &response.body {
        ResponseBody::Decoded(post) => println!("Title: {}", post.title),
        ResponseBody::Raw(bytes) => println!("Undecoded body: {} bytes", bytes.len()),
        ResponseBody::Unread => {}
    }
    println!();

    println!("=== POST Request Example ===");
    let new_post = NewPost {
        title: "My New Post".to_string(),
        body: "This is the content of my new post!".to_string(),
        user_id: 1,
    };

    let response = client
        .request()
        .method("post")
        .path("/posts")
        .query("source", "demo")
        .json(&new_post)
        .execute::<Post>()
        .await?;

    println!("Status: {}", response.status);
    println!("Content-Type: {:?}", response.header("content-type"));
    if let Some(post) = response.data() {
        println!("Created post ID: {}", post.id);
    }

    Ok(())
}
