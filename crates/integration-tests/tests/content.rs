//! Content API integration tests.
//!
//! Expect the fixture content from `jj-cli seed all`.

use joy_junction_integration_tests::{client, data, url};
use reqwest::StatusCode;
use serde_json::Value;

async fn get_json(path: &str) -> (StatusCode, Value) {
    let resp = client()
        .get(url(path))
        .send()
        .await
        .expect("Failed to send request");
    let status = resp.status();
    let body = resp.json().await.expect("Response is not JSON");
    (status, body)
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_health() {
    let resp = client()
        .get(url("/health"))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.expect("Failed to read body"), "ok");

    let resp = client()
        .get(url("/health/ready"))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_blogs_newest_first() {
    let (status, body) = get_json("/api/blogs").await;
    assert_eq!(status, StatusCode::OK);

    let blogs = data(&body).as_array().expect("data is an array");
    assert!(!blogs.is_empty());

    let dates: Vec<&str> = blogs
        .iter()
        .map(|b| b["publishedAt"].as_str().expect("publishedAt"))
        .collect();
    let mut sorted = dates.clone();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    assert_eq!(dates, sorted);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_blog_limit_and_category() {
    let (status, body) = get_json("/api/blogs?limit=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data(&body).as_array().expect("array").len(), 1);

    let (_, categories) = get_json("/api/blogs/categories").await;
    let category = data(&categories)[0].as_str().expect("a category").to_string();

    let (_, body) = get_json(&format!("/api/blogs?category={}", category.replace(' ', "%20"))).await;
    assert!(
        data(&body)
            .as_array()
            .expect("array")
            .iter()
            .all(|b| b["category"] == category.as_str())
    );

    let (status, body) = get_json("/api/blogs?limit=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"].is_array());
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_blog_by_slug() {
    let (_, list) = get_json("/api/blogs?limit=1").await;
    let slug = data(&list)[0]["id"].as_str().expect("id").to_string();

    let (status, body) = get_json(&format!("/api/blogs/{slug}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data(&body)["id"], slug.as_str());

    let (status, body) = get_json("/api/blogs/no-such-post").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_hero_slides_mobile_filter() {
    let (status, body) = get_json("/api/hero-slides?mobile=true").await;
    assert_eq!(status, StatusCode::OK);
    let slides = data(&body).as_array().expect("array");
    assert!(slides.iter().all(|s| s["isForMobile"] == true));

    let orders: Vec<i64> = slides
        .iter()
        .map(|s| s["sortOrder"].as_i64().expect("sortOrder"))
        .collect();
    assert!(orders.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_featured_testimonials() {
    let (status, body) = get_json("/api/testimonials?featured=true").await;
    assert_eq!(status, StatusCode::OK);
    let testimonials = data(&body).as_array().expect("array");
    assert!(testimonials.iter().all(|t| t["isFeatured"] == true));
    assert!(
        testimonials
            .iter()
            .all(|t| (1..=5).contains(&t["rating"].as_i64().expect("rating")))
    );
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_only_active_offers() {
    let (status, body) = get_json("/api/offers").await;
    assert_eq!(status, StatusCode::OK);
    assert!(
        data(&body)
            .as_array()
            .expect("array")
            .iter()
            .all(|o| o["isActive"] == true)
    );
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_search_blogs() {
    let (status, body) = get_json("/api/search?q=toys&type=blog").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data(&body)["query"], "toys");
    assert!(
        data(&body)["hits"]
            .as_array()
            .expect("array")
            .iter()
            .all(|h| h["indexType"] == "blog")
    );
}
