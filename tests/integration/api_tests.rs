//! API integration tests
//!
//! These drive a running server with the bootstrap admin account
//! (`admin` / `admin`). Run with: cargo test -- --ignored

use chrono::{Duration, Local};
use reqwest::{redirect::Policy, Client, StatusCode};
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080";

/// Client that reports redirects instead of following them
fn client() -> Client {
    Client::builder()
        .redirect(Policy::none())
        .cookie_store(true)
        .build()
        .expect("Failed to build client")
}

async fn login(client: &Client) -> (String, i64) {
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "login": "admin",
            "password": "admin"
        }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    let token = body["token"].as_str().expect("No token in response").to_string();
    let user_id = body["user"]["id"].as_i64().expect("No user id in response");
    (token, user_id)
}

async fn create_realtor(client: &Client, token: &str, last_name: &str) -> i64 {
    let response = client
        .post(format!("{}/admin/realtors", BASE_URL))
        .bearer_auth(token)
        .json(&json!({
            "first_name": "Test",
            "last_name": last_name
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.expect("Failed to parse response");
    body["id"].as_i64().expect("No realtor id")
}

async fn create_listing(client: &Client, token: &str, realtor_id: i64, title: &str) -> i64 {
    let response = client
        .post(format!("{}/admin/listings", BASE_URL))
        .bearer_auth(token)
        .json(&json!({
            "title": title,
            "realtor_id": realtor_id,
            "summary": "Integration test listing"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.expect("Failed to parse response");
    body["id"].as_i64().expect("No listing id")
}

async fn create_available_instance(client: &Client, token: &str, listing_id: i64) -> String {
    let response = client
        .post(format!("{}/admin/listinginstances", BASE_URL))
        .bearer_auth(token)
        .json(&json!({
            "listing_id": listing_id,
            "imprint": "Test Press, 2024",
            "status": "a"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.expect("Failed to parse response");
    body["instance"]["id"].as_str().expect("No instance id").to_string()
}

async fn create_instance(client: &Client, token: &str, instance: Value) -> String {
    let response = client
        .post(format!("{}/admin/listinginstances", BASE_URL))
        .bearer_auth(token)
        .json(&instance)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.expect("Failed to parse response");
    body["instance"]["id"].as_str().expect("No instance id").to_string()
}

async fn create_reader(client: &Client, token: &str, login: &str) -> i64 {
    let response = client
        .post(format!("{}/admin/users", BASE_URL))
        .bearer_auth(token)
        .json(&json!({
            "login": login,
            "password": "reader-password",
            "account_type": "reader"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.expect("Failed to parse response");
    body["id"].as_i64().expect("No user id")
}

/// Every item of a paginated page listing, in order
async fn all_pages(client: &Client, token: &str, path: &str) -> Vec<Value> {
    let mut items = Vec::new();
    let mut page = 1;
    loop {
        let body: Value = client
            .get(format!("{}{}?page={}", BASE_URL, path, page))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to send request")
            .json()
            .await
            .expect("Failed to parse response");
        items.extend(body["items"].as_array().expect("No items").iter().cloned());
        if page >= body["num_pages"].as_i64().expect("No page count") {
            return items;
        }
        page += 1;
    }
}

fn unique_suffix() -> i64 {
    Local::now().timestamp_millis()
}

/// Messages currently pending on the realtor list
async fn realtor_list_messages(client: &Client, token: &str) -> Vec<String> {
    let body: Value = client
        .get(format!("{}/realtors", BASE_URL))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    body["messages"]
        .as_array()
        .expect("No messages")
        .iter()
        .filter_map(|m| m["text"].as_str().map(str::to_string))
        .collect()
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_readiness_check() {
    let response = Client::new()
        .get(format!("{}/ready", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
#[ignore]
async fn test_login() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "login": "admin",
            "password": "admin"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["token"].is_string());
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["user"]["account_type"], "admin");
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "login": "admin",
            "password": "wrong"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_home_counts_visits_per_session() {
    let client = client();

    let mut shown = Vec::new();
    for _ in 0..3 {
        let body: Value = client
            .get(format!("{}/", BASE_URL))
            .send()
            .await
            .expect("Failed to send request")
            .json()
            .await
            .expect("Failed to parse response");
        assert!(body["num_listings"].is_i64());
        assert!(body["num_instances_available"].is_i64());
        shown.push(body["num_visits"].as_i64().expect("No visit count"));
    }
    assert_eq!(shown, vec![0, 1, 2]);

    // A new session starts over
    let body: Value = Client::new()
        .get(format!("{}/", BASE_URL))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(body["num_visits"], 0);
}

#[tokio::test]
#[ignore]
async fn test_catalog_pages_require_authentication() {
    let client = Client::new();

    for path in ["/listings", "/listings/1", "/realtors", "/realtors/1", "/mylistings"] {
        let response = client
            .get(format!("{}{}", BASE_URL, path))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", path);
    }
}

#[tokio::test]
#[ignore]
async fn test_available_instances_are_public() {
    let response = Client::new()
        .get(format!("{}/listinginstances/available", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["page"], 1);
    assert_eq!(body["per_page"], 10);
    for item in body["items"].as_array().expect("No items") {
        assert_eq!(item["status"], "a");
    }
}

#[tokio::test]
#[ignore]
async fn test_available_instances_sorted_by_title() {
    let client = client();
    let (token, _) = login(&client).await;
    let suffix = unique_suffix();

    let realtor = create_realtor(&client, &token, "Shelver").await;
    let second = create_listing(&client, &token, realtor, &format!("Shelf B {}", suffix)).await;
    let first = create_listing(&client, &token, realtor, &format!("Shelf A {}", suffix)).await;
    let second_instance = create_available_instance(&client, &token, second).await;
    let first_instance = create_available_instance(&client, &token, first).await;

    let items = all_pages(&client, &token, "/listinginstances/available").await;
    assert!(items.iter().all(|i| i["status"] == "a"));

    let position = |id: &str| {
        items
            .iter()
            .position(|i| i["id"] == id)
            .expect("Instance missing from available list")
    };
    assert!(position(first_instance.as_str()) < position(second_instance.as_str()));
}

#[tokio::test]
#[ignore]
async fn test_my_listings_only_own_loans_soonest_due_first() {
    let client = client();
    let (token, user_id) = login(&client).await;

    let reader = create_reader(&client, &token, &format!("reader{}", unique_suffix())).await;
    let realtor = create_realtor(&client, &token, "Circulation").await;
    let listing = create_listing(&client, &token, realtor, "Circulating Listing").await;

    let on_loan = |borrower: i64, due_back: &str| {
        json!({
            "listing_id": listing,
            "imprint": "Test Press, 2024",
            "status": "o",
            "borrower_id": borrower,
            "due_back": due_back
        })
    };
    // The other reader's copy is due first, so it would lead the page if it leaked in
    let others = create_instance(&client, &token, on_loan(reader, "1999-12-30")).await;
    let later = create_instance(&client, &token, on_loan(user_id, "2000-01-05")).await;
    let sooner = create_instance(&client, &token, on_loan(user_id, "2000-01-01")).await;

    let items = all_pages(&client, &token, "/mylistings").await;
    assert!(items.iter().all(|i| i["status"] == "o"));
    assert!(items.iter().all(|i| i["borrower_id"] == user_id));
    assert!(!items.iter().any(|i| i["id"] == others.as_str()));

    let due: Vec<&str> = items
        .iter()
        .map(|i| i["due_back"].as_str().expect("Loan without due date"))
        .collect();
    let mut sorted = due.clone();
    sorted.sort();
    assert_eq!(due, sorted);

    let position = |id: &str| {
        items
            .iter()
            .position(|i| i["id"] == id)
            .expect("Loan missing from my listings")
    };
    assert!(position(sooner.as_str()) < position(later.as_str()));

    for id in [&others, &later, &sooner] {
        client
            .delete(format!("{}/admin/listinginstances/{}", BASE_URL, id))
            .bearer_auth(&token)
            .send()
            .await
            .expect("Failed to send request");
    }
}

#[tokio::test]
#[ignore]
async fn test_page_out_of_range_is_not_found() {
    let client = client();
    let (token, _) = login(&client).await;

    for page in ["0", "-1", "100000"] {
        let response = client
            .get(format!("{}/listings?page={}", BASE_URL, page))
            .bearer_auth(&token)
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "page {}", page);
    }
}

#[tokio::test]
#[ignore]
async fn test_realtor_create_redirects_to_list() {
    let client = client();
    let (token, _) = login(&client).await;

    let response = client
        .post(format!("{}/realtors", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "first_name": "Octavia",
            "last_name": "Butler",
            "date_of_birth": "1947-06-22",
            "date_of_death": "2006-02-24"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], "/realtors");
}

#[tokio::test]
#[ignore]
async fn test_realtor_delete_outcomes() {
    let client = client();
    let (token, _) = login(&client).await;

    // Realtor with a listing is kept
    let busy = create_realtor(&client, &token, "Busy").await;
    let kept = create_listing(&client, &token, busy, "Kept Listing").await;

    let response = client
        .delete(format!("{}/realtors/{}", BASE_URL, busy))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], "/realtors");

    let messages = realtor_list_messages(&client, &token).await;
    assert_eq!(
        messages,
        vec!["Test Busy cannot be deleted. Listings exist for this realtor".to_string()]
    );
    let response = client
        .get(format!("{}/realtors/{}", BASE_URL, busy))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());
    let response = client
        .get(format!("{}/admin/listings/{}", BASE_URL, kept))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);

    // Realtor without listings goes away
    let idle = create_realtor(&client, &token, "Idle").await;
    let response = client
        .delete(format!("{}/realtors/{}", BASE_URL, idle))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let messages = realtor_list_messages(&client, &token).await;
    assert_eq!(messages, vec!["Test Idle has been deleted".to_string()]);
    assert!(realtor_list_messages(&client, &token).await.is_empty());

    let response = client
        .get(format!("{}/realtors/{}", BASE_URL, idle))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn test_loan_processing() {
    let client = client();
    let (token, user_id) = login(&client).await;

    let realtor = create_realtor(&client, &token, "Lender").await;
    let listing = create_listing(&client, &token, realtor, "Loanable Listing").await;
    let instance = create_available_instance(&client, &token, listing).await;

    // Form shows the listing title
    let form: Value = client
        .get(format!("{}/listinginstances/{}/loan", BASE_URL, instance))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(form["listing_title"], "Loanable Listing");

    // Missing borrower re-renders the form
    let response = client
        .post(format!("{}/listinginstances/{}/loan", BASE_URL, instance))
        .bearer_auth(&token)
        .json(&json!({ "listing_title": "Loanable Listing" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["errors"]["borrower"][0], "This field is required.");

    // Valid submission lends for four weeks
    let response = client
        .post(format!("{}/listinginstances/{}/loan", BASE_URL, instance))
        .bearer_auth(&token)
        .json(&json!({ "borrower": user_id }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], "/listinginstances/available");

    let view: Value = client
        .get(format!("{}/admin/listinginstances/{}", BASE_URL, instance))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    let due = (Local::now().date_naive() + Duration::days(28)).to_string();
    assert_eq!(view["instance"]["status"], "o");
    assert_eq!(view["instance"]["borrower_id"], user_id);
    assert_eq!(view["instance"]["due_back"], due);

    // It now shows among the user's loans
    let mine: Value = client
        .get(format!("{}/mylistings", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    let items = mine["items"].as_array().expect("No items");
    assert!(items.iter().any(|i| i["id"] == instance.as_str()));
    assert!(items.iter().all(|i| i["status"] == "o"));

    // Returning makes it available again
    let response = client
        .post(format!("{}/listinginstances/{}/return", BASE_URL, instance))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let view: Value = client
        .get(format!("{}/admin/listinginstances/{}", BASE_URL, instance))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(view["instance"]["status"], "a");
    assert!(view["instance"]["borrower_id"].is_null());
}

#[tokio::test]
#[ignore]
async fn test_admin_rejects_inconsistent_instance() {
    let client = client();
    let (token, _) = login(&client).await;

    let realtor = create_realtor(&client, &token, "Strict").await;
    let listing = create_listing(&client, &token, realtor, "Strict Listing").await;

    let response = client
        .post(format!("{}/admin/listinginstances", BASE_URL))
        .bearer_auth(&token)
        .json(&json!({
            "listing_id": listing,
            "imprint": "Test Press, 2024",
            "status": "o"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore]
async fn test_admin_registry() {
    let client = client();
    let (token, _) = login(&client).await;

    let body: Value = client
        .get(format!("{}/admin", BASE_URL))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");

    let instances = body
        .as_array()
        .expect("No registry")
        .iter()
        .find(|m| m["model"] == "ListingInstance")
        .expect("ListingInstance not registered");
    assert_eq!(instances["list_filter"], json!(["status", "due_back"]));
    assert_eq!(instances["fieldsets"][1]["name"], "Availability");
}
