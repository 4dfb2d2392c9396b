//! Integration tests for the harvester
//!
//! These tests use wiremock to stand in for the recipe site and run the
//! full expand, fetch, download and record cycle end-to-end.

use hf_harvest::config::Config;
use hf_harvest::crawler::{build_http_client, fetch_page, FetchOutcome, HarvestPlan, Harvester};
use hf_harvest::storage::{JsonStateStore, MemoryStateStore, SeenSet, StateStore};
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn create_test_config(server: &MockServer, dir: &Path) -> Config {
    let mut config = Config::default();
    config.site.root_url = server.uri();
    config.crawler.concurrency = 2;
    config.output.download_dir = dir.join("pdfs").to_string_lossy().into_owned();
    config.output.state_path = dir.join("state.json").to_string_lossy().into_owned();
    config
}

/// A page whose body is nothing but the given links
fn html_page(route: &str, links: &[&str]) -> Mock {
    let anchors: String = links
        .iter()
        .map(|link| format!(r#"<a href="{}">link</a>"#, link))
        .collect();

    Mock::given(method("GET")).and(path(route)).respond_with(
        ResponseTemplate::new(200)
            .set_body_string(format!("<html><body>{}</body></html>", anchors))
            .insert_header("content-type", "text/html"),
    )
}

/// A downloadable file
fn pdf_file(route: &str, content: &str) -> Mock {
    Mock::given(method("GET")).and(path(route)).respond_with(
        ResponseTemplate::new(200)
            .set_body_bytes(content.as_bytes().to_vec())
            .insert_header("content-type", "application/pdf"),
    )
}

fn failing(route: &str, status: u16) -> Mock {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
}

/// Mounts two recipes, each linking to its own card
async fn mount_two_recipes(server: &MockServer) {
    html_page(
        "/recipes/lemon-chicken-w03-1a2b3c",
        &["/cards/lemon-chicken-w03-1a2b3c.pdf", "/recipes/chicken-recipes"],
    )
    .mount(server)
    .await;
    html_page(
        "/recipes/chicken-tacos-w05-4d5e6f",
        &["/cards/chicken-tacos-w05-4d5e6f.pdf"],
    )
    .mount(server)
    .await;
    pdf_file("/cards/lemon-chicken-w03-1a2b3c.pdf", "%PDF-1.4 lemon")
        .expect(1)
        .mount(server)
        .await;
    pdf_file("/cards/chicken-tacos-w05-4d5e6f.pdf", "%PDF-1.4 tacos")
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_listing_crawl_downloads_cards() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let base = server.uri();

    html_page(
        "/recipes/chicken-recipes",
        &[
            "/recipes/lemon-chicken-w03-1a2b3c",
            "/recipes/chicken-tacos-w05-4d5e6f",
            "/recipes/lemon-chicken-w03-1a2b3c",
            "/recipes/beef-recipes",
            "/about",
            "https://elsewhere.example.com/recipes/other-w01-9z8y7x",
        ],
    )
    .expect(1)
    .mount(&server)
    .await;
    // Not recursing, so the category is never expanded
    html_page("/recipes/beef-recipes", &[])
        .expect(0)
        .mount(&server)
        .await;
    mount_two_recipes(&server).await;

    let store = MemoryStateStore::new();
    let mut harvester = Harvester::new(create_test_config(&server, dir.path()), &store).unwrap();
    harvester
        .harvest_listing(&format!("{}/recipes/chicken-recipes", base), false)
        .await
        .unwrap();
    let summary = harvester.finish().unwrap();

    let pdfs = dir.path().join("pdfs");
    assert_eq!(
        std::fs::read_to_string(pdfs.join("lemon_chicken_w03.pdf")).unwrap(),
        "%PDF-1.4 lemon"
    );
    assert_eq!(
        std::fs::read_to_string(pdfs.join("chicken_tacos_w05.pdf")).unwrap(),
        "%PDF-1.4 tacos"
    );
    assert!(!pdfs.join("lemon_chicken_w03.pdf.part").exists());

    let seen = store.snapshot();
    assert_eq!(seen.len(), 2);
    assert!(seen.contains(&format!("{}/recipes/lemon-chicken-w03-1a2b3c", base)));
    assert!(seen.contains(&format!("{}/recipes/chicken-tacos-w05-4d5e6f", base)));

    assert_eq!(summary.pages_expanded, 1);
    assert_eq!(summary.recipes_fetched, 2);
    assert_eq!(summary.files_downloaded, 2);
    assert_eq!(summary.download_failures, 0);
    assert_eq!(summary.recipes_recorded, 2);
}

#[tokio::test]
async fn test_second_run_skips_processed_recipes() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let list_url = format!("{}/recipes/chicken-recipes", server.uri());

    html_page(
        "/recipes/chicken-recipes",
        &[
            "/recipes/lemon-chicken-w03-1a2b3c",
            "/recipes/chicken-tacos-w05-4d5e6f",
        ],
    )
    .expect(2)
    .mount(&server)
    .await;
    // Recipe pages and cards are each requested by the first run only
    mount_two_recipes(&server).await;

    let config = create_test_config(&server, dir.path());
    let state_path = dir.path().join("state.json");

    let mut first = Harvester::new(config.clone(), JsonStateStore::new(&state_path)).unwrap();
    first.harvest_listing(&list_url, false).await.unwrap();
    let first_summary = first.finish().unwrap();
    assert_eq!(first_summary.files_downloaded, 2);

    let mut second = Harvester::new(config, JsonStateStore::new(&state_path)).unwrap();
    assert_eq!(second.seen().len(), 2);
    second.harvest_listing(&list_url, false).await.unwrap();
    let second_summary = second.finish().unwrap();

    assert_eq!(second_summary.recipes_skipped, 2);
    assert_eq!(second_summary.recipes_fetched, 0);
    assert_eq!(second_summary.files_downloaded, 0);
    assert_eq!(second_summary.recipes_known, 2);

    server.verify().await;
}

#[tokio::test]
async fn test_unreachable_recipe_does_not_stop_siblings() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let base = server.uri();

    html_page(
        "/recipes/chicken-recipes",
        &[
            "/recipes/broken-dish-w01-1x2y3z",
            "/recipes/chicken-tacos-w05-4d5e6f",
            "/recipes/lemon-chicken-w03-1a2b3c",
        ],
    )
    .mount(&server)
    .await;
    failing("/recipes/broken-dish-w01-1x2y3z", 500)
        .expect(1)
        .mount(&server)
        .await;
    mount_two_recipes(&server).await;

    let mut config = create_test_config(&server, dir.path());
    config.crawler.concurrency = 3;

    let store = MemoryStateStore::new();
    let mut harvester = Harvester::new(config, &store).unwrap();
    harvester
        .harvest_listing(&format!("{}/recipes/chicken-recipes", base), false)
        .await
        .unwrap();
    let summary = harvester.finish().unwrap();

    assert_eq!(summary.unreachable_pages, 1);
    assert_eq!(summary.files_downloaded, 2);

    let seen = store.snapshot();
    assert_eq!(seen.len(), 2);
    assert!(!seen.contains(&format!("{}/recipes/broken-dish-w01-1x2y3z", base)));
}

#[tokio::test]
async fn test_unreachable_listing_yields_nothing() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    failing("/recipes/chicken-recipes", 500)
        .expect(1)
        .mount(&server)
        .await;

    let store = MemoryStateStore::new();
    let mut harvester = Harvester::new(create_test_config(&server, dir.path()), &store).unwrap();
    harvester
        .harvest_listing(&format!("{}/recipes/chicken-recipes", server.uri()), true)
        .await
        .unwrap();
    let summary = harvester.finish().unwrap();

    assert_eq!(summary.pages_expanded, 1);
    assert_eq!(summary.unreachable_pages, 1);
    assert_eq!(summary.recipes_fetched, 0);
    assert!(store.snapshot().is_empty());
}

#[tokio::test]
async fn test_recursion_expands_each_category_once() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    html_page(
        "/recipes/chicken-recipes",
        &[
            "/recipes/beef-recipes",
            "/recipes/pasta-recipes",
            "/recipes/lemon-chicken-w03-1a2b3c",
        ],
    )
    .expect(1)
    .mount(&server)
    .await;
    html_page(
        "/recipes/beef-recipes",
        &[
            "/recipes/chicken-recipes",
            "/recipes/beef-recipes",
            "/recipes/pasta-recipes",
            "/recipes/beef-stew-w07-7g8h9i",
        ],
    )
    .expect(1)
    .mount(&server)
    .await;
    html_page(
        "/recipes/pasta-recipes",
        &[
            "/recipes/beef-recipes",
            "/recipes/chicken-recipes",
            // Recorded while expanding the chicken page
            "/recipes/lemon-chicken-w03-1a2b3c",
            "/recipes/creamy-pasta-w09-5j6k7l",
        ],
    )
    .expect(1)
    .mount(&server)
    .await;

    // Recipe pages without a card are still recorded
    html_page("/recipes/lemon-chicken-w03-1a2b3c", &[])
        .expect(1)
        .mount(&server)
        .await;
    html_page("/recipes/beef-stew-w07-7g8h9i", &[])
        .expect(1)
        .mount(&server)
        .await;
    html_page("/recipes/creamy-pasta-w09-5j6k7l", &[])
        .expect(1)
        .mount(&server)
        .await;

    let store = MemoryStateStore::new();
    let mut harvester = Harvester::new(create_test_config(&server, dir.path()), &store).unwrap();
    harvester
        .harvest_listing(&format!("{}/recipes/chicken-recipes", server.uri()), true)
        .await
        .unwrap();
    let summary = harvester.finish().unwrap();

    assert_eq!(summary.pages_expanded, 3);
    assert_eq!(summary.recipes_fetched, 3);
    assert_eq!(summary.recipes_skipped, 1);
    assert_eq!(store.snapshot().len(), 3);

    server.verify().await;
}

#[tokio::test]
async fn test_max_depth_limits_recursion() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    html_page("/recipes/chicken-recipes", &["/recipes/beef-recipes"])
        .expect(1)
        .mount(&server)
        .await;
    html_page("/recipes/beef-recipes", &["/recipes/pasta-recipes"])
        .expect(1)
        .mount(&server)
        .await;
    html_page("/recipes/pasta-recipes", &[])
        .expect(0)
        .mount(&server)
        .await;

    let mut config = create_test_config(&server, dir.path());
    config.crawler.max_depth = Some(1);

    let mut harvester = Harvester::new(config, MemoryStateStore::new()).unwrap();
    harvester
        .harvest_listing(&format!("{}/recipes/chicken-recipes", server.uri()), true)
        .await
        .unwrap();

    assert_eq!(harvester.summary().pages_expanded, 2);
    server.verify().await;
}

#[tokio::test]
async fn test_failed_download_is_retried_next_run() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let base = server.uri();
    let list_url = format!("{}/recipes/chicken-recipes", base);

    html_page(
        "/recipes/chicken-recipes",
        &["/recipes/lemon-chicken-w03-1a2b3c"],
    )
    .mount(&server)
    .await;
    html_page(
        "/recipes/lemon-chicken-w03-1a2b3c",
        &["/cards/lemon-chicken-w03-1a2b3c.pdf"],
    )
    .expect(2)
    .mount(&server)
    .await;
    failing("/cards/lemon-chicken-w03-1a2b3c.pdf", 404)
        .expect(2)
        .mount(&server)
        .await;

    let config = create_test_config(&server, dir.path());
    let store = MemoryStateStore::new();

    for _ in 0..2 {
        let mut harvester = Harvester::new(config.clone(), &store).unwrap();
        harvester.harvest_listing(&list_url, false).await.unwrap();
        let summary = harvester.finish().unwrap();

        assert_eq!(summary.download_failures, 1);
        assert_eq!(summary.recipes_recorded, 0);
    }

    assert!(store.snapshot().is_empty());
    assert!(!dir.path().join("pdfs/lemon_chicken_w03.pdf").exists());
    server.verify().await;
}

#[tokio::test]
async fn test_failed_download_does_not_stop_siblings() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let base = server.uri();

    html_page(
        "/recipes/chicken-recipes",
        &["/recipes/a-dish-w01-1a2b3c", "/recipes/b-dish-w02-2b3c4d"],
    )
    .mount(&server)
    .await;
    html_page(
        "/recipes/a-dish-w01-1a2b3c",
        &["/cards/a-card.pdf", "/cards/bad-card.pdf"],
    )
    .mount(&server)
    .await;
    html_page("/recipes/b-dish-w02-2b3c4d", &["/cards/b-card.pdf"])
        .mount(&server)
        .await;
    pdf_file("/cards/a-card.pdf", "%PDF-1.4 a")
        .expect(1)
        .mount(&server)
        .await;
    pdf_file("/cards/b-card.pdf", "%PDF-1.4 b")
        .expect(1)
        .mount(&server)
        .await;
    failing("/cards/bad-card.pdf", 500)
        .expect(1)
        .mount(&server)
        .await;

    // All three cards share one download window
    let mut config = create_test_config(&server, dir.path());
    config.crawler.concurrency = 3;

    let store = MemoryStateStore::new();
    let mut harvester = Harvester::new(config, &store).unwrap();
    harvester
        .harvest_listing(&format!("{}/recipes/chicken-recipes", base), false)
        .await
        .unwrap();
    let summary = harvester.finish().unwrap();

    assert_eq!(summary.files_downloaded, 2);
    assert_eq!(summary.download_failures, 1);
    assert_eq!(summary.recipes_recorded, 1);

    let pdfs = dir.path().join("pdfs");
    assert!(pdfs.join("a_card.pdf").exists());
    assert!(pdfs.join("b_card.pdf").exists());
    assert!(!pdfs.join("bad_card.pdf").exists());
    assert!(!pdfs.join("bad_card.pdf.part").exists());

    // The recipe with a missing card stays unrecorded, its sibling is kept
    let seen = store.snapshot();
    assert_eq!(seen.len(), 1);
    assert!(seen.contains(&format!("{}/recipes/b-dish-w02-2b3c4d", base)));
    assert!(!seen.contains(&format!("{}/recipes/a-dish-w01-1a2b3c", base)));

    server.verify().await;
}

#[tokio::test]
async fn test_explicit_non_recipe_url_is_not_recorded() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let page = format!("{}/recipes/chicken-recipes", server.uri());

    html_page("/recipes/chicken-recipes", &["/cards/weekly-menu.pdf"])
        .expect(1)
        .mount(&server)
        .await;
    pdf_file("/cards/weekly-menu.pdf", "%PDF-1.4 menu")
        .expect(1)
        .mount(&server)
        .await;

    let store = MemoryStateStore::new();
    let plan = HarvestPlan {
        recipe_urls: vec![page],
        ..HarvestPlan::default()
    };
    let summary = Harvester::new(create_test_config(&server, dir.path()), &store)
        .unwrap()
        .run(plan)
        .await
        .unwrap();

    assert_eq!(summary.files_downloaded, 1);
    assert_eq!(summary.recipes_recorded, 0);
    assert!(dir.path().join("pdfs/weekly_menu.pdf").exists());
    assert!(store.snapshot().is_empty());

    server.verify().await;
}

#[tokio::test]
async fn test_shared_card_is_downloaded_once() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    html_page(
        "/recipes/chicken-recipes",
        &["/recipes/lemon-chicken-w03-1a2b3c", "/recipes/lemon-chicken-w04-2b3c4d"],
    )
    .mount(&server)
    .await;
    html_page(
        "/recipes/lemon-chicken-w03-1a2b3c",
        &["/cards/lemon-chicken.pdf"],
    )
    .mount(&server)
    .await;
    html_page(
        "/recipes/lemon-chicken-w04-2b3c4d",
        &["/cards/lemon-chicken.pdf"],
    )
    .mount(&server)
    .await;
    pdf_file("/cards/lemon-chicken.pdf", "%PDF-1.4 shared")
        .expect(1)
        .mount(&server)
        .await;

    let store = MemoryStateStore::new();
    let mut harvester = Harvester::new(create_test_config(&server, dir.path()), &store).unwrap();
    harvester
        .harvest_listing(&format!("{}/recipes/chicken-recipes", server.uri()), false)
        .await
        .unwrap();

    assert_eq!(harvester.summary().files_downloaded, 1);
    assert_eq!(store.snapshot().len(), 2);
    assert!(dir.path().join("pdfs/lemon_chicken.pdf").exists());
    server.verify().await;
}

#[tokio::test]
async fn test_all_mode_organizes_by_letter() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    html_page(
        "/pages/sitemap",
        &[
            "/pages/sitemap/recipes-b",
            "/pages/sitemap/recipes-a",
            "/pages/sitemap/recipes-a",
            "/pages/sitemap/recipes-ab",
        ],
    )
    .expect(1)
    .mount(&server)
    .await;
    html_page(
        "/pages/sitemap/recipes-a",
        &["/recipes/apple-salad-w02-3m4n5o"],
    )
    .expect(1)
    .mount(&server)
    .await;
    html_page(
        "/pages/sitemap/recipes-b",
        &["/recipes/beef-stew-w07-7g8h9i"],
    )
    .expect(1)
    .mount(&server)
    .await;
    html_page(
        "/recipes/apple-salad-w02-3m4n5o",
        &["/cards/apple-salad-w02-3m4n5o.pdf"],
    )
    .mount(&server)
    .await;
    html_page(
        "/recipes/beef-stew-w07-7g8h9i",
        &["/cards/beef-stew-w07-7g8h9i.pdf"],
    )
    .mount(&server)
    .await;
    pdf_file("/cards/apple-salad-w02-3m4n5o.pdf", "%PDF-1.4 apple")
        .mount(&server)
        .await;
    pdf_file("/cards/beef-stew-w07-7g8h9i.pdf", "%PDF-1.4 beef")
        .mount(&server)
        .await;

    let store = MemoryStateStore::new();
    let mut harvester = Harvester::new(create_test_config(&server, dir.path()), &store).unwrap();
    let top = harvester.download_dir().to_path_buf();
    harvester.harvest_all(false).await.unwrap();

    assert_eq!(harvester.download_dir(), top.as_path());
    assert!(top.join("a/apple_salad_w02.pdf").exists());
    assert!(top.join("b/beef_stew_w07.pdf").exists());
    assert_eq!(store.snapshot().len(), 2);

    server.verify().await;
}

#[tokio::test]
async fn test_all_mode_flat_layout() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    html_page("/pages/sitemap", &["/pages/sitemap/recipes-a"])
        .mount(&server)
        .await;
    html_page(
        "/pages/sitemap/recipes-a",
        &["/recipes/apple-salad-w02-3m4n5o"],
    )
    .mount(&server)
    .await;
    html_page(
        "/recipes/apple-salad-w02-3m4n5o",
        &["/cards/apple-salad-w02-3m4n5o.pdf"],
    )
    .mount(&server)
    .await;
    pdf_file("/cards/apple-salad-w02-3m4n5o.pdf", "%PDF-1.4 apple")
        .mount(&server)
        .await;

    let mut config = create_test_config(&server, dir.path());
    config.output.organize_by_letter = false;

    let mut harvester = Harvester::new(config, MemoryStateStore::new()).unwrap();
    harvester.harvest_all(false).await.unwrap();

    assert!(dir.path().join("pdfs/apple_salad_w02.pdf").exists());
    assert!(!dir.path().join("pdfs/a").exists());
}

#[tokio::test]
async fn test_explicit_urls_ignore_processed_set() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let recipe = format!("{}/recipes/lemon-chicken-w03-1a2b3c", server.uri());

    html_page(
        "/recipes/lemon-chicken-w03-1a2b3c",
        &["/cards/lemon-chicken-w03-1a2b3c.pdf"],
    )
    .expect(1)
    .mount(&server)
    .await;
    pdf_file("/cards/lemon-chicken-w03-1a2b3c.pdf", "%PDF-1.4 lemon")
        .expect(1)
        .mount(&server)
        .await;

    let mut seen = SeenSet::new();
    seen.insert(recipe.clone());
    let store = MemoryStateStore::with_seen(seen);

    let plan = HarvestPlan {
        recipe_urls: vec![recipe.clone(), format!("  {}  ", recipe), String::new()],
        ..HarvestPlan::default()
    };
    let summary = Harvester::new(create_test_config(&server, dir.path()), &store)
        .unwrap()
        .run(plan)
        .await
        .unwrap();

    assert_eq!(summary.recipes_fetched, 1);
    assert_eq!(summary.files_downloaded, 1);
    assert!(dir.path().join("pdfs/lemon_chicken_w03.pdf").exists());
    assert_eq!(store.load().unwrap().len(), 1);
    server.verify().await;
}

#[tokio::test]
async fn test_fetch_sends_identifying_headers() {
    let server = MockServer::start().await;
    let config = Config::default();
    let user_agent = config.user_agent.header_value();

    Mock::given(method("GET"))
        .and(path("/recipes"))
        .and(header("user-agent", user_agent.as_str()))
        .and(header("accept", "*/*"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .expect(1)
        .mount(&server)
        .await;

    let client = build_http_client(&config.user_agent, &config.crawler).unwrap();
    let outcome = fetch_page(&client, &format!("{}/recipes", server.uri())).await;
    assert!(outcome.is_page());

    server.verify().await;
}

#[tokio::test]
async fn test_fetch_error_status_is_soft() {
    let server = MockServer::start().await;
    failing("/recipes/broken-dish-w01-1x2y3z", 500)
        .mount(&server)
        .await;

    let config = Config::default();
    let client = build_http_client(&config.user_agent, &config.crawler).unwrap();
    let url = format!("{}/recipes/broken-dish-w01-1x2y3z", server.uri());
    let outcome = fetch_page(&client, &url).await;

    match outcome {
        FetchOutcome::Unreachable { url: failed, status } => {
            assert_eq!(failed, url);
            assert_eq!(status, 500);
        }
        other => panic!("expected Unreachable, got {:?}", other),
    }
}
