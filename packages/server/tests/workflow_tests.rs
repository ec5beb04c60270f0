//! End-to-end runs of the scrape workflow over in-memory collaborators.

mod common;

use std::sync::Arc;

use common::*;
use listing_extraction::testing::{MockFetcher, MockScraper};
use listing_extraction::{SelectorConfig, SiteExtractor};
use tokio_util::sync::CancellationToken;
use worker_core::domains::listings::{
    ListingFilter, ListingRepository, MemoryListingRepository,
};
use worker_core::domains::scraping::{ScrapeWorkflow, ScraperRegistry, ScraperService};
use worker_core::kernel::jobs::JobStatus;
use worker_core::kernel::{NatsNotifier, Notification, TestNats};

const SITE: &str = "rumah123";

const PAGE: &str = r#"
<html><body>
  <div class="card">
    <a class="title" href="/properti/jakarta-selatan/hos101/">Rumah Kebayoran Baru</a>
    <div class="price">Rp 3,5 Miliar</div>
    <div class="location">Kebayoran Baru, Jakarta Selatan</div>
    <span class="bed">4 KT</span>
  </div>
  <div class="card">
    <a class="title" href="/properti/depok/hos102/">Rumah Depok Asri</a>
    <div class="price">Rp 850 Juta</div>
    <div class="location">Depok, Jawa Barat</div>
    <span class="bed">3 KT</span>
  </div>
  <div class="card">
    <a class="title" href="/properti/bogor/hos103/">Rumah Tanpa Harga</a>
    <div class="location">Bogor</div>
  </div>
  <a rel="next" href="/jual/rumah/?page=2">Berikutnya</a>
</body></html>
"#;

fn selectors() -> SelectorConfig {
    SelectorConfig {
        list_item: "div.card".to_string(),
        title: "a.title".to_string(),
        price: ".price".to_string(),
        location: ".location".to_string(),
        detail_url: "a.title".to_string(),
        bedrooms: Some(".bed".to_string()),
        next_page: Some("a[rel='next']".to_string()),
        ..Default::default()
    }
}

fn rumah123_service(
    fetcher: MockFetcher,
    repository: Arc<MemoryListingRepository>,
    notifier: Arc<dyn worker_core::kernel::Notifier>,
) -> ScraperService {
    let extractor = SiteExtractor::build(SITE, SITE, &selectors(), Arc::new(fetcher))
        .unwrap()
        .expect("rumah123 is a supported extractor");

    let mut registry = ScraperRegistry::new();
    registry.register(SITE, Arc::new(extractor));
    ScraperService::new(registry, repository, notifier)
}

#[tokio::test]
async fn test_one_failed_save_still_reports_success() {
    init_tracing();
    let records = listings(SITE, 5);
    let broken_url = records[2].url.clone();
    let wiring = Wiring::with_repository(MemoryListingRepository::new().fail_on(&broken_url));
    let scraper = Arc::new(MockScraper::new(SITE).with_listings(records));
    let service = wiring.service(&[scraper]);

    let outcome = service
        .scrape_website(SITE, SEED_URL, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.status, JobStatus::Completed);
    assert_eq!(outcome.scraped_count, 5);
    assert_eq!(outcome.saved_count, 4);
    assert_eq!(outcome.error_count, 1);
    assert_eq!(wiring.repository.len(), 4);
    assert!(wiring.repository.find_by_url(&broken_url).await.unwrap().is_none());

    let sent = wiring.notifier.notifications();
    assert!(matches!(sent.as_slice(), [Notification::Success { count: 4, .. }]));
}

#[tokio::test]
async fn test_page_is_extracted_saved_and_reported() {
    init_tracing();
    let repository = Arc::new(MemoryListingRepository::new());
    let nats = Arc::new(TestNats::new());
    let notifier = Arc::new(NatsNotifier::new(nats.clone(), "scraper.notifications"));
    let service = rumah123_service(
        MockFetcher::new().with_page(SEED_URL, PAGE),
        repository.clone(),
        notifier,
    );

    let outcome = service
        .scrape_website(SITE, SEED_URL, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.scraped_count, 2);
    assert_eq!(outcome.saved_count, 2);
    assert_eq!(outcome.error_count, 1);

    let kebayoran = repository
        .find_by_url("https://www.rumah123.test/properti/jakarta-selatan/hos101/")
        .await
        .unwrap()
        .expect("listing saved under its absolute URL");
    assert_eq!(kebayoran.price, 3_500_000_000.0);
    assert_eq!(kebayoran.bedrooms, 4);

    let under_a_billion = repository
        .find_all(&ListingFilter {
            max_price: Some(1_000_000_000.0),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(under_a_billion.len(), 1);
    assert_eq!(under_a_billion[0].title, "Rumah Depok Asri");

    let msgs = nats.messages_for_subject("scraper.notifications");
    assert_eq!(msgs.len(), 1);
    let value: serde_json::Value = nats.deserialize_message(&msgs[0]).unwrap();
    assert_eq!(value["type"], "success");
    assert_eq!(value["site_name"], SITE);
    assert_eq!(value["count"], 2);
}

#[tokio::test]
async fn test_rescrape_keeps_first_seen() {
    let repository = Arc::new(MemoryListingRepository::new());
    let service = rumah123_service(
        MockFetcher::new().with_page(SEED_URL, PAGE),
        repository.clone(),
        Arc::new(worker_core::kernel::RecordingNotifier::new()),
    );
    let url = "https://www.rumah123.test/properti/depok/hos102/";
    let cancel = CancellationToken::new();

    service.scrape_website(SITE, SEED_URL, &cancel).await.unwrap();
    let first = repository.find_by_url(url).await.unwrap().unwrap();

    service.scrape_website(SITE, SEED_URL, &cancel).await.unwrap();
    let second = repository.find_by_url(url).await.unwrap().unwrap();

    assert_eq!(repository.len(), 2);
    assert_eq!(second.first_seen_at, first.first_seen_at);
    assert!(second.scraped_at >= first.scraped_at);
}

#[tokio::test]
async fn test_challenge_page_fails_run() {
    let challenge = r#"<html><body><div class="card"><p>Checking your browser</p></div></body></html>"#;
    let repository = Arc::new(MemoryListingRepository::new());
    let notifier = Arc::new(worker_core::kernel::RecordingNotifier::new());
    let service = rumah123_service(
        MockFetcher::new().with_page(SEED_URL, challenge),
        repository.clone(),
        notifier.clone(),
    );

    let result = service
        .scrape_website(SITE, SEED_URL, &CancellationToken::new())
        .await;

    assert!(result.is_err());
    assert!(repository.is_empty());
    let sent = notifier.notifications();
    assert!(matches!(sent.as_slice(), [Notification::Error { .. }]));
}

#[tokio::test]
async fn test_notification_failure_does_not_fail_run() {
    let repository = Arc::new(MemoryListingRepository::new());
    let notifier = Arc::new(NatsNotifier::new(
        Arc::new(TestNats::failing()),
        "scraper.notifications",
    ));
    let service = rumah123_service(
        MockFetcher::new().with_page(SEED_URL, PAGE),
        repository.clone(),
        notifier,
    );

    let outcome = service
        .scrape_website(SITE, SEED_URL, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.saved_count, 2);
    assert_eq!(repository.len(), 2);
}
