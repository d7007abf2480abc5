//! End-to-end seed scenarios from spec.md §8: bootstrap, incremental,
//! and idempotent monitor ticks against a mocked Apple index and
//! per-locale pages, following the shape of
//! `commander-telegram/tests/rebuild_detection_test.rs`.

use std::str::FromStr;

use crazyones_models::LocaleTag;
use crazyones_monitor::tick::{run_tick, TickConfig};
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn index_page(base: &str, locales: &[&str]) -> String {
    let mut links = String::new();
    let mut anchors = String::new();
    for locale in locales {
        links.push_str(&format!(r#"<link rel="alternate" hreflang="{locale}" href="{base}/{locale}">"#));
        anchors.push_str(&format!(r#"<a hreflang="{locale}" href="{base}/{locale}">{locale}</a>"#));
    }
    format!("<html><head>{links}</head><body>{anchors}</body></html>")
}

fn table_row(name: &str) -> String {
    format!(
        r#"<tr><td><a href="https://support.apple.com/{name}">{name}</a></td><td>All devices</td><td>13 May 2024</td></tr>"#
    )
}

fn locale_page(names: &[&str]) -> String {
    let rows: String = names.iter().map(|n| table_row(n)).collect();
    format!("<table>{rows}</table>")
}

async fn mount_text(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

fn locale(tag: &str) -> LocaleTag {
    LocaleTag::from_str(tag).unwrap()
}

#[tokio::test]
async fn bootstrap_incremental_and_idempotent_ticks() {
    let data_dir = tempdir().unwrap();
    let server = MockServer::start().await;
    let base = server.uri();
    let client = reqwest::Client::new();
    let config = TickConfig { data_dir: data_dir.path().to_path_buf(), index_url: format!("{base}/index") };

    let locales = ["en-us", "fr-fr", "es-es"];
    let bootstrap_names = ["update 1", "update 2", "update 3", "update 4", "update 5"];

    // --- Scenario 1: Bootstrap ---
    mount_text(&server, "/index", index_page(&base, &locales)).await;
    for l in &locales {
        mount_text(&server, &format!("/{l}"), locale_page(&bootstrap_names)).await;
    }

    let outcome = run_tick(&client, &config).await.unwrap();
    assert_eq!(outcome.locales_considered, 3);
    assert_eq!(outcome.locales_changed, 3);
    assert!(outcome.trigger_written);

    let store = crazyones_store::LocaleStore::new(data_dir.path());
    for l in &locales {
        let records = store.load(&locale(l)).unwrap();
        assert_eq!(records.len(), 5);
        let mut ids: Vec<u32> = records.iter().map(|r| r.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    let trigger_store = crazyones_store::TriggerStore::new(data_dir.path());
    let trigger = trigger_store.take().expect("bootstrap tick must write a trigger");
    for l in &locales {
        let ids = trigger.get(&locale(l)).expect("every locale should have novelty");
        assert_eq!(ids, &(1..=5).collect::<std::collections::BTreeSet<_>>());
    }

    // --- Scenario 2: Incremental (en-us gains a 6th, prepended record) ---
    server.reset().await;
    mount_text(&server, "/index", index_page(&base, &locales)).await;
    let incremental_en_us = ["update 0 (new)", "update 1", "update 2", "update 3", "update 4", "update 5"];
    mount_text(&server, "/en-us", locale_page(&incremental_en_us)).await;
    mount_text(&server, "/fr-fr", locale_page(&bootstrap_names)).await;
    mount_text(&server, "/es-es", locale_page(&bootstrap_names)).await;

    let outcome = run_tick(&client, &config).await.unwrap();
    assert_eq!(outcome.locales_changed, 1, "only en-us's page body changed");
    assert!(outcome.trigger_written);

    let en_us_records = store.load(&locale("en-us")).unwrap();
    assert_eq!(en_us_records.len(), 6);
    let mut ids: Vec<u32> = en_us_records.iter().map(|r| r.id).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);

    let trigger = trigger_store.take().expect("incremental tick must write a trigger");
    assert_eq!(trigger.get(&locale("en-us")), Some(&std::collections::BTreeSet::from([6])));
    assert_eq!(trigger.get(&locale("fr-fr")), None);
    assert_eq!(trigger.get(&locale("es-es")), None);

    // --- Scenario 3: Idempotent (repeat scenario 2 with no network changes) ---
    let en_us_path = data_dir.path().join("updates").join("en-us.json");
    let mtime_before = std::fs::metadata(&en_us_path).unwrap().modified().unwrap();

    let outcome = run_tick(&client, &config).await.unwrap();
    assert_eq!(outcome.locales_changed, 0);
    assert!(!outcome.trigger_written);
    assert!(trigger_store.take().is_none(), "no trigger file should exist after an unchanged tick");

    let mtime_after = std::fs::metadata(&en_us_path).unwrap().modified().unwrap();
    assert_eq!(mtime_before, mtime_after, "store file must not be rewritten when nothing changed");
}
