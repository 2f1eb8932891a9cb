use std::time::Duration;
use tab_warden::{ApplyOutcome, BrowserSession, CdpDocument, Document, Engine, LaunchOptions, WardenConfig};

const TIMELINE: &str = "data:text/html,<html><body><nav>\
<div role='tablist' data-testid='ScrollSnap-List'>\
<div role='presentation'><a role='tab' aria-selected='true'><span>For you</span></a></div>\
<div role='presentation'><a role='tab' aria-selected='false'><span>Following</span></a></div>\
</div></nav></body></html>";

fn launch() -> BrowserSession {
    BrowserSession::launch(LaunchOptions::new().headless(true)).expect("Failed to launch browser")
}

#[test]
#[ignore] // Requires Chrome to be installed
fn test_policy_hides_tab_in_live_page() {
    let session = launch();
    session.navigate(TIMELINE).expect("Failed to navigate");

    let document = CdpDocument::new(session.tab(), &WardenConfig::default());
    let mut engine = Engine::new(document, WardenConfig::default()).expect("Failed to build engine");
    engine.start(Duration::ZERO).expect("Failed to start");
    engine.run_due(Duration::from_millis(16));

    assert!(matches!(
        engine.last_outcome(),
        Some(ApplyOutcome::Hidden { redirected: true, .. })
    ));

    let display = session
        .tab()
        .evaluate(
            "getComputedStyle(document.querySelector('[role=presentation]')).display",
            false,
        )
        .expect("Failed to read style");
    assert_eq!(display.value, Some(serde_json::json!("none")));
}

#[test]
#[ignore]
fn test_snapshot_stamps_stable_ids() {
    let session = launch();
    session.navigate(TIMELINE).expect("Failed to navigate");

    let mut document = CdpDocument::new(session.tab(), &WardenConfig::default());
    document.refresh().expect("First snapshot failed");
    let first = document.query(&WardenConfig::default().container_selector);
    document.refresh().expect("Second snapshot failed");
    let second = document.query(&WardenConfig::default().container_selector);

    assert!(first.is_some());
    assert_eq!(first, second);
    println!("Snapshot: {}", document.snapshot().to_json().expect("Failed to serialize"));
}
