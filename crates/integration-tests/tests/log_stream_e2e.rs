//! Log stream end-to-end tests
//!
//! Real SubprocessSpawner + PatternClassifier against a fake idevicesyslog.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{FakeTools, UDID};
use imobile_core::domain::{LogEvent, LogRecord, SessionState};
use imobile_infra_system::PatternClassifier;
use tokio::sync::mpsc::UnboundedReceiver;

const WAIT: Duration = Duration::from_secs(10);

async fn collect(rx: &mut UnboundedReceiver<LogEvent>) -> (Vec<LogRecord>, usize) {
    let mut records = Vec::new();
    let mut closes = 0;
    while let Some(event) = tokio::time::timeout(WAIT, rx.recv()).await.expect("stream stalled") {
        match event {
            LogEvent::Log(record) => records.push(record),
            LogEvent::Close => closes += 1,
        }
    }
    (records, closes)
}

#[tokio::test]
async fn test_syslog_classifies_lines_until_eof() {
    let fakes = FakeTools::new();
    let classifier = Arc::new(PatternClassifier::idevicesyslog().unwrap());
    let mut session = fakes.client().syslog(UDID, classifier).unwrap();
    let mut rx = session.subscribe();

    session.start().unwrap();
    let (records, closes) = collect(&mut rx).await;

    assert_eq!(closes, 1);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].category, "log");
    assert_eq!(records[0].field("process"), Some("SpringBoard"));
    assert_eq!(records[0].field("message"), Some("Scene update"));
    assert_eq!(records[1].field("process"), Some("kernel"));
    assert_eq!(records[1].field("message"), Some("wlan0 link up"));
    assert!(records[0].received_at_ms > 0);

    session.wait_closed().await;
    assert_eq!(session.state(), SessionState::Closed);
    assert_eq!(fakes.args("idevicesyslog").unwrap(), vec!["-u", UDID]);
}

#[tokio::test]
async fn test_close_terminates_running_syslog() {
    let fakes = FakeTools::new();
    fakes.install(
        "idevicesyslog",
        "printf 'Jan 17 10:22:33 Test-iPhone locationd[88] <Error>: lost fix\\n'\nexec sleep 600",
    );
    let classifier = Arc::new(PatternClassifier::idevicesyslog().unwrap());
    let mut session = fakes.client().syslog(UDID, classifier).unwrap();
    let mut rx = session.subscribe();
    session.start().unwrap();

    match tokio::time::timeout(WAIT, rx.recv()).await.unwrap() {
        Some(LogEvent::Log(record)) => assert_eq!(record.field("message"), Some("lost fix")),
        other => panic!("expected a log record, got {other:?}"),
    }

    tokio::time::timeout(WAIT, session.close()).await.expect("close hung");

    assert_eq!(rx.recv().await, Some(LogEvent::Close));
    assert!(rx.recv().await.is_none());
    assert_eq!(session.state(), SessionState::Closed);
}

#[tokio::test]
async fn test_late_subscriber_sees_only_close() {
    let fakes = FakeTools::new();
    let classifier = Arc::new(PatternClassifier::idevicesyslog().unwrap());
    let mut session = fakes.client().syslog(UDID, classifier).unwrap();
    session.start().unwrap();
    tokio::time::timeout(WAIT, session.wait_closed()).await.unwrap();

    let mut late = session.subscribe();
    assert_eq!(late.recv().await, Some(LogEvent::Close));
    assert!(late.recv().await.is_none());
}
