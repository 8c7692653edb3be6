//! Integration tests for the probe sequence over in-process pipes
//! Covers:
//! - Wire form of the four fixed requests
//! - In-order printing of replies
//! - Closed output, malformed lines and shutdown exactly once

mod common;

use common::{
    canned_replies, fake_session, fast_config, line, RecordingProcess, Scripted, TerminationLog,
};
use mcp_probe::config::MalformedPolicy;
use mcp_probe::console::Console;
use mcp_probe::errors::ProbeError;
use mcp_probe::probe::{self, Outcome};
use mcp_probe::script::Plan;
use serde_json::{json, Value};

fn output(console: Console<Vec<u8>>) -> String {
    String::from_utf8(console.into_inner()).expect("utf8 console")
}

#[tokio::test]
async fn four_requests_go_out_as_single_json_lines() {
    let log = TerminationLog::default();
    let (session, server) = fake_session(canned_replies(), RecordingProcess::new(log.clone()));
    let config = fast_config();
    let mut console = Console::new(Vec::new());

    probe::drive(session, None, &config, &Plan::standard(&config), &mut console)
        .await
        .expect("probe run");
    let lines = server.finish().await;

    let sent: Vec<Value> = lines
        .iter()
        .map(|l| {
            assert!(!l.contains('\n'));
            serde_json::from_str(l).expect("request is JSON")
        })
        .collect();

    assert_eq!(
        sent,
        vec![
            json!({
                "jsonrpc": "2.0",
                "method": "initialize",
                "params": {
                    "protocolVersion": "2024-11-05",
                    "capabilities": {},
                    "clientInfo": {"name": "test", "version": "1.0"}
                },
                "id": 0
            }),
            json!({"jsonrpc": "2.0", "method": "tools/list", "id": 1}),
            json!({
                "jsonrpc": "2.0",
                "method": "tools/call",
                "params": {"name": "SystemInformation", "arguments": {}},
                "id": 2
            }),
            json!({
                "jsonrpc": "2.0",
                "method": "tools/call",
                "params": {
                    "name": "DomainAvailability",
                    "arguments": {"value": "digitalmatrix.com"}
                },
                "id": 3
            }),
        ]
    );
    assert!(lines[2].contains(r#""arguments":{}"#));
}

#[tokio::test]
async fn replies_are_printed_in_order() {
    let log = TerminationLog::default();
    let (session, _server) = fake_session(canned_replies(), RecordingProcess::new(log.clone()));
    let config = fast_config();
    let mut console = Console::new(Vec::new());

    let report = probe::drive(session, None, &config, &Plan::standard(&config), &mut console)
        .await
        .expect("probe run");

    let ids: Vec<u64> = report
        .responses()
        .map(|v| v["id"].as_u64().expect("numeric id"))
        .collect();
    assert_eq!(ids, vec![0, 1, 2, 3]);
    assert_eq!(log.count(), 1);
    assert!(report.termination.is_some());

    let text = output(console);
    let headings = [
        "1. Sending initialize request...",
        "2. Listing tools...",
        "3. Calling SystemInformation tool...",
        "4. Calling DomainAvailability tool...",
        "Terminating server...",
    ];
    let positions: Vec<usize> = headings
        .iter()
        .map(|h| text.find(h).unwrap_or_else(|| panic!("missing '{}'", h)))
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(text.matches("Received: ").count(), 4);
    assert!(text.contains("  - SystemInformation: Host details"));
    assert!(text.contains("    os: fake"));
    assert_eq!(text.matches("Terminating server...").count(), 1);
}

#[tokio::test]
async fn closed_output_reports_no_response_and_still_terminates() {
    let log = TerminationLog::default();
    let replies = vec![
        line(r#"{"jsonrpc":"2.0","id":0,"result":{}}"#),
        Scripted::Close,
    ];
    let (session, _server) = fake_session(replies, RecordingProcess::new(log.clone()));
    let config = fast_config();
    let mut console = Console::new(Vec::new());

    let report = probe::drive(session, None, &config, &Plan::standard(&config), &mut console)
        .await
        .expect("no-response is not an error");

    let outcomes: Vec<&Outcome> = report.exchanges.iter().map(|e| &e.outcome).collect();
    assert!(matches!(outcomes[0], Outcome::Response(_)));
    assert!(outcomes[1..].iter().all(|o| **o == Outcome::NoResponse));
    assert_eq!(log.count(), 1);

    let text = output(console);
    assert_eq!(text.matches("No response received").count(), 3);
    assert!(text.contains("Terminating server..."));
}

#[tokio::test]
async fn malformed_reply_aborts_after_termination() {
    let log = TerminationLog::default();
    let replies = vec![
        line(r#"{"jsonrpc":"2.0","id":0,"result":{}}"#),
        line("Exception in thread \"main\""),
    ];
    let (session, server) = fake_session(replies, RecordingProcess::new(log.clone()));
    let config = fast_config();
    let mut console = Console::new(Vec::new());

    let err = probe::drive(session, None, &config, &Plan::standard(&config), &mut console)
        .await
        .expect_err("malformed line aborts by default");

    assert!(matches!(err, ProbeError::Decode { ref raw, .. } if raw.starts_with("Exception")));
    assert_eq!(log.count(), 1);
    // The run stopped at step 2
    assert_eq!(server.finish().await.len(), 2);
    assert!(output(console).contains("Terminating server..."));
}

#[tokio::test]
async fn malformed_reply_can_be_skipped() {
    let log = TerminationLog::default();
    let mut replies = canned_replies();
    replies[1] = line("not json at all");
    let (session, _server) = fake_session(replies, RecordingProcess::new(log.clone()));
    let config = mcp_probe::config::ProbeConfig {
        on_malformed: MalformedPolicy::Continue,
        ..fast_config()
    };
    let mut console = Console::new(Vec::new());

    let report = probe::drive(session, None, &config, &Plan::standard(&config), &mut console)
        .await
        .expect("continue policy");

    assert_eq!(
        report.exchanges[1].outcome,
        Outcome::Malformed("not json at all".to_string())
    );
    assert_eq!(report.responses().count(), 3);
    assert_eq!(log.count(), 1);
    assert!(output(console).contains("Malformed response"));
}

#[tokio::test]
async fn shutdown_failure_is_reported_once() {
    let log = TerminationLog::default();
    let (session, _server) = fake_session(canned_replies(), RecordingProcess::failing(log.clone()));
    let config = fast_config();
    let mut console = Console::new(Vec::new());

    let err = probe::drive(session, None, &config, &Plan::standard(&config), &mut console)
        .await
        .expect_err("termination failure surfaces");
    assert!(matches!(err, ProbeError::Process(_)));
    assert_eq!(log.count(), 1);
}

#[tokio::test]
async fn initialized_notification_is_not_awaited() {
    let log = TerminationLog::default();
    let (session, server) = fake_session(canned_replies(), RecordingProcess::new(log.clone()));
    let config = mcp_probe::config::ProbeConfig {
        send_initialized: true,
        ..fast_config()
    };
    let mut console = Console::new(Vec::new());

    let report = probe::drive(session, None, &config, &Plan::standard(&config), &mut console)
        .await
        .expect("probe run");
    let lines = server.finish().await;

    assert_eq!(report.exchanges.len(), 5);
    assert_eq!(report.exchanges[1].outcome, Outcome::Notified);
    assert_eq!(report.exchanges[1].id, None);
    // Ids stay contiguous around the notification
    let ids: Vec<Option<u64>> = report.exchanges.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![Some(0), None, Some(1), Some(2), Some(3)]);
    assert_eq!(lines.len(), 5);
    assert_eq!(report.responses().count(), 4);

    // The notification heading is unnumbered so request numbering is unchanged
    let text = output(console);
    assert!(text.contains("\nSending initialized notification...\n"));
    assert!(text.contains("2. Listing tools..."));
    assert!(text.contains("4. Calling DomainAvailability tool..."));
}

#[tokio::test]
async fn mismatched_reply_id_is_still_counted() {
    let log = TerminationLog::default();
    let mut replies = canned_replies();
    replies[1] = line(r#"{"jsonrpc":"2.0","id":99,"result":{"tools":[]}}"#);
    let (session, _server) = fake_session(replies, RecordingProcess::new(log.clone()));
    let config = fast_config();
    let mut console = Console::new(Vec::new());

    let report = probe::drive(session, None, &config, &Plan::standard(&config), &mut console)
        .await
        .expect("id mismatch is not fatal");

    assert_eq!(report.exchanges[1].id, Some(1));
    assert!(matches!(
        &report.exchanges[1].outcome,
        Outcome::Response(v) if v["id"] == 99
    ));
    assert_eq!(report.responses().count(), 4);
    assert_eq!(log.count(), 1);
    assert!(output(console).contains("\"id\": 99"));
}

#[tokio::test]
async fn invalid_utf8_reply_is_malformed() {
    let log = TerminationLog::default();
    let replies = vec![Scripted::Bytes(
        b"{\"jsonrpc\":\"2.0\",\"id\":0,\"result\":{\"name\":\"caf\xe9\"}}".to_vec(),
    )];
    let (session, _server) = fake_session(replies, RecordingProcess::new(log.clone()));
    let config = fast_config();
    let mut console = Console::new(Vec::new());

    let err = probe::drive(session, None, &config, &Plan::standard(&config), &mut console)
        .await
        .expect_err("invalid encoding aborts by default");

    assert!(matches!(err, ProbeError::Decode { .. }));
    assert_eq!(log.count(), 1);
    assert!(!output(console).contains("Received: "));
}

#[cfg(unix)]
#[tokio::test]
async fn undecodable_server_stderr_does_not_stop_the_run() {
    let script = r#"printf 'd\351marrage\n' >&2
while read line; do
  echo "handled request" >&2
  echo '{"jsonrpc":"2.0","id":0,"result":{}}'
done"#;
    let config = mcp_probe::config::ProbeConfig {
        command: "sh".to_string(),
        args: vec!["-c".to_string(), script.to_string()],
        drain_delay: std::time::Duration::from_millis(200),
        read_timeout: Some(std::time::Duration::from_secs(5)),
        ..fast_config()
    };
    let mut console = Console::new(Vec::new());

    let report = probe::run(&config, &Plan::standard(&config), &mut console)
        .await
        .expect("probe run");

    assert_eq!(report.responses().count(), 4);
    assert!(report.stderr.contains("marrage"));
    assert_eq!(report.stderr.matches("handled request").count(), 4);
    let termination = report.termination.expect("server terminated");
    assert!(!termination.forced);
}
