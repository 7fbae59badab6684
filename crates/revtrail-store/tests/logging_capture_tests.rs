// Integration tests for boundary logging of tracked operations.
// The capture buffer is shared across tests, so assertions match on
// per-test document ids or error codes.

use revtrail_core::logging_facility::init_test_capture;
use revtrail_core::{PaperTrail, TrailConfig};
use revtrail_core_types::schema::{EVENT_END, EVENT_END_ERROR, EVENT_START};
use revtrail_store::{define_models, MutationOptions, Tracked, TrackedEntity};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Ticket {
    id: String,
    status: String,
}

impl TrackedEntity for Ticket {
    const MODEL: &'static str = "Ticket";
    const TABLE: &'static str = "tickets";

    fn document_id(&self) -> String {
        self.id.clone()
    }
}

fn setup() -> (Connection, Tracked<Ticket>) {
    let trail = Arc::new(PaperTrail::new(TrailConfig::default()).unwrap());
    let mut conn = Connection::open_in_memory().unwrap();
    define_models(&mut conn, &trail).unwrap();
    Tracked::<Ticket>::define_table(&conn, &trail).unwrap();
    let tickets = Tracked::new(&conn, trail).unwrap();
    (conn, tickets)
}

#[test]
fn test_create_logs_start_and_end() {
    let capture = init_test_capture();
    let (mut conn, tickets) = setup();
    let tx = conn.transaction().unwrap();

    let ticket = Ticket {
        id: "log-create-1".to_string(),
        status: "open".to_string(),
    };
    tickets.create(&tx, &ticket, &MutationOptions::new()).unwrap();

    let events = capture.events_for_op("tracked_create");
    assert!(events.iter().any(|e| e.is("tracked_create", EVENT_START)
        && e.field("model") == Some("Ticket")
        && e.field("document_id") == Some("log-create-1")));
    assert!(events
        .iter()
        .any(|e| e.is("tracked_create", EVENT_END) && e.field("duration_ms").is_some()));
}

#[test]
fn test_failed_destroy_logs_error_code() {
    let capture = init_test_capture();
    let (mut conn, tickets) = setup();
    let tx = conn.transaction().unwrap();

    tickets
        .destroy(&tx, "log-missing-1", &MutationOptions::new())
        .unwrap_err();

    capture.assert_event_exists("tracked_destroy", EVENT_START);
    let errors = capture.count_events(|e| {
        e.is("tracked_destroy", EVENT_END_ERROR)
            && e.field("err_code") == Some("ERR_NOT_FOUND")
            && e.field("err_model") == Some("Ticket")
            && e.field("err_document_id") == Some("log-missing-1")
    });
    assert!(errors >= 1);
}
