//! End-to-end ticketing flow against the in-memory store: registration →
//! lazy issuance → gate entry/exit toggling, including the capture loop
//! driving a full gate station.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use whereabout_server::models::Event;
use whereabout_server::scanner::capture::{
    stop_channel, CaptureConstraints, CaptureLoop, Frame, FrameSource, FrameStream, QrDetect,
};
use whereabout_server::scanner::feedback::{FeedbackPresenter, FlashColor, ScanPanel, Tone};
use whereabout_server::scanner::gate::GateProcessor;
use whereabout_server::scanner::{EntrySignal, GateStation, ScanOutcome};
use whereabout_server::store::MemoryStore;
use whereabout_server::ticket::IssuanceService;

fn seeded_event(store: &MemoryStore, title: &str) -> Uuid {
    let id = Uuid::new_v4();
    let now = Utc::now();
    store.add_event(Event {
        id,
        title: title.to_string(),
        description: Some("Annual campus event".to_string()),
        category: "campus".to_string(),
        location: "Student Union".to_string(),
        date_time: now,
        capacity: 500,
        attendance_count: 0,
        created_at: now,
        updated_at: now,
    });
    id
}

#[tokio::test]
async fn test_register_issue_enter_exit_scenario() {
    let store = Arc::new(MemoryStore::new());
    let issuance = IssuanceService::new(store.clone());
    let gate = GateProcessor::new(store.clone());

    let event_id = seeded_event(&store, "Homecoming Concert");
    let user_id = Uuid::new_v4();
    store.add_registration(event_id, user_id);

    // First visit to the ticket view issues the ticket.
    let tickets = issuance.tickets_for_user(user_id).await.unwrap();
    assert_eq!(tickets.len(), 1);
    let code = tickets[0].ticket.ticket_code.clone();
    assert_eq!(code, format!("EVENT-{event_id}-{user_id}"));

    // Gate scan: outside → entered.
    let outcome = gate.process_scan(&code).await.unwrap();
    assert_eq!(outcome.entry_status(), EntrySignal::Entered);
    assert_eq!(outcome.event_title(), "Homecoming Concert");

    // Same code scanned again later: inside → exited, same record closed.
    let outcome = gate.process_scan(&code).await.unwrap();
    assert_eq!(outcome.entry_status(), EntrySignal::Exited);
    assert_eq!(store.entry_count(), 1);

    // Re-entry opens a second record.
    let outcome = gate.process_scan(&code).await.unwrap();
    assert_eq!(outcome.entry_status(), EntrySignal::Entered);
    assert_eq!(store.entry_count(), 2);
}

#[tokio::test]
async fn test_reissue_after_restart_returns_same_row() {
    let store = Arc::new(MemoryStore::new());
    let event_id = seeded_event(&store, "Career Fair");
    let user_id = Uuid::new_v4();
    store.add_registration(event_id, user_id);

    let first = IssuanceService::new(store.clone())
        .get_or_create(event_id, user_id)
        .await
        .unwrap();

    // A fresh service over the same store, as after a process restart.
    let second = IssuanceService::new(store.clone())
        .get_or_create(event_id, user_id)
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(store.ticket_count(), 1);
}

// ---- capture loop driving a live gate station ----

struct OneCodeCamera {
    payload: String,
}

struct OneCodeStream {
    frames: Vec<Frame>,
}

impl FrameSource for OneCodeCamera {
    type Stream = OneCodeStream;

    async fn start(
        &mut self,
        _constraints: &CaptureConstraints,
    ) -> Result<OneCodeStream, whereabout_server::scanner::CaptureError> {
        // Three frames: nothing, the held-up ticket, nothing.
        Ok(OneCodeStream {
            frames: vec![
                Frame {
                    width: 2,
                    height: 2,
                    pixels: vec![0; 12],
                },
                Frame {
                    width: 2,
                    height: 2,
                    pixels: self.payload.clone().into_bytes(),
                },
                Frame {
                    width: 2,
                    height: 2,
                    pixels: vec![0; 12],
                },
            ],
        })
    }
}

impl FrameStream for OneCodeStream {
    async fn next_frame(&mut self) -> Option<Frame> {
        if self.frames.is_empty() {
            None
        } else {
            Some(self.frames.remove(0))
        }
    }

    async fn stop(&mut self) {}
}

/// Pretends the pixel buffer is the decoded payload when it is not blank.
struct PassthroughDetector;

impl QrDetect for PassthroughDetector {
    fn detect(&self, frame: &Frame) -> Option<String> {
        if frame.pixels.iter().all(|&b| b == 0) {
            return None;
        }
        String::from_utf8(frame.pixels.clone()).ok()
    }
}

#[derive(Clone, Default)]
struct PanelLog {
    panels: Arc<Mutex<Vec<ScanPanel>>>,
}

impl FeedbackPresenter for PanelLog {
    fn play_tone(&mut self, _tone: Tone) {}
    fn flash(&mut self, _color: FlashColor, _duration: Duration) {}
    fn show_panel(&mut self, panel: ScanPanel, _dismiss_after: Duration) {
        self.panels.lock().unwrap().push(panel);
    }
}

#[tokio::test]
async fn test_capture_loop_drives_gate_station_end_to_end() {
    let store = Arc::new(MemoryStore::new());
    let event_id = seeded_event(&store, "Hackathon Finals");
    let user_id = Uuid::new_v4();
    store.add_registration(event_id, user_id);

    let ticket = IssuanceService::new(store.clone())
        .get_or_create(event_id, user_id)
        .await
        .unwrap();

    let presenter = PanelLog::default();
    let panels = presenter.panels.clone();
    let station = GateStation::new(GateProcessor::new(store.clone()), presenter);

    let camera = OneCodeCamera {
        payload: ticket.ticket_code.clone(),
    };
    let mut capture = CaptureLoop::new(camera, PassthroughDetector, station);

    let (_stop_handle, stop) = stop_channel();
    capture
        .run(CaptureConstraints::default(), stop)
        .await
        .unwrap();

    let panels = panels.lock().unwrap();
    assert_eq!(panels.len(), 1);
    assert_eq!(panels[0].entry_status, EntrySignal::Entered);
    assert_eq!(panels[0].event_title, "Hackathon Finals");
    assert_eq!(panels[0].message, "Entry confirmed");
    assert_eq!(store.entry_count(), 1);
}

#[tokio::test]
async fn test_outcome_variants_carry_their_records() {
    let store = Arc::new(MemoryStore::new());
    let event_id = seeded_event(&store, "Orientation");
    let user_id = Uuid::new_v4();

    let ticket = IssuanceService::new(store.clone())
        .get_or_create(event_id, user_id)
        .await
        .unwrap();
    let gate = GateProcessor::new(store.clone());

    match gate.process_scan(&ticket.ticket_code).await.unwrap() {
        ScanOutcome::Entered { record, .. } => assert!(record.exited_at.is_none()),
        other => panic!("expected entry, got {other:?}"),
    }

    match gate.process_scan(&ticket.ticket_code).await.unwrap() {
        ScanOutcome::Exited { record, .. } => assert!(record.exited_at.is_some()),
        other => panic!("expected exit, got {other:?}"),
    }
}
