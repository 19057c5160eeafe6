//! Operator feedback for scan outcomes.
//!
//! Every scan — accepted or rejected — produces a tone, a color flash and a
//! panel update within the same interaction cycle. Purely presentational;
//! no business state lives here.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::scanner::capture::ScanHandler;
use crate::scanner::gate::{EntrySignal, GateProcessor, ScanOutcome};
use crate::store::TicketStore;

/// A short oscillator burst.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Tone {
    pub frequency_hz: u32,
    pub duration_ms: u64,
    pub gain: f32,
}

pub const SUCCESS_TONE: Tone = Tone {
    frequency_hz: 900,
    duration_ms: 150,
    gain: 0.3,
};

pub const REJECT_TONE: Tone = Tone {
    frequency_hz: 300,
    duration_ms: 200,
    gain: 0.4,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashColor {
    /// Entry confirmed.
    Green,
    /// Exit confirmed.
    Blue,
    /// Rejection or failure.
    Red,
}

pub const FLASH_DURATION: Duration = Duration::from_millis(600);

/// How long the last-scan panel stays up before auto-dismissing.
pub const PANEL_DISMISS_DELAY: Duration = Duration::from_millis(3500);

/// What the operator-facing panel shows for one scan.
#[derive(Debug, Clone, Serialize)]
pub struct ScanPanel {
    pub event_title: String,
    pub message: String,
    pub ticket_status: String,
    pub entry_status: EntrySignal,
    pub code: String,
    pub scanned_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanFeedback {
    pub tone: Tone,
    pub flash: FlashColor,
    pub panel: ScanPanel,
}

/// Maps an outcome to its signals. Pure; the timestamp is passed in so the
/// panel reflects when the scan was judged.
pub fn feedback_for(outcome: &ScanOutcome, scanned_at: DateTime<Utc>) -> ScanFeedback {
    let (tone, flash) = match outcome.entry_status() {
        EntrySignal::Entered => (SUCCESS_TONE, FlashColor::Green),
        EntrySignal::Exited => (SUCCESS_TONE, FlashColor::Blue),
        EntrySignal::Error => (REJECT_TONE, FlashColor::Red),
    };

    ScanFeedback {
        tone,
        flash,
        panel: ScanPanel {
            event_title: outcome.event_title().to_string(),
            message: outcome.message().to_string(),
            ticket_status: outcome.ticket_status().to_string(),
            entry_status: outcome.entry_status(),
            code: outcome.scanned_code().to_string(),
            scanned_at,
        },
    }
}

/// Station-side output device: speaker, display backlight, panel.
pub trait FeedbackPresenter: Send {
    fn play_tone(&mut self, tone: Tone);
    fn flash(&mut self, color: FlashColor, duration: Duration);
    fn show_panel(&mut self, panel: ScanPanel, dismiss_after: Duration);
}

pub struct FeedbackController<P> {
    presenter: P,
}

impl<P: FeedbackPresenter> FeedbackController<P> {
    pub fn new(presenter: P) -> Self {
        Self { presenter }
    }

    /// Pushes all three signals for an outcome and returns what was shown.
    pub fn present(&mut self, outcome: &ScanOutcome) -> ScanFeedback {
        let feedback = feedback_for(outcome, Utc::now());
        self.emit(&feedback);
        feedback
    }

    /// Rejection-style signals for a scan that could not be judged at all
    /// (store unreachable mid-scan). The operator retries; the loop keeps
    /// running.
    pub fn present_failure(&mut self, raw_code: &str) -> ScanFeedback {
        let feedback = ScanFeedback {
            tone: REJECT_TONE,
            flash: FlashColor::Red,
            panel: ScanPanel {
                event_title: "Unknown".to_string(),
                message: "Scan failed, try again".to_string(),
                ticket_status: "invalid".to_string(),
                entry_status: EntrySignal::Error,
                code: raw_code.trim().to_string(),
                scanned_at: Utc::now(),
            },
        };
        self.emit(&feedback);
        feedback
    }

    fn emit(&mut self, feedback: &ScanFeedback) {
        self.presenter.play_tone(feedback.tone);
        self.presenter.flash(feedback.flash, FLASH_DURATION);
        self.presenter
            .show_panel(feedback.panel.clone(), PANEL_DISMISS_DELAY);
    }
}

/// A gate processor and its feedback wired together as the capture loop's
/// downstream: scan in, signals out, one at a time.
pub struct GateStation<S, P> {
    gate: GateProcessor<S>,
    feedback: FeedbackController<P>,
}

impl<S: TicketStore, P: FeedbackPresenter> GateStation<S, P> {
    pub fn new(gate: GateProcessor<S>, presenter: P) -> Self {
        Self {
            gate,
            feedback: FeedbackController::new(presenter),
        }
    }
}

impl<S: TicketStore, P: FeedbackPresenter> ScanHandler for GateStation<S, P> {
    async fn handle_scan(&mut self, payload: &str) {
        match self.gate.process_scan(payload).await {
            Ok(outcome) => {
                self.feedback.present(&outcome);
            }
            Err(err) => {
                tracing::error!(error = %err, "Scan processing failed");
                self.feedback.present_failure(payload);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::gate::RejectReason;
    use crate::store::MemoryStore;
    use crate::ticket::IssuanceService;
    use std::sync::{Arc, Mutex};
    use uuid::Uuid;

    #[derive(Debug, Clone, PartialEq)]
    enum Signal {
        Tone(u32),
        Flash(FlashColor),
        Panel(String),
    }

    #[derive(Clone, Default)]
    struct RecordingPresenter {
        signals: Arc<Mutex<Vec<Signal>>>,
    }

    impl FeedbackPresenter for RecordingPresenter {
        fn play_tone(&mut self, tone: Tone) {
            self.signals.lock().unwrap().push(Signal::Tone(tone.frequency_hz));
        }

        fn flash(&mut self, color: FlashColor, _duration: Duration) {
            self.signals.lock().unwrap().push(Signal::Flash(color));
        }

        fn show_panel(&mut self, panel: ScanPanel, _dismiss_after: Duration) {
            self.signals.lock().unwrap().push(Signal::Panel(panel.message));
        }
    }

    fn rejected(reason: RejectReason) -> ScanOutcome {
        ScanOutcome::Rejected {
            reason,
            raw_code: "garbage".to_string(),
        }
    }

    #[test]
    fn test_rejection_maps_to_red_flash_and_low_tone() {
        let feedback = feedback_for(&rejected(RejectReason::MalformedPayload), Utc::now());

        assert_eq!(feedback.tone, REJECT_TONE);
        assert_eq!(feedback.flash, FlashColor::Red);
        assert_eq!(feedback.panel.message, "Invalid QR format");
        assert_eq!(feedback.panel.event_title, "Unknown");
        assert_eq!(feedback.panel.entry_status, EntrySignal::Error);
    }

    #[test]
    fn test_unknown_ticket_keeps_its_own_message() {
        let feedback = feedback_for(&rejected(RejectReason::UnknownTicket), Utc::now());
        assert_eq!(feedback.panel.message, "Invalid or used ticket");
    }

    #[tokio::test]
    async fn test_entry_and_exit_map_to_distinct_colors() {
        let store = Arc::new(MemoryStore::new());
        let gate = GateProcessor::new(store.clone());
        let ticket = IssuanceService::new(store)
            .get_or_create(Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap();

        let entered = gate.process_scan(&ticket.ticket_code).await.unwrap();
        let entered = feedback_for(&entered, Utc::now());
        assert_eq!(entered.flash, FlashColor::Green);
        assert_eq!(entered.tone, SUCCESS_TONE);
        assert_eq!(entered.panel.message, "Entry confirmed");

        let exited = gate.process_scan(&ticket.ticket_code).await.unwrap();
        let exited = feedback_for(&exited, Utc::now());
        assert_eq!(exited.flash, FlashColor::Blue);
        assert_eq!(exited.tone, SUCCESS_TONE);
        assert_eq!(exited.panel.message, "Exit confirmed");
    }

    #[tokio::test]
    async fn test_station_signals_every_scan_including_rejections() {
        let store = Arc::new(MemoryStore::new());
        let presenter = RecordingPresenter::default();
        let signals = presenter.signals.clone();
        let mut station = GateStation::new(GateProcessor::new(store), presenter);

        station.handle_scan("not-a-real-code").await;

        let recorded = signals.lock().unwrap();
        assert_eq!(
            *recorded,
            vec![
                Signal::Tone(REJECT_TONE.frequency_hz),
                Signal::Flash(FlashColor::Red),
                Signal::Panel("Invalid QR format".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_station_survives_store_outage_with_failure_feedback() {
        let store = Arc::new(MemoryStore::new());
        let ticket = IssuanceService::new(store.clone())
            .get_or_create(Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap();
        store.set_unavailable(true);

        let presenter = RecordingPresenter::default();
        let signals = presenter.signals.clone();
        let mut station = GateStation::new(GateProcessor::new(store), presenter);

        station.handle_scan(&ticket.ticket_code).await;

        let recorded = signals.lock().unwrap();
        assert!(recorded.contains(&Signal::Panel("Scan failed, try again".to_string())));
    }
}
