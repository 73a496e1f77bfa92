//! Dispatch loop: from tagged deliveries to notification jobs.
//!
//! The dispatcher is the single consumer of incoming webhook deliveries. Per
//! delivery it:
//!
//! 1. routes on the event-kind tag (unrecognized kinds are logged and
//!    ignored);
//! 2. runs the matching decoder (a decode failure drops that delivery -
//!    webhook sources do not resend on consumer-side failure);
//! 3. applies the notification policy (a non-notifying action is the common
//!    case and is dropped silently);
//! 4. renders the notification, resolves today's duty slot, and hands one
//!    job per recipient to the mailer.
//!
//! Jobs fan out best-effort: one recipient's send failure is logged and does
//! not block the remaining recipients. Processing is sequential; throughput
//! is bounded by human notification volume, not performance.

use std::sync::Arc;

use chrono::{Datelike, Local, Weekday};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::duty::DutyRoster;
use crate::mail::Mailer;
use crate::notify::{NotificationJob, render, should_notify};
use crate::webhooks::events::RepoEvent;
use crate::webhooks::payload::Payload;
use crate::webhooks::{decode_issue_comment_event, decode_issue_event};

/// Channel buffer size for incoming deliveries.
pub const DELIVERY_CHANNEL_BUFFER: usize = 100;

/// Event-kind tag for `issues` deliveries.
const KIND_ISSUES: &str = "issues";
/// Event-kind tag for `issue_comment` deliveries.
const KIND_ISSUE_COMMENT: &str = "issue_comment";

/// One inbound webhook delivery: the event-kind tag plus the JSON body.
#[derive(Debug, Clone)]
pub struct Delivery {
    /// The `X-GitHub-Event` header value.
    pub event_kind: String,

    /// The parsed JSON body.
    pub payload: Payload,
}

impl Delivery {
    pub fn new(event_kind: impl Into<String>, payload: impl Into<Payload>) -> Self {
        Delivery {
            event_kind: event_kind.into(),
            payload: payload.into(),
        }
    }
}

/// Source of "what weekday is it".
///
/// The dispatcher resolves the duty slot against this at dispatch time, so
/// tests can pin the day while production reads the local wall clock.
pub trait Clock: Send + Sync {
    fn today(&self) -> Weekday;
}

/// Production clock: the local wall-clock weekday.
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> Weekday {
        Local::now().weekday()
    }
}

/// A clock pinned to one weekday.
pub struct FixedClock(pub Weekday);

impl Clock for FixedClock {
    fn today(&self) -> Weekday {
        self.0
    }
}

/// The dispatch loop's immutable dependencies.
///
/// Constructed once at startup from loaded configuration; nothing here is
/// mutated afterwards, so the dispatcher can process deliveries without any
/// locking.
pub struct Dispatcher {
    roster: DutyRoster,
    clock: Box<dyn Clock>,
    mailer: Arc<dyn Mailer>,
}

impl Dispatcher {
    pub fn new(roster: DutyRoster, clock: Box<dyn Clock>, mailer: Arc<dyn Mailer>) -> Self {
        Dispatcher {
            roster,
            clock,
            mailer,
        }
    }

    /// Runs the loop until the delivery channel closes or shutdown is
    /// requested. In-flight jobs may be dropped on shutdown; there is no
    /// durability guarantee.
    pub async fn run(&self, mut rx: mpsc::Receiver<Delivery>, cancel: CancellationToken) {
        info!("Dispatch loop listening");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Dispatch loop shutting down");
                    break;
                }
                delivery = rx.recv() => {
                    match delivery {
                        Some(delivery) => {
                            self.process(delivery).await;
                        }
                        None => {
                            info!("Delivery channel closed, dispatch loop exiting");
                            break;
                        }
                    }
                }
            }
        }
    }

    /// Processes one delivery end to end.
    ///
    /// Returns the number of jobs successfully handed to the mailer. All
    /// failure modes are handled here: nothing a single delivery does can
    /// take the loop down.
    pub async fn process(&self, delivery: Delivery) -> usize {
        let event = match delivery.event_kind.as_str() {
            KIND_ISSUES => match decode_issue_event(&delivery.payload) {
                Ok(event) => RepoEvent::Issue(event),
                Err(e) => {
                    warn!(kind = KIND_ISSUES, field = %e.path(), "Dropping undecodable delivery");
                    return 0;
                }
            },
            KIND_ISSUE_COMMENT => match decode_issue_comment_event(&delivery.payload) {
                Ok(event) => RepoEvent::IssueComment(event),
                Err(e) => {
                    warn!(kind = KIND_ISSUE_COMMENT, field = %e.path(), "Dropping undecodable delivery");
                    return 0;
                }
            },
            other => {
                debug!(kind = %other, "Ignoring unrecognized event kind");
                return 0;
            }
        };

        if !should_notify(&event) {
            debug!(action = %event.action(), "Action not notification-worthy, dropping");
            return 0;
        }

        let notification = render(&event);
        let today = self.clock.today();
        let on_duty = self.roster.recipients_for(today);

        if on_duty.is_empty() {
            debug!(day = ?today, "Duty slot is empty, nobody to notify");
            return 0;
        }

        let mut sent = 0;
        for recipient in on_duty {
            let job = NotificationJob::new(&notification, recipient.clone());
            match self.mailer.send(&job).await {
                Ok(()) => {
                    info!(recipient = %recipient, action = %event.action(), "Notification dispatched");
                    sent += 1;
                }
                Err(e) => {
                    // Best-effort fan-out: keep going with the other recipients.
                    error!(recipient = %recipient, error = %e, "Failed to send notification");
                }
            }
        }

        sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;

    use crate::duty::Recipient;
    use crate::mail::SendError;

    /// Records every job handed to it; optionally fails named recipients.
    struct RecordingMailer {
        jobs: Mutex<Vec<NotificationJob>>,
        failing: HashSet<String>,
    }

    impl RecordingMailer {
        fn new() -> Self {
            RecordingMailer {
                jobs: Mutex::new(Vec::new()),
                failing: HashSet::new(),
            }
        }

        fn failing_for(recipients: &[&str]) -> Self {
            RecordingMailer {
                jobs: Mutex::new(Vec::new()),
                failing: recipients.iter().map(|r| r.to_string()).collect(),
            }
        }

        fn jobs(&self) -> Vec<NotificationJob> {
            self.jobs.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, job: &NotificationJob) -> Result<(), SendError> {
            self.jobs.lock().unwrap().push(job.clone());
            if self.failing.contains(job.recipient.as_str()) {
                let bad = "not an address".parse::<lettre::Address>().unwrap_err();
                return Err(SendError::Address(bad));
            }
            Ok(())
        }
    }

    fn monday_roster(members: &[&str]) -> DutyRoster {
        let mut slots: [Vec<Recipient>; 7] = Default::default();
        slots[1] = members.iter().map(|m| Recipient::from(*m)).collect();
        DutyRoster::new(slots)
    }

    fn dispatcher_on_monday(
        roster: DutyRoster,
        mailer: Arc<RecordingMailer>,
    ) -> Dispatcher {
        Dispatcher::new(roster, Box::new(FixedClock(Weekday::Mon)), mailer)
    }

    fn issue_delivery(action: &str) -> Delivery {
        Delivery::new(
            "issues",
            json!({
                "action": action,
                "issue": {
                    "title": "Bug X",
                    "html_url": "http://x/1"
                }
            }),
        )
    }

    fn comment_delivery(action: &str) -> Delivery {
        Delivery::new(
            "issue_comment",
            json!({
                "action": action,
                "issue": { "title": "Bug X" },
                "comment": {
                    "body": "LGTM",
                    "html_url": "http://x/1#c1",
                    "user": { "login": "bob" }
                }
            }),
        )
    }

    #[tokio::test]
    async fn opened_issue_notifies_the_one_on_duty() {
        let mailer = Arc::new(RecordingMailer::new());
        let dispatcher = dispatcher_on_monday(monday_roster(&["alice@x.com"]), mailer.clone());

        let sent = dispatcher.process(issue_delivery("opened")).await;

        assert_eq!(sent, 1);
        let jobs = mailer.jobs();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].recipient, Recipient::from("alice@x.com"));
        assert!(jobs[0].title.contains("Bug X"));
        assert!(jobs[0].title.contains("opened"));
    }

    #[tokio::test]
    async fn empty_duty_slot_produces_no_jobs() {
        let mailer = Arc::new(RecordingMailer::new());
        let dispatcher = dispatcher_on_monday(monday_roster(&[]), mailer.clone());

        let sent = dispatcher.process(issue_delivery("opened")).await;

        assert_eq!(sent, 0);
        assert!(mailer.jobs().is_empty());
    }

    #[tokio::test]
    async fn comment_fans_out_to_every_on_duty_recipient() {
        let mailer = Arc::new(RecordingMailer::new());
        let dispatcher = dispatcher_on_monday(
            monday_roster(&["alice@x.com", "carol@x.com"]),
            mailer.clone(),
        );

        let sent = dispatcher.process(comment_delivery("created")).await;

        assert_eq!(sent, 2);
        let jobs = mailer.jobs();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].recipient, Recipient::from("alice@x.com"));
        assert_eq!(jobs[1].recipient, Recipient::from("carol@x.com"));
        for job in &jobs {
            assert!(job.body.contains("bob"));
            assert!(job.body.contains("LGTM"));
        }
    }

    #[tokio::test]
    async fn closed_issue_is_dropped_silently() {
        let mailer = Arc::new(RecordingMailer::new());
        let dispatcher = dispatcher_on_monday(monday_roster(&["alice@x.com"]), mailer.clone());

        let sent = dispatcher.process(issue_delivery("closed")).await;

        assert_eq!(sent, 0);
        assert!(mailer.jobs().is_empty());
    }

    #[tokio::test]
    async fn undecodable_delivery_is_dropped() {
        let mailer = Arc::new(RecordingMailer::new());
        let dispatcher = dispatcher_on_monday(monday_roster(&["alice@x.com"]), mailer.clone());

        // Missing issue.title.
        let delivery = Delivery::new(
            "issues",
            json!({
                "action": "opened",
                "issue": { "html_url": "http://x/1" }
            }),
        );
        let sent = dispatcher.process(delivery).await;

        assert_eq!(sent, 0);
        assert!(mailer.jobs().is_empty());
    }

    #[tokio::test]
    async fn unrecognized_event_kind_is_ignored() {
        let mailer = Arc::new(RecordingMailer::new());
        let dispatcher = dispatcher_on_monday(monday_roster(&["alice@x.com"]), mailer.clone());

        let delivery = Delivery::new("push", json!({ "ref": "refs/heads/main" }));
        let sent = dispatcher.process(delivery).await;

        assert_eq!(sent, 0);
        assert!(mailer.jobs().is_empty());
    }

    #[tokio::test]
    async fn one_failing_recipient_does_not_block_the_rest() {
        let mailer = Arc::new(RecordingMailer::failing_for(&["alice@x.com"]));
        let dispatcher = dispatcher_on_monday(
            monday_roster(&["alice@x.com", "carol@x.com"]),
            mailer.clone(),
        );

        let sent = dispatcher.process(issue_delivery("reopen")).await;

        // Both sends were attempted; only carol's succeeded.
        assert_eq!(sent, 1);
        assert_eq!(mailer.jobs().len(), 2);
    }

    #[tokio::test]
    async fn edited_comment_is_dropped_silently() {
        let mailer = Arc::new(RecordingMailer::new());
        let dispatcher = dispatcher_on_monday(monday_roster(&["alice@x.com"]), mailer.clone());

        let sent = dispatcher.process(comment_delivery("edited")).await;

        assert_eq!(sent, 0);
        assert!(mailer.jobs().is_empty());
    }

    #[tokio::test]
    async fn duty_is_resolved_against_the_clock_day() {
        let mut slots: [Vec<Recipient>; 7] = Default::default();
        slots[0] = vec![Recipient::from("sun@x.com")];
        slots[6] = vec![Recipient::from("sat@x.com")];
        let roster = DutyRoster::new(slots);

        let mailer = Arc::new(RecordingMailer::new());
        let dispatcher = Dispatcher::new(
            roster,
            Box::new(FixedClock(Weekday::Sat)),
            mailer.clone(),
        );

        dispatcher.process(issue_delivery("opened")).await;

        let jobs = mailer.jobs();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].recipient, Recipient::from("sat@x.com"));
    }

    #[tokio::test]
    async fn run_drains_channel_until_closed() {
        let mailer = Arc::new(RecordingMailer::new());
        let dispatcher = dispatcher_on_monday(monday_roster(&["alice@x.com"]), mailer.clone());

        let (tx, rx) = mpsc::channel(DELIVERY_CHANNEL_BUFFER);
        tx.send(issue_delivery("opened")).await.unwrap();
        tx.send(issue_delivery("closed")).await.unwrap();
        tx.send(comment_delivery("created")).await.unwrap();
        drop(tx);

        dispatcher.run(rx, CancellationToken::new()).await;

        // opened + comment notify, closed does not.
        assert_eq!(mailer.jobs().len(), 2);
    }

    #[tokio::test]
    async fn run_stops_on_cancellation() {
        let mailer = Arc::new(RecordingMailer::new());
        let dispatcher = dispatcher_on_monday(monday_roster(&["alice@x.com"]), mailer.clone());

        let (_tx, rx) = mpsc::channel::<Delivery>(1);
        let cancel = CancellationToken::new();
        cancel.cancel();

        // Must return promptly even though the channel never closes.
        dispatcher.run(rx, cancel).await;
        assert!(mailer.jobs().is_empty());
    }
}
