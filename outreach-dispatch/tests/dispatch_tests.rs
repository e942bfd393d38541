//! End-to-end dispatch tests against the in-memory store and mock sender
//!
//! These exercise the full path a campaign takes: lifecycle commands
//! through the orchestrator, the throttled send loop, pause/resume
//! hand-off, and the scheduler sweep.
#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};

use outreach_common::{
    account::Account,
    id::{AccountId, CampaignId, ContactId, UserId},
    status::CampaignStatus,
};
use outreach_dispatch::{
    DispatchEvent, Dispatcher, Notifier, NullNotifier, Orchestrator, PacingConfig, Scheduler,
    SchedulerConfig,
};
use outreach_sender::{MockSender, MockSenderFactory, SendError};
use outreach_store::{
    CampaignStore, MemoryAccountDirectory, MemoryStore, NewCampaignRecord, NewLogRecord,
};

/// Captures every dispatch event in arrival order
#[derive(Debug, Default)]
struct RecordingNotifier {
    events: Mutex<Vec<DispatchEvent>>,
}

impl RecordingNotifier {
    fn events(&self) -> Vec<DispatchEvent> {
        self.events.lock().expect("notifier lock poisoned").clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, event: DispatchEvent) {
        self.events.lock().expect("notifier lock poisoned").push(event);
    }
}

/// Store, mock sender and orchestrator wired the way the daemon wires
/// them, minus the real Cloud API client
struct TestRig {
    store: Arc<MemoryStore>,
    sender: MockSender,
    orchestrator: Orchestrator,
}

impl TestRig {
    fn new(pacing_ms: u64, notifier: Arc<dyn Notifier>) -> Self {
        let store = Arc::new(MemoryStore::new());
        let factory = MockSenderFactory::new();
        let sender = factory.sender();

        let accounts = MemoryAccountDirectory::with_accounts([Account {
            id: AccountId(1),
            owner: UserId(1),
            phone_number_id: "106540352242922".into(),
            access_token: "test-token".into(),
            api_version: None,
            display_name: "Test Business".into(),
        }]);

        let dispatcher = Dispatcher::new(
            Arc::clone(&store) as Arc<dyn CampaignStore>,
            Arc::new(accounts),
            Arc::new(factory),
            Arc::clone(&notifier),
            PacingConfig {
                message_delay_ms: pacing_ms,
            },
        );
        let orchestrator = Orchestrator::new(
            Arc::clone(&store) as Arc<dyn CampaignStore>,
            dispatcher,
            notifier,
        );

        Self {
            store,
            sender,
            orchestrator,
        }
    }

    async fn seed_campaign(
        &self,
        status: CampaignStatus,
        scheduled_at: Option<DateTime<Utc>>,
        recipients: &[&str],
    ) -> outreach_store::Campaign {
        let campaign = self
            .store
            .create_campaign(NewCampaignRecord {
                account_id: AccountId(1),
                created_by: UserId(1),
                title: "Launch announcement".into(),
                template_name: "launch_announcement".into(),
                language_code: "en_US".into(),
                components: Vec::new(),
                status,
                scheduled_at,
                contact_count: recipients.len(),
            })
            .await
            .expect("campaign should persist");

        let rows = recipients
            .iter()
            .enumerate()
            .map(|(index, phone)| NewLogRecord {
                contact_id: ContactId(index as u64 + 1),
                phone_number: (*phone).to_string(),
            })
            .collect();
        self.store
            .insert_logs(&campaign.id, rows)
            .await
            .expect("logs should persist");

        campaign
    }

    async fn wait_for_status(
        &self,
        id: &CampaignId,
        expected: CampaignStatus,
        timeout: Duration,
    ) -> outreach_store::Campaign {
        tokio::time::timeout(timeout, async {
            loop {
                let campaign = self
                    .store
                    .get_campaign(id)
                    .await
                    .expect("campaign should exist");
                if campaign.status == expected {
                    return campaign;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("campaign never reached {expected}"))
    }

    async fn wait_until_run_stops(&self, id: &CampaignId) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while self.orchestrator.is_running(id) {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("run task should stop");
    }
}

#[tokio::test]
async fn test_execute_sends_every_recipient_in_order() {
    let rig = TestRig::new(0, Arc::new(NullNotifier));
    let campaign = rig
        .seed_campaign(
            CampaignStatus::Draft,
            None,
            &["911111111111", "912222222222", "913333333333"],
        )
        .await;

    let running = rig
        .orchestrator
        .execute(&campaign.id)
        .await
        .expect("execute should start the run");
    assert_eq!(running.status, CampaignStatus::Running);
    assert!(running.started_at.is_some());

    let completed = rig
        .wait_for_status(&campaign.id, CampaignStatus::Completed, Duration::from_secs(2))
        .await;
    assert_eq!(completed.messages_sent, 3);
    assert_eq!(completed.messages_failed, 0);
    assert!(completed.completed_at.is_some());

    // Oldest log row first, exactly the insertion order
    assert_eq!(
        rig.sender.recipients(),
        vec![
            "911111111111".to_string(),
            "912222222222".to_string(),
            "913333333333".to_string(),
        ]
    );

    let counts = rig
        .store
        .log_status_counts(&campaign.id)
        .await
        .expect("campaign should exist");
    assert_eq!(counts.sent, 3);
    assert_eq!(counts.pending, 0);

    let page = rig
        .store
        .logs_page(&campaign.id, 1, 10)
        .await
        .expect("campaign should exist");
    for log in &page.logs {
        assert!(log.message_id.as_deref().is_some_and(|id| id.starts_with("wamid.")));
        assert!(log.sent_at.is_some());
    }
}

#[tokio::test]
async fn test_failed_recipient_does_not_stop_the_run() {
    let rig = TestRig::new(0, Arc::new(NullNotifier));
    let campaign = rig
        .seed_campaign(
            CampaignStatus::Draft,
            None,
            &["911111111111", "912222222222", "913333333333"],
        )
        .await;

    rig.sender.fail_for(
        "912222222222",
        SendError::Api {
            code: 131_026,
            message: "Message undeliverable".into(),
        },
    );

    rig.orchestrator
        .execute(&campaign.id)
        .await
        .expect("execute should start the run");

    let completed = rig
        .wait_for_status(&campaign.id, CampaignStatus::Completed, Duration::from_secs(2))
        .await;
    assert_eq!(completed.messages_sent, 2);
    assert_eq!(completed.messages_failed, 1);

    let page = rig
        .store
        .logs_page(&campaign.id, 1, 10)
        .await
        .expect("campaign should exist");
    let failed = page
        .logs
        .iter()
        .find(|log| log.phone_number == "912222222222")
        .expect("failed row should exist");
    assert_eq!(
        failed.error_message.as_deref(),
        Some("WhatsApp API error [131026]: Message undeliverable")
    );
    assert!(failed.message_id.is_none());

    for log in page.logs.iter().filter(|log| log.phone_number != "912222222222") {
        assert!(log.message_id.is_some());
    }
}

#[tokio::test]
async fn test_pause_banks_progress_and_resume_sends_each_recipient_once() {
    // Slow pacing so the pause lands inside a throttle gap, never
    // mid-send
    let rig = TestRig::new(1_000, Arc::new(NullNotifier));
    let campaign = rig
        .seed_campaign(
            CampaignStatus::Draft,
            None,
            &["911111111111", "912222222222", "913333333333"],
        )
        .await;

    let running = rig
        .orchestrator
        .execute(&campaign.id)
        .await
        .expect("execute should start the run");
    let first_started_at = running.started_at;

    rig.sender
        .wait_for_count(1, Duration::from_secs(2))
        .await
        .expect("first send should happen");

    rig.orchestrator
        .pause(&campaign.id)
        .await
        .expect("pause should succeed");
    rig.wait_until_run_stops(&campaign.id).await;

    let paused = rig
        .store
        .get_campaign(&campaign.id)
        .await
        .expect("campaign should exist");
    assert_eq!(paused.status, CampaignStatus::Paused);
    assert!(paused.messages_sent >= 1);
    assert!(
        paused.messages_sent < 3,
        "pause should leave recipients pending"
    );

    let pending = rig
        .store
        .pending_logs(&campaign.id)
        .await
        .expect("campaign should exist");
    assert_eq!(pending.len(), 3 - paused.messages_sent);

    let resumed = rig
        .orchestrator
        .resume(&campaign.id)
        .await
        .expect("resume should start a new run");
    assert_eq!(resumed.status, CampaignStatus::Running);

    let completed = rig
        .wait_for_status(&campaign.id, CampaignStatus::Completed, Duration::from_secs(5))
        .await;
    assert_eq!(completed.messages_sent, 3);
    assert_eq!(completed.messages_failed, 0);
    // Resume continues the original run's clock
    assert_eq!(completed.started_at, first_started_at);

    // Each recipient exactly once across both runs
    let mut recipients = rig.sender.recipients();
    recipients.sort_unstable();
    assert_eq!(
        recipients,
        vec![
            "911111111111".to_string(),
            "912222222222".to_string(),
            "913333333333".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_resume_requires_a_paused_campaign() {
    let rig = TestRig::new(1_000, Arc::new(NullNotifier));
    let campaign = rig
        .seed_campaign(
            CampaignStatus::Draft,
            None,
            &["911111111111", "912222222222"],
        )
        .await;

    rig.orchestrator
        .execute(&campaign.id)
        .await
        .expect("execute should start the run");

    let error = rig
        .orchestrator
        .resume(&campaign.id)
        .await
        .expect_err("resume while running should conflict");
    assert_eq!(error.to_string(), "cannot resume campaign while running");
}

#[tokio::test]
async fn test_scheduler_promotes_a_due_campaign_end_to_end() {
    let rig = TestRig::new(0, Arc::new(NullNotifier));
    let now = Utc::now();
    let campaign = rig
        .seed_campaign(
            CampaignStatus::Scheduled,
            Some(now - chrono::Duration::minutes(1)),
            &["911111111111", "912222222222"],
        )
        .await;

    let scheduler = Scheduler::new(
        Arc::clone(&rig.store) as Arc<dyn CampaignStore>,
        rig.orchestrator.clone(),
        SchedulerConfig::default(),
    );

    let started = scheduler.poll_due(now).await.expect("sweep should succeed");
    assert_eq!(started, 1);

    let completed = rig
        .wait_for_status(&campaign.id, CampaignStatus::Completed, Duration::from_secs(2))
        .await;
    assert_eq!(completed.messages_sent, 2);
    assert_eq!(rig.sender.sent_count(), 2);

    // The campaign left scheduled, so a second sweep is a no-op
    let started = scheduler.poll_due(now).await.expect("sweep should succeed");
    assert_eq!(started, 0);
}

#[tokio::test]
async fn test_missing_account_marks_the_campaign_failed() {
    let notifier = Arc::new(RecordingNotifier::default());

    // Wire a dispatcher whose account directory is empty
    let store = Arc::new(MemoryStore::new());
    let dispatcher = Dispatcher::new(
        Arc::clone(&store) as Arc<dyn CampaignStore>,
        Arc::new(MemoryAccountDirectory::new()),
        Arc::new(MockSenderFactory::new()),
        Arc::clone(&notifier) as Arc<dyn Notifier>,
        PacingConfig::default(),
    );
    let orchestrator = Orchestrator::new(
        Arc::clone(&store) as Arc<dyn CampaignStore>,
        dispatcher,
        Arc::clone(&notifier) as Arc<dyn Notifier>,
    );

    let campaign = store
        .create_campaign(NewCampaignRecord {
            account_id: AccountId(9),
            created_by: UserId(1),
            title: "Orphaned".into(),
            template_name: "orphaned".into(),
            language_code: "en_US".into(),
            components: Vec::new(),
            status: CampaignStatus::Draft,
            scheduled_at: None,
            contact_count: 0,
        })
        .await
        .expect("campaign should persist");

    orchestrator
        .execute(&campaign.id)
        .await
        .expect("execute should still start the run");

    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let row = store
                .get_campaign(&campaign.id)
                .await
                .expect("campaign should exist");
            if row.status == CampaignStatus::Failed {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("campaign should end up failed");

    let events = notifier.events();
    assert!(events.iter().any(|event| matches!(
        event,
        DispatchEvent::RunFailed { reason, .. } if reason.contains("not found")
    )));
}

#[tokio::test]
async fn test_events_trace_the_whole_run() {
    let notifier = Arc::new(RecordingNotifier::default());
    let rig = TestRig::new(0, Arc::clone(&notifier) as Arc<dyn Notifier>);
    let campaign = rig
        .seed_campaign(
            CampaignStatus::Draft,
            None,
            &["911111111111", "912222222222"],
        )
        .await;

    rig.sender.fail_for(
        "912222222222",
        SendError::Api {
            code: 131_047,
            message: "Re-engagement message".into(),
        },
    );

    rig.orchestrator
        .execute(&campaign.id)
        .await
        .expect("execute should start the run");

    // The completion event lands after the status write; wait for it
    // rather than for the status
    tokio::time::timeout(Duration::from_secs(2), async {
        while !matches!(
            notifier.events().last(),
            Some(DispatchEvent::RunCompleted { .. })
        ) {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("run should complete");

    let events = notifier.events();
    assert_eq!(events.len(), 4);
    assert!(matches!(
        events[0],
        DispatchEvent::RunStarted { pending: 2, .. }
    ));
    assert!(matches!(
        &events[1],
        DispatchEvent::MessageSent { message_id, .. } if message_id.starts_with("wamid.")
    ));
    assert!(matches!(
        &events[2],
        DispatchEvent::MessageFailed { reason, .. } if reason.contains("131047")
    ));
    assert!(matches!(
        events[3],
        DispatchEvent::RunCompleted { sent: 1, failed: 1, .. }
    ));
}
