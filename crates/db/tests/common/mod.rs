//! Shared harness: a store migrated with the real migrator (in-memory SQLite
//! by default, Postgres when asked), every service wired on it, and a notifier
//! that records mail.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use splittrip_db::services::{CreateTransaction, CreateTrip, InviteParticipant};
use splittrip_db::views::TransactionView;
use splittrip_db::{
    CostService, DebtLedger, LedgerStore, Mailer, TransactionLifecycle, TripService,
    TripViewService, UserService,
};
use splittrip_shared::auth::{ActivateRequest, RegisterRequest};
use splittrip_shared::config::{ActivationConfig, DatabaseConfig, EmailConfig, JwtConfig};
use splittrip_shared::email::{EmailError, Notifier};
use splittrip_shared::jwt::JwtService;
use uuid::Uuid;

/// One recorded message.
#[derive(Debug, Clone)]
pub struct SentMail {
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

/// Records every message; fails every call while `failing` is set.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<SentMail>>,
    pub attempts: Mutex<u32>,
    pub failing: AtomicBool,
}

impl RecordingNotifier {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn last(&self) -> Option<SentMail> {
        self.sent.lock().unwrap().last().cloned()
    }

    pub fn attempts(&self) -> u32 {
        *self.attempts.lock().unwrap()
    }

    /// Token from the most recent activation mail.
    pub fn last_activation_token(&self) -> String {
        let mail = self.last().expect("no mail sent");
        let start = mail.body.find("token=").expect("no token in mail") + "token=".len();
        mail.body[start..]
            .split_whitespace()
            .next()
            .expect("empty token")
            .to_string()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(
        &self,
        recipients: &[String],
        subject: &str,
        body: &str,
    ) -> Result<(), EmailError> {
        *self.attempts.lock().unwrap() += 1;
        if self.failing.load(Ordering::SeqCst) {
            return Err(EmailError::SendError("smtp down".to_string()));
        }
        self.sent.lock().unwrap().push(SentMail {
            to: recipients.to_vec(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

pub struct TestApp {
    pub store: LedgerStore,
    pub users: UserService,
    pub trips: TripService,
    pub costs: CostService,
    pub transactions: TransactionLifecycle,
    pub ledger: DebtLedger,
    pub views: TripViewService,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn database_config() -> DatabaseConfig {
    DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        // One connection: every handle sees the same in-memory database.
        max_connections: 1,
        min_connections: 1,
        acquire_timeout_secs: 5,
    }
}

pub fn jwt() -> JwtService {
    JwtService::new(&JwtConfig {
        secret: "integration-test-secret".to_string(),
        access_token_expiry_secs: 3600,
    })
}

pub async fn setup() -> TestApp {
    setup_with(ActivationConfig::default()).await
}

pub async fn setup_with(activation: ActivationConfig) -> TestApp {
    setup_on(&database_config(), &activation).await
}

/// Postgres pool from `DATABASE_URL`, or `None` when no Postgres is configured.
pub fn postgres_config() -> Option<DatabaseConfig> {
    let url = std::env::var("DATABASE_URL").ok()?;
    if !url.starts_with("postgres") {
        return None;
    }
    Some(DatabaseConfig {
        url,
        max_connections: 10,
        min_connections: 2,
        acquire_timeout_secs: 30,
    })
}

pub async fn setup_on(config: &DatabaseConfig, activation: &ActivationConfig) -> TestApp {
    let store = LedgerStore::connect(config).await.expect("connect");
    store.migrate().await.expect("migrate");

    let notifier = Arc::new(RecordingNotifier::default());
    let mailer = Mailer::new(notifier.clone(), &EmailConfig::default());

    TestApp {
        users: UserService::new(store.clone(), jwt(), mailer.clone(), activation),
        trips: TripService::new(store.clone(), mailer),
        costs: CostService::new(&store),
        transactions: TransactionLifecycle::new(store.clone()),
        ledger: DebtLedger::new(&store),
        views: TripViewService::new(&store),
        store,
        notifier,
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

impl TestApp {
    /// Registers and activates `name`, returning the user id.
    pub async fn user(&self, name: &str) -> Uuid {
        let outcome = self
            .users
            .register(RegisterRequest {
                username: name.to_string(),
                email: format!("{name}@example.com"),
                password: "correct horse battery".to_string(),
            })
            .await
            .expect("register");
        let token = self.notifier.last_activation_token();
        self.users
            .activate(ActivateRequest { token })
            .await
            .expect("activate");
        outcome.value.id
    }

    /// Creates a EUR trip in June 2026 owned by `owner`.
    pub async fn trip(&self, owner: Uuid) -> Uuid {
        self.trips
            .create(
                owner,
                CreateTrip {
                    name: "Lisbon".to_string(),
                    location: "Portugal".to_string(),
                    description: None,
                    start_date: date(2026, 6, 1),
                    end_date: date(2026, 6, 10),
                    currency: "EUR".to_string(),
                },
            )
            .await
            .expect("create trip")
            .id
    }

    /// Invites `user` (registered as `name`) into the trip and accepts.
    pub async fn join(&self, trip_id: Uuid, owner: Uuid, user: Uuid, name: &str) {
        self.trips
            .invite(
                owner,
                trip_id,
                InviteParticipant {
                    email: format!("{name}@example.com"),
                },
            )
            .await
            .expect("invite");
        self.trips.accept(user, trip_id).await.expect("accept");
    }

    /// Records that `debtor` owes `creditor` `amount`, created by the creditor.
    pub async fn owe(
        &self,
        trip_id: Uuid,
        creditor: Uuid,
        debtor: Uuid,
        amount: &str,
    ) -> TransactionView {
        self.transactions
            .create(creditor, trip_id, transaction(creditor, debtor, amount))
            .await
            .expect("create transaction")
    }
}

pub fn transaction(creditor: Uuid, debtor: Uuid, amount: &str) -> CreateTransaction {
    CreateTransaction {
        creditor_id: creditor,
        debtor_id: debtor,
        amount: amount.to_string(),
        currency: None,
        description: None,
        occurred_at: None,
    }
}
