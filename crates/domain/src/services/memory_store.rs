//! In-memory [`TransitionStore`].
//!
//! Units of work hold the store mutex for their whole lifetime and operate on
//! a private copy of the state, which replaces the shared state on commit.
//! This gives the same all-or-nothing and serialization behavior as a
//! Postgres transaction with row locks, at the cost of no parallelism.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::store::{SubjectMutation, TransitionStore, UnitOfWork};
use crate::errors::DomainError;
use crate::models::{
    AuditRecord, Comment, CreatorApplication, LedgerAdjustment, LedgerEntry, NewAuditRecord,
    Payment, Post, Report, Stream, Subject, SubjectKind, User, Wallet,
};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    applications: HashMap<Uuid, CreatorApplication>,
    posts: HashMap<Uuid, Post>,
    comments: HashMap<Uuid, Comment>,
    streams: HashMap<Uuid, Stream>,
    reports: HashMap<Uuid, Report>,
    payments: HashMap<Uuid, Payment>,
    wallets: HashMap<Uuid, Wallet>,
    ledger: Vec<LedgerEntry>,
    audit: Vec<AuditRecord>,
}

impl MemoryState {
    fn subject(&self, kind: SubjectKind, id: Uuid) -> Option<Subject> {
        match kind {
            SubjectKind::User => self.users.get(&id).cloned().map(Subject::User),
            SubjectKind::Admin => self
                .users
                .get(&id)
                .filter(|u| u.role.is_admin())
                .cloned()
                .map(Subject::Admin),
            SubjectKind::CreatorApplication => self
                .applications
                .get(&id)
                .cloned()
                .map(Subject::CreatorApplication),
            SubjectKind::Post => self.posts.get(&id).cloned().map(Subject::Post),
            SubjectKind::Comment => self.comments.get(&id).cloned().map(Subject::Comment),
            SubjectKind::Stream => self.streams.get(&id).cloned().map(Subject::Stream),
            SubjectKind::Report => self.reports.get(&id).cloned().map(Subject::Report),
            SubjectKind::Payment => self.payments.get(&id).cloned().map(Subject::Payment),
            SubjectKind::DiscountCode | SubjectKind::Gift => None,
        }
    }

    fn put(&mut self, subject: Subject) {
        match subject {
            Subject::User(user) | Subject::Admin(user) => {
                self.users.insert(user.id, user);
            }
            Subject::CreatorApplication(application) => {
                self.applications.insert(application.id, application);
            }
            Subject::Post(post) => {
                self.posts.insert(post.id, post);
            }
            Subject::Comment(comment) => {
                self.comments.insert(comment.id, comment);
            }
            Subject::Stream(stream) => {
                self.streams.insert(stream.id, stream);
            }
            Subject::Report(report) => {
                self.reports.insert(report.id, report);
            }
            Subject::Payment(payment) => {
                self.payments.insert(payment.id, payment);
            }
        }
    }
}

#[derive(Debug, Default)]
struct Faults {
    ledger: AtomicBool,
    audit: AtomicBool,
}

/// Shared in-memory subject store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<MemoryState>>,
    faults: Arc<Faults>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent ledger write fail with `Unavailable`.
    pub fn fail_ledger_writes(&self, fail: bool) {
        self.faults.ledger.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent audit write fail with `Unavailable`.
    pub fn fail_audit_writes(&self, fail: bool) {
        self.faults.audit.store(fail, Ordering::SeqCst);
    }

    pub async fn insert_user(&self, user: User) {
        self.state.lock().await.users.insert(user.id, user);
    }

    pub async fn insert_application(&self, application: CreatorApplication) {
        self.state
            .lock()
            .await
            .applications
            .insert(application.id, application);
    }

    pub async fn insert_post(&self, post: Post) {
        self.state.lock().await.posts.insert(post.id, post);
    }

    pub async fn insert_comment(&self, comment: Comment) {
        self.state.lock().await.comments.insert(comment.id, comment);
    }

    pub async fn insert_stream(&self, stream: Stream) {
        self.state.lock().await.streams.insert(stream.id, stream);
    }

    pub async fn insert_report(&self, report: Report) {
        self.state.lock().await.reports.insert(report.id, report);
    }

    pub async fn insert_payment(&self, payment: Payment) {
        self.state.lock().await.payments.insert(payment.id, payment);
    }

    pub async fn set_wallet(&self, user_id: Uuid, balance: i64) {
        self.state.lock().await.wallets.insert(
            user_id,
            Wallet {
                user_id,
                balance,
                updated_at: Utc::now(),
            },
        );
    }

    pub async fn user(&self, id: Uuid) -> Option<User> {
        self.state.lock().await.users.get(&id).cloned()
    }

    pub async fn application(&self, id: Uuid) -> Option<CreatorApplication> {
        self.state.lock().await.applications.get(&id).cloned()
    }

    pub async fn post(&self, id: Uuid) -> Option<Post> {
        self.state.lock().await.posts.get(&id).cloned()
    }

    pub async fn comment(&self, id: Uuid) -> Option<Comment> {
        self.state.lock().await.comments.get(&id).cloned()
    }

    pub async fn stream(&self, id: Uuid) -> Option<Stream> {
        self.state.lock().await.streams.get(&id).cloned()
    }

    pub async fn report(&self, id: Uuid) -> Option<Report> {
        self.state.lock().await.reports.get(&id).cloned()
    }

    pub async fn payment(&self, id: Uuid) -> Option<Payment> {
        self.state.lock().await.payments.get(&id).cloned()
    }

    pub async fn wallet(&self, user_id: Uuid) -> Option<Wallet> {
        self.state.lock().await.wallets.get(&user_id).cloned()
    }

    pub async fn ledger_entries(&self) -> Vec<LedgerEntry> {
        self.state.lock().await.ledger.clone()
    }

    /// Audit records in insertion order.
    pub async fn audit_records(&self) -> Vec<AuditRecord> {
        self.state.lock().await.audit.clone()
    }
}

#[async_trait]
impl TransitionStore for InMemoryStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, DomainError> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(InMemoryUnitOfWork {
            guard,
            working,
            faults: self.faults.clone(),
        }))
    }
}

struct InMemoryUnitOfWork {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
    faults: Arc<Faults>,
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn lock_subject(
        &mut self,
        kind: SubjectKind,
        id: Uuid,
    ) -> Result<Option<Subject>, DomainError> {
        Ok(self.working.subject(kind, id))
    }

    async fn lock_wallet(&mut self, user_id: Uuid) -> Result<Option<Wallet>, DomainError> {
        Ok(self.working.wallets.get(&user_id).cloned())
    }

    async fn count_active_admins(&mut self) -> Result<i64, DomainError> {
        Ok(self
            .working
            .users
            .values()
            .filter(|u| u.role.is_admin() && u.is_active)
            .count() as i64)
    }

    async fn apply(&mut self, mutation: &SubjectMutation) -> Result<(), DomainError> {
        let (kind, id) = mutation.target();
        let mut subject = self
            .working
            .subject(kind, id)
            .ok_or_else(|| DomainError::NotFound(format!("{} not found", kind.display_name())))?;
        mutation.apply(&mut subject)?;
        self.working.put(subject);
        Ok(())
    }

    async fn adjust_balance(
        &mut self,
        adjustment: &LedgerAdjustment,
    ) -> Result<Wallet, DomainError> {
        if self.faults.ledger.load(Ordering::SeqCst) {
            return Err(DomainError::Unavailable(
                "Simulated ledger failure".to_string(),
            ));
        }
        if self
            .working
            .ledger
            .iter()
            .any(|e| e.payment_id == adjustment.payment_id)
        {
            return Err(DomainError::Conflict(
                "Ledger entry already exists for payment".to_string(),
            ));
        }

        let now = Utc::now();
        let wallet = self
            .working
            .wallets
            .entry(adjustment.user_id)
            .or_insert_with(|| Wallet {
                user_id: adjustment.user_id,
                balance: 0,
                updated_at: now,
            });
        let balance = wallet.balance + adjustment.delta;
        if balance < 0 {
            return Err(DomainError::InvalidState(
                "Wallet balance cannot go negative".to_string(),
            ));
        }
        wallet.balance = balance;
        wallet.updated_at = now;
        let wallet = wallet.clone();

        self.working.ledger.push(LedgerEntry {
            id: Uuid::new_v4(),
            user_id: adjustment.user_id,
            payment_id: adjustment.payment_id,
            delta: adjustment.delta,
            balance_after: balance,
            reason: adjustment.reason.clone(),
            created_at: now,
        });
        Ok(wallet)
    }

    async fn append_audit(&mut self, record: &NewAuditRecord) -> Result<Uuid, DomainError> {
        if self.faults.audit.load(Ordering::SeqCst) {
            return Err(DomainError::Unavailable(
                "Simulated audit failure".to_string(),
            ));
        }
        let actor_email = self
            .working
            .users
            .get(&record.actor_id)
            .map(|u| u.email.clone());
        let id = Uuid::new_v4();
        self.working.audit.push(AuditRecord {
            id,
            actor_id: record.actor_id,
            actor_email,
            action: record.action,
            subject_kind: record.subject_kind,
            subject_id: record.subject_id,
            affected_user_id: record.affected_user_id,
            description: record.description.clone(),
            metadata: record.metadata.clone(),
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        let InMemoryUnitOfWork {
            mut guard, working, ..
        } = *self;
        *guard = working;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;

    fn admin() -> User {
        User {
            id: Uuid::new_v4(),
            email: "ops@example.com".to_string(),
            name: None,
            username: None,
            role: UserRole::Admin,
            is_active: true,
            is_suspended: false,
            suspended_reason: None,
            suspended_by: None,
            suspended_at: None,
            suspension_expires_at: None,
            admin_notes: None,
            last_login_at: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_drop_without_commit_discards_changes() {
        let store = InMemoryStore::new();
        let user = admin();
        store.insert_user(user.clone()).await;

        {
            let mut uow = store.begin().await.unwrap();
            uow.apply(&SubjectMutation::SetAdminActive {
                admin_id: user.id,
                active: false,
            })
            .await
            .unwrap();
        }
        assert!(store.user(user.id).await.unwrap().is_active);

        let mut uow = store.begin().await.unwrap();
        uow.apply(&SubjectMutation::SetAdminActive {
            admin_id: user.id,
            active: false,
        })
        .await
        .unwrap();
        uow.commit().await.unwrap();
        assert!(!store.user(user.id).await.unwrap().is_active);
    }

    #[tokio::test]
    async fn test_admin_subject_requires_admin_role() {
        let store = InMemoryStore::new();
        let mut user = admin();
        user.role = UserRole::Creator;
        store.insert_user(user.clone()).await;

        let mut uow = store.begin().await.unwrap();
        assert!(uow
            .lock_subject(SubjectKind::Admin, user.id)
            .await
            .unwrap()
            .is_none());
        assert!(uow
            .lock_subject(SubjectKind::User, user.id)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_ledger_is_one_entry_per_payment() {
        let store = InMemoryStore::new();
        let user_id = Uuid::new_v4();
        store.set_wallet(user_id, 100).await;
        let adjustment = LedgerAdjustment {
            user_id,
            payment_id: Uuid::new_v4(),
            delta: -40,
            reason: "refund".to_string(),
        };

        let mut uow = store.begin().await.unwrap();
        assert_eq!(uow.adjust_balance(&adjustment).await.unwrap().balance, 60);
        let err = uow.adjust_balance(&adjustment).await.unwrap_err();
        assert_eq!(err.kind(), crate::errors::ErrorKind::Conflict);
    }
}
