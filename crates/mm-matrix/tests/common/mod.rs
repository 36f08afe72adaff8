//! Test doubles shared by the integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use mm_matrix::directory::{Directory, InMemoryDirectory, MembershipPatch, PrincipalQuery};
use mm_matrix::shared::Notifier;
use mm_matrix::{Group, GroupRef, MatrixError, Principal, Result};

/// Everything the collaborators were asked to do, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    FetchPrincipal(String),
    ListPrincipals(PrincipalQuery),
    ListGroups(String),
    SetGroupMembers(String, MembershipPatch),
    Notify(String, String),
}

#[derive(Debug, Default)]
pub struct CallLog {
    calls: Mutex<Vec<Call>>,
}

impl CallLog {
    pub fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().iter().filter(|c| pred(c)).count()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }
}

/// In-memory directory that logs calls and can be told to misbehave
pub struct RecordingDirectory {
    pub inner: InMemoryDirectory,
    log: Arc<CallLog>,
    fail_writes: AtomicBool,
    fail_lists: AtomicBool,
    write_gate: Mutex<Option<Arc<Notify>>>,
    search_delays: Mutex<HashMap<String, Duration>>,
}

impl RecordingDirectory {
    pub fn new(inner: InMemoryDirectory, log: Arc<CallLog>) -> Self {
        Self {
            inner,
            log,
            fail_writes: AtomicBool::new(false),
            fail_lists: AtomicBool::new(false),
            write_gate: Mutex::new(None),
            search_delays: Mutex::new(HashMap::new()),
        }
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_lists(&self, fail: bool) {
        self.fail_lists.store(fail, Ordering::SeqCst);
    }

    /// Writes block until the returned handle is notified.
    pub fn hold_writes(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.write_gate.lock() = Some(gate.clone());
        gate
    }

    /// User searches for `search` take `delay` to answer.
    pub fn delay_search(&self, search: &str, delay: Duration) {
        self.search_delays.lock().insert(search.to_string(), delay);
    }
}

#[async_trait]
impl Directory for RecordingDirectory {
    async fn fetch_principal(&self, id: &str) -> Result<Principal> {
        self.log.record(Call::FetchPrincipal(id.to_string()));
        self.inner.fetch_principal(id).await
    }

    async fn list_principals(&self, query: &PrincipalQuery) -> Result<Vec<Principal>> {
        self.log.record(Call::ListPrincipals(query.clone()));
        let delay = self.search_delays.lock().get(&query.search).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_lists.load(Ordering::SeqCst) {
            return Err(MatrixError::directory("listing unavailable"));
        }
        self.inner.list_principals(query).await
    }

    async fn list_groups(&self, search: &str) -> Result<Vec<Group>> {
        self.log.record(Call::ListGroups(search.to_string()));
        if self.fail_lists.load(Ordering::SeqCst) {
            return Err(MatrixError::directory("listing unavailable"));
        }
        self.inner.list_groups(search).await
    }

    async fn set_group_members(&self, group_id: &str, members: &MembershipPatch) -> Result<()> {
        self.log
            .record(Call::SetGroupMembers(group_id.to_string(), members.clone()));
        let gate = self.write_gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(MatrixError::directory("write rejected"));
        }
        self.inner.set_group_members(group_id, members).await
    }
}

pub struct RecordingNotifier {
    log: Arc<CallLog>,
}

impl RecordingNotifier {
    pub fn new(log: Arc<CallLog>) -> Self {
        Self { log }
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify_success(&self, title: &str, message: &str) {
        self.log
            .record(Call::Notify(title.to_string(), message.to_string()));
    }
}

/// A small office: two editors, one reviewer, one newcomer
pub fn office() -> InMemoryDirectory {
    let editors = GroupRef::new("editors").with_title("Editors");
    InMemoryDirectory::new()
        .with_group(Group::new("editors").with_title("Editors").with_role("Editor"))
        .with_group(Group::new("reviewers").with_title("Reviewers").with_role("Reviewer"))
        .with_group(Group::new("Administrators").with_title("Administrators").with_role("Manager"))
        .with_group(Group::new("AuthenticatedUsers"))
        .with_principal(Principal::new("admin").with_fullname("Site Admin").with_role("Manager"))
        .with_principal(
            Principal::new("alice")
                .with_fullname("Alice Liddell")
                .with_group(editors.clone()),
        )
        .with_principal(
            Principal::new("albert")
                .with_fullname("Albert Hofmann")
                .with_group(editors)
                .with_group(GroupRef::new("reviewers").with_title("Reviewers")),
        )
        .with_principal(Principal::new("carol"))
}
