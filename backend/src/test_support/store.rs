//! In-memory implementation of the persistence ports.
//!
//! Mirrors the guarded-write semantics of the PostgreSQL adapters: status
//! changes and item mutations only apply while the predicate holds, and the
//! one-draft-per-creator rule is enforced inside a single lock.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ports::{
    ConditionalUpdate, PanelRepository, PanelRepositoryError, RequestItemRepository,
    RequestItemRepositoryError, SolarRequestRepository, SolarRequestRepositoryError,
    StatusTransition, StoredCredentials, UserPersistenceError, UserRepository,
};
use crate::domain::{
    DraftSummary, ListScope, Login, Panel, PanelId, PasswordHash, RequestFilter, RequestId,
    RequestItem, RequestStatus, RequestSummary, Role, SolarPanelRequest, User, UserId,
};

#[derive(Debug, Clone)]
struct RequestRow {
    id: RequestId,
    creator: UserId,
    moderator: Option<UserId>,
    status: RequestStatus,
    insolation: f64,
    total_power: Option<f64>,
    created_at: DateTime<Utc>,
    formed_at: Option<DateTime<Utc>>,
    moderated_at: Option<DateTime<Utc>>,
    deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
struct ItemRow {
    request: RequestId,
    panel: PanelId,
    area: f64,
}

#[derive(Default)]
struct State {
    users: HashMap<UserId, StoredCredentials>,
    panels: HashMap<PanelId, Panel>,
    requests: HashMap<RequestId, RequestRow>,
    items: Vec<ItemRow>,
}

impl State {
    fn login_of(&self, id: UserId) -> String {
        self.users
            .get(&id)
            .map(|stored| stored.user.login().to_string())
            .unwrap_or_default()
    }

    fn is_draft(&self, id: RequestId) -> bool {
        self.requests
            .get(&id)
            .is_some_and(|row| row.status == RequestStatus::Draft)
    }

    fn draft_of(&self, creator: UserId) -> Option<&RequestRow> {
        self.requests
            .values()
            .find(|row| row.creator == creator && row.status == RequestStatus::Draft)
    }

    fn item_count(&self, id: RequestId) -> u64 {
        self.items.iter().filter(|item| item.request == id).count() as u64
    }
}

/// Shared in-memory store used by integration tests and BDD scenarios.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a catalog panel.
    pub fn seed_panel(&self, panel: Panel) {
        self.lock().panels.insert(panel.id, panel);
    }

    /// Flag a catalog panel as withdrawn.
    pub fn soft_delete_panel(&self, id: PanelId) {
        if let Some(panel) = self.lock().panels.get_mut(&id) {
            panel.is_deleted = true;
        }
    }

    /// Create an account directly, bypassing registration.
    pub fn seed_user(&self, login: &str, password: &str, role: Role) -> User {
        let login = Login::new(login).unwrap_or_else(|err| panic!("invalid seed login: {err}"));
        let user = User::new(UserId::random(), login, role);
        self.lock().users.insert(
            user.id(),
            StoredCredentials {
                user: user.clone(),
                password_hash: PasswordHash::derive(password),
            },
        );
        user
    }

    /// Number of drafts currently held by `creator`.
    pub fn draft_count(&self, creator: UserId) -> usize {
        self.lock()
            .requests
            .values()
            .filter(|row| row.creator == creator && row.status == RequestStatus::Draft)
            .count()
    }
}

/// Build a catalog panel for tests.
pub fn panel(title: &str, power: f64, width: i32, height: i32) -> Panel {
    Panel {
        id: PanelId::random(),
        title: title.to_owned(),
        panel_type: "monocrystalline".to_owned(),
        power,
        width,
        height,
        image: None,
        is_deleted: false,
    }
}

#[async_trait]
impl SolarRequestRepository for InMemoryStore {
    async fn find_or_create_draft(
        &self,
        creator: UserId,
        now: DateTime<Utc>,
    ) -> Result<RequestId, SolarRequestRepositoryError> {
        let mut state = self.lock();
        if let Some(row) = state.draft_of(creator) {
            return Ok(row.id);
        }
        let id = RequestId::random();
        state.requests.insert(
            id,
            RequestRow {
                id,
                creator,
                moderator: None,
                status: RequestStatus::Draft,
                insolation: 0.0,
                total_power: None,
                created_at: now,
                formed_at: None,
                moderated_at: None,
                deleted_at: None,
            },
        );
        Ok(id)
    }

    async fn draft_summary(
        &self,
        creator: UserId,
    ) -> Result<Option<DraftSummary>, SolarRequestRepositoryError> {
        let state = self.lock();
        Ok(state.draft_of(creator).map(|row| DraftSummary {
            request_id: row.id,
            item_count: state.item_count(row.id),
        }))
    }

    async fn find_by_id(
        &self,
        id: RequestId,
    ) -> Result<Option<SolarPanelRequest>, SolarRequestRepositoryError> {
        let state = self.lock();
        let Some(row) = state.requests.get(&id) else {
            return Ok(None);
        };
        let items = state
            .items
            .iter()
            .filter(|item| item.request == id)
            .filter_map(|item| {
                state.panels.get(&item.panel).map(|panel| RequestItem {
                    panel: panel.clone(),
                    area: item.area,
                })
            })
            .collect();
        Ok(Some(SolarPanelRequest {
            id: row.id,
            creator: row.creator,
            moderator: row.moderator,
            status: row.status,
            insolation: row.insolation,
            total_power: row.total_power,
            created_at: row.created_at,
            formed_at: row.formed_at,
            moderated_at: row.moderated_at,
            deleted_at: row.deleted_at,
            items,
        }))
    }

    async fn status_of(
        &self,
        id: RequestId,
    ) -> Result<Option<RequestStatus>, SolarRequestRepositoryError> {
        Ok(self.lock().requests.get(&id).map(|row| row.status))
    }

    async fn list(
        &self,
        scope: ListScope,
        filter: RequestFilter,
    ) -> Result<Vec<RequestSummary>, SolarRequestRepositoryError> {
        let state = self.lock();
        let mut rows: Vec<_> = state
            .requests
            .values()
            .filter(|row| row.status.is_listed())
            .filter(|row| match scope {
                ListScope::All => true,
                ListScope::CreatedBy(creator) => row.creator == creator,
            })
            .filter(|row| filter.status.is_none_or(|status| row.status == status))
            .filter(|row| {
                filter
                    .formed_from
                    .is_none_or(|from| row.formed_at.is_some_and(|at| at >= from))
            })
            .filter(|row| {
                filter
                    .formed_to
                    .is_none_or(|to| row.formed_at.is_some_and(|at| at <= to))
            })
            .collect();
        rows.sort_by(|a, b| b.formed_at.cmp(&a.formed_at));
        Ok(rows
            .into_iter()
            .map(|row| RequestSummary {
                id: row.id,
                status: row.status,
                creator_login: state.login_of(row.creator),
                moderator_login: row.moderator.map(|id| state.login_of(id)),
                created_at: row.created_at,
                formed_at: row.formed_at,
                moderated_at: row.moderated_at,
                insolation: row.insolation,
                total_power: row.total_power,
            })
            .collect())
    }

    async fn update_insolation(
        &self,
        id: RequestId,
        insolation: f64,
    ) -> Result<ConditionalUpdate, SolarRequestRepositoryError> {
        let mut state = self.lock();
        match state.requests.get_mut(&id) {
            Some(row) if row.status == RequestStatus::Draft => {
                row.insolation = insolation;
                Ok(ConditionalUpdate::Applied)
            }
            _ => Ok(ConditionalUpdate::NoMatch),
        }
    }

    async fn transition(
        &self,
        transition: StatusTransition,
    ) -> Result<ConditionalUpdate, SolarRequestRepositoryError> {
        let mut state = self.lock();
        let Some(row) = state.requests.get_mut(&transition.id) else {
            return Ok(ConditionalUpdate::NoMatch);
        };
        if row.status != transition.from {
            return Ok(ConditionalUpdate::NoMatch);
        }
        row.status = transition.to;
        match transition.to {
            RequestStatus::Formed => row.formed_at = Some(transition.at),
            RequestStatus::Completed | RequestStatus::Rejected => {
                row.moderated_at = Some(transition.at);
                row.moderator = transition.moderator;
            }
            RequestStatus::Deleted => row.deleted_at = Some(transition.at),
            RequestStatus::Draft => {}
        }
        Ok(ConditionalUpdate::Applied)
    }

    async fn update_total_power(
        &self,
        id: RequestId,
        total_power: f64,
    ) -> Result<ConditionalUpdate, SolarRequestRepositoryError> {
        let mut state = self.lock();
        match state.requests.get_mut(&id) {
            Some(row) if row.status == RequestStatus::Completed => {
                row.total_power = Some(total_power);
                Ok(ConditionalUpdate::Applied)
            }
            _ => Ok(ConditionalUpdate::NoMatch),
        }
    }
}

#[async_trait]
impl RequestItemRepository for InMemoryStore {
    async fn insert(
        &self,
        request: RequestId,
        panel: PanelId,
    ) -> Result<ConditionalUpdate, RequestItemRepositoryError> {
        let mut state = self.lock();
        if !state.is_draft(request) {
            return Ok(ConditionalUpdate::NoMatch);
        }
        if state
            .items
            .iter()
            .any(|item| item.request == request && item.panel == panel)
        {
            return Err(RequestItemRepositoryError::duplicate(format!(
                "panel {panel} is already in request {request}"
            )));
        }
        state.items.push(ItemRow {
            request,
            panel,
            area: 0.0,
        });
        Ok(ConditionalUpdate::Applied)
    }

    async fn remove(
        &self,
        request: RequestId,
        panel: PanelId,
    ) -> Result<ConditionalUpdate, RequestItemRepositoryError> {
        let mut state = self.lock();
        if !state.is_draft(request) {
            return Ok(ConditionalUpdate::NoMatch);
        }
        let before = state.items.len();
        state
            .items
            .retain(|item| !(item.request == request && item.panel == panel));
        Ok(ConditionalUpdate::from_rows(before - state.items.len()))
    }

    async fn resize(
        &self,
        request: RequestId,
        panel: PanelId,
        area: f64,
    ) -> Result<ConditionalUpdate, RequestItemRepositoryError> {
        let mut state = self.lock();
        if !state.is_draft(request) {
            return Ok(ConditionalUpdate::NoMatch);
        }
        let mut rows = 0;
        for item in state
            .items
            .iter_mut()
            .filter(|item| item.request == request && item.panel == panel)
        {
            item.area = area;
            rows += 1;
        }
        Ok(ConditionalUpdate::from_rows(rows))
    }
}

#[async_trait]
impl PanelRepository for InMemoryStore {
    async fn find_by_id(&self, id: PanelId) -> Result<Option<Panel>, PanelRepositoryError> {
        Ok(self.lock().panels.get(&id).cloned())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn insert(
        &self,
        user: &User,
        password_hash: &PasswordHash,
    ) -> Result<(), UserPersistenceError> {
        let mut state = self.lock();
        if state
            .users
            .values()
            .any(|stored| stored.user.login() == user.login())
        {
            return Err(UserPersistenceError::duplicate_login(user.login().to_string()));
        }
        state.users.insert(
            user.id(),
            StoredCredentials {
                user: user.clone(),
                password_hash: password_hash.clone(),
            },
        );
        Ok(())
    }

    async fn find_by_login(
        &self,
        login: &Login,
    ) -> Result<Option<StoredCredentials>, UserPersistenceError> {
        Ok(self
            .lock()
            .users
            .values()
            .find(|stored| stored.user.login() == login)
            .cloned())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserPersistenceError> {
        Ok(self.lock().users.get(&id).map(|stored| stored.user.clone()))
    }
}
