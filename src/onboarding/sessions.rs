//! Session registry: in-memory onboarding sessions keyed by id.
//!
//! Each session is a [`Navigator`] behind its own mutex. Mutating calls use
//! `try_lock`: a second request arriving while one is in flight is rejected
//! as busy rather than queued, so advances on one session never interleave.
//!
//! A session leaves the registry once its completion has been persisted, or
//! when the idle sweep finds it untouched for longer than the idle timeout.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::error::{Error, FlowError, SessionError};

use super::flow::{Flow, Locale};
use super::flows;
use super::identity::{FixedIdentity, Identity};
use super::navigator::{AdvanceOutcome, CalculatorSettings, Clock, Completion, Navigator, NavigatorDeps, SessionView};
use super::persistence::ProgressStore;
use super::response::Response;

type SessionHandle = Arc<Mutex<Navigator>>;

pub struct SessionRegistry {
    flows: HashMap<String, Arc<Flow>>,
    catalog: Arc<Catalog>,
    store: Arc<dyn ProgressStore>,
    clock: Arc<dyn Clock>,
    settings: CalculatorSettings,
    sessions: RwLock<HashMap<Uuid, SessionHandle>>,
}

impl SessionRegistry {
    /// Build every registered flow. A malformed flow fails here, before any
    /// session exists.
    pub fn new(
        catalog: Arc<Catalog>,
        store: Arc<dyn ProgressStore>,
        clock: Arc<dyn Clock>,
        settings: CalculatorSettings,
    ) -> Result<Self, FlowError> {
        let mut built = HashMap::new();
        for id in flows::FLOW_IDS {
            if let Some(flow) = flows::by_id(id) {
                built.insert(id.to_string(), Arc::new(flow?));
            }
        }
        info!(flows = built.len(), "Onboarding flows validated");
        Ok(Self {
            flows: built,
            catalog,
            store,
            clock,
            settings,
            sessions: RwLock::new(HashMap::new()),
        })
    }

    pub fn flow(&self, id: &str) -> Option<&Arc<Flow>> {
        self.flows.get(id)
    }

    /// Start a session on `flow_id` for `user_id` (anonymous when `None`).
    pub async fn create(
        &self,
        flow_id: &str,
        user_id: Option<String>,
        locale: Locale,
    ) -> Result<(Uuid, SessionView), Error> {
        let flow = self
            .flows
            .get(flow_id)
            .ok_or_else(|| SessionError::UnknownFlow(flow_id.to_string()))?;

        let identity = FixedIdentity::from(user_id);
        let authenticated = identity.current_user_id().is_some();
        let deps = NavigatorDeps {
            catalog: Arc::clone(&self.catalog),
            store: Arc::clone(&self.store),
            identity: Arc::new(identity),
            clock: Arc::clone(&self.clock),
            settings: self.settings,
        };
        let navigator = Navigator::new(Arc::clone(flow), deps, locale);
        let view = navigator.view().await?;

        let id = Uuid::new_v4();
        self.sessions
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(navigator)));
        info!(session_id = %id, flow = flow_id, authenticated, "Onboarding session started");
        Ok((id, view))
    }

    async fn handle(&self, id: Uuid) -> Result<SessionHandle, SessionError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(SessionError::NotFound(id))
    }

    /// Current view. Waits for any in-flight request on the session.
    pub async fn view(&self, id: Uuid) -> Result<SessionView, Error> {
        let handle = self.handle(id).await?;
        let navigator = handle.lock().await;
        Ok(navigator.view().await?)
    }

    pub async fn advance(&self, id: Uuid, response: Response) -> Result<(AdvanceOutcome, SessionView), Error> {
        let handle = self.handle(id).await?;
        let mut navigator = handle.try_lock().map_err(|_| SessionError::Busy(id))?;
        if navigator.is_complete() {
            return Err(SessionError::AlreadyComplete(id).into());
        }
        let outcome = navigator.advance(response).await?;
        debug!(session_id = %id, step = %outcome.current_step_id, "Advance handled");
        let view = navigator.view().await?;
        Ok((outcome, view))
    }

    pub async fn skip(&self, id: Uuid) -> Result<(AdvanceOutcome, SessionView), Error> {
        let handle = self.handle(id).await?;
        let mut navigator = handle.try_lock().map_err(|_| SessionError::Busy(id))?;
        if navigator.is_complete() {
            return Err(SessionError::AlreadyComplete(id).into());
        }
        let outcome = navigator.skip().await?;
        let view = navigator.view().await?;
        Ok((outcome, view))
    }

    pub async fn complete(&self, id: Uuid) -> Result<Completion, Error> {
        let handle = self.handle(id).await?;
        let mut navigator = handle.try_lock().map_err(|_| SessionError::Busy(id))?;
        if navigator.is_complete() {
            return Err(SessionError::AlreadyComplete(id).into());
        }
        let completion = navigator.complete().await?;
        drop(navigator);
        self.sessions.write().await.remove(&id);
        info!(session_id = %id, save = ?completion.save, "Onboarding session completed");
        Ok(completion)
    }

    /// Drop sessions whose last step change is older than `max_idle`.
    /// Sessions busy with a request are kept. Returns the number dropped.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let Ok(max_idle) = chrono::Duration::from_std(max_idle) else {
            return 0;
        };
        let cutoff = self.clock.now() - max_idle;

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, handle| match handle.try_lock() {
            Ok(navigator) if navigator.state().last_updated_at < cutoff => {
                debug!(session_id = %id, "Idle onboarding session dropped");
                false
            }
            _ => true,
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!(count = evicted, "Evicted idle onboarding sessions");
        }
        evicted
    }

    /// Drop a session. Returns whether it existed.
    pub async fn remove(&self, id: Uuid) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

/// Spawn a background task that periodically evicts idle sessions.
pub fn spawn_idle_sweep(
    registry: Arc<SessionRegistry>,
    max_idle: Duration,
    every: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            registry.evict_idle(max_idle).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::onboarding::navigator::SystemClock;
    use crate::onboarding::persistence::{MemoryProgressStore, SaveOutcome};
    use chrono::{DateTime, TimeZone, Utc};

    fn registry() -> (SessionRegistry, Arc<MemoryProgressStore>) {
        let store = Arc::new(MemoryProgressStore::new());
        let registry = SessionRegistry::new(
            Arc::new(Catalog::new()),
            store.clone(),
            Arc::new(SystemClock),
            CalculatorSettings::default(),
        )
        .unwrap();
        (registry, store)
    }

    #[tokio::test]
    async fn create_and_advance() {
        let (registry, _) = registry();
        let (id, view) = registry
            .create(flows::CONVERSATIONAL, Some("u1".into()), Locale::En)
            .await
            .unwrap();
        assert_eq!(view.current_step.id, "welcome");
        assert_eq!(registry.len().await, 1);

        let (outcome, view) = registry.advance(id, Response::None).await.unwrap();
        assert!(outcome.advanced());
        assert_eq!(view.current_step.id, "get_name");
        assert_eq!(view.current_step.title, "What's your name?");
    }

    #[tokio::test]
    async fn unknown_flow_and_session() {
        let (registry, _) = registry();
        let err = registry.create("nope", None, Locale::Fr).await.unwrap_err();
        assert!(matches!(err, Error::Session(SessionError::UnknownFlow(_))));

        let id = Uuid::new_v4();
        let err = registry.view(id).await.unwrap_err();
        assert!(matches!(err, Error::Session(SessionError::NotFound(_))));
    }

    #[tokio::test]
    async fn overlapping_requests_are_rejected() {
        let (registry, _) = registry();
        let (id, _) = registry
            .create(flows::QUESTIONNAIRE, None, Locale::Fr)
            .await
            .unwrap();

        let handle = registry.handle(id).await.unwrap();
        let guard = handle.lock().await;
        let err = registry.advance(id, Response::None).await.unwrap_err();
        assert!(matches!(err, Error::Session(SessionError::Busy(_))));
        let err = registry.complete(id).await.unwrap_err();
        assert!(matches!(err, Error::Session(SessionError::Busy(_))));
        drop(guard);

        let (outcome, _) = registry.advance(id, Response::None).await.unwrap();
        // profile type is required
        assert!(!outcome.advanced());
    }

    #[tokio::test]
    async fn completed_sessions_refuse_further_work() {
        let (registry, store) = registry();
        let (id, _) = registry
            .create(flows::QUESTIONNAIRE, Some("u9".into()), Locale::Fr)
            .await
            .unwrap();

        let completion = registry.complete(id).await.unwrap();
        assert_eq!(completion.save, SaveOutcome::Saved);
        assert!(store.snapshot("u9").await.is_some());

        let err = registry.advance(id, Response::None).await.unwrap_err();
        assert!(matches!(err, Error::Session(SessionError::NotFound(_))));
        let err = registry.complete(id).await.unwrap_err();
        assert!(matches!(err, Error::Session(SessionError::NotFound(_))));
        assert!(!registry.remove(id).await);
    }

    #[tokio::test]
    async fn completed_sessions_leave_the_registry() {
        let (registry, _) = registry();
        for i in 0..20 {
            let (id, _) = registry
                .create(flows::QUESTIONNAIRE, Some(format!("user-{i}")), Locale::Fr)
                .await
                .unwrap();
            registry.complete(id).await.unwrap();
        }
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn in_flight_completion_still_refuses_further_work() {
        let (registry, _) = registry();
        let (id, _) = registry
            .create(flows::QUESTIONNAIRE, None, Locale::Fr)
            .await
            .unwrap();
        // A request that already holds the handle sees the completed state.
        let handle = registry.handle(id).await.unwrap();
        registry.complete(id).await.unwrap();
        assert!(handle.lock().await.is_complete());
    }

    /// Clock that tests can move forward.
    struct ManualClock(std::sync::Mutex<DateTime<Utc>>);

    impl ManualClock {
        fn advance(&self, by: chrono::Duration) {
            let mut now = self.0.lock().unwrap();
            *now += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    #[tokio::test]
    async fn idle_sessions_are_evicted() {
        let clock = Arc::new(ManualClock(std::sync::Mutex::new(
            Utc.with_ymd_and_hms(2026, 5, 4, 8, 0, 0).unwrap(),
        )));
        let registry = SessionRegistry::new(
            Arc::new(Catalog::new()),
            Arc::new(MemoryProgressStore::new()),
            clock.clone(),
            CalculatorSettings::default(),
        )
        .unwrap();

        let (abandoned, _) = registry
            .create(flows::CONVERSATIONAL, None, Locale::Fr)
            .await
            .unwrap();
        let (active, _) = registry
            .create(flows::CONVERSATIONAL, None, Locale::Fr)
            .await
            .unwrap();

        clock.advance(chrono::Duration::minutes(30));
        registry.advance(active, Response::None).await.unwrap();
        clock.advance(chrono::Duration::minutes(31));

        let idle = Duration::from_secs(60 * 60);
        assert_eq!(registry.evict_idle(idle).await, 1);
        assert_eq!(registry.len().await, 1);
        assert!(matches!(
            registry.view(abandoned).await.unwrap_err(),
            Error::Session(SessionError::NotFound(_))
        ));
        assert!(registry.view(active).await.is_ok());

        // Busy sessions are never dropped under a request.
        clock.advance(chrono::Duration::hours(2));
        let handle = registry.handle(active).await.unwrap();
        let guard = handle.lock().await;
        assert_eq!(registry.evict_idle(idle).await, 0);
        drop(guard);
        assert_eq!(registry.evict_idle(idle).await, 1);
        assert!(registry.is_empty().await);
    }
}
