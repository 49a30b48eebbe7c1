use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{Mutex, MutexGuard, OnceCell, RwLock};
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_models::AppError;

use crate::services::public_api::{MacroPeriodGateway, PublicMacroPeriodApi};
use crate::services::session::ResponseController;

pub type SharedSession = Arc<Mutex<ResponseController>>;

type SessionCell = Arc<OnceCell<SharedSession>>;

/// Registry entry for one token. The cell is filled by the first load; every
/// concurrent caller for the same token waits on that one load.
struct SessionSlot {
    cell: SessionCell,
    last_used: Instant,
}

impl SessionSlot {
    fn new() -> Self {
        Self {
            cell: Arc::new(OnceCell::new()),
            last_used: Instant::now(),
        }
    }

    // Still loading, or a request holds the session.
    fn is_busy(&self) -> bool {
        match self.cell.get() {
            Some(session) => session.try_lock().is_err(),
            None => true,
        }
    }
}

/// Router state: the backend gateway plus one independent session per token.
pub struct AvailabilityState {
    pub config: Arc<AppConfig>,
    gateway: Arc<dyn MacroPeriodGateway>,
    sessions: RwLock<HashMap<String, SessionSlot>>,
}

impl AvailabilityState {
    pub fn new(config: Arc<AppConfig>) -> Self {
        let gateway = Arc::new(PublicMacroPeriodApi::new(&config));
        Self::with_gateway(config, gateway)
    }

    pub fn with_gateway(config: Arc<AppConfig>, gateway: Arc<dyn MacroPeriodGateway>) -> Self {
        Self {
            config,
            gateway,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Loads the period from the backend, reloading an existing session in
    /// place or creating a new one. A link the backend no longer knows drops
    /// its session.
    pub async fn open(&self, token: &str) -> Result<SharedSession, AppError> {
        let cell = self.cell_for(token).await;

        let Some(session) = cell.get().cloned() else {
            return self.init(token, &cell).await;
        };

        let reloaded = {
            let mut controller = lock(&session)?;
            controller.reload().await
        };

        if let Err(e) = reloaded {
            if e.is_not_found() {
                warn!("Link no longer valid, dropping its session");
                self.discard(token, &cell).await;
            }
            return Err(e.into());
        }
        Ok(session)
    }

    /// The current session for `token`, loading it on first access.
    pub async fn session(&self, token: &str) -> Result<SharedSession, AppError> {
        let cell = self.cell_for(token).await;
        self.init(token, &cell).await
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    async fn init(&self, token: &str, cell: &SessionCell) -> Result<SharedSession, AppError> {
        let loaded = cell
            .get_or_try_init(|| async {
                let controller = ResponseController::load(self.gateway.clone(), token).await?;
                debug!("Opened response session");
                Ok::<_, AppError>(Arc::new(Mutex::new(controller)))
            })
            .await;

        match loaded {
            Ok(session) => Ok(session.clone()),
            Err(e) => {
                if !cell.initialized() {
                    self.discard(token, cell).await;
                }
                Err(e)
            }
        }
    }

    /// Returns the token's cell, creating the slot if needed. Idle sessions
    /// are evicted first, and the oldest idle ones go when the registry is full.
    async fn cell_for(&self, token: &str) -> SessionCell {
        let mut sessions = self.sessions.write().await;
        self.evict(&mut sessions, token);

        let slot = sessions.entry(token.to_string()).or_insert_with(SessionSlot::new);
        slot.last_used = Instant::now();
        slot.cell.clone()
    }

    fn evict(&self, sessions: &mut HashMap<String, SessionSlot>, keep: &str) {
        let ttl = self.config.session_idle_ttl();
        let before = sessions.len();
        sessions.retain(|token, slot| token == keep || slot.last_used.elapsed() < ttl || slot.is_busy());

        let max_sessions = self.config.max_sessions.max(1);
        if !sessions.contains_key(keep) && sessions.len() >= max_sessions {
            let mut by_age: Vec<(Instant, String)> = sessions
                .iter()
                .map(|(token, slot)| (slot.last_used, token.clone()))
                .collect();
            by_age.sort();

            for (_, token) in by_age {
                if sessions.len() < max_sessions {
                    break;
                }
                if sessions.get(&token).is_some_and(|slot| !slot.is_busy()) {
                    sessions.remove(&token);
                }
            }
        }

        let evicted = before.saturating_sub(sessions.len());
        if evicted > 0 {
            info!("Evicted {} idle response session(s)", evicted);
        }
    }

    // Removes the slot only if it still holds `cell`; a newer slot for the
    // same token stays.
    async fn discard(&self, token: &str, cell: &SessionCell) {
        let mut sessions = self.sessions.write().await;
        if sessions.get(token).is_some_and(|slot| Arc::ptr_eq(&slot.cell, cell)) {
            sessions.remove(token);
        }
    }
}

/// Takes the session without waiting. A held lock means another request,
/// usually a submission, is still in flight.
pub fn lock(session: &SharedSession) -> Result<MutexGuard<'_, ResponseController>, AppError> {
    session.try_lock().map_err(|_| {
        warn!("Session busy, rejecting concurrent request");
        AppError::Conflict("This session is busy; wait for the current submission to finish".to_string())
    })
}
