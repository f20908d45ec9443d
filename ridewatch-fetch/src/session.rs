//! Session lifecycle manager.
//!
//! Owns the one [`Session`] of the process. Callers get read-only snapshots
//! through [`SessionManager::ensure_fresh`], which renews below the safety
//! margin. Renewal is single-writer: concurrent callers wait on the renewal
//! lock and then observe the session the winner installed.
//!
//! ```text
//!   Fresh ──ensure_fresh (stale)──▶ Renewing ──ok──▶ Fresh
//!                                      │
//!                                      └─retries exhausted─▶ Invalid (terminal)
//! ```

use chrono::{DateTime, Utc};
use ridewatch_core::{Session, SessionState};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, instrument, warn};

use crate::cookies::{self, CookieMap, LOGIN_VALID_COOKIE};
use crate::error::{ApiError, SessionError};
use crate::retry::RetryPolicy;
use crate::shutdown::StopSignal;
use crate::source::{Renewal, SessionRenewer};

/// Default minimum remaining validity before a renewal.
pub const DEFAULT_SAFETY_MARGIN: Duration = Duration::from_secs(15 * 60);

/// Default background refresh cadence.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5 * 60);

// ============================================================================
// Configuration
// ============================================================================

/// Session manager settings.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Remaining validity below which the session is renewed.
    pub safety_margin: Duration,
    /// Background refresh cadence.
    pub refresh_interval: Duration,
    /// Retry policy for renewal requests.
    pub retry: RetryPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            safety_margin: DEFAULT_SAFETY_MARGIN,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            retry: RetryPolicy::default(),
        }
    }
}

// ============================================================================
// Session Info
// ============================================================================

/// Point-in-time report on the managed session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    /// Lifecycle state.
    pub state: SessionState,
    /// Masked subject identifier.
    pub subject: String,
    /// Renewal counter.
    pub generation: u64,
    /// Number of cookies held.
    pub cookie_count: usize,
    /// Required cookies that are missing.
    pub missing_cookies: Vec<String>,
    /// Raw `LoginValid` value.
    pub login_valid: Option<String>,
    /// Derived expiry.
    pub expires_at: DateTime<Utc>,
    /// Whole minutes until expiry (negative once expired).
    pub minutes_remaining: i64,
    /// True if the next `ensure_fresh` would renew.
    pub renewal_due: bool,
    /// Last successful renewal.
    pub last_refresh: Option<DateTime<Utc>>,
    /// Last renewal failure.
    pub last_error: Option<String>,
}

// ============================================================================
// Session Manager
// ============================================================================

#[derive(Debug)]
struct Inner {
    session: Session,
    state: SessionState,
    last_refresh: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

/// Keeps the authenticated session alive.
pub struct SessionManager {
    renewer: Arc<dyn SessionRenewer>,
    config: SessionConfig,
    inner: RwLock<Inner>,
    renew_lock: Mutex<()>,
    renewing: AtomicBool,
    notify: watch::Sender<Session>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Builds the manager from externally supplied credentials.
    ///
    /// Does not contact the remote service.
    pub fn initialize(
        ssn: &str,
        initial_cookies: CookieMap,
        renewer: Arc<dyn SessionRenewer>,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        let ssn = ssn.trim();
        if ssn.is_empty() {
            return Err(SessionError::Configuration(
                "subject identifier is empty".to_string(),
            ));
        }
        if initial_cookies.is_empty() {
            return Err(SessionError::Configuration("no cookies supplied".to_string()));
        }

        let missing = cookies::missing_required(&initial_cookies);
        if !missing.is_empty() {
            return Err(SessionError::Configuration(format!(
                "missing required cookies: {}",
                missing.join(", ")
            )));
        }

        let expires_at = cookies::login_expiry(&initial_cookies).ok_or_else(|| {
            SessionError::Configuration(format!("{LOGIN_VALID_COOKIE} cookie is not a valid timestamp"))
        })?;

        let session = Session::new(ssn, initial_cookies, expires_at);
        info!(
            subject = %session.masked_subject(),
            expires_at = %expires_at,
            "Session initialized"
        );

        let (notify, _) = watch::channel(session.clone());
        Ok(Self {
            renewer,
            config,
            inner: RwLock::new(Inner {
                session,
                state: SessionState::Fresh,
                last_refresh: None,
                last_error: None,
            }),
            renew_lock: Mutex::new(()),
            renewing: AtomicBool::new(false),
            notify,
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> SessionState {
        let state = self.inner.read().await.state;
        self.effective_state(state)
    }

    /// Last successful renewal.
    pub async fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.inner.read().await.last_refresh
    }

    /// Current session snapshot, without any freshness check.
    pub async fn snapshot(&self) -> Session {
        self.inner.read().await.session.clone()
    }

    /// Subscribes to renewed sessions.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.notify.subscribe()
    }

    /// Returns a session valid for at least the safety margin, renewing if needed.
    ///
    /// Makes no network call while the session is fresh.
    pub async fn ensure_fresh(&self) -> Result<Session, SessionError> {
        let seen_generation = {
            let inner = self.inner.read().await;
            if inner.state.is_terminal() {
                return Err(Self::invalid_error(&inner));
            }
            if inner.session.is_valid(self.config.safety_margin) {
                return Ok(inner.session.clone());
            }
            inner.session.generation
        };

        let _guard = self.renew_lock.lock().await;

        // Another caller may have renewed while we waited for the lock.
        {
            let inner = self.inner.read().await;
            if inner.state.is_terminal() {
                return Err(Self::invalid_error(&inner));
            }
            if inner.session.generation != seen_generation
                || inner.session.is_valid(self.config.safety_margin)
            {
                return Ok(inner.session.clone());
            }
        }

        self.renew_locked().await
    }

    /// Forces a renewal after the service rejected `rejected` as unauthenticated.
    ///
    /// If the session was already renewed since `rejected` was handed out,
    /// the newer session is returned without another renewal.
    pub async fn handle_unexpected_expiry(&self, rejected: &Session) -> Result<Session, SessionError> {
        warn!(
            generation = rejected.generation,
            "Session rejected by remote service, forcing renewal"
        );

        let _guard = self.renew_lock.lock().await;
        {
            let inner = self.inner.read().await;
            if inner.state.is_terminal() {
                return Err(Self::invalid_error(&inner));
            }
            if inner.session.generation != rejected.generation {
                return Ok(inner.session.clone());
            }
        }

        self.renew_locked().await
    }

    /// Renews immediately regardless of remaining validity.
    pub async fn force_refresh(&self) -> Result<Session, SessionError> {
        let _guard = self.renew_lock.lock().await;
        {
            let inner = self.inner.read().await;
            if inner.state.is_terminal() {
                return Err(Self::invalid_error(&inner));
            }
        }
        self.renew_locked().await
    }

    /// Runs `ensure_fresh` on a timer until stopped or the session turns invalid.
    pub fn start_background_refresh(
        self: &Arc<Self>,
        interval: Duration,
        mut stop: StopSignal,
    ) -> JoinHandle<()> {
        let manager = Arc::clone(self);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            info!(interval_secs = interval.as_secs(), "Background session refresh started");

            loop {
                tokio::select! {
                    () = stop.stopped() => {
                        debug!("Background session refresh stopped");
                        break;
                    }
                    _ = ticker.tick() => {}
                }

                match manager.ensure_fresh().await {
                    Ok(session) => {
                        debug!(generation = session.generation, "Background refresh tick ok");
                    }
                    Err(e) => {
                        warn!(error = %e, kind = e.kind(), "Background refresh tick failed");
                        if manager.state().await.is_terminal() {
                            error!("Session is invalid, stopping background refresh");
                            break;
                        }
                    }
                }
            }
        })
    }

    /// Reports on the current session.
    pub async fn info(&self) -> SessionInfo {
        let inner = self.inner.read().await;
        let session = &inner.session;
        let now = Utc::now();

        SessionInfo {
            state: self.effective_state(inner.state),
            subject: session.masked_subject(),
            generation: session.generation,
            cookie_count: session.cookies.len(),
            missing_cookies: cookies::missing_required(&session.cookies)
                .into_iter()
                .map(str::to_string)
                .collect(),
            login_valid: session.cookies.get(LOGIN_VALID_COOKIE).cloned(),
            expires_at: session.expires_at,
            minutes_remaining: session.remaining_at(now).num_minutes(),
            renewal_due: !session.is_valid_at(now, self.config.safety_margin),
            last_refresh: inner.last_refresh,
            last_error: inner.last_error.clone(),
        }
    }

    // ------------------------------------------------------------------------
    // Renewal
    // ------------------------------------------------------------------------

    /// Renews the session. Caller must hold `renew_lock`.
    #[instrument(skip(self))]
    async fn renew_locked(&self) -> Result<Session, SessionError> {
        let current = self.inner.read().await.session.clone();
        let _renewing = RenewingGuard::enter(&self.renewing);

        info!(
            generation = current.generation,
            expires_at = %current.expires_at,
            "Renewing session"
        );

        let result = self
            .config
            .retry
            .execute(
                "session_renewal",
                |attempt| {
                    let renewer = Arc::clone(&self.renewer);
                    let current = current.clone();
                    async move {
                        debug!(attempt, "Sending renewal request");
                        let renewal = renewer.renew(&current).await?;
                        merge_renewal(&current, renewal)
                    }
                },
                |e| !e.is_auth(),
            )
            .await;

        let mut inner = self.inner.write().await;
        match result {
            Ok(renewed) => {
                let now = Utc::now();
                inner.session = renewed.clone();
                inner.state = SessionState::Fresh;
                inner.last_refresh = Some(now);
                inner.last_error = None;
                drop(inner);

                if !renewed.is_valid_at(now, self.config.safety_margin) {
                    warn!(
                        expires_at = %renewed.expires_at,
                        "Renewed session already expires within the safety margin"
                    );
                }
                info!(
                    generation = renewed.generation,
                    expires_at = %renewed.expires_at,
                    "Session renewed"
                );

                self.notify.send_replace(renewed.clone());
                Ok(renewed)
            }
            Err(exhausted) => {
                inner.state = SessionState::Invalid;
                inner.last_error = Some(exhausted.error.to_string());
                error!(
                    kind = exhausted.error.kind(),
                    attempts = exhausted.attempts,
                    last_refresh = ?inner.last_refresh,
                    error = %exhausted.error,
                    "Session renewal failed, fresh cookies required"
                );

                Err(SessionError::Expired {
                    attempts: exhausted.attempts,
                    reason: exhausted.error.to_string(),
                    last_refresh: inner.last_refresh,
                })
            }
        }
    }

    /// `Renewing` is only reported while a renewal future is alive.
    fn effective_state(&self, stored: SessionState) -> SessionState {
        if stored == SessionState::Fresh && self.renewing.load(Ordering::SeqCst) {
            SessionState::Renewing
        } else {
            stored
        }
    }

    fn invalid_error(inner: &Inner) -> SessionError {
        SessionError::Expired {
            attempts: 0,
            reason: inner
                .last_error
                .clone()
                .unwrap_or_else(|| "session is invalid".to_string()),
            last_refresh: inner.last_refresh,
        }
    }
}

/// Marks a renewal as in flight until dropped.
///
/// Dropping the renewal future mid-flight clears the flag as well.
struct RenewingGuard<'a>(&'a AtomicBool);

impl<'a> RenewingGuard<'a> {
    fn enter(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for RenewingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Merges renewed cookies into `current` and recomputes the expiry.
///
/// The expiry comes from a returned `LoginValid`, else from the earliest
/// `expires=` attribute on the returned cookies.
fn merge_renewal(current: &Session, renewal: Renewal) -> Result<Session, ApiError> {
    if renewal.cookies.is_empty() {
        return Err(ApiError::Malformed("renewal returned no cookies".to_string()));
    }

    let expires_at = match renewal.cookies.get(LOGIN_VALID_COOKIE) {
        Some(value) => cookies::parse_login_valid(value).ok_or_else(|| {
            ApiError::Malformed(format!("unparseable {LOGIN_VALID_COOKIE} value"))
        })?,
        None => renewal.expires_hint.ok_or_else(|| {
            ApiError::Malformed("renewal carried no validity window".to_string())
        })?,
    };

    let mut merged = current.cookies.clone();
    merged.extend(renewal.cookies);

    let mut session = Session::new(current.subject.clone(), merged, expires_at);
    session.generation = current.generation + 1;
    Ok(session)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicU32;

    #[derive(Clone, Copy)]
    enum Behavior {
        Succeed,
        Transient,
        Unauthorized,
    }

    struct FakeRenewer {
        calls: AtomicU32,
        behavior: Behavior,
        latency: Duration,
    }

    impl FakeRenewer {
        fn new(behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicU32::new(0),
                behavior,
                latency: Duration::from_millis(100),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SessionRenewer for FakeRenewer {
        async fn renew(&self, _session: &Session) -> Result<Renewal, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.latency).await;

            match self.behavior {
                Behavior::Succeed => {
                    let mut cookies = CookieMap::new();
                    cookies.insert(
                        LOGIN_VALID_COOKIE.to_string(),
                        cookies::format_login_valid(Utc::now() + chrono::Duration::minutes(60)),
                    );
                    cookies.insert("ASP.NET_SessionId".to_string(), "renewed".to_string());
                    Ok(Renewal {
                        cookies,
                        expires_hint: None,
                    })
                }
                Behavior::Transient => Err(ApiError::Transient("502 Bad Gateway".to_string())),
                Behavior::Unauthorized => {
                    Err(ApiError::AuthenticationFailed("login required".to_string()))
                }
            }
        }
    }

    fn cookies_expiring_in(minutes: i64) -> CookieMap {
        let mut cookies = CookieMap::new();
        cookies.insert("FpsPartnerDeviceIdentifier".into(), "device".into());
        cookies.insert("FpsExternalIdentity".into(), "identity".into());
        cookies.insert("ASP.NET_SessionId".into(), "original".into());
        cookies.insert(
            LOGIN_VALID_COOKIE.into(),
            cookies::format_login_valid(Utc::now() + chrono::Duration::minutes(minutes)),
        );
        cookies
    }

    fn manager(minutes: i64, renewer: Arc<FakeRenewer>) -> SessionManager {
        SessionManager::initialize(
            "199001011234",
            cookies_expiring_in(minutes),
            renewer,
            SessionConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_initialize_rejects_missing_cookies() {
        let mut cookies = cookies_expiring_in(60);
        cookies.remove("FpsExternalIdentity");

        let err = SessionManager::initialize(
            "199001011234",
            cookies,
            FakeRenewer::new(Behavior::Succeed),
            SessionConfig::default(),
        )
        .unwrap_err();

        assert_eq!(err.kind(), "configuration");
        assert!(err.to_string().contains("FpsExternalIdentity"));
    }

    #[test]
    fn test_initialize_rejects_unparseable_login_valid() {
        let mut cookies = cookies_expiring_in(60);
        cookies.insert(LOGIN_VALID_COOKIE.into(), "soon".into());

        let result = SessionManager::initialize(
            "199001011234",
            cookies,
            FakeRenewer::new(Behavior::Succeed),
            SessionConfig::default(),
        );
        assert!(matches!(result, Err(SessionError::Configuration(_))));
    }

    #[test]
    fn test_initialize_rejects_empty_inputs() {
        let renewer = FakeRenewer::new(Behavior::Succeed);
        assert!(
            SessionManager::initialize(" ", cookies_expiring_in(60), renewer.clone(), SessionConfig::default())
                .is_err()
        );
        assert!(
            SessionManager::initialize("199001011234", CookieMap::new(), renewer, SessionConfig::default())
                .is_err()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_session_makes_no_network_call() {
        let renewer = FakeRenewer::new(Behavior::Succeed);
        let manager = manager(60, renewer.clone());

        let session = manager.ensure_fresh().await.unwrap();
        assert_eq!(session.generation, 0);
        assert_eq!(renewer.calls(), 0);
        assert_eq!(manager.state().await, SessionState::Fresh);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_session_renews_exactly_once() {
        let renewer = FakeRenewer::new(Behavior::Succeed);
        let manager = manager(5, renewer.clone());
        let mut updates = manager.subscribe();

        let session = manager.ensure_fresh().await.unwrap();
        assert_eq!(renewer.calls(), 1);
        assert_eq!(session.generation, 1);
        assert_eq!(session.cookies.get("ASP.NET_SessionId").map(String::as_str), Some("renewed"));
        assert_eq!(session.cookies.get("FpsExternalIdentity").map(String::as_str), Some("identity"));
        assert!(session.is_valid(DEFAULT_SAFETY_MARGIN));

        // A second call finds the session fresh again.
        manager.ensure_fresh().await.unwrap();
        assert_eq!(renewer.calls(), 1);

        assert!(updates.has_changed().unwrap());
        assert_eq!(updates.borrow_and_update().generation, 1);
        assert!(manager.last_refresh().await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_exhaust_then_invalid() {
        let renewer = FakeRenewer::new(Behavior::Transient);
        let manager = manager(5, renewer.clone());

        let err = manager.ensure_fresh().await.unwrap_err();
        match err {
            SessionError::Expired { attempts, .. } => assert_eq!(attempts, 3),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(renewer.calls(), 3);
        assert_eq!(manager.state().await, SessionState::Invalid);

        // Invalid is terminal: no further network calls.
        assert!(manager.ensure_fresh().await.unwrap_err().is_expired());
        assert_eq!(renewer.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auth_failure_during_renewal_is_not_retried() {
        let renewer = FakeRenewer::new(Behavior::Unauthorized);
        let manager = manager(5, renewer.clone());

        assert!(manager.ensure_fresh().await.is_err());
        assert_eq!(renewer.calls(), 1);
        assert_eq!(manager.state().await, SessionState::Invalid);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_one_renewal() {
        let renewer = FakeRenewer::new(Behavior::Succeed);
        let manager = Arc::new(manager(5, renewer.clone()));

        let a = tokio::spawn({
            let manager = Arc::clone(&manager);
            async move { manager.ensure_fresh().await }
        });
        let b = tokio::spawn({
            let manager = Arc::clone(&manager);
            async move { manager.ensure_fresh().await }
        });

        let (a, b) = (a.await.unwrap().unwrap(), b.await.unwrap().unwrap());
        assert_eq!(renewer.calls(), 1);
        assert_eq!(a, b);
        assert_eq!(a.generation, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_renewal_leaves_session_fresh() {
        let renewer = FakeRenewer::new(Behavior::Succeed);
        let manager = Arc::new(manager(5, renewer.clone()));

        let task = tokio::spawn({
            let manager = Arc::clone(&manager);
            async move { manager.ensure_fresh().await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(manager.state().await, SessionState::Renewing);
        assert_eq!(manager.info().await.state, SessionState::Renewing);

        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());
        assert_eq!(manager.state().await, SessionState::Fresh);
        assert_eq!(manager.snapshot().await.generation, 0);

        // A cancelled renewal does not block the next one.
        let timed_out =
            tokio::time::timeout(Duration::from_millis(50), manager.ensure_fresh()).await;
        assert!(timed_out.is_err());
        assert_eq!(manager.state().await, SessionState::Fresh);

        let session = manager.ensure_fresh().await.unwrap();
        assert_eq!(session.generation, 1);
        assert_eq!(renewer.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unexpected_expiry_renews_once_per_generation() {
        let renewer = FakeRenewer::new(Behavior::Succeed);
        let manager = manager(60, renewer.clone());

        let rejected = manager.ensure_fresh().await.unwrap();
        let renewed = manager.handle_unexpected_expiry(&rejected).await.unwrap();
        assert_eq!(renewed.generation, 1);

        // The same stale snapshot reported again does not renew twice.
        let again = manager.handle_unexpected_expiry(&rejected).await.unwrap();
        assert_eq!(again.generation, 1);
        assert_eq!(renewer.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_refresh_renews_and_stops() {
        let renewer = FakeRenewer::new(Behavior::Succeed);
        let manager = Arc::new(manager(5, renewer.clone()));
        let (handle, signal) = crate::shutdown::stop_channel();

        let task = manager.start_background_refresh(Duration::from_secs(300), signal);
        tokio::time::sleep(Duration::from_secs(301)).await;
        assert_eq!(renewer.calls(), 1);

        handle.stop();
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_refresh_exits_when_invalid() {
        let renewer = FakeRenewer::new(Behavior::Transient);
        let manager = Arc::new(manager(5, renewer.clone()));
        let (_handle, signal) = crate::shutdown::stop_channel();

        let task = manager.start_background_refresh(Duration::from_secs(60), signal);
        task.await.unwrap();
        assert_eq!(manager.state().await, SessionState::Invalid);
    }

    #[tokio::test(start_paused = true)]
    async fn test_info_reports_due_renewal() {
        let manager = manager(5, FakeRenewer::new(Behavior::Succeed));
        let info = manager.info().await;

        assert!(info.renewal_due);
        assert!(info.missing_cookies.is_empty());
        assert_eq!(info.cookie_count, 4);
        assert_eq!(info.subject, "********1234");
        assert!(info.minutes_remaining <= 5);
    }

    #[test]
    fn test_merge_uses_expires_hint_without_login_valid() {
        let current = Session::new("1", cookies_expiring_in(5), Utc::now());
        let hint = Utc::now() + chrono::Duration::hours(1);

        let mut returned = CookieMap::new();
        returned.insert("ASP.NET_SessionId".into(), "x".into());
        let merged = merge_renewal(
            &current,
            Renewal {
                cookies: returned,
                expires_hint: Some(hint),
            },
        )
        .unwrap();

        assert_eq!(merged.expires_at, hint);
        assert_eq!(merged.generation, current.generation + 1);
        assert!(merge_renewal(&current, Renewal::default()).is_err());
    }
}
