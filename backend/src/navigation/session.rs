//! Timer-driven navigation sessions.
//!
//! A session samples its [`LocationSource`] on a fixed interval from a single tokio
//! task, so two fixes are never processed at the same time. Results go to the
//! caller's `on_update` / `on_error` callbacks. [`NavigationSession::stop`] waits for
//! the task to finish, so no callback runs once it has returned.

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use shared::{NavigationUpdate, PositionFix};
use tokio::{
    sync::{oneshot, watch},
    task::JoinHandle,
    time::MissedTickBehavior,
};

use super::{
    source::LocationSource,
    tracker::{NavigationTracker, Route, SessionState},
};
use crate::{
    config::NavigationConfig,
    error::{ConfigError, LocationError, NavigationError},
};

/// Handle to one running session. Dropping it also shuts the session down.
#[derive(Debug)]
pub struct NavigationSession {
    route: Arc<Route>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
    state: watch::Receiver<SessionState>,
}

impl NavigationSession {
    /// Spawn the sampling task. Must be called from within a tokio runtime.
    pub fn start<S, U, E>(
        route: Arc<Route>,
        source: S,
        config: NavigationConfig,
        on_update: U,
        on_error: E,
    ) -> Result<Self, NavigationError>
    where
        S: LocationSource,
        U: FnMut(NavigationUpdate) + Send + 'static,
        E: FnMut(LocationError) + Send + 'static,
    {
        let mut tracker = NavigationTracker::new(config.clone());
        tracker.start(Arc::clone(&route))?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let (state_tx, state_rx) = watch::channel(SessionState::Active);
        let task = tokio::spawn(run_session(
            tracker,
            source,
            config,
            on_update,
            on_error,
            shutdown_rx,
            state_tx,
        ));

        Ok(Self {
            route,
            shutdown: Some(shutdown_tx),
            task: Some(task),
            state: state_rx,
        })
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn is_active(&self) -> bool {
        self.state() == SessionState::Active
    }

    pub fn route(&self) -> &Arc<Route> {
        &self.route
    }

    /// Resolve once the session has left `Active`, by arrival or shutdown.
    pub async fn finished(&mut self) -> SessionState {
        // An Err only means the task is gone; the last published state still stands.
        let _ = self
            .state
            .wait_for(|state| *state != SessionState::Active)
            .await;
        self.state()
    }

    /// Cancel sampling and wait for the task to exit.
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            // The task may already have ended on arrival.
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                tracing::error!("navigation task ended abnormally: {err}");
            }
        }
    }
}

async fn run_session<S, U, E>(
    mut tracker: NavigationTracker,
    mut source: S,
    config: NavigationConfig,
    mut on_update: U,
    mut on_error: E,
    mut shutdown: oneshot::Receiver<()>,
    state: watch::Sender<SessionState>,
) where
    S: LocationSource,
    U: FnMut(NavigationUpdate) + Send + 'static,
    E: FnMut(LocationError) + Send + 'static,
{
    let mut ticker = tokio::time::interval(config.sample_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            _ = ticker.tick() => {}
        }

        let sample = tokio::select! {
            biased;
            _ = &mut shutdown => break,
            sample = tokio::time::timeout(config.fix_timeout, source.current_fix()) => sample,
        };

        let fix = match sample {
            Ok(Ok(fix)) => fix,
            Ok(Err(err)) => {
                tracing::warn!("location fix failed: {err}");
                on_error(err);
                continue;
            }
            Err(_) => {
                let err = LocationError::Timeout(config.fix_timeout);
                tracing::warn!("{err}");
                on_error(err);
                continue;
            }
        };

        if let Err(err) = check_freshness(&fix, config.max_fix_age) {
            tracing::warn!("discarding fix: {err}");
            on_error(err);
            continue;
        }

        match tracker.process_fix(&fix) {
            Ok(update) => on_update(update),
            Err(NavigationError::Location(err)) => {
                tracing::warn!("discarding fix: {err}");
                on_error(err);
                continue;
            }
            Err(err) => {
                tracing::error!("navigation tracker rejected fix: {err}");
                break;
            }
        }

        if tracker.state() == SessionState::Arrived {
            state.send_replace(SessionState::Arrived);
            return;
        }
    }

    tracker.stop();
    state.send_replace(SessionState::Idle);
}

fn check_freshness(fix: &PositionFix, max_age: Duration) -> Result<(), LocationError> {
    let age_ms = (Utc::now() - fix.timestamp).num_milliseconds();
    let max_ms = i64::try_from(max_age.as_millis()).unwrap_or(i64::MAX);
    if age_ms > max_ms {
        return Err(LocationError::Stale { age_ms });
    }
    Ok(())
}

/// Owner of at most one session at a time.
///
/// Starting while a session is active fails with [`NavigationError::AlreadyActive`];
/// call [`Navigator::stop`] first.
#[derive(Debug, Default)]
pub struct Navigator {
    config: NavigationConfig,
    session: Option<NavigationSession>,
}

impl Navigator {
    pub fn new(config: NavigationConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }

    /// Navigator using [`NavigationConfig::from_env`].
    pub fn from_env() -> Result<Self, ConfigError> {
        NavigationConfig::from_env().map(Self::new)
    }

    pub fn config(&self) -> &NavigationConfig {
        &self.config
    }

    pub fn start<S, U, E>(
        &mut self,
        route: Arc<Route>,
        source: S,
        on_update: U,
        on_error: E,
    ) -> Result<(), NavigationError>
    where
        S: LocationSource,
        U: FnMut(NavigationUpdate) + Send + 'static,
        E: FnMut(LocationError) + Send + 'static,
    {
        if self.is_active() {
            return Err(NavigationError::AlreadyActive);
        }
        let session =
            NavigationSession::start(route, source, self.config.clone(), on_update, on_error)?;
        self.session = Some(session);
        Ok(())
    }

    /// Stop the current session, if any. Calling it while idle does nothing.
    pub async fn stop(&mut self) {
        if let Some(session) = self.session.take() {
            session.stop().await;
        }
    }

    pub fn is_active(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(NavigationSession::is_active)
    }

    pub fn state(&self) -> SessionState {
        self.session
            .as_ref()
            .map_or(SessionState::Idle, NavigationSession::state)
    }

    pub fn session_mut(&mut self) -> Option<&mut NavigationSession> {
        self.session.as_mut()
    }
}
