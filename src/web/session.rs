//! Server-side sessions keyed by an opaque cookie.
//!
//! The browser only ever holds a random session id. User id, pending flash
//! messages and the running quiz stay in memory on the server.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use actix_web::cookie::{Cookie, SameSite};
use actix_web::dev::Payload;
use actix_web::{error, web, FromRequest, HttpRequest, HttpResponseBuilder};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use futures::future::{ready, Ready};
use log::debug;
use uuid::Uuid;

use crate::core::quiz::QuizState;
use crate::web::server::AppState;

/// Name of the cookie carrying the session id
pub const SESSION_COOKIE: &str = "mensable_session";

/// Everything remembered about one browser session
#[derive(Debug, Clone)]
pub struct SessionData {
    /// Logged-in user, if any
    pub user_id: Option<i64>,
    /// Messages to show on the next rendered page
    pub flashes: Vec<String>,
    /// Quiz in progress
    pub quiz: Option<QuizState>,
    /// Last request seen for this session
    pub last_seen: DateTime<Utc>,
}

impl Default for SessionData {
    fn default() -> Self {
        Self {
            user_id: None,
            flashes: Vec::new(),
            quiz: None,
            last_seen: Utc::now(),
        }
    }
}

/// How often a newly stored session may trigger a sweep of idle ones
const PRUNE_INTERVAL_SECONDS: i64 = 60;

/// All live sessions
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<DashMap<String, SessionData>>,
    idle_timeout: Duration,
    /// Unix time of the last sweep
    last_pruned: Arc<AtomicI64>,
}

impl SessionStore {
    pub fn new(idle_minutes: i64) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            idle_timeout: Duration::minutes(idle_minutes),
            last_pruned: Arc::new(AtomicI64::new(Utc::now().timestamp())),
        }
    }

    /// Resume the session named by the cookie, or hand out a fresh id.
    ///
    /// A fresh session is only stored once something is written to it.
    pub fn open(&self, cookie_value: Option<&str>) -> Session {
        if let Some(id) = cookie_value {
            if let Some(mut data) = self.sessions.get_mut(id) {
                data.last_seen = Utc::now();
                return Session {
                    id: id.to_string(),
                    is_new: false,
                    store: self.clone(),
                };
            }
        }

        Session {
            id: Uuid::new_v4().to_string(),
            is_new: true,
            store: self.clone(),
        }
    }

    /// Drop sessions that have been idle longer than the timeout
    pub fn prune_idle(&self) {
        let cutoff = Utc::now() - self.idle_timeout;
        let before = self.sessions.len();
        self.sessions.retain(|_, data| data.last_seen >= cutoff);
        let pruned = before.saturating_sub(self.sessions.len());
        if pruned > 0 {
            debug!("Pruned {} idle sessions", pruned);
        }
    }

    /// Sweep idle sessions at most once per interval
    fn prune_if_due(&self) {
        let now = Utc::now().timestamp();
        let last = self.last_pruned.load(Ordering::Relaxed);
        if now - last < PRUNE_INTERVAL_SECONDS {
            return;
        }
        if self
            .last_pruned
            .compare_exchange(last, now, Ordering::Relaxed, Ordering::Relaxed)
            .is_ok()
        {
            self.prune_idle();
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }
}

/// Handle on the current request's session
pub struct Session {
    id: String,
    is_new: bool,
    store: SessionStore,
}

impl Session {
    /// Read the stored data; `None` while nothing has been written
    fn read<R>(&self, f: impl FnOnce(&SessionData) -> R) -> Option<R> {
        self.store.sessions.get(&self.id).map(|data| f(data.value()))
    }

    /// Change the stored data, storing the session first if needed
    fn update<R>(&self, f: impl FnOnce(&mut SessionData) -> R) -> R {
        if !self.store.sessions.contains_key(&self.id) {
            self.store.prune_if_due();
            debug!("Started session {}", self.id);
        }
        let mut entry = self.store.sessions.entry(self.id.clone()).or_default();
        f(entry.value_mut())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn user_id(&self) -> Option<i64> {
        self.read(|data| data.user_id).flatten()
    }

    pub fn log_in(&self, user_id: i64) {
        self.update(|data| data.user_id = Some(user_id));
    }

    /// Forget everything but keep the session id
    pub fn clear(&self) {
        if let Some(mut data) = self.store.sessions.get_mut(&self.id) {
            *data = SessionData::default();
        }
    }

    pub fn flash(&self, message: impl Into<String>) {
        let message = message.into();
        self.update(|data| data.flashes.push(message));
    }

    pub fn take_flashes(&self) -> Vec<String> {
        match self.store.sessions.get_mut(&self.id) {
            Some(mut data) => std::mem::take(&mut data.flashes),
            None => Vec::new(),
        }
    }

    pub fn quiz(&self) -> Option<QuizState> {
        self.read(|data| data.quiz.clone()).flatten()
    }

    pub fn set_quiz(&self, quiz: QuizState) {
        self.update(|data| data.quiz = Some(quiz));
    }

    pub fn clear_quiz(&self) {
        if let Some(mut data) = self.store.sessions.get_mut(&self.id) {
            data.quiz = None;
        }
    }

    /// Add the session cookie to a response once the session is stored and
    /// the browser doesn't have it yet
    pub fn attach(&self, builder: &mut HttpResponseBuilder) {
        if self.is_new && self.store.sessions.contains_key(&self.id) {
            let cookie = Cookie::build(SESSION_COOKIE, self.id.clone())
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .finish();
            builder.cookie(cookie);
        }
    }
}

impl FromRequest for Session {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = match req.app_data::<web::Data<AppState>>() {
            Some(state) => {
                let cookie = req.cookie(SESSION_COOKIE);
                Ok(state.sessions.open(cookie.as_ref().map(|c| c.value())))
            }
            None => Err(error::ErrorInternalServerError("Session store not configured")),
        };
        ready(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::HttpResponse;

    #[test]
    fn test_open_new_and_resume() {
        let store = SessionStore::new(60);
        let session = store.open(None);
        assert!(session.is_new);
        session.log_in(5);

        let resumed = store.open(Some(session.id()));
        assert!(!resumed.is_new);
        assert_eq!(resumed.user_id(), Some(5));

        // Unknown ids get a fresh session
        let stranger = store.open(Some("not-a-session"));
        assert!(stranger.is_new);
        assert_ne!(stranger.id(), "not-a-session");
        assert_eq!(stranger.user_id(), None);
    }

    #[test]
    fn test_flashes_are_taken_once() {
        let store = SessionStore::new(60);
        let session = store.open(None);
        session.flash("one");
        session.flash("two");
        assert_eq!(session.take_flashes(), vec!["one", "two"]);
        assert!(session.take_flashes().is_empty());
    }

    #[test]
    fn test_clear_keeps_id_and_drops_state() {
        let store = SessionStore::new(60);
        let session = store.open(None);
        session.log_in(1);
        session.set_quiz(QuizState::new(3, vec![1, 2]));

        session.clear();

        assert_eq!(session.user_id(), None);
        assert!(session.quiz().is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_prune_idle_sessions() {
        let store = SessionStore::new(30);
        let stale = store.open(None);
        let fresh = store.open(None);
        stale.flash("old");
        fresh.flash("new");
        store
            .sessions
            .get_mut(stale.id())
            .unwrap()
            .last_seen = Utc::now() - Duration::minutes(31);

        store.prune_idle();

        assert_eq!(store.len(), 1);
        assert!(store.sessions.contains_key(fresh.id()));
    }

    // Reading an unknown session stores nothing and sets no cookie
    #[test]
    fn test_fresh_session_is_stored_on_first_write() {
        let store = SessionStore::new(60);
        let session = store.open(None);
        assert_eq!(session.user_id(), None);
        assert!(session.take_flashes().is_empty());
        assert!(session.quiz().is_none());
        session.clear();
        session.clear_quiz();
        assert_eq!(store.len(), 0);

        let mut builder = HttpResponse::Ok();
        session.attach(&mut builder);
        assert_eq!(builder.finish().cookies().count(), 0);

        session.flash("hello");
        assert_eq!(store.len(), 1);
        let mut builder = HttpResponse::Ok();
        session.attach(&mut builder);
        let response = builder.finish();
        let cookie = response.cookies().next().unwrap();
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), session.id());
    }

    #[test]
    fn test_prune_runs_at_most_once_per_interval() {
        let store = SessionStore::new(30);
        let stale = store.open(None);
        stale.flash("old");
        store
            .sessions
            .get_mut(stale.id())
            .unwrap()
            .last_seen = Utc::now() - Duration::minutes(31);

        // Swept recently: a new session leaves the stale one alone
        store.open(None).flash("new");
        assert_eq!(store.len(), 2);

        store
            .last_pruned
            .store(Utc::now().timestamp() - PRUNE_INTERVAL_SECONDS, Ordering::Relaxed);
        store.open(None).flash("newer");
        assert_eq!(store.len(), 2);
        assert!(!store.sessions.contains_key(stale.id()));
    }
}
