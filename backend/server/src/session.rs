//! # Session Identity
//!
//! Each browser gets one opaque id, carried in the signed `slice_session` cookie.
//!
//! - Assigned by the server on the first request that needs it
//! - Never reassigned while the cookie lives
//! - Signed with a key generated at startup, so ids only ever come from this process
//! - A cookie with a bad signature or an unparsable id is ignored and replaced
use std::{convert::Infallible, sync::Arc};

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
    response::{IntoResponseParts, ResponseParts},
};
use axum_extra::extract::cookie::{Cookie, Key, SameSite, SignedCookieJar};
use time::Duration;
use tracing::{debug, warn};

use crate::{models::SessionId, state::State};

pub const SESSION_COOKIE: &str = "slice_session";
const SESSION_MAX_AGE_DAYS: i64 = 31;

/// Per-request session state. Returned from handlers to emit `Set-Cookie` when an id
/// was assigned during the request.
#[derive(Clone)]
pub struct SessionContext {
    jar: SignedCookieJar,
    id: Option<SessionId>,
    assigned: bool,
}

impl SessionContext {
    pub fn new(key: Key) -> Self {
        Self {
            jar: SignedCookieJar::new(key),
            id: None,
            assigned: false,
        }
    }

    pub fn from_headers(headers: &HeaderMap, key: Key) -> Self {
        let jar = SignedCookieJar::from_headers(headers, key);
        let id = jar.get(SESSION_COOKIE).and_then(|cookie| {
            cookie
                .value()
                .parse()
                .map_err(|_| warn!("Ignoring malformed session id"))
                .ok()
        });

        Self {
            jar,
            id,
            assigned: false,
        }
    }

    pub fn id(&self) -> Option<SessionId> {
        self.id
    }

    pub fn ensure_session_id(&mut self) -> SessionId {
        if let Some(id) = self.id {
            return id;
        }

        let id = SessionId::generate();
        debug!("Assigned session {id}");

        self.id = Some(id);
        self.assigned = true;
        id
    }

    fn session_cookie(id: SessionId) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, id.to_string()))
            .path("/")
            .max_age(Duration::days(SESSION_MAX_AGE_DAYS))
            .http_only(true)
            .same_site(SameSite::Lax)
            .build()
    }
}

impl FromRequestParts<Arc<State>> for SessionContext {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<State>,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers, state.key.clone()))
    }
}

impl IntoResponseParts for SessionContext {
    type Error = Infallible;

    fn into_response_parts(self, res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        match (self.assigned, self.id) {
            (true, Some(id)) => self
                .jar
                .add(Self::session_cookie(id))
                .into_response_parts(res),
            _ => Ok(res),
        }
    }
}
