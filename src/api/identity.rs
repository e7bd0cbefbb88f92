//! Caller identity extraction.
//!
//! Authentication itself happens upstream: the auth proxy in front of this
//! service verifies the session and forwards the user id in a request header.
//! Handlers take an [`OwnerId`] argument; requests without an identity are
//! redirected to the public entry point before any handler code runs.

use actix_web::{
    dev::Payload, http::header, http::StatusCode, web, FromRequest, HttpRequest, HttpResponse,
    ResponseError,
};
use std::fmt;
use std::future::{ready, Ready};
use tracing::warn;

/// Where identity comes from and where anonymous callers are sent
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub header: String,
    pub redirect_to: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            header: "x-user-id".to_string(),
            redirect_to: "/".to_string(),
        }
    }
}

/// Authenticated owner of the jobs a request may touch. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(id: &str) -> Option<Self> {
        let id = id.trim();
        if id.is_empty() {
            None
        } else {
            Some(Self(id.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Request had no usable identity
#[derive(Debug)]
pub struct Unauthenticated {
    redirect_to: String,
}

impl fmt::Display for Unauthenticated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unauthenticated, redirecting to {}", self.redirect_to)
    }
}

impl ResponseError for Unauthenticated {
    fn status_code(&self) -> StatusCode {
        StatusCode::SEE_OTHER
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::SeeOther()
            .insert_header((header::LOCATION, self.redirect_to.clone()))
            .finish()
    }
}

impl FromRequest for OwnerId {
    type Error = Unauthenticated;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let default_config;
        let config = match req.app_data::<web::Data<IdentityConfig>>() {
            Some(config) => config.get_ref(),
            None => {
                default_config = IdentityConfig::default();
                &default_config
            }
        };

        let owner = req
            .headers()
            .get(config.header.as_str())
            .and_then(|value| value.to_str().ok())
            .and_then(OwnerId::new);

        ready(match owner {
            Some(owner) => Ok(owner),
            None => {
                warn!("No identity on {} {}, redirecting", req.method(), req.path());
                Err(Unauthenticated {
                    redirect_to: config.redirect_to.clone(),
                })
            }
        })
    }
}
