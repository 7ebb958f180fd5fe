//! services/api/src/web/middleware.rs
//!
//! Client identification middleware.
//!
//! Every browser gets a random id in the `sw_client` cookie; saved favorites and the
//! profile are keyed by it. This is not authentication.

use axum::{
    extract::Request,
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::{debug, error};
use uuid::Uuid;

pub const CLIENT_COOKIE: &str = "sw_client";
const COOKIE_MAX_AGE_SECS: u64 = 60 * 60 * 24 * 365;

/// The calling browser, inserted into request extensions by `ensure_client`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientId(pub Uuid);

/// Reads the client cookie, issuing a new id when it is missing or unreadable.
pub async fn ensure_client(mut req: Request, next: Next) -> Response {
    let (client_id, issued) = match client_from_headers(req.headers()) {
        Some(id) => (id, false),
        None => (Uuid::new_v4(), true),
    };
    req.extensions_mut().insert(ClientId(client_id));

    let mut response = next.run(req).await;
    if issued {
        debug!(%client_id, "Issuing client cookie");
        let cookie = format!(
            "{}={}; Path=/; Max-Age={}; SameSite=Lax; HttpOnly",
            CLIENT_COOKIE, client_id, COOKIE_MAX_AGE_SECS
        );
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => error!("Failed to build client cookie: {}", e),
        }
    }
    response
}

/// Finds a well-formed client id among the request's cookies.
pub fn client_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|c| {
            let (name, value) = c.trim().split_once('=')?;
            (name == CLIENT_COOKIE).then(|| Uuid::parse_str(value.trim()).ok())?
        })
}
