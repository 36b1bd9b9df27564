//! Response cache middleware.
//!
//! Serves cached GET responses and captures fresh 2xx responses into the
//! cache. Keys and path exclusions use the full request URL, including any
//! prefix a parent router stripped with `Router::nest`.
//!
//! A miss whose body has a known non-zero length is streamed to the client
//! while being copied aside, and the copy is stored once the body completes.
//! A body of unknown length is buffered first, so `X-Cache: MISS` is only
//! added when there is something to store.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{Body, Bytes, HttpBody},
    extract::{OriginalUri, Request, State},
    http::{
        header::{CONNECTION, CONTENT_LENGTH, TRANSFER_ENCODING, USER_AGENT},
        HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri,
    },
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use bytes::BytesMut;
use futures::StreamExt;
use tracing::{debug, instrument, warn};

use crate::api::AppState;
use crate::cache::{derive_key, short_key, CacheItem, CacheManager};

/// Paths containing any of these segments are never cached.
pub const EXCLUDED_PATHS: [&str; 2] = ["/admin", "/auth"];

pub const X_CACHE: HeaderName = HeaderName::from_static("x-cache");
pub const X_CACHE_KEY: HeaderName = HeaderName::from_static("x-cache-key");

/// Applies the response cache to every route of `router`.
pub fn with_response_cache(router: Router, state: AppState) -> Router {
    router.layer(middleware::from_fn_with_state(state, response_cache_layer))
}

/// Middleware for read-through response caching.
///
/// Only GET requests outside [`EXCLUDED_PATHS`] are considered. Non-2xx and
/// empty responses are passed through uncached.
#[instrument(skip_all, fields(path = %request.uri().path()))]
pub async fn response_cache_layer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(manager) = state.cache.clone() else {
        return next.run(request).await;
    };

    if request.method() != Method::GET {
        return next.run(request).await;
    }

    let uri = full_uri(&request);
    if EXCLUDED_PATHS.iter().any(|excluded| uri.path().contains(excluded)) {
        return next.run(request).await;
    }

    let user_agent = request
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let key = derive_key(request.method().as_str(), &uri.to_string(), user_agent);

    if let Some(item) = manager.get(&key).await {
        debug!(
            key = short_key(&key),
            outcome = "hit",
            ttl_remaining_ms = item.ttl_remaining_ms(),
            "serving cached response"
        );
        return replay(item, &key);
    }

    debug!(key = short_key(&key), outcome = "miss", "executing handler");
    let response = next.run(request).await;

    if !response.status().is_success() {
        return response;
    }

    match response.body().size_hint().exact() {
        Some(0) => response,
        Some(_) => capture(response, manager, key, state.ttl()),
        None => buffer_and_store(response, &manager, &key, state.ttl()).await,
    }
}

/// The request URI as the client sent it. Nested routers only see the path
/// below their mount point, so `OriginalUri` is preferred when present.
fn full_uri(request: &Request) -> Uri {
    request
        .extensions()
        .get::<OriginalUri>()
        .map(|original| original.0.clone())
        .unwrap_or_else(|| request.uri().clone())
}

/// Builds a response from a cached item without touching the handler.
fn replay(item: CacheItem, key: &str) -> Response {
    let mut response = Response::new(Body::from(item.data));
    let headers = response.headers_mut();

    for (name, value) in &item.headers {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            headers.insert(name, value);
        }
    }

    mark(headers, "HIT", key);
    response
}

/// Tees the response body into a buffer and stores it when the body ends.
fn capture(response: Response, manager: Arc<CacheManager>, key: String, ttl: Duration) -> Response {
    let (mut parts, body) = response.into_parts();
    let headers = cacheable_headers(&parts.headers);
    mark(&mut parts.headers, "MISS", &key);

    let mut upstream = Box::pin(body.into_data_stream());
    let stream = async_stream::stream! {
        let mut captured = BytesMut::new();

        while let Some(chunk) = upstream.next().await {
            match chunk {
                Ok(bytes) => {
                    captured.extend_from_slice(&bytes);
                    yield Ok::<Bytes, axum::Error>(bytes);
                }
                Err(e) => {
                    warn!(error = %e, "response body failed, not caching");
                    yield Err(e);
                    return;
                }
            }
        }

        if captured.is_empty() {
            return;
        }

        // Spawned so the write completes even if the client disconnects
        let write = tokio::spawn(async move {
            if let Err(e) = manager.set(&key, captured.to_vec(), headers, ttl).await {
                warn!(key = short_key(&key), error = %e, "Failed to cache response");
            }
        });
        let _ = write.await;
    };

    Response::from_parts(parts, Body::from_stream(stream))
}

/// Collects a body of unknown length, storing and marking it only when it
/// turns out non-empty.
async fn buffer_and_store(
    response: Response,
    manager: &CacheManager,
    key: &str,
    ttl: Duration,
) -> Response {
    let (mut parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "response body failed, not caching");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    if bytes.is_empty() {
        return Response::from_parts(parts, Body::empty());
    }

    let headers = cacheable_headers(&parts.headers);
    match manager.set(key, bytes.to_vec(), headers, ttl).await {
        Ok(()) => mark(&mut parts.headers, "MISS", key),
        Err(e) => warn!(key = short_key(key), error = %e, "Failed to cache response"),
    }
    Response::from_parts(parts, Body::from(bytes))
}

/// Headers worth replaying on a hit. Repeated names keep the last value.
fn cacheable_headers(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter(|(name, _)| {
            ![CONTENT_LENGTH, TRANSFER_ENCODING, CONNECTION, X_CACHE, X_CACHE_KEY].contains(name)
        })
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}

fn mark(headers: &mut HeaderMap, outcome: &'static str, key: &str) {
    headers.insert(X_CACHE, HeaderValue::from_static(outcome));
    if let Ok(value) = HeaderValue::from_str(short_key(key)) {
        headers.insert(X_CACHE_KEY, value);
    }
}
