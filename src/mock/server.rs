//! Hyper server setup and request routing for the mock API

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming as IncomingBody};
use hyper::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnectionBuilder;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;

use crate::api::endpoints;
use crate::common::config::Credentials;
use crate::common::{Error, Result};

use super::store::RevueStore;

/// Path prefix the mock serves under, mirroring the public API
pub const API_PREFIX: &str = "/api";

/// Shared store handle
pub type SharedStore = Arc<Mutex<RevueStore>>;

/// HTTP server for the mock Revue API
pub struct MockServer {
    listener: TcpListener,
    store: SharedStore,
}

impl MockServer {
    /// Bind to `addr`; use port 0 for an ephemeral port
    pub async fn bind(addr: &str, credentials: Credentials) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            store: Arc::new(Mutex::new(RevueStore::new(credentials))),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Base URL clients should be configured with
    pub fn base_url(&self) -> Result<String> {
        Ok(format!("http://{}{}", self.local_addr()?, API_PREFIX))
    }

    pub fn store(&self) -> SharedStore {
        Arc::clone(&self.store)
    }

    /// Serve until `shutdown` resolves
    pub async fn serve<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tracing::info!("Mock Revue API listening on {}", self.base_url()?);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Mock Revue API shutting down");
                    break;
                }
                accepted = self.listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(conn) => conn,
                        Err(e) => {
                            tracing::error!("Accept error: {}", e);
                            continue;
                        }
                    };

                    let io = TokioIo::new(stream);
                    let store = Arc::clone(&self.store);

                    tokio::task::spawn(async move {
                        let builder = ConnectionBuilder::new(TokioExecutor::new());
                        let service = hyper::service::service_fn(move |req| {
                            handle_request(req, Arc::clone(&store))
                        });
                        if let Err(err) = builder.serve_connection(io, service).await {
                            tracing::debug!("Error serving connection from {}: {}", peer, err);
                        }
                    });
                }
            }
        }

        Ok(())
    }

    /// Serve on a background task, returning a handle that stops it
    pub fn spawn(self) -> Result<MockHandle> {
        let base_url = self.base_url()?;
        let store = self.store();
        let (tx, rx) = oneshot::channel::<()>();

        let task = tokio::spawn(self.serve(async move {
            let _ = rx.await;
        }));

        Ok(MockHandle {
            base_url,
            store,
            shutdown: Some(tx),
            task,
        })
    }
}

/// A mock server running on a background task
pub struct MockHandle {
    base_url: String,
    store: SharedStore,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<Result<()>>,
}

impl MockHandle {
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn store(&self) -> SharedStore {
        Arc::clone(&self.store)
    }

    /// Stop accepting connections and wait for the server task
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        (&mut self.task)
            .await
            .map_err(|e| Error::Io(std::io::Error::other(e)))?
    }
}

/// Handles an incoming HTTP request
async fn handle_request(
    req: Request<IncomingBody>,
    store: SharedStore,
) -> std::result::Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let revue_id = query_param(req.uri().query(), endpoints::REVUE_ID_PARAM);
    let token = bearer_token(&req);

    let body = match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            tracing::warn!("Failed to read request body: {}", e);
            return Ok(json_response(400, &json!({ "msg": "Unreadable body" })));
        }
    };

    let (status, reply) = route(
        &method,
        &path,
        revue_id.as_deref(),
        token.as_deref(),
        &body,
        &store,
    )
    .await;

    tracing::debug!("{} {} -> {}", method, path, status);
    Ok(json_response(status, &reply))
}

async fn route(
    method: &Method,
    path: &str,
    revue_id: Option<&str>,
    token: Option<&str>,
    body: &[u8],
    store: &SharedStore,
) -> (u16, Value) {
    let Some(route) = path.strip_prefix(API_PREFIX) else {
        return not_found();
    };

    let mut store = store.lock().await;

    if *method == Method::POST && route == endpoints::AUTHENTICATE {
        return match parse_json(body) {
            Ok(json) => store.authenticate(&json),
            Err(reply) => reply,
        };
    }

    let known = [
        endpoints::CREATE,
        endpoints::LIST,
        endpoints::EDIT,
        endpoints::DELETE,
    ];
    if !known.contains(&route) {
        return not_found();
    }
    if !store.is_authorized(token) {
        return (401, json!({ "msg": "Unauthorized" }));
    }

    match (method.as_str(), route) {
        ("POST", endpoints::CREATE) => match parse_json(body) {
            Ok(json) => store.create(&json),
            Err(reply) => reply,
        },
        ("GET", endpoints::LIST) => store.list(),
        ("PUT", endpoints::EDIT) => match parse_json(body) {
            Ok(json) => store.edit(revue_id, &json),
            Err(reply) => reply,
        },
        ("DELETE", endpoints::DELETE) => store.delete(revue_id),
        _ => (405, json!({ "msg": "Method not allowed" })),
    }
}

fn parse_json(body: &[u8]) -> std::result::Result<Value, (u16, Value)> {
    serde_json::from_slice(body).map_err(|e| (400, json!({ "msg": format!("Invalid JSON: {}", e) })))
}

fn not_found() -> (u16, Value) {
    (404, json!({ "msg": "Not found" }))
}

fn bearer_token(req: &Request<IncomingBody>) -> Option<String> {
    req.headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|t| t.trim().to_string())
}

/// Value of `name` in a query string; ids need no percent-decoding
fn query_param(query: Option<&str>, name: &str) -> Option<String> {
    query?
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

fn json_response(status: u16, body: &Value) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body.to_string())));
    *response.status_mut() = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_param() {
        assert_eq!(
            query_param(Some("revueId=abc&x=1"), "revueId").as_deref(),
            Some("abc")
        );
        assert_eq!(query_param(Some("x=1"), "revueId"), None);
        assert_eq!(query_param(None, "revueId"), None);
    }

    #[tokio::test]
    async fn test_route_requires_token() {
        let store: SharedStore = Arc::new(Mutex::new(RevueStore::new(Credentials::default())));

        let (status, _) = route(&Method::GET, "/api/Revue/All", None, None, b"", &store).await;
        assert_eq!(status, 401);

        let (status, _) = route(&Method::GET, "/api/Nope", None, None, b"", &store).await;
        assert_eq!(status, 404);

        let login = br#"{"email":"user@example.com","password":"string"}"#;
        let (status, body) =
            route(&Method::POST, "/api/User/Authentication", None, None, login, &store).await;
        assert_eq!(status, 200);
        let token = body["accessToken"].as_str().unwrap().to_string();

        let (status, body) =
            route(&Method::GET, "/api/Revue/All", None, Some(&token), b"", &store).await;
        assert_eq!(status, 200);
        assert_eq!(body, json!([]));

        let (status, _) =
            route(&Method::POST, "/api/Revue/All", None, Some(&token), b"", &store).await;
        assert_eq!(status, 405);
    }

    #[tokio::test]
    async fn test_route_rejects_bad_json() {
        let store: SharedStore = Arc::new(Mutex::new(RevueStore::new(Credentials::default())));
        let (status, _) = route(
            &Method::POST,
            "/api/User/Authentication",
            None,
            None,
            b"{not json",
            &store,
        )
        .await;
        assert_eq!(status, 400);
    }
}
