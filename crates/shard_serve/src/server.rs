//! The HTTP listener and request handler.

use std::convert::Infallible;
use std::future::Future;
use std::net::TcpListener;
use std::path::PathBuf;
use std::sync::Arc;

use hyper::header::{HeaderValue, CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE};
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use shard_config::BuildOptions;

use crate::error::ServeError;
use crate::route::{content_type, resolve_request, Resolved};

/// What the server exposes and how unknown routes are answered.
#[derive(Debug, Clone)]
pub struct ServeConfig {
    /// Directory served as `/`.
    pub root: PathBuf,
    /// HTML document used for history fallback.
    pub html_filename: String,
    /// Answer unknown extension-less paths with the HTML document.
    pub history_fallback: bool,
}

impl ServeConfig {
    /// Serves the output directory of a build.
    pub fn from_options(options: &BuildOptions) -> Self {
        Self {
            root: options.out_dir.clone(),
            html_filename: options.html_filename.clone(),
            history_fallback: options.server.history_fallback,
        }
    }

    fn fallback(&self) -> Option<&str> {
        self.history_fallback.then_some(self.html_filename.as_str())
    }
}

/// Opens a non-blocking listener on `host:port`. Port 0 picks a free port.
pub fn bind(host: &str, port: u16) -> Result<TcpListener, ServeError> {
    let addr = format!("{host}:{port}");
    let bind_err = |source| ServeError::Bind {
        addr: addr.clone(),
        source,
    };
    let listener = TcpListener::bind((host, port)).map_err(bind_err)?;
    listener.set_nonblocking(true).map_err(bind_err)?;
    Ok(listener)
}

/// Answers a single request for `target`, a path with an optional query.
pub async fn respond(config: &ServeConfig, method: &Method, target: &str) -> Response<Body> {
    let head = *method == Method::HEAD;
    if *method != Method::GET && !head {
        return status(StatusCode::METHOD_NOT_ALLOWED);
    }

    let file = match resolve_request(&config.root, target, config.fallback()) {
        Resolved::File(file) | Resolved::Fallback(file) => file,
        Resolved::Forbidden => return status(StatusCode::FORBIDDEN),
        Resolved::NotFound => return status(StatusCode::NOT_FOUND),
    };

    let bytes = match tokio::fs::read(&file).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(path = %file.display(), error = %e, "failed to read file");
            return status(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let len = bytes.len();
    let mut response = Response::new(if head { Body::empty() } else { Body::from(bytes) });
    let headers = response.headers_mut();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_str(&content_type(&file))
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(CONTENT_LENGTH, HeaderValue::from(len));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    response
}

fn status(code: StatusCode) -> Response<Body> {
    let mut response = Response::new(Body::from(code.canonical_reason().unwrap_or("")));
    *response.status_mut() = code;
    response
}

/// Serves `config.root` on `listener` until `shutdown` completes.
pub async fn serve<F>(listener: TcpListener, config: ServeConfig, shutdown: F) -> Result<(), ServeError>
where
    F: Future<Output = ()>,
{
    if !config.root.is_dir() {
        return Err(ServeError::MissingRoot(config.root));
    }
    tracing::info!(root = %config.root.display(), "serving output directory");

    let config = Arc::new(config);
    let make_svc = make_service_fn(move |_conn| {
        let config = Arc::clone(&config);
        async move {
            Ok::<_, Infallible>(service_fn(move |req: Request<Body>| {
                let config = Arc::clone(&config);
                async move {
                    let target = req.uri().path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
                    let response = respond(&config, req.method(), target).await;
                    tracing::debug!(
                        method = %req.method(),
                        path = req.uri().path(),
                        status = response.status().as_u16(),
                        "request"
                    );
                    Ok::<_, Infallible>(response)
                }
            }))
        }
    });

    Server::from_tcp(listener)?
        .serve(make_svc)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tokio::sync::oneshot;

    fn site(history_fallback: bool) -> (tempfile::TempDir, ServeConfig) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "<html>app</html>").unwrap();
        fs::write(dir.path().join("runtime.bundle.1234abcd.js"), "runtime();").unwrap();
        let config = ServeConfig {
            root: dir.path().to_path_buf(),
            html_filename: "index.html".to_string(),
            history_fallback,
        };
        (dir, config)
    }

    async fn get(config: &ServeConfig, path: &str) -> Response<Body> {
        respond(config, &Method::GET, path).await
    }

    async fn text(response: Response<Body>) -> String {
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn serves_file_with_headers() {
        let (_dir, config) = site(true);
        let response = get(&config, "/runtime.bundle.1234abcd.js").await;
        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert!(headers[CONTENT_TYPE].to_str().unwrap().contains("javascript"));
        assert_eq!(headers[CONTENT_LENGTH], "10");
        assert_eq!(headers[CACHE_CONTROL], "no-cache");
        assert_eq!(text(response).await, "runtime();");
    }

    #[tokio::test]
    async fn head_has_no_body() {
        let (_dir, config) = site(true);
        let response = respond(&config, &Method::HEAD, "/index.html").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_LENGTH], "16");
        assert_eq!(text(response).await, "");
    }

    #[tokio::test]
    async fn history_fallback_serves_document() {
        let (_dir, config) = site(true);
        let response = get(&config, "/settings/profile").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(text(response).await, "<html>app</html>");
    }

    #[tokio::test]
    async fn fallback_disabled_gives_404() {
        let (_dir, config) = site(false);
        let response = get(&config, "/settings/profile").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn traversal_is_forbidden() {
        let (_dir, config) = site(true);
        let response = get(&config, "/%2e%2e/Cargo.toml").await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn post_is_rejected() {
        let (_dir, config) = site(true);
        let response = respond(&config, &Method::POST, "/index.html").await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServeConfig {
            root: dir.path().join("build"),
            html_filename: "index.html".to_string(),
            history_fallback: true,
        };
        let listener = bind("127.0.0.1", 0).unwrap();
        let err = serve(listener, config, async {}).await.unwrap_err();
        assert!(matches!(err, ServeError::MissingRoot(_)));
    }

    #[tokio::test]
    async fn serves_over_tcp() {
        let (_dir, config) = site(true);
        let listener = bind("127.0.0.1", 0).unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(serve(listener, config, async {
            let _ = shutdown_rx.await;
        }));

        let client = hyper::Client::new();
        let uri = format!("http://{addr}/").parse().unwrap();
        let response = client.get(uri).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(text(response).await, "<html>app</html>");

        let _ = shutdown_tx.send(());
        handle.await.unwrap().unwrap();
    }

    #[test]
    fn bind_reports_address() {
        let taken = bind("127.0.0.1", 0).unwrap();
        let port = taken.local_addr().unwrap().port();
        match bind("127.0.0.1", port) {
            Err(ServeError::Bind { addr, .. }) => assert_eq!(addr, format!("127.0.0.1:{port}")),
            other => panic!("expected bind error, got {other:?}"),
        }
    }
}
