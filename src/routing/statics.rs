//! Static file adapters.
//!
//! # Responsibilities
//! - Mount a directory under a `{name...}` capture pattern
//! - Mount individual files at fixed paths
//! - Reject misconfiguration at setup time with a `RouterError`
//!
//! # Design Decisions
//! - File I/O, ranges, HEAD, conditional requests and traversal protection
//!   are delegated to tower-http's `ServeDir` / `ServeFile`
//! - Adapters are ordinary GET bindings, so they run inside the group's
//!   middleware chain and show up in the route table
//! - Never panics: every precondition failure is returned

use axum::body::Body;
use axum::extract::Request;
use axum::http::{Method, StatusCode, Uri};
use axum::response::IntoResponse;
use std::path::{Path, PathBuf};
use tower::ServiceExt;
use tower_http::services::{ServeDir, ServeFile};

use crate::error::RouterError;
use crate::http::handler::Handler;
use crate::routing::params::PathParamsExt;
use crate::routing::pattern::{self, Pattern};
use crate::routing::{Group, Mux};

fn existing_dir(root: PathBuf) -> Result<PathBuf, RouterError> {
    if root.is_dir() {
        Ok(root)
    } else {
        Err(RouterError::MissingFilesystem(root))
    }
}

fn capture_name(pattern: &str) -> Result<String, RouterError> {
    let parsed = Pattern::parse(pattern)?;
    pattern::wildcard_name(&parsed.path)
        .map(str::to_string)
        .ok_or_else(|| RouterError::MissingWildcard(pattern.to_string()))
}

impl Group {
    /// Serve files below `root` at `pattern`, which must end with a
    /// `{name...}` capture: `GET /static/{path...}` serves `root/<path>`.
    pub fn serve_directory(
        &self,
        pattern: &str,
        root: impl Into<PathBuf>,
    ) -> Result<(), RouterError> {
        self.serve_directory_with_prefix(pattern, root, "/")
    }

    /// Like [`serve_directory`](Self::serve_directory), resolving captured
    /// paths below `fs_prefix` inside `root`.
    ///
    /// `fs_prefix` must begin with `/`; `"/assets"` maps
    /// `/static/app.css` to `root/assets/app.css`.
    pub fn serve_directory_with_prefix(
        &self,
        pattern: &str,
        root: impl Into<PathBuf>,
        fs_prefix: &str,
    ) -> Result<(), RouterError> {
        let root = existing_dir(root.into())?;
        if !fs_prefix.starts_with('/') {
            return Err(RouterError::RelativePrefix(fs_prefix.to_string()));
        }
        let capture = capture_name(pattern)?;

        tracing::info!(
            pattern = %pattern,
            root = %root.display(),
            fs_prefix = %fs_prefix,
            "Serving static directory"
        );

        let service = ServeDir::new(root);
        let fs_prefix = fs_prefix.trim_end_matches('/').to_string();
        let handler = Handler::new(move |mut req: Request| {
            let service = service.clone();
            let target = format!(
                "{fs_prefix}/{}",
                req.path_param(&capture).unwrap_or_default()
            );
            async move {
                match target.parse::<Uri>() {
                    Ok(uri) => *req.uri_mut() = uri,
                    Err(_) => return StatusCode::BAD_REQUEST.into_response(),
                }
                match service.oneshot(req).await {
                    Ok(res) => res.map(Body::new),
                    Err(never) => match never {},
                }
            }
        });

        self.try_handle(Some(Method::GET), pattern, handler)
    }

    /// Serve each of `paths` from the same-named file below `root`:
    /// `serve_files(root, &["/favicon.ico", "/robots.txt"])`.
    pub fn serve_files(&self, root: impl Into<PathBuf>, paths: &[&str]) -> Result<(), RouterError> {
        let root = existing_dir(root.into())?;
        for path in paths {
            let parsed = Pattern::parse(path)?;
            self.bind_file(path, &root, &parsed.path)?;
        }
        Ok(())
    }

    /// Serve the single file `root/file` at `pattern`.
    pub fn serve_file_from(
        &self,
        pattern: &str,
        root: impl Into<PathBuf>,
        file: &str,
    ) -> Result<(), RouterError> {
        let root = existing_dir(root.into())?;
        self.bind_file(pattern, &root, file)
    }

    fn bind_file(&self, pattern: &str, root: &Path, file: &str) -> Result<(), RouterError> {
        let path = root.join(file.trim_start_matches('/'));
        tracing::debug!(pattern = %pattern, file = %path.display(), "Serving static file");
        let handler = Handler::from_service(ServeFile::new(path));
        self.try_handle(Some(Method::GET), pattern, handler)
    }
}

impl Mux {
    /// See [`Group::serve_directory`].
    pub fn serve_directory(
        &self,
        pattern: &str,
        root: impl Into<PathBuf>,
    ) -> Result<(), RouterError> {
        self.root().serve_directory(pattern, root)
    }

    /// See [`Group::serve_directory_with_prefix`].
    pub fn serve_directory_with_prefix(
        &self,
        pattern: &str,
        root: impl Into<PathBuf>,
        fs_prefix: &str,
    ) -> Result<(), RouterError> {
        self.root()
            .serve_directory_with_prefix(pattern, root, fs_prefix)
    }

    /// See [`Group::serve_files`].
    pub fn serve_files(&self, root: impl Into<PathBuf>, paths: &[&str]) -> Result<(), RouterError> {
        self.root().serve_files(root, paths)
    }

    /// See [`Group::serve_file_from`].
    pub fn serve_file_from(
        &self,
        pattern: &str,
        root: impl Into<PathBuf>,
        file: &str,
    ) -> Result<(), RouterError> {
        self.root().serve_file_from(pattern, root, file)
    }
}
