// src/serve/files.rs

//! Static file handler for the generated site.
//!
//! Request resolution order:
//! 1. Exact file match
//! 2. Directory with `index.html`
//! 3. Extensionless path with a sibling `.html` file (`/about` → `about.html`)
//! 4. 404

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderValue, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use regex::Regex;
use tracing::{debug, warn};

use super::ServeState;
use super::reload::client_script;

pub(crate) async fn serve_path(State(state): State<Arc<ServeState>>, uri: Uri) -> Response {
    let Some(rel) = sanitize_rel_path(uri.path()) else {
        return (StatusCode::BAD_REQUEST, "invalid path").into_response();
    };

    let Some(file) = resolve_file(&state.site_dir, &rel).await else {
        debug!(path = %uri.path(), "not found");
        return (StatusCode::NOT_FOUND, "not found").into_response();
    };

    serve_file(&state, &file).await
}

/// Reject anything that could step outside the site directory.
pub(crate) fn sanitize_rel_path(path: &str) -> Option<PathBuf> {
    let decoded = urlencoding::decode(path).ok()?;
    let rel = PathBuf::from(decoded.trim_start_matches('/'));
    for comp in rel.components() {
        if matches!(
            comp,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        ) {
            return None;
        }
    }
    Some(rel)
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
}

async fn resolve_file(root: &Path, rel: &Path) -> Option<PathBuf> {
    let full = root.join(rel);

    if is_file(&full).await {
        return Some(full);
    }

    if is_dir(&full).await {
        let index = full.join("index.html");
        return is_file(&index).await.then_some(index);
    }

    if full.extension().is_none() && !rel.as_os_str().is_empty() {
        let html = full.with_extension("html");
        if is_file(&html).await {
            return Some(html);
        }
    }

    None
}

async fn serve_file(state: &ServeState, path: &Path) -> Response {
    let bytes = match tokio::fs::read(path).await {
        Ok(v) => v,
        Err(e) => {
            warn!(path = ?path, error = %e, "failed to read file");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("failed to read {}: {e}", path.display()),
            )
                .into_response();
        }
    };

    let content_type = content_type_for(path);
    let body = if state.inject_reload_script && content_type.starts_with("text/html") {
        match String::from_utf8(bytes) {
            Ok(html) => inject_reload_script(&state.body_close, html).into_bytes(),
            Err(err) => err.into_bytes(),
        }
    } else {
        bytes
    };

    let mut response = body.into_response();
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    response
}

/// Insert the live-reload client before the last `</body>`, or append it.
pub(crate) fn inject_reload_script(body_close: &Regex, html: String) -> String {
    let script = client_script();
    match body_close.find_iter(&html).last() {
        Some(m) => {
            let mut out = String::with_capacity(html.len() + script.len());
            out.push_str(&html[..m.start()]);
            out.push_str(&script);
            out.push_str(&html[m.start()..]);
            out
        }
        None => html + &script,
    }
}

pub(crate) fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase()
        .as_str()
    {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" => "application/javascript; charset=utf-8",
        "json" => "application/json; charset=utf-8",
        "xml" => "application/xml; charset=utf-8",
        "txt" | "md" => "text/plain; charset=utf-8",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serve::BODY_CLOSE_PATTERN;

    #[test]
    fn rejects_parent_segments() {
        assert!(sanitize_rel_path("/../etc/passwd").is_none());
        assert!(sanitize_rel_path("/a/%2e%2e/b").is_none());
        assert_eq!(
            sanitize_rel_path("/posts/hello%20world.html"),
            Some(PathBuf::from("posts/hello world.html"))
        );
    }

    #[test]
    fn rejects_non_utf8_escapes() {
        assert!(sanitize_rel_path("/posts/%ff%fe.html").is_none());
    }

    #[test]
    fn script_goes_before_last_body_close() {
        let re = Regex::new(BODY_CLOSE_PATTERN).unwrap();
        let out = inject_reload_script(&re, "<html><BODY>hi</Body ></html>".to_string());
        let idx_script = out.find("<script>").unwrap();
        let idx_close = out.find("</Body >").unwrap();
        assert!(idx_script < idx_close);
        assert!(out.starts_with("<html><BODY>hi"));
    }

    #[test]
    fn script_appended_without_body() {
        let re = Regex::new(BODY_CLOSE_PATTERN).unwrap();
        let out = inject_reload_script(&re, "<p>fragment</p>".to_string());
        assert!(out.starts_with("<p>fragment</p><script>"));
    }

    #[test]
    fn content_types() {
        assert_eq!(content_type_for(Path::new("a/main.min.js")), "application/javascript; charset=utf-8");
        assert_eq!(content_type_for(Path::new("INDEX.HTML")), "text/html; charset=utf-8");
        assert_eq!(content_type_for(Path::new("blob")), "application/octet-stream");
    }
}
