//! Static file serving module
//!
//! Resolves a request path under the configured root, falls back to
//! `index.html` for directories, rejects dotfile segments and streams the
//! resolved file.

use crate::http::mime::MimeTypes;
use crate::http::response::{
    build_403_response, build_500_response, build_file_not_found, ResponseBody,
};
use crate::logger;
use futures_util::TryStreamExt;
use http_body_util::{BodyExt, StreamBody};
use hyper::body::Frame;
use hyper::{Response, StatusCode};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio_util::io::ReaderStream;

/// File served when the request path names a directory
pub const INDEX_FILE: &str = "index.html";

/// Static serving settings, disabled until a root folder is configured
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticConfig {
    pub enabled: bool,
    pub root_folder: PathBuf,
}

impl StaticConfig {
    pub fn new(root_folder: impl Into<PathBuf>) -> Self {
        Self {
            enabled: true,
            root_folder: root_folder.into(),
        }
    }
}

/// True when any segment of the request path starts with `.`
///
/// This also covers `..`, so traversal segments are refused here.
pub fn has_dot_segment(request_path: &str) -> bool {
    request_path
        .split('/')
        .any(|segment| segment.starts_with('.'))
}

/// Resolve `request_path` under `root` and stream the file
pub async fn serve(request_path: &str, root: &Path, mime: &MimeTypes) -> Response<ResponseBody> {
    if has_dot_segment(request_path) {
        logger::log_warning(&format!("Dotfile request refused: {request_path}"));
        return build_403_response();
    }

    let candidate = root.join(request_path.trim_start_matches('/'));

    let file_path = match fs::metadata(&candidate).await {
        Ok(meta) if meta.is_dir() => {
            let index = candidate.join(INDEX_FILE);
            match fs::metadata(&index).await {
                Ok(meta) if meta.is_file() => index,
                _ => return build_file_not_found(),
            }
        }
        // Not a directory, or the stat itself failed: try the path directly
        _ => candidate,
    };

    serve_file(&file_path, root, mime).await
}

/// Stream one resolved file, refusing anything outside `root`
async fn serve_file(file_path: &Path, root: &Path, mime: &MimeTypes) -> Response<ResponseBody> {
    let root_canonical = match fs::canonicalize(root).await {
        Ok(p) => p,
        Err(e) => {
            logger::log_warning(&format!(
                "Static directory not found or inaccessible '{}': {e}",
                root.display()
            ));
            return build_file_not_found();
        }
    };

    // File not found is common (404), no need to log at warning level
    let Ok(file_canonical) = fs::canonicalize(file_path).await else {
        return build_file_not_found();
    };
    if !file_canonical.starts_with(&root_canonical) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {} -> {}",
            file_path.display(),
            file_canonical.display()
        ));
        return build_403_response();
    }

    let file = match fs::File::open(&file_canonical).await {
        Ok(f) => f,
        Err(e) => {
            logger::log_debug(&format!("Cannot open '{}': {e}", file_path.display()));
            return build_file_not_found();
        }
    };

    let length = match file.metadata().await {
        Ok(meta) if meta.is_file() => meta.len(),
        Ok(_) => return build_file_not_found(),
        Err(e) => {
            logger::log_error(&format!(
                "Failed to stat '{}': {e}",
                file_path.display()
            ));
            return build_500_response(&e.to_string());
        }
    };

    let content_type = mime.type_for_file(file_path);
    let display_path = file_path.display().to_string();
    let stream = ReaderStream::new(file)
        .inspect_err(move |e| {
            logger::log_error(&format!("Stream failed for '{display_path}': {e}"));
        })
        .map_ok(Frame::data);

    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", content_type)
        .header("Content-Length", length)
        .body(StreamBody::new(stream).boxed())
        .unwrap_or_else(|e| {
            logger::log_error(&format!("Failed to build static file response: {e}"));
            build_500_response(&e.to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::body::Bytes;
    use std::fs as stdfs;

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        stdfs::write(dir.path().join("index.html"), "<h1>home</h1>").unwrap();
        stdfs::write(dir.path().join("app.js"), "console.log(1)").unwrap();
        stdfs::write(dir.path().join(".htaccess"), "secret").unwrap();
        stdfs::create_dir(dir.path().join("docs")).unwrap();
        stdfs::write(dir.path().join("docs").join("index.html"), "docs").unwrap();
        stdfs::create_dir(dir.path().join("empty")).unwrap();
        dir
    }

    async fn body(resp: Response<ResponseBody>) -> Bytes {
        resp.into_body().collect().await.unwrap().to_bytes()
    }

    #[test]
    fn test_has_dot_segment() {
        assert!(has_dot_segment("/.htaccess"));
        assert!(has_dot_segment("/a/.git/config"));
        assert!(has_dot_segment("/../../etc/passwd"));
        assert!(!has_dot_segment("/a/b.txt"));
        assert!(!has_dot_segment("/"));
    }

    #[tokio::test]
    async fn test_root_serves_index() {
        let dir = fixture();
        let resp = serve("/", dir.path(), &MimeTypes::new()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["content-type"], "text/html");
        assert_eq!(resp.headers()["content-length"], "13");
        assert_eq!(body(resp).await, "<h1>home</h1>");
    }

    #[tokio::test]
    async fn test_subdirectory_index() {
        let dir = fixture();
        let resp = serve("/docs", dir.path(), &MimeTypes::new()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body(resp).await, "docs");
    }

    #[tokio::test]
    async fn test_directory_without_index_is_404() {
        let dir = fixture();
        let resp = serve("/empty/", dir.path(), &MimeTypes::new()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(body(resp).await, "File Not Found");
    }

    #[tokio::test]
    async fn test_plain_file_with_mime() {
        let dir = fixture();
        let resp = serve("/app.js", dir.path(), &MimeTypes::new()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["content-type"], "application/javascript");
        assert_eq!(body(resp).await, "console.log(1)");
    }

    #[tokio::test]
    async fn test_missing_file_is_404() {
        let dir = fixture();
        let resp = serve("/missing.txt", dir.path(), &MimeTypes::new()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_dotfiles_are_forbidden_whether_or_not_they_exist() {
        let dir = fixture();
        for path in ["/.htaccess", "/.env", "/docs/.hidden/index.html"] {
            let resp = serve(path, dir.path(), &MimeTypes::new()).await;
            assert_eq!(resp.status(), StatusCode::FORBIDDEN, "path {path}");
        }
    }

    #[tokio::test]
    async fn test_traversal_is_forbidden() {
        let dir = fixture();
        let resp = serve("/../../etc/passwd", dir.path(), &MimeTypes::new()).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_escaping_root_is_forbidden() {
        let outside = tempfile::tempdir().unwrap();
        stdfs::write(outside.path().join("secret.txt"), "nope").unwrap();
        let dir = fixture();
        std::os::unix::fs::symlink(
            outside.path().join("secret.txt"),
            dir.path().join("link.txt"),
        )
        .unwrap();

        let resp = serve("/link.txt", dir.path(), &MimeTypes::new()).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_instance_mime_overrides_apply() {
        let dir = fixture();
        stdfs::write(dir.path().join("notes.mdx"), "# hi").unwrap();
        let mut mime = MimeTypes::new();
        mime.add_type("mdx", "text/mdx").unwrap();

        let resp = serve("/notes.mdx", dir.path(), &mime).await;
        assert_eq!(resp.headers()["content-type"], "text/mdx");

        let resp = serve("/notes.mdx", dir.path(), &MimeTypes::new()).await;
        assert_eq!(resp.headers()["content-type"], "application/octet-stream");
    }

    #[tokio::test]
    async fn test_missing_root_is_404() {
        let dir = fixture();
        let root = dir.path().join("nope");
        let resp = serve("/index.html", &root, &MimeTypes::new()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
