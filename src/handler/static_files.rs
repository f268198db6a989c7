//! Static file serving module
//!
//! Maps request paths to files under the document root: percent-decoding,
//! traversal protection, index file resolution, directory listings, and
//! MIME type detection.

use crate::http::{self, mime};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::path::{Path, PathBuf};
use tokio::fs;

const INDEX_FILES: [&str; 2] = ["index.html", "index.htm"];

/// Outcome of resolving a request path against the document root
enum Resolved {
    /// Serve this file's bytes
    File(PathBuf),
    /// Directory requested with trailing slash and no index file
    Listing(PathBuf),
    /// Directory requested without trailing slash
    Redirect(String),
    NotFound,
}

/// Serve a GET/HEAD request for `request_path` relative to `root`
pub async fn serve(root: &Path, request_path: &str, is_head: bool) -> Response<Full<Bytes>> {
    let Some(decoded) = percent_decode(request_path) else {
        return http::build_404_response();
    };

    match resolve(root, request_path, &decoded).await {
        Resolved::File(path) => serve_file(&path, is_head).await,
        Resolved::Listing(dir) => serve_listing(&dir, &decoded, is_head).await,
        Resolved::Redirect(location) => http::build_redirect_response(&location),
        Resolved::NotFound => http::build_404_response(),
    }
}

/// Resolve a decoded request path to a file or directory under the root
///
/// Canonicalizes the candidate path and requires it to stay inside the
/// canonicalized root, so `..` segments and symlinks cannot escape.
/// `raw` is the still-encoded request path; redirects are built from it so
/// encoded characters never leak decoded into a Location header.
async fn resolve(root: &Path, raw: &str, decoded: &str) -> Resolved {
    let root_canonical = match root.canonicalize() {
        Ok(p) => p,
        Err(e) => {
            logger::log_warning(&format!(
                "Document root not accessible '{}': {e}",
                root.display()
            ));
            return Resolved::NotFound;
        }
    };

    let relative = decoded.trim_start_matches('/');
    let candidate = root_canonical.join(relative);

    // Missing files are the common 404 case, not worth a log line
    let Ok(canonical) = candidate.canonicalize() else {
        return Resolved::NotFound;
    };

    if !canonical.starts_with(&root_canonical) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {} -> {}",
            decoded,
            canonical.display()
        ));
        return Resolved::NotFound;
    }

    if canonical.is_dir() {
        if !decoded.ends_with('/') {
            return Resolved::Redirect(format!("{raw}/"));
        }
        for index in INDEX_FILES {
            let index_path = canonical.join(index);
            if index_path.is_file() {
                return Resolved::File(index_path);
            }
        }
        return Resolved::Listing(canonical);
    }

    Resolved::File(canonical)
}

/// Read a file and build the response with inferred content type
async fn serve_file(path: &Path, is_head: bool) -> Response<Full<Bytes>> {
    match fs::read(path).await {
        Ok(content) => {
            let content_type =
                mime::get_content_type(path.extension().and_then(|e| e.to_str()));
            http::build_file_response(Bytes::from(content), content_type, is_head)
        }
        Err(e) => {
            logger::log_error(&format!("Failed to read file '{}': {e}", path.display()));
            http::build_404_response()
        }
    }
}

/// Generate an HTML listing for a directory with no index file
async fn serve_listing(dir: &Path, request_path: &str, is_head: bool) -> Response<Full<Bytes>> {
    let mut read_dir = match fs::read_dir(dir).await {
        Ok(rd) => rd,
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read directory '{}': {e}",
                dir.display()
            ));
            return http::build_404_response();
        }
    };

    let mut entries = Vec::new();
    while let Ok(Some(entry)) = read_dir.next_entry().await {
        let mut name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type().await.is_ok_and(|t| t.is_dir()) {
            name.push('/');
        }
        entries.push(name);
    }
    entries.sort();

    http::build_html_response(render_listing(request_path, &entries), is_head)
}

/// Render the directory listing page
fn render_listing(request_path: &str, entries: &[String]) -> String {
    let title = format!("Directory listing for {}", escape_html(request_path));
    let mut html = String::with_capacity(256 + entries.len() * 64);
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
    html.push_str(&format!("<title>{title}</title>\n"));
    html.push_str("<meta charset=\"utf-8\">\n</head>\n<body>\n");
    html.push_str(&format!("<h1>{title}</h1>\n<hr>\n<ul>\n"));
    for name in entries {
        let href = percent_encode(name);
        let text = escape_html(name);
        html.push_str(&format!("<li><a href=\"{href}\">{text}</a></li>\n"));
    }
    html.push_str("</ul>\n<hr>\n</body>\n</html>\n");
    html
}

/// Decode %XX escapes in a request path
///
/// Returns None for truncated/invalid escapes or non-UTF-8 results.
fn percent_decode(path: &str) -> Option<String> {
    let bytes = path.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hi = hex_value(*bytes.get(i + 1)?)?;
            let lo = hex_value(*bytes.get(i + 2)?)?;
            out.push((hi << 4) | lo);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

/// Percent-encode a listing entry name for use in an href
///
/// Everything outside the unreserved set (plus `/` for directory entries)
/// is encoded, so names containing `%`, `?`, `#` or spaces round-trip
/// through `percent_decode` when the link is followed.
fn percent_encode(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for &b in name.as_bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                out.push(b as char);
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

const fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as std_fs;

    /// Fresh scratch directory under the system temp dir
    fn scratch_root(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("servedir-static-{name}-{}", std::process::id()));
        let _ = std_fs::remove_dir_all(&dir);
        std_fs::create_dir_all(&dir).unwrap();
        dir
    }

    async fn body_bytes(response: Response<Full<Bytes>>) -> Bytes {
        use http_body_util::BodyExt;
        response.into_body().collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn serves_exact_file_bytes() {
        let root = scratch_root("exact");
        std_fs::write(root.join("data.txt"), b"exact bytes\n").unwrap();

        let resp = serve(&root, "/data.txt", false).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["Content-Type"], "text/plain; charset=utf-8");
        assert_eq!(body_bytes(resp).await.as_ref(), b"exact bytes\n");
    }

    #[tokio::test]
    async fn missing_file_is_404() {
        let root = scratch_root("missing");
        let resp = serve(&root, "/no-such-file.txt", false).await;
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn head_has_empty_body_with_length() {
        let root = scratch_root("head");
        std_fs::write(root.join("page.html"), b"<p>hi</p>").unwrap();

        let resp = serve(&root, "/page.html", true).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["Content-Length"], "9");
        assert!(body_bytes(resp).await.is_empty());
    }

    #[tokio::test]
    async fn traversal_outside_root_is_blocked() {
        let parent = scratch_root("traversal");
        let root = parent.join("webroot");
        std_fs::create_dir_all(&root).unwrap();
        std_fs::write(parent.join("secret.txt"), b"top secret").unwrap();

        let resp = serve(&root, "/../secret.txt", false).await;
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn directory_with_index_serves_index() {
        let root = scratch_root("index");
        std_fs::write(root.join("index.html"), b"<h1>home</h1>").unwrap();

        let resp = serve(&root, "/", false).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["Content-Type"], "text/html; charset=utf-8");
        assert_eq!(body_bytes(resp).await.as_ref(), b"<h1>home</h1>");
    }

    #[tokio::test]
    async fn directory_without_slash_redirects() {
        let root = scratch_root("redirect");
        std_fs::create_dir_all(root.join("assets")).unwrap();

        let resp = serve(&root, "/assets", false).await;
        assert_eq!(resp.status(), 301);
        assert_eq!(resp.headers()["Location"], "/assets/");
    }

    #[tokio::test]
    async fn directory_without_index_lists_entries() {
        let root = scratch_root("listing");
        std_fs::write(root.join("a.txt"), b"a").unwrap();
        std_fs::create_dir_all(root.join("sub")).unwrap();

        let resp = serve(&root, "/", false).await;
        assert_eq!(resp.status(), 200);
        let body = String::from_utf8(body_bytes(resp).await.to_vec()).unwrap();
        assert!(body.contains("a.txt"));
        assert!(body.contains("sub/"));
    }

    #[tokio::test]
    async fn percent_encoded_path_is_decoded() {
        let root = scratch_root("decode");
        std_fs::write(root.join("with space.txt"), b"spaced").unwrap();

        let resp = serve(&root, "/with%20space.txt", false).await;
        assert_eq!(resp.status(), 200);
        assert_eq!(body_bytes(resp).await.as_ref(), b"spaced");
    }

    #[tokio::test]
    async fn listing_hrefs_are_percent_encoded_and_followable() {
        let root = scratch_root("href-encode");
        std_fs::write(root.join("50%.txt"), b"half off").unwrap();

        let resp = serve(&root, "/", false).await;
        assert_eq!(resp.status(), 200);
        let body = String::from_utf8(body_bytes(resp).await.to_vec()).unwrap();
        assert!(body.contains("href=\"50%25.txt\""));
        assert!(body.contains(">50%.txt</a>"));

        // Following the emitted link resolves back to the file
        let follow = serve(&root, "/50%25.txt", false).await;
        assert_eq!(follow.status(), 200);
        assert_eq!(body_bytes(follow).await.as_ref(), b"half off");
    }

    #[tokio::test]
    async fn redirect_location_keeps_encoded_path() {
        let root = scratch_root("encoded-redirect");
        std_fs::create_dir_all(root.join("my docs")).unwrap();

        let resp = serve(&root, "/my%20docs", false).await;
        assert_eq!(resp.status(), 301);
        assert_eq!(resp.headers()["Location"], "/my%20docs/");
    }

    #[test]
    fn test_percent_encode() {
        assert_eq!(percent_encode("plain.txt"), "plain.txt");
        assert_eq!(percent_encode("50%.txt"), "50%25.txt");
        assert_eq!(percent_encode("a b?c#d"), "a%20b%3Fc%23d");
        assert_eq!(percent_encode("sub/"), "sub/");
    }

    #[test]
    fn test_percent_decode() {
        assert_eq!(percent_decode("/plain").as_deref(), Some("/plain"));
        assert_eq!(percent_decode("/a%20b").as_deref(), Some("/a b"));
        assert_eq!(percent_decode("/%2F").as_deref(), Some("//"));
        assert_eq!(percent_decode("/bad%2"), None);
        assert_eq!(percent_decode("/bad%zz"), None);
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a<b>&\"c\""), "a&lt;b&gt;&amp;&quot;c&quot;");
    }
}
