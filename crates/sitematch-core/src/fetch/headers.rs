//! Parse HTTP response header lines as libcurl delivers them.

/// Status and encoding of the final response (after redirects).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: Option<u32>,
    pub content_encoding: Option<String>,
}

/// Accumulates header lines. With redirects libcurl reports every hop's
/// headers; a new status line starts a fresh response.
#[derive(Debug, Default)]
pub struct ResponseHeaders {
    head: ResponseHead,
}

impl ResponseHeaders {
    pub fn push_line(&mut self, raw: &[u8]) {
        let line = String::from_utf8_lossy(raw);
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        if line.starts_with("HTTP/") {
            self.head = ResponseHead {
                status: parse_status_line(line),
                content_encoding: None,
            };
            return;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-encoding") {
                self.head.content_encoding = Some(value.trim().to_string());
            }
        }
    }

    pub fn head(&self) -> ResponseHead {
        self.head.clone()
    }
}

/// `HTTP/1.1 301 Moved Permanently` -> 301.
fn parse_status_line(line: &str) -> Option<u32> {
    line.split_whitespace().nth(1)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(lines: &[&str]) -> ResponseHead {
        let mut h = ResponseHeaders::default();
        for l in lines {
            h.push_line(format!("{}\r\n", l).as_bytes());
        }
        h.head()
    }

    #[test]
    fn status_and_encoding() {
        let head = feed(&["HTTP/1.1 200 OK", "Content-Encoding: gzip", "Content-Length: 12", ""]);
        assert_eq!(head.status, Some(200));
        assert_eq!(head.content_encoding.as_deref(), Some("gzip"));
    }

    #[test]
    fn header_names_are_case_insensitive() {
        let head = feed(&["HTTP/2 200", "content-encoding:  deflate "]);
        assert_eq!(head.status, Some(200));
        assert_eq!(head.content_encoding.as_deref(), Some("deflate"));
    }

    #[test]
    fn redirect_hop_headers_are_discarded() {
        let head = feed(&[
            "HTTP/1.1 301 Moved Permanently",
            "Content-Encoding: gzip",
            "Location: https://www.example.com/",
            "",
            "HTTP/1.1 200 OK",
            "Content-Type: text/html",
            "",
        ]);
        assert_eq!(head.status, Some(200));
        assert!(head.content_encoding.is_none());
    }

    #[test]
    fn no_headers() {
        assert_eq!(feed(&[]), ResponseHead::default());
    }
}
