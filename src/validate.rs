use std::sync::OnceLock;

use regex::Regex;
use url::Url;

fn email_regex() -> Option<&'static Regex> {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok())
        .as_ref()
}

pub fn email(input: &str) -> bool {
    email_regex().is_some_and(|re| re.is_match(input.trim()))
}

/// Absolute http(s) URL with a host.
pub fn url(input: &str) -> bool {
    match Url::parse(input.trim()) {
        Ok(parsed) => {
            matches!(parsed.scheme(), "http" | "https")
                && parsed.host_str().is_some_and(|h| !h.is_empty())
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails() {
        assert!(email("ana@example.com"));
        assert!(email("  ana.souza+trip@mail.example.com.br "));
        assert!(!email("ana@example"));
        assert!(!email("ana example@mail.com"));
        assert!(!email("@example.com"));
        assert!(!email(""));
    }

    #[test]
    fn urls() {
        assert!(url("https://airbnb.com/rooms/123"));
        assert!(url("http://localhost:3333"));
        assert!(!url("airbnb.com/rooms/123"));
        assert!(!url("ftp://files.example.com"));
        assert!(!url("not a url"));
    }
}
