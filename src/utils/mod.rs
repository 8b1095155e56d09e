//! Utility functions and helpers.

pub mod http;

use url::Url;

use crate::error::Result;

/// Join an API root and a path, tolerating a missing trailing slash on the root.
pub fn endpoint(base_url: &str, path: &str) -> Result<Url> {
    let mut base = Url::parse(base_url)?;
    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    // `./` keeps a segment such as `bot1:abc` from being read as a scheme.
    Ok(base.join(&format!("./{}", path.trim_start_matches('/')))?)
}

/// Render an integer with `,` as the thousands separator.
pub fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Escape text for Telegram's HTML parse mode.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint() {
        assert_eq!(
            endpoint("https://api.hh.ru", "vacancies").unwrap().as_str(),
            "https://api.hh.ru/vacancies"
        );
        assert_eq!(
            endpoint("http://127.0.0.1:8080/mock", "/vacancies")
                .unwrap()
                .as_str(),
            "http://127.0.0.1:8080/mock/vacancies"
        );
        assert_eq!(
            endpoint("https://api.telegram.org", "bot1:abc/sendMessage")
                .unwrap()
                .as_str(),
            "https://api.telegram.org/bot1:abc/sendMessage"
        );
        assert!(endpoint("not a url", "x").is_err());
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1_000), "1,000");
        assert_eq!(group_thousands(150_000), "150,000");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
        assert_eq!(group_thousands(-45_000), "-45,000");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("C++ & <Rust> 'dev'"),
            "C++ &amp; &lt;Rust&gt; &#39;dev&#39;"
        );
    }
}
