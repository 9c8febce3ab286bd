//! Rotating CORS-relay fallback ring.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Public CORS relays tried when direct fetches are blocked or failing.
/// Prefix-style: the percent-encoded target URL is appended.
pub const DEFAULT_PROXIES: &[&str] = &[
  "https://api.allorigins.win/raw?url=",
  "https://corsproxy.io/?",
  "https://proxy.cors.sh/",
  "https://cors-anywhere.herokuapp.com/",
];

/// Ordered proxy templates with a rotating cursor.
///
/// The cursor remembers the last proxy that delivered, so the next walk
/// starts there instead of re-trying a dead relay first. Templates either
/// contain a literal `{url}` placeholder or act as a prefix for the
/// percent-encoded target.
pub struct ProxyRing {
  templates: Vec<String>,
  cursor: AtomicUsize,
}

impl ProxyRing {
  pub fn new(templates: Vec<String>) -> Self {
    Self {
      templates,
      cursor: AtomicUsize::new(0),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.templates.is_empty()
  }

  /// Indices to try, starting from the last proxy that worked.
  pub fn order(&self) -> Vec<usize> {
    let len = self.templates.len();
    if len == 0 {
      return Vec::new();
    }
    let start = self.cursor.load(Ordering::Relaxed) % len;
    (0..len).map(|i| (start + i) % len).collect()
  }

  /// Build the relay URL for the proxy at `index`.
  pub fn url_for(&self, index: usize, target: &str) -> Option<String> {
    let template = self.templates.get(index)?;
    let encoded: String = url::form_urlencoded::byte_serialize(target.as_bytes()).collect();
    Some(if template.contains("{url}") {
      template.replace("{url}", &encoded)
    } else {
      format!("{template}{encoded}")
    })
  }

  /// Remember the proxy that delivered, so the next walk starts there.
  pub fn mark_success(&self, index: usize) {
    self.cursor.store(index, Ordering::Relaxed);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn ring() -> ProxyRing {
    ProxyRing::new(DEFAULT_PROXIES.iter().map(|p| p.to_string()).collect())
  }

  #[test]
  fn test_order_starts_at_cursor() {
    let ring = ring();
    assert_eq!(ring.order(), vec![0, 1, 2, 3]);

    ring.mark_success(2);
    assert_eq!(ring.order(), vec![2, 3, 0, 1]);
  }

  #[test]
  fn test_empty_ring_has_no_order() {
    let ring = ProxyRing::new(Vec::new());
    assert!(ring.is_empty());
    assert!(ring.order().is_empty());
  }

  #[test]
  fn test_prefix_template_appends_encoded_target() {
    let ring = ring();
    let url = ring
      .url_for(0, "https://fantasy.premierleague.com/api/fixtures/?future=1")
      .unwrap();

    assert!(url.starts_with("https://api.allorigins.win/raw?url="));
    // The target must be percent-encoded, including its query string.
    assert!(url.contains("https%3A%2F%2Ffantasy.premierleague.com"));
    assert!(url.contains("%3Ffuture%3D1"));
  }

  #[test]
  fn test_placeholder_template_substitutes_target() {
    let ring = ProxyRing::new(vec!["https://relay.example/fetch?u={url}&raw=1".to_string()]);
    let url = ring.url_for(0, "https://fantasy.premierleague.com/api/").unwrap();

    assert_eq!(
      url,
      "https://relay.example/fetch?u=https%3A%2F%2Ffantasy.premierleague.com%2Fapi%2F&raw=1"
    );
  }

  #[test]
  fn test_url_for_out_of_range_is_none() {
    assert!(ring().url_for(9, "https://example.com").is_none());
  }
}
