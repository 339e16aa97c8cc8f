//! Sticker pack identifier extraction
//!
//! Users either paste a pack link (`https://t.me/addstickers/<name>`) or type the
//! bare pack name. Sticker messages carry the name directly in `set_name`.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static PACK_LINK: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"(?i)(?:https?://)?(?:www\.)?(?:t|telegram)\.me/addstickers/([^/?#\s]*)")
        .expect("pack link pattern is valid")
});

/// Name of a sticker pack on Telegram
///
/// Only alphanumerics plus `_`, `-` and `.` are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackId(String);

impl PackId {
    /// Validate a raw pack name
    ///
    /// Returns `None` for empty names or names containing any other character.
    pub fn new(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if !raw.is_empty() && raw.chars().all(is_pack_char) {
            Some(Self(raw.to_string()))
        } else {
            None
        }
    }

    /// The pack name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical link handed to sticker-convert's downloader
    pub fn source_url(&self) -> String {
        format!("https://t.me/addstickers/{}", self.0)
    }
}

impl fmt::Display for PackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PackId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn is_pack_char(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '_' | '-' | '.')
}

/// Extract a pack identifier from free-form user text
///
/// A recognized `addstickers` link wins; its trailing path segment is returned.
/// Otherwise the whole trimmed text must itself be a valid pack name.
///
/// # Examples
///
/// ```
/// use sticker_exporter::identifier::extract_pack_id;
///
/// let id = extract_pack_id("https://t.me/addstickers/Foo").unwrap();
/// assert_eq!(id.as_str(), "Foo");
/// assert_eq!(extract_pack_id("Foo_Bar-1.2").unwrap().as_str(), "Foo_Bar-1.2");
/// assert!(extract_pack_id("has space!").is_none());
/// ```
pub fn extract_pack_id(text: &str) -> Option<PackId> {
    let text = text.trim();
    if let Some(caps) = PACK_LINK.captures(text) {
        return caps.get(1).and_then(|m| PackId::new(m.as_str()));
    }
    PackId::new(text)
}
