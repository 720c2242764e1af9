//! Storage key naming and public URL mapping
//!
//! Public URLs embed the storage key percent-encoded after a fixed `/o/`
//! marker, followed by `?alt=media`:
//!
//! ```text
//! <base>/o/photos%2F1718000000000-cat.png?alt=media
//! ```

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

use super::{StorageError, StorageResult};

/// Path segment that precedes the encoded key in a public URL
pub const OBJECT_PATH_MARKER: &str = "/o/";

/// Characters left unescaped by `encodeURIComponent`
const KEY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Replaces every character outside `[A-Za-z0-9.-]` with `_`
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Builds `[<folder>/]<epoch_millis>-<sanitized name>`
///
/// The folder has leading and trailing slashes stripped and is dropped when
/// nothing remains.
#[must_use]
pub fn storage_key(folder: Option<&str>, file_name: &str, epoch_millis: i64) -> String {
    let file_key = format!("{epoch_millis}-{}", sanitize_file_name(file_name));

    match folder.map(|folder| folder.trim_matches('/')) {
        Some(folder) if !folder.is_empty() => format!("{folder}/{file_key}"),
        _ => file_key,
    }
}

/// Public URL for `key` under `base`
#[must_use]
pub fn public_url(base: &str, key: &str) -> String {
    format!(
        "{}{OBJECT_PATH_MARKER}{}?alt=media",
        base.trim_end_matches('/'),
        utf8_percent_encode(key, KEY_ENCODE_SET)
    )
}

/// Recovers the storage key from a public URL
///
/// # Errors
///
/// Returns `StorageError::InvalidUrl` if the URL does not parse, lacks the
/// `/o/` marker, carries an empty key, or the key is not valid UTF-8
pub fn recover_key(public_url: &str) -> StorageResult<String> {
    let url = Url::parse(public_url)
        .map_err(|e| StorageError::InvalidUrl(format!("{public_url}: {e}")))?;

    let (_, encoded_key) = url
        .path()
        .split_once(OBJECT_PATH_MARKER)
        .ok_or_else(|| StorageError::InvalidUrl(public_url.to_string()))?;

    if encoded_key.is_empty() {
        return Err(StorageError::InvalidUrl(public_url.to_string()));
    }

    percent_decode_str(encoded_key)
        .decode_utf8()
        .map(|key| key.into_owned())
        .map_err(|e| StorageError::InvalidUrl(format!("{public_url}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://firebasestorage.googleapis.com/v0/b/demo-bucket";

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("cat.png"), "cat.png");
        assert_eq!(sanitize_file_name("my cat (1).png"), "my_cat__1_.png");
        assert_eq!(sanitize_file_name("../etc/passwd"), ".._etc_passwd");
        assert_eq!(sanitize_file_name("café.jpg"), "caf_.jpg");
        assert_eq!(sanitize_file_name("a_b"), "a_b");
    }

    #[test]
    fn test_storage_key_folder_handling() {
        assert_eq!(storage_key(None, "cat.png", 42), "42-cat.png");
        assert_eq!(storage_key(Some(""), "cat.png", 42), "42-cat.png");
        assert_eq!(storage_key(Some("///"), "cat.png", 42), "42-cat.png");
        assert_eq!(
            storage_key(Some("/avatars/2024/"), "cat.png", 42),
            "avatars/2024/42-cat.png"
        );
        assert_eq!(
            storage_key(Some("users"), "my photo.png", 1_700_000_000_000),
            "users/1700000000000-my_photo.png"
        );
    }

    #[test]
    fn test_public_url_encodes_key_like_uri_components() {
        assert_eq!(
            public_url(BASE, "avatars/42-cat.png"),
            format!("{BASE}/o/avatars%2F42-cat.png?alt=media")
        );
        assert_eq!(
            public_url(&format!("{BASE}/"), "a b"),
            format!("{BASE}/o/a%20b?alt=media")
        );
    }

    #[test]
    fn test_recover_key_from_public_url() {
        for key in [
            "42-cat.png",
            "avatars/2024/42-cat.png",
            "a_b.-c",
            "folder with spaces/1-x.png",
            "ünïcode/1-x.png",
        ] {
            assert_eq!(recover_key(&public_url(BASE, key)).unwrap(), key);
        }
    }

    #[test]
    fn test_recover_key_ignores_query_string() {
        let url = format!("{BASE}/o/photos%2F1-a.png?alt=media&token=abc");
        assert_eq!(recover_key(&url).unwrap(), "photos/1-a.png");
    }

    #[test]
    fn test_recover_key_rejects_malformed_urls() {
        assert!(matches!(
            recover_key("https://example.com/images/cat.png"),
            Err(StorageError::InvalidUrl(_))
        ));
        assert!(matches!(
            recover_key("not a url"),
            Err(StorageError::InvalidUrl(_))
        ));
        assert!(matches!(
            recover_key(&format!("{BASE}/o/?alt=media")),
            Err(StorageError::InvalidUrl(_))
        ));
    }
}
