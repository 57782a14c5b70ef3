//! Text helpers shared across the engine.
//!
//! All offsets in this crate are character offsets into the flattened
//! plain-text projection of the document, never byte offsets.

use std::path::Path;

pub fn truncate(s: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }

    let char_count = s.chars().count();
    if char_count <= max {
        return s.to_string();
    }

    if max <= 3 {
        return s.chars().take(max).collect();
    }

    let truncated: String = s.chars().take(max - 3).collect();
    format!("{}...", truncated)
}

/// Number of characters in `s`.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Byte index of the `char_idx`-th character, or `None` past the end.
/// `char_idx == char_len(s)` maps to `s.len()`.
pub fn char_to_byte(s: &str, char_idx: usize) -> Option<usize> {
    if char_idx == 0 {
        return Some(0);
    }
    let mut count = 0;
    for (byte_idx, _) in s.char_indices() {
        if count == char_idx {
            return Some(byte_idx);
        }
        count += 1;
    }
    if count == char_idx {
        Some(s.len())
    } else {
        None
    }
}

/// Character index corresponding to a byte index on a char boundary.
pub fn byte_to_char(s: &str, byte_idx: usize) -> usize {
    s[..byte_idx.min(s.len())].chars().count()
}

/// Slice `s` by a half-open character range.
pub fn slice_chars(s: &str, start: usize, end: usize) -> Option<&str> {
    if start > end {
        return None;
    }
    let start_byte = char_to_byte(s, start)?;
    let end_byte = start_byte + char_to_byte(&s[start_byte..], end - start)?;
    Some(&s[start_byte..end_byte])
}

/// Replace the half-open character range `[start, end)` with `replacement`.
pub fn splice_chars(s: &str, start: usize, end: usize, replacement: &str) -> Option<String> {
    if start > end {
        return None;
    }
    let start_byte = char_to_byte(s, start)?;
    let end_byte = start_byte + char_to_byte(&s[start_byte..], end - start)?;
    let mut out = String::with_capacity(s.len() + replacement.len());
    out.push_str(&s[..start_byte]);
    out.push_str(replacement);
    out.push_str(&s[end_byte..]);
    Some(out)
}

/// Compute a stable hash of file contents (FNV-1a 64-bit).
pub fn hash_bytes(content: &[u8]) -> String {
    const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    let mut hash = FNV_OFFSET_BASIS;
    for byte in content {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }

    format!("{:016x}", hash)
}

pub fn hash_str(content: &str) -> String {
    hash_bytes(content.as_bytes())
}

/// Write a file via a temp file and rename, so readers never see a torn write.
pub(crate) fn write_atomic(path: &Path, content: &str) -> anyhow::Result<()> {
    let tmp_path = path.with_extension("tmp");
    std::fs::write(&tmp_path, content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        let _ = std::fs::set_permissions(&tmp_path, perms);
    }

    if let Err(err) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(err.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_unicode_safe() {
        let input = "ééééé";
        assert_eq!(truncate(input, 4), "é...");
    }

    #[test]
    fn test_truncate_small_max() {
        let input = "こんにちは";
        assert_eq!(truncate(input, 3), "こんに");
        assert_eq!(truncate(input, 0), "");
    }

    #[test]
    fn test_hash_str_is_stable() {
        let a = hash_str("hello");
        let b = hash_str("hello");
        let c = hash_str("world");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_slice_chars_multibyte() {
        let text = "café au lait";
        assert_eq!(slice_chars(text, 0, 4), Some("café"));
        assert_eq!(slice_chars(text, 5, 7), Some("au"));
        assert_eq!(slice_chars(text, 8, 12), Some("lait"));
        assert_eq!(slice_chars(text, 8, 13), None);
        assert_eq!(slice_chars(text, 4, 3), None);
    }

    #[test]
    fn test_char_byte_conversion_round_trip() {
        let text = "naïve résumé";
        let byte = char_to_byte(text, 6).unwrap();
        assert_eq!(byte_to_char(text, byte), 6);
        assert_eq!(char_to_byte(text, char_len(text)), Some(text.len()));
    }

    #[test]
    fn test_splice_chars_replaces_range() {
        assert_eq!(
            splice_chars("I recieve mail", 2, 9, "receive").as_deref(),
            Some("I receive mail")
        );
        assert_eq!(splice_chars("abc", 1, 1, "X").as_deref(), Some("aXbc"));
        assert_eq!(splice_chars("abc", 2, 9, "X"), None);
    }

    #[test]
    fn test_write_atomic_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        write_atomic(&path, "one").unwrap();
        write_atomic(&path, "two").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "two");
        assert!(!path.with_extension("tmp").exists());
    }
}
