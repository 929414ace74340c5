use crate::normalize::{clean, escape_invalid_chars};

/// Deterministic resource key for a string.
///
/// Computed over UTF-16 code units so keys agree with existing translation
/// memories.
pub fn hash_key(text: &str) -> String {
    let mut hash: u64 = 0;
    for unit in text.encode_utf16() {
        hash = (hash + u64::from(unit)) * 65521 % 1_073_741_789;
    }
    format!("r{hash}")
}

/// Key of a translatable unit: the hash of its cleaned source.
pub fn make_key(source: &str) -> String {
    hash_key(&clean(&escape_invalid_chars(source)))
}

/// Key of a front matter field, namespaced by the document it came from.
pub fn frontmatter_key(document_path: &str, field_path: &str) -> String {
    format!("{}.{}", hash_key(document_path), field_path)
}
