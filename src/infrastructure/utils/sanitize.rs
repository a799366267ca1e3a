use std::path::Path;

use ammonia::Builder;

/// Removes every HTML tag (and the content of script/style blocks) from
/// free text and trims it. Entities produced by the cleaner are decoded
/// again, since the result is stored as plain text.
pub fn strip_tags(input: &str) -> String {
    let cleaned = Builder::empty()
        .clean_content_tags(["script", "style"].into_iter().collect())
        .clean(input)
        .to_string();
    decode_basic_entities(&cleaned).trim().to_string()
}

fn decode_basic_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", "\u{a0}")
        .replace("&amp;", "&")
}

/// Lower-case, hyphenated stem of a file name, safe for the uploads
/// directory. Falls back to `image` when nothing usable remains.
pub fn file_stem_slug(file_name: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let slug = slug::slugify(stem);
    if slug.is_empty() { "image".to_string() } else { slug }
}

/// Rejects anything that could escape the uploads directory.
pub fn is_safe_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains("..")
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains('\0')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_markup_but_keeps_text() {
        assert_eq!(strip_tags("  <em>Bold</em> & <b>bright</b> "), "Bold & bright");
        assert_eq!(strip_tags("<script>alert(1)</script>ok"), "ok");
        assert_eq!(strip_tags("a < b"), "a < b");
    }

    #[test]
    fn slugs_file_stems() {
        assert_eq!(file_stem_slug("My Product Photo.PNG"), "my-product-photo");
        assert_eq!(file_stem_slug("???.jpg"), "image");
    }

    #[test]
    fn unsafe_names_are_rejected() {
        assert!(is_safe_file_name("photo_ai_20260101120000.jpg"));
        assert!(!is_safe_file_name("../etc/passwd"));
        assert!(!is_safe_file_name("a/b.jpg"));
        assert!(!is_safe_file_name(".env"));
    }
}
