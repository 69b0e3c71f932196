use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static NON_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s-]").expect("static slug pattern"));
static DASH_OR_SPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[-\s]+").expect("static slug pattern"));

/// Slug for a dye name: trimmed, lowercased, "/" turned into "-", then
/// standard slugification.
///
/// "MemBrite Fix 660/680" becomes "membrite-fix-660-680".
pub fn dye_slug(name: &str) -> String {
    slugify(&name.trim().to_lowercase().replace('/', "-"))
}

/// Web-framework style slugify: NFKD-normalize and drop what is left
/// outside ASCII, drop anything that is not a word character, whitespace or
/// hyphen, then collapse runs of hyphens and whitespace into a single hyphen.
pub fn slugify(value: &str) -> String {
    let ascii: String = value.nfkd().filter(char::is_ascii).collect();
    let lowered = ascii.to_lowercase();
    let cleaned = NON_WORD.replace_all(&lowered, "");
    let dashed = DASH_OR_SPACE.replace_all(&cleaned, "-");
    dashed.trim_matches(|c| c == '-' || c == '_').to_string()
}
