// src/matching/normalize.rs
use once_cell::sync::Lazy;
use regex::Regex;

/// Marketing filler stripped from product names before similarity comparison.
pub const STOPWORDS: [&str; 8] = [
    "garansi", "resmi", "original", "promo", "murah", "dan", "untuk", "dengan",
];

// `15"` has to become `15inch` before punctuation stripping eats the quote.
static INCH_QUOTE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(\d+)\s*""#).unwrap());

static NON_ALNUM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9\s]").unwrap());

static UNIT_RES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (Regex::new(r"(\d+)\s*inch").unwrap(), "${1}inch"),
        (Regex::new(r"(\d+)\s*gb").unwrap(), "${1}gb"),
        (Regex::new(r"(\d+)\s*tb").unwrap(), "${1}tb"),
        (Regex::new(r"(\d+)\s*hz").unwrap(), "${1}hz"),
    ]
});

/// Deterministic cleanup of a raw product name into a comparable form.
///
/// Lower-cases, strips everything outside `[a-z0-9 ]`, glues unit expressions
/// to their numeric prefix (`15 inch` -> `15inch`, `8 GB` -> `8gb`), drops
/// stopwords, and collapses whitespace. Pure and idempotent:
/// `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(raw: &str) -> String {
    let mut text = raw.to_lowercase();
    text = INCH_QUOTE_RE.replace_all(&text, "${1}inch").to_string();
    text = NON_ALNUM_RE.replace_all(&text, " ").to_string();
    for (re, replacement) in UNIT_RES.iter() {
        text = re.replace_all(&text, *replacement).to_string();
    }
    text.split_whitespace()
        .filter(|token| !STOPWORDS.contains(token))
        .collect::<Vec<_>>()
        .join(" ")
}
