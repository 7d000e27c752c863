//! Utilities for writing seed data: slugs, stable ids, placeholder images.

use std::fmt::Display;
use std::sync::LazyLock;

use md5::{Digest, Md5};
use regex::Regex;

use crate::config::PlaceholderService;

static NON_SLUG_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("static slug pattern"));

/// Letters transliterated before slugging.
const TRANSLITERATIONS: &[(char, &str)] = &[
    // Finnish/Swedish
    ('ä', "a"),
    ('å', "a"),
    ('ö', "o"),
    // German
    ('ü', "u"),
    ('ß', "ss"),
    // French/Spanish/Portuguese
    ('é', "e"),
    ('è', "e"),
    ('ê', "e"),
    ('ë', "e"),
    ('à', "a"),
    ('â', "a"),
    ('ù', "u"),
    ('û', "u"),
    ('ô', "o"),
    ('î', "i"),
    ('ï', "i"),
    ('ç', "c"),
    ('ñ', "n"),
    ('ã', "a"),
    ('õ', "o"),
    // Nordic
    ('æ', "ae"),
    ('ø', "o"),
    // Polish
    ('ł', "l"),
    ('ż', "z"),
    ('ź', "z"),
    ('ś', "s"),
    ('ć', "c"),
    ('ń', "n"),
];

/// Creates a URL-safe slug.
///
/// ```
/// use seedkit::helpers::make_slug;
///
/// assert_eq!(make_slug("Pekka Kuumalainen"), "pekka-kuumalainen");
/// assert_eq!(make_slug("Mäkitalo Åland"), "makitalo-aland");
/// assert_eq!(make_slug("Müller Straße"), "muller-strasse");
/// ```
pub fn make_slug(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.to_lowercase().chars() {
        match TRANSLITERATIONS.iter().find(|(from, _)| *from == c) {
            Some((_, to)) => slug.push_str(to),
            None => slug.push(c),
        }
    }

    NON_SLUG_CHARS
        .replace_all(&slug, "-")
        .trim_matches('-')
        .to_string()
}

/// Stable 32-character hex id derived from `value` (MD5).
pub fn make_hash_id(value: &str) -> String {
    format!("{:x}", Md5::digest(value.as_bytes()))
}

/// Reproducible placeholder image URL for `seed`.
pub fn placeholder_image(
    seed: impl Display,
    width: u32,
    height: u32,
    service: PlaceholderService,
) -> String {
    match service {
        PlaceholderService::Picsum => {
            format!("https://picsum.photos/seed/{seed}/{width}/{height}")
        }
        PlaceholderService::Placehold => format!("https://placehold.co/{width}x{height}"),
    }
}
