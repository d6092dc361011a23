//! Book identifiers and language names

/// Language selector value meaning "use the free-text language instead".
pub const OTHER_LANGUAGE: &str = "other";

/// Languages offered when adding a book.
pub const LANGUAGES: &[&str] = &[
    // Indian languages
    "Assamese", "Bengali", "Bodo", "Dogri", "English", "Gujarati", "Hindi", "Kannada",
    "Kashmiri", "Konkani", "Maithili", "Malayalam", "Manipuri", "Marathi", "Nepali", "Odia",
    "Punjabi", "Sanskrit", "Santali", "Sindhi", "Tamil", "Telugu", "Urdu",
    // foreign languages
    "Arabic", "Chinese (Mandarin)", "French", "German", "Indonesian", "Italian", "Japanese",
    "Korean", "Portuguese", "Russian", "Spanish", "Swahili", "Turkish",
    // formats
    "Braille",
];

/// Build the human readable id of a book, e.g. `ENG-THE_ALCHEMIST`.
///
/// The prefix is the first three characters of `language`, shorter when the
/// language is shorter. Uniqueness is the caller's concern.
pub fn derive_id(title: &str, language: &str) -> String {
    let prefix: String = language.chars().take(3).collect();

    let mut body = String::with_capacity(title.len());
    let mut in_space = false;
    for c in title.chars() {
        if c.is_whitespace() {
            if !in_space {
                body.push('_');
            }
            in_space = true;
        } else {
            body.push(c);
            in_space = false;
        }
    }

    format!("{}-{}", prefix.to_uppercase(), body.to_uppercase())
}

/// Upper-case the first letter and leave the rest untouched.
pub fn capitalize(language: &str) -> String {
    let mut chars = language.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
