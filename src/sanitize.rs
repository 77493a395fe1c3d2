use regex::Regex;

/// Strips everything outside the rendering charset: the Hebrew block, Latin
/// letters, digits, whitespace and basic punctuation. Anything else would
/// draw as tofu or break the fallback font.
#[must_use]
pub fn sanitize_for_render(text: &str) -> String {
    let disallowed = Regex::new(r#"[^\x{0590}-\x{05FF}A-Za-z0-9\s.,!?"':-]"#)
        .expect("hardcoded charset regex is valid");
    disallowed.replace_all(text, "").to_string()
}

/// Removes CJK ideographs across the BMP and the supplementary ideographic
/// planes.
#[must_use]
pub fn strip_cjk(text: &str) -> String {
    text.chars().filter(|ch| !is_cjk(*ch)).collect()
}

fn is_cjk(ch: char) -> bool {
    matches!(ch,
        '\u{4E00}'..='\u{9FFF}'
            | '\u{3400}'..='\u{4DBF}'
            | '\u{20000}'..='\u{2A6DF}'
            | '\u{2A700}'..='\u{2B73F}'
            | '\u{2B740}'..='\u{2B81F}'
            | '\u{2B820}'..='\u{2CEAF}')
}
