//! Text normalization for bilingual matching
//!
//! Persian input arrives with Arabic-presentation letters, zero-width
//! joiners and Arabic-Indic digits depending on the user's keyboard.
//! Everything is folded to one canonical form before any lookup so the
//! synonym tables only need to list one spelling per term.

/// Fold a raw query or synonym into canonical matching form:
/// lowercase, Arabic letters mapped to Persian, zero-width characters
/// removed, diacritics stripped, digits folded to ASCII, whitespace
/// collapsed.
pub fn fold_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last_was_space = true;

    for ch in input.chars() {
        let ch = match ch {
            // Arabic yeh / kaf to Persian forms
            '\u{064A}' => '\u{06CC}', // ي -> ی
            '\u{0643}' => '\u{06A9}', // ك -> ک
            // Arabic-Indic and extended Arabic-Indic digits
            '\u{0660}'..='\u{0669}' => {
                char::from(b'0' + (ch as u32 - 0x0660) as u8)
            }
            '\u{06F0}'..='\u{06F9}' => {
                char::from(b'0' + (ch as u32 - 0x06F0) as u8)
            }
            other => other,
        };

        // Zero-width joiners and Arabic diacritics carry no matching value
        if matches!(ch, '\u{200C}' | '\u{200D}' | '\u{FEFF}') {
            continue;
        }
        if ('\u{064B}'..='\u{065F}').contains(&ch) || ch == '\u{0670}' {
            continue;
        }

        if ch.is_whitespace() {
            if !last_was_space {
                out.push(' ');
                last_was_space = true;
            }
            continue;
        }
        last_was_space = false;

        for lower in ch.to_lowercase() {
            out.push(lower);
        }
    }

    while out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Fold only digits (Persian and Arabic-Indic to ASCII), leaving the rest
/// of the text untouched. Used where the original casing matters, e.g.
/// before scanning for a numeric threshold.
pub fn fold_digits(input: &str) -> String {
    input
        .chars()
        .map(|ch| match ch {
            '\u{0660}'..='\u{0669}' => char::from(b'0' + (ch as u32 - 0x0660) as u8),
            '\u{06F0}'..='\u{06F9}' => char::from(b'0' + (ch as u32 - 0x06F0) as u8),
            other => other,
        })
        .collect()
}
