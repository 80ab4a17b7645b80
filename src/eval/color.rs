//! Ampersand colour codes.
//!
//! `&X` with `X` in `0-9a-fk-or` becomes `§X`, and `&#RRGGBB` becomes the
//! expanded hex form `§x§r§r§g§g§b§b` (digits lower-cased).

const SECTION: char = '§';

pub fn translate_color_codes(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len() + 8);
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '&' {
            if let Some(hex) = hex_code(&chars[i + 1..]) {
                out.push(SECTION);
                out.push('x');
                for digit in hex {
                    out.push(SECTION);
                    out.push(digit.to_ascii_lowercase());
                }
                i += 8;
                continue;
            }
            if let Some(&code) = chars.get(i + 1) {
                if is_format_code(code) {
                    out.push(SECTION);
                    out.push(code);
                    i += 2;
                    continue;
                }
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}

/// `#RRGGBB` at the start of `rest`.
fn hex_code(rest: &[char]) -> Option<&[char]> {
    if rest.len() < 7 || rest[0] != '#' {
        return None;
    }
    let digits = &rest[1..7];
    digits
        .iter()
        .all(|c| c.is_ascii_hexdigit())
        .then_some(digits)
}

fn is_format_code(code: char) -> bool {
    matches!(code.to_ascii_lowercase(), '0'..='9' | 'a'..='f' | 'k'..='o' | 'r')
}
