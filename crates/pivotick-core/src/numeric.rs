//! Locale-aware numeric normalization.
//!
//! Exchange pages render prices with thousands separators, full-width
//! punctuation and leftover markup. [`normalize`] reduces such text to a
//! plain decimal numeral and parses it; anything that is not a numeral after
//! cleaning is an error, never a silent zero.

use crate::ValidationError;

const FULL_WIDTH_START: u32 = 0xFF01;
const FULL_WIDTH_END: u32 = 0xFF5E;
const FULL_WIDTH_SHIFT: u32 = 0xFEE0;
const IDEOGRAPHIC_SPACE: char = '\u{3000}';

/// Map a full-width ASCII variant (U+FF01..U+FF5E) to its half-width form.
pub fn fold_full_width(ch: char) -> char {
    let code = ch as u32;
    if (FULL_WIDTH_START..=FULL_WIDTH_END).contains(&code) {
        char::from_u32(code - FULL_WIDTH_SHIFT).unwrap_or(ch)
    } else if ch == IDEOGRAPHIC_SPACE {
        ' '
    } else {
        ch
    }
}

/// Parse locale-formatted numeric text into an `f64`.
///
/// No rounding is applied.
///
/// # Errors
///
/// Returns [`ValidationError::NotNumeric`] when the cleaned text is not a
/// decimal numeral (`[+-]?digits[.digits]`). Placeholders such as `--`,
/// exponents, `inf` and `NaN` are all rejected.
pub fn normalize(raw: &str) -> Result<f64, ValidationError> {
    let cleaned = clean(raw);
    if !is_decimal_numeral(&cleaned) {
        return Err(not_numeric(raw));
    }
    cleaned.parse::<f64>().map_err(|_| not_numeric(raw))
}

fn clean(raw: &str) -> String {
    let without_entities = raw.replace("&nbsp;", " ").replace("&#160;", " ");
    let mut output = String::with_capacity(without_entities.len());
    let mut in_tag = false;

    for ch in without_entities.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if in_tag => {}
            _ => {
                let folded = fold_full_width(ch);
                if folded == ',' || folded.is_whitespace() {
                    continue;
                }
                output.push(folded);
            }
        }
    }

    output
}

fn is_decimal_numeral(text: &str) -> bool {
    let unsigned = text
        .strip_prefix('+')
        .or_else(|| text.strip_prefix('-'))
        .unwrap_or(text);

    let mut digits = 0_usize;
    let mut dots = 0_usize;
    for ch in unsigned.chars() {
        match ch {
            '0'..='9' => digits += 1,
            '.' => dots += 1,
            _ => return false,
        }
    }

    digits > 0 && dots <= 1
}

fn not_numeric(raw: &str) -> ValidationError {
    ValidationError::NotNumeric {
        value: raw.trim().to_owned(),
    }
}
