//! Character entity decoding for text content

use std::borrow::Cow;

/// Decode `&lt; &gt; &amp; &quot; &apos;` and `&#NNN;` / `&#xHH;` references.
///
/// Unknown or malformed references are kept verbatim.
pub fn decode_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        match after.find(';').and_then(|semi| decode_reference(&after[..semi]).map(|cp| (semi, cp))) {
            Some((semi, code_point)) => {
                push_code_point(&mut out, code_point);
                rest = &after[semi + 1..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn decode_reference(name: &str) -> Option<u32> {
    match name {
        "lt" => Some('<' as u32),
        "gt" => Some('>' as u32),
        "amp" => Some('&' as u32),
        "quot" => Some('"' as u32),
        "apos" => Some('\'' as u32),
        _ => {
            let number = name.strip_prefix('#')?;
            if let Some(hex) = number.strip_prefix('x').or_else(|| number.strip_prefix('X')) {
                u32::from_str_radix(hex, 16).ok()
            } else {
                number.parse().ok()
            }
        }
    }
}

/// Append a code point as UTF-8 (1 to 4 bytes depending on its range).
/// Surrogates and out-of-range values become U+FFFD.
fn push_code_point(out: &mut String, code_point: u32) {
    out.push(char::from_u32(code_point).unwrap_or(char::REPLACEMENT_CHARACTER));
}
