//! String and byte literal decoding.

/// Process escapes in string literal content (without the quotes).
///
/// Returns the offending escape character on failure.
pub(crate) fn unescape_string(content: &str) -> Result<String, char> {
    let mut out = String::with_capacity(content.len());
    let mut chars = content.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(esc) = chars.next() else {
            return Err('\\');
        };
        match esc {
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'v' => out.push('\x0b'),
            '0' => out.push('\0'),
            '\\' => out.push('\\'),
            '"' => out.push('"'),
            '\'' => out.push('\''),
            'x' => {
                let hi = chars.next().and_then(|d| d.to_digit(16));
                let lo = chars.next().and_then(|d| d.to_digit(16));
                match (hi, lo) {
                    (Some(hi), Some(lo)) => {
                        let byte = u8::try_from(hi * 16 + lo).map_err(|_| 'x')?;
                        out.push(char::from(byte));
                    }
                    _ => return Err('x'),
                }
            }
            other => return Err(other),
        }
    }
    Ok(out)
}

/// Decode the hex digits of a `0x"..."` literal. Whitespace between digits
/// is ignored.
pub(crate) fn decode_hex_bytes(content: &str) -> Option<Vec<u8>> {
    let digits: Vec<u8> = content
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .map(|c| c.to_digit(16).and_then(|d| u8::try_from(d).ok()))
        .collect::<Option<_>>()?;
    if digits.len() % 2 != 0 {
        return None;
    }
    Some(digits.chunks(2).map(|pair| (pair[0] << 4) | pair[1]).collect())
}
