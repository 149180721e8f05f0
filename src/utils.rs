/// Decodes single-byte text; codes map 1:1 to U+0000..U+00FF.
pub fn latin1_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Turns a font name into a C identifier fragment: every character that is
/// not an ASCII letter or digit becomes `_`.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// The character for an 8-bit code as shown in generated comments.
/// Control characters are shown as a blank.
pub fn display_char(code: u8) -> char {
    let c = char::from(code);
    if c.is_control() {
        ' '
    } else {
        c
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("MS Sans-Serif_8x13"), "MS_Sans_Serif_8x13");
        assert_eq!(sanitize_name("Fixedsys 9pt"), "Fixedsys_9pt");
        assert_eq!(sanitize_name("Grüße"), "Gr__e");
    }

    #[test]
    fn test_latin1() {
        assert_eq!(latin1_to_string(b"Terminal"), "Terminal");
        assert_eq!(latin1_to_string(&[0x43, 0xA9]), "C\u{a9}");
    }

    #[test]
    fn test_display_char() {
        assert_eq!(display_char(b'A'), 'A');
        assert_eq!(display_char(0x7F), ' ');
        assert_eq!(display_char(0x85), ' ');
        assert_eq!(display_char(0xE4), 'ä');
    }
}
