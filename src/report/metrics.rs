//! Font metrics and text encoding for the standard Helvetica faces.
//!
//! The report uses the non-embedded base-14 fonts with `WinAnsiEncoding`, so
//! every string is written as single bytes and measured with the Adobe AFM
//! advance widths (units of 1/1000 em).

/// Font face used by a text run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

impl Font {
    /// Resource name the page content refers to.
    pub fn resource_name(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }

    pub fn base_font(self) -> &'static str {
        match self {
            Font::Regular => "Helvetica",
            Font::Bold => "Helvetica-Bold",
        }
    }
}

// Advance widths for bytes 32..=126 under WinAnsiEncoding.
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// Advance width of one encoded byte, in 1/1000 em.
pub fn byte_width(byte: u8, font: Font) -> u16 {
    match byte {
        32..=126 => {
            let idx = (byte - 32) as usize;
            match font {
                Font::Regular => HELVETICA_WIDTHS[idx],
                Font::Bold => HELVETICA_BOLD_WIDTHS[idx],
            }
        }
        0x85 | 0x97 | 0x89 => 1000,
        0x95 => 350,
        0x91 | 0x92 | 0x82 => match font {
            Font::Regular => 222,
            Font::Bold => 278,
        },
        0x93 | 0x94 | 0x84 => match font {
            Font::Regular => 333,
            Font::Bold => 500,
        },
        0xA0 | 0xB7 => 278,
        _ => 556,
    }
}

/// Width in points of already-encoded bytes.
pub fn encoded_width(bytes: &[u8], font: Font, size: f32) -> f32 {
    let units: u32 = bytes.iter().map(|&b| byte_width(b, font) as u32).sum();
    units as f32 * size / 1000.0
}

/// Map text to WinAnsi bytes.
///
/// Characters outside the encoding are replaced with `?` when they are
/// letters or digits and dropped otherwise (emoji, box drawing, …), so the
/// output never contains bytes the font cannot draw. Control characters
/// become spaces. PDF string delimiters are left alone; the lopdf writer
/// escapes them when the string is serialised.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for c in text.chars() {
        match c {
            ' '..='~' => out.push(c as u8),
            '\u{A0}'..='\u{FF}' => out.push(c as u32 as u8),
            c if c.is_control() => out.push(b' '),
            '─' | '━' | '‐' | '‑' | '‒' | '−' => out.push(b'-'),
            '→' => out.extend_from_slice(b"->"),
            '←' => out.extend_from_slice(b"<-"),
            '✓' | '✔' => out.push(b'x'),
            c => match win_ansi_special(c) {
                Some(byte) => out.push(byte),
                None if c.is_alphanumeric() => out.push(b'?'),
                None => {}
            },
        }
    }
    out
}

/// The 0x80–0x9F block of WinAnsiEncoding.
fn win_ansi_special(c: char) -> Option<u8> {
    let byte = match c {
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8A,
        '‹' => 0x8B,
        'Œ' => 0x8C,
        'Ž' => 0x8E,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9A,
        '›' => 0x9B,
        'œ' => 0x9C,
        'ž' => 0x9E,
        'Ÿ' => 0x9F,
        _ => return None,
    };
    Some(byte)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_passes_through() {
        assert_eq!(encode_win_ansi("Q3 (draft) <a & b>"), b"Q3 (draft) <a & b>");
    }

    #[test]
    fn latin1_and_typography_map_to_single_bytes() {
        assert_eq!(encode_win_ansi("café"), b"caf\xE9");
        assert_eq!(encode_win_ansi("“quote” – ok…"), b"\x93quote\x94 \x96 ok\x85");
        assert_eq!(encode_win_ansi("• item"), b"\x95 item");
    }

    #[test]
    fn unmappable_characters_are_dropped_or_replaced() {
        assert_eq!(encode_win_ansi("🔍 Themes"), b" Themes");
        assert_eq!(encode_win_ansi("日本"), b"??");
        assert_eq!(encode_win_ansi("───"), b"---");
    }

    #[test]
    fn control_characters_become_spaces() {
        assert_eq!(encode_win_ansi("a\tb\u{7}c"), b"a b c");
    }

    #[test]
    fn widths_follow_afm_tables() {
        assert_eq!(byte_width(b' ', Font::Regular), 278);
        assert_eq!(byte_width(b'W', Font::Regular), 944);
        assert_eq!(byte_width(b'i', Font::Regular), 222);
        assert_eq!(byte_width(b'i', Font::Bold), 278);
        assert_eq!(byte_width(b'~', Font::Bold), 584);
        // "Hello" = 722 + 556 + 222 + 222 + 556 = 2278 units
        let w = encoded_width(b"Hello", Font::Regular, 10.0);
        assert!((w - 22.78).abs() < 0.001, "got {w}");
    }

    #[test]
    fn bold_is_never_narrower_for_letters() {
        for b in b'a'..=b'z' {
            assert!(byte_width(b, Font::Bold) >= byte_width(b, Font::Regular));
        }
    }
}
