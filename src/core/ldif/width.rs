//! Display width of text in terminal columns.
//!
//! Widths come from a static table of `(last codepoint, width)` ranges sorted
//! by codepoint: 0 for combining marks and other zero-width characters, 2 for
//! wide East-Asian ideographs, syllables, fullwidth forms and emoji, 1 for
//! everything else.

static WIDTHS: &[(u32, u8)] = &[
    (0x007E, 1),
    (0x009F, 0), // C1 controls
    (0x02FF, 1),
    (0x036F, 0), // combining diacritical marks
    (0x0482, 1),
    (0x0489, 0), // combining cyrillic
    (0x0590, 1),
    (0x05BD, 0), // hebrew points
    (0x10FF, 1),
    (0x115F, 2), // hangul jamo initials
    (0x1AAF, 1),
    (0x1AFF, 0), // combining diacritical marks extended
    (0x1DBF, 1),
    (0x1DFF, 0), // combining diacritical marks supplement
    (0x200A, 1),
    (0x200F, 0), // zero width space, joiners, direction marks
    (0x20CF, 1),
    (0x20FF, 0), // combining marks for symbols
    (0x2328, 1),
    (0x232A, 2), // angle brackets
    (0x2E7F, 1),
    (0x303E, 2), // CJK radicals, punctuation
    (0x3040, 1),
    (0x3098, 2), // hiragana
    (0x309A, 0), // combining kana voiced marks
    (0x4DBF, 2), // katakana .. CJK extension A
    (0x4DFF, 1), // yijing hexagrams
    (0xA4CF, 2), // CJK unified ideographs, yi
    (0xA95F, 1),
    (0xA97F, 2), // hangul jamo extended-A
    (0xABFF, 1),
    (0xD7A3, 2), // hangul syllables
    (0xF8FF, 1),
    (0xFAFF, 2), // CJK compatibility ideographs
    (0xFDFF, 1),
    (0xFE0F, 0), // variation selectors
    (0xFE1F, 1),
    (0xFE2F, 0), // combining half marks
    (0xFE6F, 2), // CJK compatibility and small forms
    (0xFEFE, 1),
    (0xFEFF, 0), // byte order mark
    (0xFF00, 1),
    (0xFF60, 2), // fullwidth forms
    (0xFFDF, 1),
    (0xFFE6, 2), // fullwidth signs
    (0x16FDF, 1),
    (0x18D8F, 2), // ideographic symbols, tangut, khitan
    (0x1AFEF, 1),
    (0x1B2FF, 2), // kana supplement and extended, nushu
    (0x1F2FF, 1),
    (0x1F64F, 2), // pictographs, emoticons
    (0x1F67F, 1),
    (0x1F6FF, 2), // transport and map symbols
    (0x1F8FF, 1),
    (0x1F9FF, 2), // supplemental pictographs
    (0x1FFFF, 1),
    (0x2FFFD, 2), // CJK extensions B..F
    (0x2FFFF, 1),
    (0x3FFFD, 2), // CJK extension G
    (0xDFFFF, 1),
    (0xE01EF, 0), // tags, variation selectors supplement
    (0x10FFFF, 1),
];

/// Columns occupied by one character.
pub fn char_width(c: char) -> usize
{
    let cp = c as u32;
    let idx = WIDTHS.partition_point(|&(last, _)| last < cp);
    WIDTHS
        .get(idx)
        .map_or(1, |&(_, w)| w as usize)
}

/// Columns occupied by a string.
pub fn str_width(s: &str) -> usize
{
    s.chars()
        .map(char_width)
        .sum()
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn table_is_sorted_and_covers_unicode()
    {
        assert!(
            WIDTHS
                .windows(2)
                .all(|w| w[0].0 < w[1].0)
        );
        assert_eq!(
            WIDTHS
                .last()
                .map(|r| r.0),
            Some(0x10FFFF)
        );
    }

    #[test]
    fn width_classes()
    {
        assert_eq!(char_width('a'), 1);
        assert_eq!(char_width('é'), 1);
        assert_eq!(char_width('\u{0301}'), 0); // combining acute
        assert_eq!(char_width('中'), 2);
        assert_eq!(char_width('한'), 2);
        assert_eq!(char_width('Ａ'), 2); // fullwidth A
        assert_eq!(char_width('😀'), 2);
        assert_eq!(char_width('\u{200B}'), 0);
    }

    #[test]
    fn wide_ranges_outside_the_bmp_cjk_blocks()
    {
        assert_eq!(char_width('🚀'), 2); // U+1F680
        assert_eq!(char_width('\u{1F6FF}'), 2);
        assert_eq!(char_width('\u{1F650}'), 1); // ornamental dingbat
        assert_eq!(char_width('\u{A960}'), 2);
        assert_eq!(char_width('\u{A97F}'), 2);
        assert_eq!(char_width('\u{A980}'), 1); // javanese
        assert_eq!(char_width('\u{16FE0}'), 2);
        assert_eq!(char_width('\u{17000}'), 2); // tangut
        assert_eq!(char_width('\u{18AFF}'), 2);
        assert_eq!(char_width('\u{1B000}'), 2); // katakana letter archaic e
        assert_eq!(char_width('\u{1B2FF}'), 2);
        assert_eq!(char_width('\u{1B300}'), 1);
    }

    #[test]
    fn string_width_sums_columns()
    {
        assert_eq!(str_width("cn: 清华"), 8);
        assert_eq!(str_width("e\u{0301}"), 1);
    }
}
