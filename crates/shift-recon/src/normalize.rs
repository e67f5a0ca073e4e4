//! Worker-name canonicalization and time/date token parsing.
//!
//! Every downstream join between attendance and service data goes through
//! [`normalize_name`], so the rules below are applied in a fixed order and the
//! substitution tables are plain data.

use chrono::NaiveDate;
use unicode_normalization::UnicodeNormalization;

/// Symbols removed wherever they appear in a label.
const STRIPPED_SYMBOLS: &[char] = &['⚪', '★', '（', '）', '(', ')', '・'];

/// Bullet glyphs removed from the start of a label.
const LEADING_BULLETS: &[char] = &[
    '\u{25EF}', '\u{3007}', '\u{25CB}', '\u{25CF}', '\u{25CE}', '\u{2B55}', '\u{26AA}',
    '\u{26AB}', '\u{2605}', '\u{2606}',
];

/// Kanji variants and known mojibake, applied in order after NFKC.
pub const VARIANT_SUBSTITUTIONS: &[(&str, &str)] = &[
    ("﨑", "崎"),
    ("髙", "高"),
    ("德", "徳"),
    ("邊", "辺"),
    ("廣", "広"),
    ("澤", "沢"),
    ("齋", "斎"),
    ("眞", "真"),
    ("淸", "清"),
    ("𠮷", "吉"),
    ("早_", "早崎"),
    ("早＿", "早崎"),
];

/// Canonicalize a worker label into the identity used as a join key.
///
/// Returns an empty string when nothing identifying is left (no kana, CJK
/// ideograph or ASCII alphanumeric).
pub fn normalize_name(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let cleaned: String = trimmed
        .chars()
        .filter(|&c| !is_stripped_control(c))
        .collect();
    let spaced = collapse_whitespace(&cleaned);

    let without_symbols: String = spaced
        .chars()
        .filter(|c| !STRIPPED_SYMBOLS.contains(c))
        .collect();
    let unbulleted = without_symbols.trim_start_matches(LEADING_BULLETS);

    let compat: String = unbulleted.nfkc().map(fold_full_width).collect();
    let mut normalized = collapse_whitespace(&compat).trim().to_string();

    if !normalized.chars().any(is_identifying) {
        return String::new();
    }

    for (from, to) in VARIANT_SUBSTITUTIONS {
        if normalized.contains(from) {
            normalized = normalized.replace(from, to);
        }
    }
    normalized
}

fn is_stripped_control(c: char) -> bool {
    matches!(c, '\u{0}'..='\u{1F}' | '\u{7F}'..='\u{9F}' | '\u{FFFD}')
}

fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_space = false;
    for c in s.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

fn fold_full_width(c: char) -> char {
    match c {
        'Ａ'..='Ｚ' | 'ａ'..='ｚ' | '０'..='９' => {
            char::from_u32(c as u32 - 0xFEE0).unwrap_or(c)
        }
        _ => c,
    }
}

fn is_identifying(c: char) -> bool {
    matches!(
        c,
        '\u{3040}'..='\u{309F}'
            | '\u{30A0}'..='\u{30FF}'
            | '\u{4E00}'..='\u{9FAF}'
            | '\u{3400}'..='\u{4DBF}'
    ) || c.is_ascii_alphanumeric()
}

/// Parse `H`, `H:MM`, `HH:MM` or `HH:MM:SS` into minutes after midnight.
/// Full-width digits and colons (`９：００`) are accepted.
///
/// Hours past 23 are kept as-is (`26:30` is 1590), so next-day times survive
/// until they are anchored to a date. Seconds are discarded.
pub fn parse_minute_of_day(token: &str) -> Option<u32> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }

    let folded: String = token
        .chars()
        .map(|c| match c {
            '：' => ':',
            _ => fold_full_width(c),
        })
        .collect();

    let mut parts = folded.split(':');
    let hours = parse_small_number(parts.next()?)?;
    let minutes = match parts.next() {
        Some(mm) => parse_small_number(mm)?,
        None => 0,
    };
    if let Some(ss) = parts.next() {
        parse_small_number(ss)?;
    }
    if parts.next().is_some() {
        return None;
    }

    Some(hours * 60 + minutes)
}

/// One or two ASCII digits.
fn parse_small_number(s: &str) -> Option<u32> {
    if s.is_empty() || s.len() > 2 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Parse a calendar date as it appears in attendance and service exports.
///
/// Accepts `YYYY/M/D`, `YYYY-M-D`, `YYYYMMDD` and `YYYY年M月D日`, optionally
/// followed by a time part (`2024/01/05 00:00:00`) or a parenthesised weekday
/// (`2024/01/05(金)`).
pub fn parse_date(token: &str) -> Option<NaiveDate> {
    let token = token.trim();
    let date_part = token
        .split(|c: char| c.is_whitespace() || c == '(' || c == '（' || c == 'T')
        .next()?
        .trim();
    if date_part.is_empty() {
        return None;
    }

    if date_part.len() == 8 && date_part.bytes().all(|b| b.is_ascii_digit()) {
        return NaiveDate::parse_from_str(date_part, "%Y%m%d").ok();
    }

    let unified: String = date_part
        .chars()
        .map(|c| match c {
            '/' | '-' | '.' | '年' | '月' => '/',
            _ => c,
        })
        .filter(|&c| c != '日')
        .collect();

    let mut fields = unified.split('/');
    let year: i32 = fields.next()?.parse().ok()?;
    let month: u32 = fields.next()?.parse().ok()?;
    let day: u32 = fields.next()?.parse().ok()?;
    if fields.next().is_some() || year < 1000 {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}
