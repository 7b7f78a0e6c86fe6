//! Text metrics for the three base-14 Helvetica faces the documents use.
//!
//! Widths are the standard AFM advances in 1/1000 em. Characters outside
//! WinAnsi are written as `?` and measured as such.

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::job::Align;

/// (ascender - descender + line gap) / units per em for Helvetica.
const LINE_HEIGHT_EM: f32 = 1.156;
const ASCENDER_EM: f32 = 0.718;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Font {
    Regular,
    Bold,
    Oblique,
}

impl Font {
    pub const ALL: [Font; 3] = [Font::Regular, Font::Bold, Font::Oblique];

    pub fn base_name(self) -> &'static [u8] {
        match self {
            Self::Regular => b"Helvetica",
            Self::Bold => b"Helvetica-Bold",
            Self::Oblique => b"Helvetica-Oblique",
        }
    }

    /// Resource name inside page dictionaries.
    pub fn resource_name(self) -> &'static [u8] {
        match self {
            Self::Regular => b"F1",
            Self::Bold => b"F2",
            Self::Oblique => b"F3",
        }
    }

    fn ascii_widths(self) -> &'static [u16; 95] {
        match self {
            Self::Regular | Self::Oblique => &HELVETICA,
            Self::Bold => &HELVETICA_BOLD,
        }
    }

    /// Advance of one character in 1/1000 em.
    pub fn char_width(self, ch: char) -> u16 {
        let bold = matches!(self, Self::Bold);
        match ch {
            ' '..='~' => self.ascii_widths()[ch as usize - 32],
            '\u{a0}' => 278,
            '¿' => 611,
            '¡' => 333,
            '“' | '”' | '„' => if bold { 500 } else { 333 },
            '‘' | '’' | '‚' => if bold { 278 } else { 222 },
            '—' => 1000,
            '–' => 556,
            '•' => 350,
            '…' => 1000,
            '°' => 400,
            'º' => 365,
            'ª' => 370,
            '€' => 556,
            _ => match ascii_base(ch) {
                Some(base) => self.ascii_widths()[base as usize - 32],
                None if encode_char(ch).is_some() => 556,
                None => self.ascii_widths()['?' as usize - 32],
            },
        }
    }

    pub fn text_width(self, text: &str, size: f32) -> f32 {
        let units: u32 = text.chars().map(|ch| u32::from(self.char_width(ch))).sum();
        units as f32 * size / 1000.0
    }
}

pub fn line_height(size: f32) -> f32 {
    size * LINE_HEIGHT_EM
}

pub fn ascender(size: f32) -> f32 {
    size * ASCENDER_EM
}

/// Greedy word wrap. Explicit newlines start new lines, words wider than the
/// box are split by character. Whitespace-only text yields no lines.
pub fn wrap_text(text: &str, font: Font, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    if text.trim().is_empty() {
        return lines;
    }

    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate =
                if current.is_empty() { word.to_string() } else { format!("{current} {word}") };
            if font.text_width(&candidate, size) <= max_width {
                current = candidate;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }

            if font.text_width(word, size) <= max_width {
                current = word.to_string();
            } else {
                for ch in word.chars() {
                    current.push(ch);
                    if font.text_width(&current, size) > max_width && current.chars().count() > 1 {
                        current.pop();
                        lines.push(std::mem::take(&mut current));
                        current.push(ch);
                    }
                }
            }
        }
        if !current.is_empty() || paragraph.trim().is_empty() {
            lines.push(current);
        }
    }

    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    lines
}

/// Height of `text` wrapped into `max_width`.
pub fn text_height(text: &str, font: Font, size: f32, max_width: f32) -> f32 {
    wrap_text(text, font, size, max_width).len() as f32 * line_height(size)
}

/// Left edge of a line of `line_width` inside a box.
pub fn aligned_x(align: Align, box_x: f32, box_width: f32, line_width: f32) -> f32 {
    match align {
        Align::Left => box_x,
        Align::Center => box_x + (box_width - line_width) / 2.0,
        Align::Right => box_x + box_width - line_width,
    }
}

/// Encodes `text` as WinAnsi bytes, replacing anything unmappable with `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars().map(|ch| encode_char(ch).unwrap_or(b'?')).collect()
}

fn encode_char(ch: char) -> Option<u8> {
    match ch {
        ' '..='~' => Some(ch as u8),
        '\u{a0}'..='\u{ff}' => Some(ch as u32 as u8),
        '€' => Some(0x80),
        '‚' => Some(0x82),
        '„' => Some(0x84),
        '…' => Some(0x85),
        '‘' => Some(0x91),
        '’' => Some(0x92),
        '“' => Some(0x93),
        '”' => Some(0x94),
        '•' => Some(0x95),
        '–' => Some(0x96),
        '—' => Some(0x97),
        '™' => Some(0x99),
        _ => None,
    }
}

/// ASCII letter an accented Latin character decomposes to (`á` → `a`).
fn ascii_base(ch: char) -> Option<char> {
    if encode_char(ch).is_none() {
        return None;
    }
    let base = ch.to_string().nfd().next()?;
    (base != ch && base.is_ascii_alphabetic()).then_some(base)
}

#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    278, 278, 584, 584, 584, 556, 1015,
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    278, 278, 278, 469, 556, 333,
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
    334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];
