//! テープ一覧表示
//!
//! 1バイト1行のテキスト一覧。表示列はビットフラグで選択する。
//! 列指定は `holes+octal+char` のように `+` で連結する。

use crate::decoder::{Decoded, ShiftState};
use crate::tape::TapeLine;

bitflags::bitflags! {
    /// 表示列
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Columns: u32 {
        /// 9穴パターン
        const HOLES = 0b00_0001;
        /// 生バイト（8進）
        const OCTAL = 0b00_0010;
        /// FIODEC 表示
        const CHAR  = 0b00_0100;
        /// Unicode コード（8進）
        const CODE  = 0b00_1000;
        /// 行の種類
        const KIND  = 0b01_0000;
        /// シフト状態
        const SHIFT = 0b10_0000;
    }
}

/// 列指定をパース（不明な名前は無視）
pub fn parse_columns(s: &str) -> Columns {
    let mut columns = Columns::empty();

    for part in s.to_lowercase().split('+') {
        match part.trim() {
            "none" => {}
            "holes" => columns |= Columns::HOLES,
            "octal" => columns |= Columns::OCTAL,
            "char" => columns |= Columns::CHAR,
            "code" => columns |= Columns::CODE,
            "kind" => columns |= Columns::KIND,
            "shift" => columns |= Columns::SHIFT,
            "all" => columns = Columns::all(),
            other => log::warn!("Unknown column: {}", other),
        }
    }

    columns
}

/// 穴パターン（上から 1 2 3 sync 4 5 6 7 8）
pub fn holes(byte: u8) -> String {
    let mut s = String::with_capacity(9 * 3);
    for bit in 0..8 {
        if bit == 3 {
            s.push('.');
        }
        s.push(if byte & (1 << bit) != 0 { '●' } else { '○' });
    }
    s
}

/// 表示用の短い文字列
pub fn display(decoded: &Decoded) -> String {
    match decoded {
        Decoded::Feed => String::new(),
        Decoded::Glyph('\n') => "\\n".to_string(),
        Decoded::Glyph('\t') => "\\t".to_string(),
        Decoded::Glyph('\x08') => "\\b".to_string(),
        Decoded::Glyph(c) => c.to_string(),
        Decoded::Shift(ShiftState::Lower) => "Lcs".to_string(),
        Decoded::Shift(ShiftState::Upper) => "Ucs".to_string(),
        Decoded::Colour(entry) => entry.control_name().unwrap_or("?").to_string(),
        Decoded::Unmapped(_) => decoded.text(),
    }
}

/// Unicode コード（8進、出力なしは ---）
fn code_column(decoded: &Decoded) -> String {
    match decoded {
        Decoded::Glyph(c) => format!("{:03o}", *c as u32),
        _ => "---".to_string(),
    }
}

/// 一覧の1行
pub fn format_line(index: usize, line: &TapeLine, columns: Columns) -> String {
    let mut row = format!("{:6}", index);
    if columns.contains(Columns::HOLES) {
        row.push_str("  ");
        row.push_str(&holes(line.byte));
    }
    if columns.contains(Columns::OCTAL) {
        row.push_str(&format!("  {:03o}", line.byte));
    }
    if columns.contains(Columns::CHAR) {
        row.push_str(&format!("  {:<8}", display(&line.decoded)));
    }
    if columns.contains(Columns::CODE) {
        row.push_str(&format!("  {:>4}", code_column(&line.decoded)));
    }
    if columns.contains(Columns::KIND) {
        row.push_str(&format!("  {:<7}", line.kind.name()));
    }
    if columns.contains(Columns::SHIFT) {
        let shift = match line.shift {
            ShiftState::Lower => "lower",
            ShiftState::Upper => "upper",
        };
        row.push_str(&format!("  {}", shift));
    }
    row.trim_end().to_string()
}

/// 範囲を一覧にする（width = 0 は最後まで）
pub fn format_range(lines: &[TapeLine], start: usize, width: usize, columns: Columns) -> Vec<String> {
    let start = start.min(lines.len());
    let end = if width == 0 {
        lines.len()
    } else {
        start.saturating_add(width).min(lines.len())
    };
    lines[start..end]
        .iter()
        .enumerate()
        .map(|(i, line)| format_line(start + i, line, columns))
        .collect()
}
