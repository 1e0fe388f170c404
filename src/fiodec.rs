//! FIODEC コード表
//!
//! PDP-1 paper tape character code (Friden Flexowriter)
//! 7ビットのテープコード → 文字／制御マーカーの固定テーブル
//! 下段バンク 0o00-0o77、上段バンク 0o100-0o177（同じ下位6ビットで大文字・記号）

use serde::{Deserialize, Serialize};

/// 上段バンクのオフセット
pub const UPPER_BANK: u8 = 0o100;

/// 下位6ビットのマスク
pub const CODE_MASK: u8 = 0o77;

/// テープバイトのうちテーブル参照に使う下位7ビット
pub const TABLE_MASK: u8 = 0o177;

/// マーカー／パリティビット（穴8）
pub const MARKER_BIT: u8 = 0o200;

/// テーブルの1エントリ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fiodec {
    /// 表示可能な文字（改行・タブ・バックスペースを含む）
    Glyph(char),
    /// Lower Case シフト (Lcs)
    LowerCase,
    /// Upper Case シフト (Ucs)
    UpperCase,
    /// 黒リボン (Blk)
    Black,
    /// 赤リボン (Red)
    Red,
}

impl Fiodec {
    /// 表示用の短い名前（制御マーカーのみ）
    pub fn control_name(&self) -> Option<&'static str> {
        match self {
            Fiodec::Glyph(_) => None,
            Fiodec::LowerCase => Some("Lcs"),
            Fiodec::UpperCase => Some("Ucs"),
            Fiodec::Black => Some("Blk"),
            Fiodec::Red => Some("Red"),
        }
    }
}

const fn g(c: char) -> Option<Fiodec> {
    Some(Fiodec::Glyph(c))
}

const LCS: Option<Fiodec> = Some(Fiodec::LowerCase);
const UCS: Option<Fiodec> = Some(Fiodec::UpperCase);
const BLK: Option<Fiodec> = Some(Fiodec::Black);
const RED: Option<Fiodec> = Some(Fiodec::Red);
const NO: Option<Fiodec> = None;

/// FIODEC → Unicode 基本テーブル（128エントリ、8個ずつ2列で1行）
#[rustfmt::skip]
const BASE_TABLE: [Option<Fiodec>; 128] = [
    // 0o000
    g(' '), g('1'), g('2'), g('3'), g('4'), g('5'), g('6'), g('7'),
    g('8'), g('9'), NO,     NO,     NO,     NO,     NO,     NO,
    // 0o020
    g('0'), g('/'), g('s'), g('t'), g('u'), g('v'), g('w'), g('x'),
    g('y'), g('z'), NO,     g(','), BLK,    RED,    g('\t'), NO,
    // 0o040
    g('·'), g('j'), g('k'), g('l'), g('m'), g('n'), g('o'), g('p'),
    g('q'), g('r'), NO,     NO,     g('-'), g(')'), g('‾'), g('('),
    // 0o060
    NO,     g('a'), g('b'), g('c'), g('d'), g('e'), g('f'), g('g'),
    g('h'), g('i'), LCS,    g('.'), UCS,    g('\x08'), NO,  g('\n'),
    // 0o100
    g(' '), g('"'), g('\''), g('~'), g('⊃'), g('∨'), g('∧'), g('<'),
    g('>'), g('↑'), NO,     NO,     NO,     NO,     NO,     NO,
    // 0o120
    g('→'), g('?'), g('S'), g('T'), g('U'), g('V'), g('W'), g('X'),
    g('Y'), g('Z'), NO,     g('='), BLK,    RED,    g('\t'), NO,
    // 0o140
    g('_'), g('J'), g('K'), g('L'), g('M'), g('N'), g('O'), g('P'),
    g('Q'), g('R'), NO,     NO,     g('+'), g(']'), g('|'), g('['),
    // 0o160
    NO,     g('A'), g('B'), g('C'), g('D'), g('E'), g('F'), g('G'),
    g('H'), g('I'), LCS,    g('×'), UCS,    g('\x08'), NO,  g('\n'),
];

/// 基本テーブルに対する例外パッチ（ここだけで管理する）
pub const OVERRIDES: [(u8, Fiodec); 2] = [
    // ページ区切り → 改行
    (0o13, Fiodec::Glyph('\n')),
    // マーカービットのみのコード → スペース
    (0o200, Fiodec::Glyph(' ')),
];

const fn build_table() -> [Option<Fiodec>; 256] {
    let mut table = [None; 256];
    let mut i = 0;
    while i < BASE_TABLE.len() {
        table[i] = BASE_TABLE[i];
        i += 1;
    }
    let mut j = 0;
    while j < OVERRIDES.len() {
        table[OVERRIDES[j].0 as usize] = Some(OVERRIDES[j].1);
        j += 1;
    }
    table
}

/// パッチ適用済みのテーブル（読み取り専用）
static TABLE: [Option<Fiodec>; 256] = build_table();

/// コードを引く（未定義コードは None）
#[inline]
pub fn lookup(code: u8) -> Option<Fiodec> {
    TABLE[code as usize]
}

/// 下段バンクの文字に対応する上段バンクのエントリ
#[inline]
pub fn upper_of(code: u8) -> Option<Fiodec> {
    lookup((code & CODE_MASK) | UPPER_BANK)
}

/// 下位6ビットのパリティが奇数か
#[inline]
pub fn low6_parity_odd(byte: u8) -> bool {
    (byte & CODE_MASK).count_ones() % 2 == 1
}
