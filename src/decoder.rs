//! シフト状態付き FIODEC デコーダ
//!
//! バイト列を1バイトずつ処理し、文字またはシフト／無視イベントに変換する。
//! シフト状態はストリーム全体で保持され、Lcs/Ucs でのみ変化する。

use crate::fiodec::{self, Fiodec, CODE_MASK, TABLE_MASK, UPPER_BANK};
use serde::{Deserialize, Serialize};

/// テープフィード（リーダー）
const FEED: u8 = 0o000;

/// ページ区切り（常に改行）
const PAGE_BREAK: u8 = 0o013;

/// シフト状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ShiftState {
    #[default]
    Lower,
    Upper,
}

/// 1バイトのデコード結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decoded {
    /// テープフィード（何も出力しない）
    Feed,
    /// 通常の文字
    Glyph(char),
    /// シフト変更（出力なし）
    Shift(ShiftState),
    /// リボン色変更（出力なし）
    Colour(Fiodec),
    /// 未定義コード（元のバイトを保持）
    Unmapped(u8),
}

impl Decoded {
    /// 出力文字列（制御コードは空）
    pub fn text(&self) -> String {
        match self {
            Decoded::Glyph(c) => c.to_string(),
            Decoded::Feed | Decoded::Shift(_) | Decoded::Colour(_) => String::new(),
            Decoded::Unmapped(code) => format!("?0o{:o}?", code & TABLE_MASK),
        }
    }
}

/// シフト状態を追跡するデコーダ
#[derive(Debug, Clone, Default)]
pub struct ShiftDecoder {
    shift: ShiftState,
}

impl ShiftDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 現在のシフト状態
    pub fn shift(&self) -> ShiftState {
        self.shift
    }

    /// 1バイト処理
    pub fn step(&mut self, byte: u8) -> Decoded {
        if byte == FEED {
            return Decoded::Feed;
        }
        if byte == PAGE_BREAK {
            return Decoded::Glyph('\n');
        }

        let code = byte & TABLE_MASK;
        let entry = match fiodec::lookup(code) {
            Some(entry) => entry,
            None => return Decoded::Unmapped(byte),
        };

        match entry {
            Fiodec::LowerCase => {
                self.shift = ShiftState::Lower;
                Decoded::Shift(ShiftState::Lower)
            }
            Fiodec::UpperCase => {
                self.shift = ShiftState::Upper;
                Decoded::Shift(ShiftState::Upper)
            }
            Fiodec::Black | Fiodec::Red => Decoded::Colour(entry),
            Fiodec::Glyph(c) => {
                // 上段シフト中は下段コードを上段で引き直す
                if self.shift == ShiftState::Upper && code < UPPER_BANK {
                    if let Some(Fiodec::Glyph(upper)) = fiodec::upper_of(code & CODE_MASK) {
                        return Decoded::Glyph(upper);
                    }
                }
                Decoded::Glyph(c)
            }
        }
    }
}

/// バイト列全体をデコード（各バイト処理後のシフト状態付き）
pub fn decode_bytes(bytes: &[u8]) -> Vec<(Decoded, ShiftState)> {
    let mut decoder = ShiftDecoder::new();
    bytes
        .iter()
        .map(|&b| {
            let decoded = decoder.step(b);
            (decoded, decoder.shift())
        })
        .collect()
}

/// デコード結果を連結したテキスト
pub fn decode_text(bytes: &[u8]) -> String {
    decode_bytes(bytes).iter().map(|(d, _)| d.text()).collect()
}
