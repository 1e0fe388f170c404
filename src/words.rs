//! 18ビットワード再構成
//!
//! マーカービット（0o200）付きの3バイト組から PDP-1 の18ビットワードを組み立てる。
//! 各バイトの下位6ビットを上位から順に詰める（RPB 命令と同じ読み方）。

use crate::fiodec::{CODE_MASK, MARKER_BIT};
use serde::{Deserialize, Serialize};

/// 18ビットワードのマスク
pub const WORD_MASK: u32 = 0o777777;

/// 1ワードを構成するテープバイト数
pub const BYTES_PER_WORD: usize = 3;

/// DIO 命令（上位2桁の8進数）
pub const DIO: u32 = 0o32;

/// JMP 命令
pub const JMP: u32 = 0o60;

/// 再構成したワード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    /// 先頭バイトのテープ位置
    pub index: usize,
    /// 18ビット値
    pub value: u32,
}

impl Word {
    /// 上位6ビット（命令コード＋間接ビット）
    #[inline]
    pub fn tag(&self) -> u32 {
        opcode_tag(self.value)
    }

    /// 下位12ビット（アドレス）
    #[inline]
    pub fn operand(&self) -> u32 {
        operand(self.value)
    }

    pub fn is_dio(&self) -> bool {
        self.tag() == DIO
    }

    pub fn is_jmp(&self) -> bool {
        self.tag() == JMP
    }

    /// このワードを構成するテープ位置
    pub fn byte_range(&self) -> std::ops::Range<usize> {
        self.index..self.index + BYTES_PER_WORD
    }
}

/// 上位6ビット
#[inline]
pub fn opcode_tag(value: u32) -> u32 {
    (value >> 12) & 0o77
}

/// 下位12ビット
#[inline]
pub fn operand(value: u32) -> u32 {
    value & 0o7777
}

/// マーカービットが立っているか
#[inline]
pub fn is_marked(byte: u8) -> bool {
    byte & MARKER_BIT != 0
}

/// 3バイトを18ビットワードに詰める
#[inline]
pub fn pack(b0: u8, b1: u8, b2: u8) -> u32 {
    ((b0 & CODE_MASK) as u32) << 12 | ((b1 & CODE_MASK) as u32) << 6 | (b2 & CODE_MASK) as u32
}

/// start から連続するマーカー付き3バイト組をワードにする
/// 3バイト揃わない位置で停止する（空の結果も正常）
pub fn reconstruct(bytes: &[u8], start: usize) -> Vec<Word> {
    let mut words = Vec::new();
    let mut pos = start;
    while let Some(triplet) = bytes.get(pos..pos + BYTES_PER_WORD) {
        if !triplet.iter().all(|&b| is_marked(b)) {
            break;
        }
        words.push(Word {
            index: pos,
            value: pack(triplet[0], triplet[1], triplet[2]),
        });
        pos += BYTES_PER_WORD;
    }
    words
}

/// 基本命令のニーモニック（間接ビットを除いた5ビット、32エントリ）
const OPCODES: [Option<&str>; 32] = [
    None,        // 00
    Some("and"), // 02
    Some("ior"), // 04
    Some("xor"), // 06
    Some("xct"), // 10
    None,
    None,
    Some("cal"), // 16 (間接付きは jda)
    Some("lac"), // 20
    Some("lio"), // 22
    Some("dac"), // 24
    Some("dap"), // 26
    Some("dip"), // 30
    Some("dio"), // 32
    Some("dzm"), // 34
    None,
    Some("add"), // 40
    Some("sub"), // 42
    Some("idx"), // 44
    Some("isp"), // 46
    Some("sad"), // 50
    Some("sas"), // 52
    Some("mul"), // 54
    Some("div"), // 56
    Some("jmp"), // 60
    Some("jsp"), // 62
    Some("skp"), // 64
    Some("sft"), // 66
    Some("law"), // 70
    Some("iot"), // 72
    None,
    Some("opr"), // 76
];

/// メモリ参照命令（間接ビットが意味を持つ）
fn can_indirect(op: usize) -> bool {
    matches!(op, 0o01..=0o06 | 0o10..=0o16 | 0o20..=0o27 | 0o30 | 0o31)
}

/// ワードの簡易逆アセンブル（"dio 7760" / "lac i 100" 形式）
/// 未定義命令は None
pub fn mnemonic(value: u32) -> Option<String> {
    let tag = opcode_tag(value);
    let op = (tag >> 1) as usize;
    let indirect = tag & 1 != 0;
    let addr = operand(value);

    if op == 0o07 && indirect {
        return Some(format!("jda {:o}", addr));
    }
    let name = OPCODES[op]?;
    if indirect && can_indirect(op) {
        Some(format!("{} i {:o}", name, addr))
    } else if indirect && op == 0o34 {
        // law の間接ビットは負数
        Some(format!("law -{:o}", addr))
    } else {
        Some(format!("{} {:o}", name, addr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack() {
        assert_eq!(pack(0o232, 0o200, 0o202), 0o320002);
        assert_eq!(pack(0o277, 0o277, 0o277), WORD_MASK);
        // 上位2ビットは無視される
        assert_eq!(pack(0o377, 0o300, 0o301), 0o770001);
    }

    #[test]
    fn test_reconstruct_stops_at_unmarked() {
        let bytes = [0o232, 0o201, 0o200, 0o260, 0o077, 0o200, 0o201];
        let words = reconstruct(&bytes, 0);
        assert_eq!(words.len(), 1);
        assert_eq!(words[0], Word { index: 0, value: 0o320100 });
        assert!(words[0].is_dio());
        assert_eq!(words[0].operand(), 0o100);
    }

    #[test]
    fn test_reconstruct_from_offset() {
        let bytes = [0, 0o232, 0o201, 0o200, 0o260, 0o200, 0o204, 0o200];
        let words = reconstruct(&bytes, 1);
        assert_eq!(words.len(), 2);
        assert_eq!(words[1].index, 4);
        assert!(words[1].is_jmp());
        assert_eq!(words[1].byte_range(), 4..7);
    }

    #[test]
    fn test_reconstruct_empty() {
        assert!(reconstruct(&[], 0).is_empty());
        assert!(reconstruct(&[0o200, 0o200], 0).is_empty());
        assert!(reconstruct(&[0o200, 0o200, 0o200], 5).is_empty());
        assert!(reconstruct(&[0o100, 0o200, 0o200], 0).is_empty());
    }

    #[test]
    fn test_mnemonic() {
        assert_eq!(mnemonic(0o327760).as_deref(), Some("dio 7760"));
        assert_eq!(mnemonic(0o217760).as_deref(), Some("lac i 7760"));
        assert_eq!(mnemonic(0o607751).as_deref(), Some("jmp 7751"));
        assert_eq!(mnemonic(0o170100).as_deref(), Some("jda 100"));
        assert_eq!(mnemonic(0o710005).as_deref(), Some("law -5"));
        assert_eq!(mnemonic(0o000000), None);
        assert_eq!(mnemonic(0o740000), None);
    }
}
