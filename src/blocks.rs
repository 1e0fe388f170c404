//! RIM / BIN ローダーブロック検出
//!
//! RIM形式: `dio addr` + データワードの繰り返し、`jmp start` で終了
//! BIN形式: `dio start`, `dio end` の2ワードヘッダの後にデータワードが続く
//!
//! 長さの前置がないため、命令コードのパターンから貪欲に判定する。
//! 一度決めたブロックは後戻りしない（先にマッチした方が勝ち）。
//! データがたまたま DIO/JMP に見える場合は誤検出することがある。

use crate::words::{Word, BYTES_PER_WORD};
use serde::{Deserialize, Serialize};

/// ブロック形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockKind {
    Rim,
    Bin,
}

/// 検出したブロック（ワード単位）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub kind: BlockKind,
    /// 先頭ワードの位置（ワード列内）
    pub start: usize,
    /// ワード数
    pub len: usize,
}

impl Block {
    /// ブロックに含まれるワード
    pub fn words<'a>(&self, words: &'a [Word]) -> &'a [Word] {
        &words[self.start..self.start + self.len]
    }

    /// ブロックを構成するテープ位置
    pub fn byte_indices<'a>(&self, words: &'a [Word]) -> impl Iterator<Item = usize> + 'a {
        self.words(words).iter().flat_map(|w| w.byte_range())
    }

    /// テープ上のバイト数
    pub fn byte_len(&self) -> usize {
        self.len * BYTES_PER_WORD
    }
}

/// BIN ブロック判定（ワード数を返す）
fn match_bin(rest: &[Word]) -> Option<usize> {
    if rest.len() < 2 || !rest[0].is_dio() || !rest[1].is_dio() {
        return None;
    }
    let start = rest[0].operand() as usize;
    let end = rest[1].operand() as usize;
    let count = (end + 1).saturating_sub(start);
    Some((2 + count).min(rest.len()))
}

/// RIM ブロック判定（ワード数を返す）
fn match_rim(rest: &[Word]) -> Option<usize> {
    if rest.len() < 2 || !rest[0].is_dio() || rest[1].is_dio() {
        return None;
    }
    let mut len = 0;
    let mut i = 0;
    while i < rest.len() {
        if rest[i].is_dio() {
            // dio + データワード
            len = (i + 2).min(rest.len());
            i += 2;
        } else if rest[i].is_jmp() {
            len = i + 1;
            break;
        } else {
            break;
        }
    }
    if len == 0 {
        None
    } else {
        Some(len)
    }
}

/// ワード列からブロックを検出する
/// どちらにも一致しない位置は1ワード進める
pub fn classify_blocks(words: &[Word]) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut cursor = 0;

    while cursor < words.len() {
        let rest = &words[cursor..];
        let found = match_bin(rest)
            .map(|len| (BlockKind::Bin, len))
            .or_else(|| match_rim(rest).map(|len| (BlockKind::Rim, len)));

        match found {
            Some((kind, len)) => {
                log::trace!(
                    "{:?} block at tape {} ({} words)",
                    kind,
                    rest[0].index,
                    len
                );
                blocks.push(Block { kind, start: cursor, len });
                cursor += len;
            }
            None => cursor += 1,
        }
    }

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(values: &[u32]) -> Vec<Word> {
        values
            .iter()
            .enumerate()
            .map(|(i, &value)| Word { index: 10 + i * BYTES_PER_WORD, value })
            .collect()
    }

    #[test]
    fn test_bin_block_length() {
        let w = words(&[0o320000, 0o320002, 0o1, 0o2, 0o3]);
        let blocks = classify_blocks(&w);
        assert_eq!(blocks, vec![Block { kind: BlockKind::Bin, start: 0, len: 5 }]);
        assert_eq!(blocks[0].byte_len(), 15);
        let indices: Vec<usize> = blocks[0].byte_indices(&w).collect();
        assert_eq!(indices, (10..25).collect::<Vec<_>>());
    }

    #[test]
    fn test_bin_clamped_to_remaining() {
        let w = words(&[0o320100, 0o320177, 0o1]);
        let blocks = classify_blocks(&w);
        assert_eq!(blocks, vec![Block { kind: BlockKind::Bin, start: 0, len: 3 }]);
    }

    #[test]
    fn test_bin_reversed_range_is_header_only() {
        let w = words(&[0o320010, 0o320004, 0o777777]);
        let blocks = classify_blocks(&w);
        assert_eq!(blocks[0], Block { kind: BlockKind::Bin, start: 0, len: 2 });
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn test_rim_block_through_jmp() {
        let w = words(&[0o320100, 0o200000, 0o600100]);
        let blocks = classify_blocks(&w);
        assert_eq!(blocks, vec![Block { kind: BlockKind::Rim, start: 0, len: 3 }]);
    }

    #[test]
    fn test_rim_multiple_deposits() {
        let w = words(&[
            0o320100, 0o200000, 0o320101, 0o400000, 0o320102, 0o000001, 0o600100, 0o111111,
        ]);
        let blocks = classify_blocks(&w);
        assert_eq!(blocks[0], Block { kind: BlockKind::Rim, start: 0, len: 7 });
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn test_rim_without_jmp_stops_at_other_opcode() {
        let w = words(&[0o320100, 0o200000, 0o440000, 0o600000]);
        let blocks = classify_blocks(&w);
        assert_eq!(blocks[0], Block { kind: BlockKind::Rim, start: 0, len: 2 });
    }

    #[test]
    fn test_rim_trailing_dio_without_data() {
        let w = words(&[0o320100, 0o200000, 0o320101]);
        let blocks = classify_blocks(&w);
        assert_eq!(blocks, vec![Block { kind: BlockKind::Rim, start: 0, len: 3 }]);
        assert_eq!(blocks[0].byte_indices(&w).count(), 9);
    }

    #[test]
    fn test_rim_then_bin() {
        let w = words(&[
            0o320100, 0o200000, 0o600100, // RIM
            0o320200, 0o320201, 0o5, 0o6, // BIN
        ]);
        let blocks = classify_blocks(&w);
        assert_eq!(
            blocks,
            vec![
                Block { kind: BlockKind::Rim, start: 0, len: 3 },
                Block { kind: BlockKind::Bin, start: 3, len: 4 },
            ]
        );
    }

    #[test]
    fn test_skips_unrecognised_words() {
        let w = words(&[0o123456, 0o600000, 0o320000, 0o320000, 0o7]);
        let blocks = classify_blocks(&w);
        assert_eq!(blocks, vec![Block { kind: BlockKind::Bin, start: 2, len: 3 }]);
    }

    #[test]
    fn test_empty_and_single() {
        assert!(classify_blocks(&[]).is_empty());
        assert!(classify_blocks(&words(&[0o320000])).is_empty());
    }
}
