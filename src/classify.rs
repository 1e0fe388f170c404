//! テープ行（バイト）の分類
//!
//! 3パス構成:
//! 1. テープ全体の統計（確実な英数字／確実なバイナリの数）
//! 2. バイナリ寄りのテープのみ RIM/BIN ブロック検出
//! 3. バイトごとの最終分類（ブロック検出結果を優先）
//!
//! あくまでヒューリスティックで、完全な分類は目指さない。

use crate::blocks::{classify_blocks, Block, BlockKind};
use crate::fiodec::{low6_parity_odd, MARKER_BIT};
use crate::words::{is_marked, reconstruct, Word, BYTES_PER_WORD};
use serde::{Deserialize, Serialize};

/// 英数字テープとみなす割合の閾値
pub const ALPHA_THRESHOLD: f64 = 0.70;

/// 穴7（ラベル用）
const HOLE7: u8 = 0o100;

/// 閾値が 0.0 - 1.0 の範囲内か確認
pub fn check_threshold(threshold: f64) -> Result<f64, String> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(threshold)
    } else {
        Err(format!("Threshold must be between 0.0 and 1.0: {}", threshold))
    }
}

/// 行の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LineType {
    /// 穴なし（テープフィード）
    Leader,
    /// 穴パターンで文字を描いたラベル
    Label,
    /// FIODEC テキスト
    Alphanumeric,
    /// 形式不明のバイナリ
    #[default]
    GenericBinary,
    /// RIM ローダーブロック
    Rim,
    /// BIN ローダーブロック
    Bin,
}

impl LineType {
    pub const ALL: [LineType; 6] = [
        LineType::Leader,
        LineType::Label,
        LineType::Alphanumeric,
        LineType::GenericBinary,
        LineType::Rim,
        LineType::Bin,
    ];

    /// 表示名
    pub fn name(&self) -> &'static str {
        match self {
            LineType::Leader => "leader",
            LineType::Label => "label",
            LineType::Alphanumeric => "alpha",
            LineType::GenericBinary => "binary",
            LineType::Rim => "rim",
            LineType::Bin => "bin",
        }
    }
}

impl From<BlockKind> for LineType {
    fn from(kind: BlockKind) -> Self {
        match kind {
            BlockKind::Rim => LineType::Rim,
            BlockKind::Bin => LineType::Bin,
        }
    }
}

impl std::fmt::Display for LineType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// パス1: テープ全体の統計
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TapeStats {
    /// マーカービットなし・非ゼロ
    pub definite_alpha: usize,
    /// マーカービットあり・下位6ビット奇数パリティ（テキストとしては不正）
    pub definite_binary: usize,
}

impl TapeStats {
    pub fn gather(bytes: &[u8]) -> Self {
        let mut stats = TapeStats::default();
        for &b in bytes {
            if b & MARKER_BIT == 0 {
                if b != 0 {
                    stats.definite_alpha += 1;
                }
            } else if low6_parity_odd(b) {
                stats.definite_binary += 1;
            }
        }
        stats
    }

    /// 英数字の割合（判定材料がなければ 0.0）
    pub fn alpha_ratio(&self) -> f64 {
        let total = self.definite_alpha + self.definite_binary;
        if total == 0 {
            0.0
        } else {
            self.definite_alpha as f64 / total as f64
        }
    }
}

/// パス2の結果
#[derive(Debug, Clone, Default)]
pub struct BlockScan {
    /// 再構成した全ワード（マーカー付きラン単位で連結）
    pub words: Vec<Word>,
    /// 検出したブロック（`words` 内の位置）
    pub blocks: Vec<Block>,
    /// テープ位置 → ブロック種別
    pub marks: Vec<Option<LineType>>,
}

/// パス2: マーカー付きランごとにワード再構成とブロック検出
pub fn detect_blocks(bytes: &[u8]) -> BlockScan {
    let mut scan = BlockScan {
        marks: vec![None; bytes.len()],
        ..Default::default()
    };

    let mut pos = 0;
    while pos < bytes.len() {
        if !is_marked(bytes[pos]) {
            pos += 1;
            continue;
        }

        let run = reconstruct(bytes, pos);
        if run.is_empty() {
            pos += 1;
            continue;
        }

        let base = scan.words.len();
        for block in classify_blocks(&run) {
            let kind = LineType::from(block.kind);
            for i in block.byte_indices(&run) {
                scan.marks[i] = Some(kind);
            }
            scan.blocks.push(Block { start: base + block.start, ..block });
        }
        pos += run.len() * BYTES_PER_WORD;
        scan.words.extend(run);
    }

    log::debug!(
        "Block scan: {} words, {} blocks",
        scan.words.len(),
        scan.blocks.len()
    );
    scan
}

/// パス3: ブロックに属さないバイトの分類
pub fn classify_byte(byte: u8, alpha_ratio: f64, threshold: f64) -> LineType {
    if byte == 0 {
        return LineType::Leader;
    }
    match (byte & MARKER_BIT != 0, byte & HOLE7 != 0) {
        (false, true) => LineType::Label,
        (false, false) => LineType::Alphanumeric,
        (true, false) => {
            // マーカーをパリティとみなすと全体が偶数パリティ → テキストではない
            if low6_parity_odd(byte) {
                LineType::GenericBinary
            } else if alpha_ratio >= threshold {
                LineType::Alphanumeric
            } else {
                LineType::GenericBinary
            }
        }
        (true, true) => LineType::Alphanumeric,
    }
}

/// 分類結果
#[derive(Debug, Clone, Default)]
pub struct Classification {
    pub stats: TapeStats,
    /// バイトごとの種類
    pub lines: Vec<LineType>,
    /// パス2で再構成したワード
    pub words: Vec<Word>,
    /// パス2で検出したブロック
    pub blocks: Vec<Block>,
    /// パス2を実行したか
    pub binary_pass: bool,
}

/// 既定の閾値で分類
pub fn classify(bytes: &[u8]) -> Classification {
    classify_with_threshold(bytes, ALPHA_THRESHOLD)
}

/// 閾値を指定して分類
pub fn classify_with_threshold(bytes: &[u8], threshold: f64) -> Classification {
    let stats = TapeStats::gather(bytes);
    let ratio = stats.alpha_ratio();
    let binary_pass = ratio < threshold;
    log::debug!(
        "Tape stats: alpha={} binary={} ratio={:.3} -> {}",
        stats.definite_alpha,
        stats.definite_binary,
        ratio,
        if binary_pass { "block scan" } else { "text" }
    );

    let scan = if binary_pass {
        detect_blocks(bytes)
    } else {
        BlockScan::default()
    };

    let lines = bytes
        .iter()
        .enumerate()
        .map(|(i, &b)| {
            scan.marks
                .get(i)
                .copied()
                .flatten()
                .unwrap_or_else(|| classify_byte(b, ratio, threshold))
        })
        .collect();

    Classification {
        stats,
        lines,
        words: scan.words,
        blocks: scan.blocks,
        binary_pass,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 18ビットワードをマーカー付き3バイトに展開
    fn punch(word: u32) -> [u8; 3] {
        [
            MARKER_BIT | ((word >> 12) & 0o77) as u8,
            MARKER_BIT | ((word >> 6) & 0o77) as u8,
            MARKER_BIT | (word & 0o77) as u8,
        ]
    }

    fn tape(words: &[u32]) -> Vec<u8> {
        words.iter().flat_map(|&w| punch(w)).collect()
    }

    #[test]
    fn test_all_zero_is_leader() {
        let c = classify(&[0u8; 40]);
        assert_eq!(c.lines.len(), 40);
        assert!(c.lines.iter().all(|&t| t == LineType::Leader));
        assert_eq!(c.stats.alpha_ratio(), 0.0);
    }

    #[test]
    fn test_text_tape_skips_block_scan() {
        let bytes: Vec<u8> = (1u8..0o200).collect();
        let c = classify(&bytes);
        assert_eq!(c.stats.alpha_ratio(), 1.0);
        assert!(!c.binary_pass);
        assert!(c.words.is_empty());
        assert!(c.blocks.is_empty());
        assert!(c
            .lines
            .iter()
            .all(|&t| t == LineType::Label || t == LineType::Alphanumeric));
    }

    #[test]
    fn test_bit_patterns() {
        let t = ALPHA_THRESHOLD;
        assert_eq!(classify_byte(0, 0.0, t), LineType::Leader);
        assert_eq!(classify_byte(0o100, 0.0, t), LineType::Label);
        assert_eq!(classify_byte(0o177, 1.0, t), LineType::Label);
        assert_eq!(classify_byte(0o061, 0.0, t), LineType::Alphanumeric);
        // 下位6ビット奇数パリティ + マーカー → バイナリ
        assert_eq!(classify_byte(0o201, 1.0, t), LineType::GenericBinary);
        // 偶数パリティは統計次第
        assert_eq!(classify_byte(0o203, 0.9, t), LineType::Alphanumeric);
        assert_eq!(classify_byte(0o203, 0.5, t), LineType::GenericBinary);
        assert_eq!(classify_byte(0o203, 0.70, t), LineType::Alphanumeric);
        assert_eq!(classify_byte(0o300, 0.0, t), LineType::Alphanumeric);
    }

    #[test]
    fn test_threshold_is_tunable() {
        // 英数字 3 : バイナリ 1 → 0.75
        let bytes = [0o061, 0o062, 0o063, 0o201, 0o203];
        let c = classify(&bytes);
        assert_eq!(c.stats.alpha_ratio(), 0.75);
        assert!(!c.binary_pass);
        assert_eq!(c.lines[4], LineType::Alphanumeric);

        let strict = classify_with_threshold(&bytes, 0.80);
        assert!(strict.binary_pass);
        assert_eq!(strict.lines[4], LineType::GenericBinary);
    }

    #[test]
    fn test_check_threshold() {
        assert_eq!(check_threshold(0.0), Ok(0.0));
        assert_eq!(check_threshold(ALPHA_THRESHOLD), Ok(ALPHA_THRESHOLD));
        assert_eq!(check_threshold(1.0), Ok(1.0));
        assert!(check_threshold(1.5).is_err());
        assert!(check_threshold(-0.1).is_err());
        assert!(check_threshold(f64::NAN).is_err());
    }

    #[test]
    fn test_rim_block_marked() {
        let mut bytes = vec![0u8; 5];
        bytes.extend(tape(&[0o327751, 0o730002, 0o607751]));
        bytes.extend([0u8; 3]);
        let c = classify(&bytes);
        assert!(c.binary_pass);
        assert_eq!(c.blocks.len(), 1);
        assert_eq!(c.blocks[0].kind, BlockKind::Rim);
        assert!(c.lines[..5].iter().all(|&t| t == LineType::Leader));
        assert!(c.lines[5..14].iter().all(|&t| t == LineType::Rim));
        assert!(c.lines[14..].iter().all(|&t| t == LineType::Leader));
    }

    #[test]
    fn test_bin_block_marked() {
        let bytes = tape(&[0o320000, 0o320002, 0o111111, 0o222222, 0o333333]);
        let c = classify(&bytes);
        assert_eq!(c.blocks.len(), 1);
        assert_eq!(c.blocks[0].len, 5);
        assert_eq!(c.lines.len(), 15);
        assert!(c.lines.iter().all(|&t| t == LineType::Bin));
    }

    #[test]
    fn test_separate_runs_merge_word_indices() {
        let mut bytes = tape(&[0o320100, 0o200000, 0o600100]);
        bytes.push(0);
        bytes.extend(tape(&[0o320000, 0o320000, 0o7]));
        let c = classify(&bytes);
        assert_eq!(c.words.len(), 6);
        assert_eq!(c.blocks.len(), 2);
        assert_eq!(c.blocks[1].start, 3);
        assert_eq!(c.blocks[1].kind, BlockKind::Bin);
        assert_eq!(c.words[c.blocks[1].start].index, 10);
        assert_eq!(c.lines[9], LineType::Leader);
        assert!(c.lines[10..].iter().all(|&t| t == LineType::Bin));
    }

    #[test]
    fn test_unrecognised_binary_falls_back() {
        // 奇数パリティのマーカー付きバイト（ブロックなし）
        let bytes = [0o201, 0o202, 0o204, 0o201];
        let c = classify(&bytes);
        assert!(c.binary_pass);
        assert!(c.blocks.is_empty());
        assert!(c.lines.iter().all(|&t| t == LineType::GenericBinary));
    }

    #[test]
    fn test_trailing_partial_word() {
        let mut bytes = tape(&[0o320000, 0o320000, 0o5]);
        bytes.extend([0o201, 0o201]);
        let c = classify(&bytes);
        assert!(c.lines[..9].iter().all(|&t| t == LineType::Bin));
        assert_eq!(c.lines[9], LineType::GenericBinary);
        assert_eq!(c.lines[10], LineType::GenericBinary);
    }

    #[test]
    fn test_deterministic() {
        let bytes: Vec<u8> = (0..=255u8).rev().cycle().take(2000).collect();
        let a = classify(&bytes);
        let b = classify(&bytes);
        assert_eq!(a.lines, b.lines);
        assert_eq!(a.blocks, b.blocks);
    }
}
