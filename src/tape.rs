//! 紙テープ全体のデコード結果
//!
//! 分類（3パス）とシフト付きデコードを合わせ、1バイトごとのレコードを作る。
//! レコード列が表示側・テキスト出力側へ渡す唯一のインターフェース。

use crate::blocks::{Block, BlockKind};
use crate::classify::{classify_with_threshold, Classification, LineType, ALPHA_THRESHOLD};
use crate::decoder::{Decoded, ShiftDecoder, ShiftState};
use crate::words::Word;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 先頭リーダーをスキップするときに残す行数
pub const DEFAULT_LEADER_KEEP: usize = 5;

/// 1バイト分のデコード結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TapeLine {
    /// テープ上の生バイト
    pub byte: u8,
    /// デコードした文字（制御コードは出力なし）
    pub decoded: Decoded,
    /// このバイト処理後のシフト状態
    pub shift: ShiftState,
    /// 行の種類
    pub kind: LineType,
}

impl TapeLine {
    /// 出力文字列
    pub fn text(&self) -> String {
        self.decoded.text()
    }
}

/// 分類とデコードを合わせる
fn combine(bytes: &[u8], classification: &Classification) -> Vec<TapeLine> {
    let mut decoder = ShiftDecoder::new();
    bytes
        .iter()
        .zip(&classification.lines)
        .map(|(&byte, &kind)| {
            let decoded = decoder.step(byte);
            TapeLine {
                byte,
                decoded,
                shift: decoder.shift(),
                kind,
            }
        })
        .collect()
}

/// バイト列 → レコード列（純粋関数）
pub fn decode_tape(bytes: &[u8]) -> Vec<TapeLine> {
    combine(bytes, &classify_with_threshold(bytes, ALPHA_THRESHOLD))
}

/// 改行コードを LF に統一
pub fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// 種類ごとの集計
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TapeSummary {
    pub total: usize,
    pub leader: usize,
    pub label: usize,
    pub alphanumeric: usize,
    pub generic_binary: usize,
    pub rim: usize,
    pub bin: usize,
    pub rim_blocks: usize,
    pub bin_blocks: usize,
    pub words: usize,
    pub alpha_ratio: f64,
}

impl TapeSummary {
    /// 種類ごとの行数
    pub fn count(&self, kind: LineType) -> usize {
        match kind {
            LineType::Leader => self.leader,
            LineType::Label => self.label,
            LineType::Alphanumeric => self.alphanumeric,
            LineType::GenericBinary => self.generic_binary,
            LineType::Rim => self.rim,
            LineType::Bin => self.bin,
        }
    }
}

impl std::fmt::Display for TapeSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Total: {} lines (alpha ratio {:.2})", self.total, self.alpha_ratio)?;
        for kind in LineType::ALL {
            writeln!(f, "  {:<7} {}", kind.name(), self.count(kind))?;
        }
        write!(
            f,
            "Blocks: {} RIM, {} BIN ({} words)",
            self.rim_blocks, self.bin_blocks, self.words
        )
    }
}

/// 読み込んだ紙テープ
pub struct Tape {
    /// 元のバイト列
    pub raw: Vec<u8>,
    /// バイトごとのレコード
    pub lines: Vec<TapeLine>,
    /// 分類の詳細（統計・ワード・ブロック）
    pub classification: Classification,
}

impl Tape {
    /// 既定の閾値でデコード
    pub fn from_bytes(raw: Vec<u8>) -> Self {
        Self::with_threshold(raw, ALPHA_THRESHOLD)
    }

    /// 閾値を指定してデコード
    pub fn with_threshold(raw: Vec<u8>, threshold: f64) -> Self {
        let classification = classify_with_threshold(&raw, threshold);
        let lines = combine(&raw, &classification);
        Tape {
            raw,
            lines,
            classification,
        }
    }

    /// ファイルから読み込む
    pub fn from_file<P: AsRef<Path>>(path: P, threshold: f64) -> Result<Self, String> {
        let raw = fs::read(&path)
            .map_err(|e| format!("Cannot open {}: {}", path.as_ref().display(), e))?;
        log::info!("Loaded tape: {} ({} lines)", path.as_ref().display(), raw.len());
        Ok(Self::with_threshold(raw, threshold))
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// 再構成したワード
    pub fn words(&self) -> &[Word] {
        &self.classification.words
    }

    /// 検出したブロック
    pub fn blocks(&self) -> &[Block] {
        &self.classification.blocks
    }

    /// 表示開始位置（先頭リーダーのうち最後の keep 行は残す）
    pub fn initial_position(&self, keep: usize) -> usize {
        let leading = self.raw.iter().take_while(|&&b| b == 0).count();
        leading.saturating_sub(keep)
    }

    /// デコードしたテキスト（改行は LF に統一）
    pub fn text(&self) -> String {
        let text: String = self.lines.iter().map(TapeLine::text).collect();
        normalize_newlines(&text)
    }

    /// テキストをファイルに書き出す
    pub fn export_text<P: AsRef<Path>>(&self, path: P) -> Result<(), String> {
        fs::write(&path, self.text())
            .map_err(|e| format!("Failed to write {}: {}", path.as_ref().display(), e))?;
        log::info!("Decoded text written to {}", path.as_ref().display());
        Ok(())
    }

    /// 集計
    pub fn summary(&self) -> TapeSummary {
        let mut summary = TapeSummary {
            total: self.lines.len(),
            words: self.classification.words.len(),
            alpha_ratio: self.classification.stats.alpha_ratio(),
            ..Default::default()
        };
        for line in &self.lines {
            match line.kind {
                LineType::Leader => summary.leader += 1,
                LineType::Label => summary.label += 1,
                LineType::Alphanumeric => summary.alphanumeric += 1,
                LineType::GenericBinary => summary.generic_binary += 1,
                LineType::Rim => summary.rim += 1,
                LineType::Bin => summary.bin += 1,
            }
        }
        for block in &self.classification.blocks {
            match block.kind {
                BlockKind::Rim => summary.rim_blocks += 1,
                BlockKind::Bin => summary.bin_blocks += 1,
            }
        }
        summary
    }
}
