//! PTAPE - PDP-1 Paper Tape Decoder
//!
//! 9穴紙テープのバイト列を解析する:
//! - FIODEC 文字デコード（Lcs/Ucs シフト状態付き）
//! - マーカービット付き3バイト組からの18ビットワード再構成
//! - RIM / BIN ローダーブロック検出
//! - 行ごとの分類（リーダー、ラベル、英数字、バイナリ）

pub mod fiodec;
pub mod decoder;
pub mod words;
pub mod blocks;
pub mod classify;
pub mod tape;
pub mod listing;
pub mod config;
