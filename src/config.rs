//! 設定ファイル管理モジュール
//!
//! デコーダの設定をJSON形式で永続化

use crate::classify::{check_threshold, ALPHA_THRESHOLD};
use crate::tape::DEFAULT_LEADER_KEEP;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// 設定ファイルのデフォルトファイル名
const CONFIG_FILENAME: &str = "ptape_config.json";

/// 実行ファイルのディレクトリを取得
pub fn get_exe_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// 設定ファイルのパスを取得
pub fn get_config_path() -> PathBuf {
    get_exe_dir().join(CONFIG_FILENAME)
}

/// デコーダ設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// 英数字テープとみなす割合の閾値
    #[serde(default = "default_alpha_threshold")]
    pub alpha_threshold: f64,
    /// 先頭リーダーのうち表示に残す行数
    #[serde(default = "default_leader_keep")]
    pub leader_keep: usize,
    /// 一覧の行数（0 = 全部）
    #[serde(default)]
    pub width: usize,
    /// 一覧の表示列（"holes+octal+char+kind" 形式）
    #[serde(default = "default_columns")]
    pub columns: String,
    /// 最後に開いたテープ
    #[serde(default)]
    pub last_tape: Option<String>,
}

fn default_alpha_threshold() -> f64 { ALPHA_THRESHOLD }
fn default_leader_keep() -> usize { DEFAULT_LEADER_KEEP }
fn default_columns() -> String { "holes+octal+char+kind".to_string() }

impl Default for Config {
    fn default() -> Self {
        Config {
            alpha_threshold: default_alpha_threshold(),
            leader_keep: default_leader_keep(),
            width: 0,
            columns: default_columns(),
            last_tape: None,
        }
    }
}

impl Config {
    /// オプション指定で設定ファイルを読み込む
    /// config_path が指定されていればそれを、なければ実行ファイルディレクトリのものを使う
    pub fn load_with_options(config_path: Option<&str>) -> (Self, PathBuf) {
        let config_file_path = match config_path {
            Some(path) => PathBuf::from(path),
            None => get_config_path(),
        };
        let config = Self::load_from(&config_file_path);
        (config, config_file_path)
    }

    /// 指定したパスから設定を読み込む（読めなければデフォルト）
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<Config>(&content) {
                Ok(config) => config.sanitized(),
                Err(e) => {
                    log::warn!(
                        "Failed to parse config {:?}: {}, using defaults",
                        path.as_ref(),
                        e
                    );
                    Config::default()
                }
            },
            Err(_) => Config::default(),
        }
    }

    /// 範囲外の閾値はデフォルトに戻す
    fn sanitized(mut self) -> Self {
        if check_threshold(self.alpha_threshold).is_err() {
            log::warn!(
                "alpha_threshold {} out of range, using {}",
                self.alpha_threshold,
                ALPHA_THRESHOLD
            );
            self.alpha_threshold = ALPHA_THRESHOLD;
        }
        self
    }

    /// 指定したパスに設定を保存する
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), String> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;
        fs::write(path, json).map_err(|e| format!("Failed to write config: {}", e))?;
        Ok(())
    }
}
