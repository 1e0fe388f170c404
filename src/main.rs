//! PTAPE - PDP-1 Paper Tape Decoder
//!
//! 紙テープイメージを読み込み、1バイト1行の一覧・集計・テキスト出力を行う。
//!
//! # 使用方法
//! ```text
//! ptape spacewar.bin --summary
//! ptape manual.fio --text manual.txt
//! ptape ddt.bin --columns all --start 0 --width 64
//! ```

use ptape::classify::check_threshold;
use ptape::config::Config;
use ptape::listing::{self, Columns};
use ptape::tape::Tape;

use clap::Parser;

/// PTAPE - PDP-1 Paper Tape Decoder
#[derive(Parser, Debug)]
#[command(name = "ptape")]
#[command(author = "PTAPE Project")]
#[command(version = "0.1.0")]
#[command(about = "PTAPE - PDP-1 paper tape decoder (FIODEC / RIM / BIN)", long_about = None)]
struct Args {
    /// 紙テープイメージファイル
    tape: String,

    /// デコードしたテキストの出力先
    #[arg(short, long)]
    text: Option<String>,

    /// レコード列をJSONで標準出力へ
    #[arg(long)]
    json: bool,

    /// 集計のみ表示
    #[arg(short, long)]
    summary: bool,

    /// 表示列: holes, octal, char, code, kind, shift, all, none
    /// 複数指定可: holes+octal+kind
    #[arg(short, long)]
    columns: Option<String>,

    /// 表示開始位置（省略時は先頭リーダーをスキップ）
    #[arg(long)]
    start: Option<usize>,

    /// 表示行数（0 = 最後まで）
    #[arg(short, long)]
    width: Option<usize>,

    /// 英数字テープとみなす割合の閾値 (0.0 - 1.0)
    #[arg(long)]
    threshold: Option<f64>,

    /// 設定ファイル（省略時は実行ファイルと同じディレクトリの ptape_config.json）
    #[arg(long)]
    config: Option<String>,

    /// 今回のテープを last_tape として設定ファイルに保存
    #[arg(long)]
    remember: bool,
}

fn run(args: Args) -> Result<(), String> {
    let (mut config, config_path) = Config::load_with_options(args.config.as_deref());
    log::debug!("Config: {:?} ({:?})", config, config_path);

    // コマンドライン指定を優先
    let threshold = check_threshold(args.threshold.unwrap_or(config.alpha_threshold))?;
    let columns: Columns = listing::parse_columns(args.columns.as_deref().unwrap_or(config.columns.as_str()));
    let width = args.width.unwrap_or(config.width);

    let tape = Tape::from_file(&args.tape, threshold)?;
    let summary = tape.summary();
    log::info!(
        "Classified {} lines: {} RIM / {} BIN blocks",
        summary.total,
        summary.rim_blocks,
        summary.bin_blocks
    );

    if args.remember {
        config.last_tape = Some(args.tape.clone());
        config.save_to(&config_path)?;
    }

    if let Some(ref out) = args.text {
        tape.export_text(out)?;
        println!("Decoding complete. Output written to {}", out);
        return Ok(());
    }

    if args.json {
        let json = serde_json::to_string_pretty(&tape.lines)
            .map_err(|e| format!("Failed to serialize records: {}", e))?;
        println!("{}", json);
        return Ok(());
    }

    if args.summary {
        println!("Paper Tape: {}", args.tape);
        println!("{}", summary);
        return Ok(());
    }

    let start = args
        .start
        .unwrap_or_else(|| tape.initial_position(config.leader_keep));
    println!(
        "Paper Tape: {} | Total: {} lines | Starting at {}",
        args.tape,
        tape.len(),
        start
    );
    for row in listing::format_range(&tape.lines, start, width, columns) {
        println!("{}", row);
    }
    if columns.contains(Columns::HOLES) {
        println!("Legend: ● = punched hole, ○ = unpunched, . = sync hole");
    }

    Ok(())
}

fn main() {
    env_logger::init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
