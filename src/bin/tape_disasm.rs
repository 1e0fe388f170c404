//! RIM/BIN ブロック一覧
//!
//! 使用方法: cargo run --bin tape_disasm -- <tape_file>
//!
//! 検出したローダーブロックごとに、ロードアドレス・生ワード・ニーモニックを表示する。

use ptape::blocks::{Block, BlockKind};
use ptape::classify::{check_threshold, ALPHA_THRESHOLD};
use ptape::tape::Tape;
use ptape::words::{mnemonic, Word};

use clap::Parser;

/// RIM/BIN loader block listing
#[derive(Parser, Debug)]
#[command(name = "tape_disasm")]
#[command(about = "List RIM/BIN loader blocks on a PDP-1 paper tape", long_about = None)]
struct Args {
    /// 紙テープイメージファイル
    tape: String,

    /// 英数字テープとみなす割合の閾値
    #[arg(long, default_value_t = ALPHA_THRESHOLD)]
    threshold: f64,
}

/// 1ワード分の行
fn format_word(addr: Option<u32>, word: &Word) -> String {
    let addr = match addr {
        Some(a) => format!("{:04o}", a),
        None => "    ".to_string(),
    };
    let text = mnemonic(word.value).unwrap_or_default();
    format!("{}: {:06o}  {}", addr, word.value, text)
}

/// RIM: dio addr / data の組を addr: data として表示
fn print_rim(words: &[Word]) {
    let mut i = 0;
    while i < words.len() {
        let w = &words[i];
        if w.is_dio() {
            if let Some(data) = words.get(i + 1) {
                println!("{}", format_word(Some(w.operand()), data));
            }
            i += 2;
        } else {
            println!("{}  (start)", format_word(None, w));
            i += 1;
        }
    }
}

/// BIN: ヘッダ2ワードの後、開始アドレスから連続
fn print_bin(words: &[Word]) {
    let start = words[0].operand();
    println!("{}  (start)", format_word(None, &words[0]));
    println!("{}  (end)", format_word(None, &words[1]));
    for (offset, w) in words[2..].iter().enumerate() {
        println!("{}", format_word(Some(start + offset as u32), w));
    }
}

fn print_block(tape: &Tape, block: &Block) {
    let words = block.words(tape.words());
    let kind = match block.kind {
        BlockKind::Rim => "RIM",
        BlockKind::Bin => "BIN",
    };
    println!(
        "\n{} block at tape position {} ({} words)",
        kind,
        words[0].index,
        words.len()
    );
    println!("Addr  Raw     Instruction");
    match block.kind {
        BlockKind::Rim => print_rim(words),
        BlockKind::Bin => print_bin(words),
    }
}

fn main() {
    env_logger::init();

    let args = Args::parse();
    let loaded = check_threshold(args.threshold).and_then(|t| Tape::from_file(&args.tape, t));
    let tape = match loaded {
        Ok(tape) => tape,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    println!("Loader blocks of {}", args.tape);
    if !tape.classification.binary_pass {
        println!("Tape looks like text (alpha ratio {:.2}), no block scan", tape.summary().alpha_ratio);
        return;
    }
    if tape.blocks().is_empty() {
        println!("No RIM/BIN blocks found");
        return;
    }
    for block in tape.blocks() {
        print_block(&tape, block);
    }
}
