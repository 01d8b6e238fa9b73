// Helvetica (standard 14) のメトリクスとテキスト描画オペレータ

/// Helvetica の AFM グリフ幅（1000 units/em）。WinAnsi 0x20..=0x7E。
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // space ../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 0 .. ?
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // @ .. O
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // P .. _
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // ` .. o
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // p .. ~
];

/// Helvetica の AFM グリフ幅。WinAnsi 0xA0..=0xFF（Latin-1 と同じ並び）。
const HELVETICA_LATIN1_WIDTHS: [u16; 96] = [
    278, 333, 556, 556, 556, 556, 260, 556, 333, 737, 370, 556, 584, 333, 737, 333, // nbsp .. macron
    400, 584, 333, 333, 333, 556, 537, 278, 333, 333, 365, 556, 834, 834, 834, 611, // degree .. questiondown
    667, 667, 667, 667, 667, 667, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278, // Agrave .. Idieresis
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611, // Eth .. germandbls
    556, 556, 556, 556, 556, 556, 889, 500, 556, 556, 556, 556, 278, 278, 278, 278, // agrave .. idieresis
    556, 556, 556, 556, 556, 556, 556, 584, 611, 556, 556, 556, 556, 500, 556, 500, // eth .. ydieresis
];

/// 表にないグリフ（`?` に置き換わる前の制御文字など）に使う幅。
const DEFAULT_WIDTH: u16 = 556;

const HELVETICA_ASCENDER: f64 = 718.0;
const HELVETICA_DESCENDER: f64 = -207.0;

fn glyph_width(byte: u8) -> u16 {
    match byte {
        0x20..=0x7E => HELVETICA_WIDTHS[(byte - 0x20) as usize],
        0xA0..=0xFF => HELVETICA_LATIN1_WIDTHS[(byte - 0xA0) as usize],
        _ => DEFAULT_WIDTH,
    }
}

/// 指定サイズで描画したときのテキスト幅（pt）。
pub fn text_width(text: &str, size: f64) -> f64 {
    let units: u32 = encode_win_ansi(text)
        .into_iter()
        .map(|b| u32::from(glyph_width(b)))
        .sum();
    f64::from(units) * size / 1000.0
}

/// 指定サイズでのフォントの高さ（ascender - descender, pt）。
pub fn text_height(size: f64) -> f64 {
    (HELVETICA_ASCENDER - HELVETICA_DESCENDER) * size / 1000.0
}

/// テキストを WinAnsi バイト列に変換する。
///
/// Latin-1 で表現できない文字と C1 制御文字は `?` になる。
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match u32::from(c) {
            code @ 0x20..=0x7E | code @ 0xA0..=0xFF => code as u8,
            _ => b'?',
        })
        .collect()
}

/// PDF リテラル文字列として `( ) \` をエスケープする。
pub fn escape_literal(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() + 2);
    for &b in bytes {
        if matches!(b, b'(' | b')' | b'\\') {
            out.push(b'\\');
        }
        out.push(b);
    }
    out
}

/// Where and how a single line of text is drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct TextPlacement {
    pub x: f64,
    pub y: f64,
    pub size: f64,
    /// 反時計回りの回転角（度）。
    pub rotate_deg: f64,
    /// 0.0 (black) ..= 1.0 (white)
    pub gray: f64,
}

/// Build the operators that draw `text` at `placement` using font resource
/// `font_name`, optionally switching to graphics state `gs_name` first.
pub fn text_operators(
    text: &str,
    placement: &TextPlacement,
    font_name: &str,
    gs_name: Option<&str>,
) -> Vec<u8> {
    let radians = placement.rotate_deg.to_radians();
    let (sin, cos) = radians.sin_cos();

    let mut ops = Vec::new();
    ops.extend_from_slice(b"q\n");
    if let Some(gs) = gs_name {
        ops.extend_from_slice(format!("/{gs} gs\n").as_bytes());
    }
    ops.extend_from_slice(b"BT\n");
    ops.extend_from_slice(format!("{} g\n", fmt_num(placement.gray)).as_bytes());
    ops.extend_from_slice(format!("/{font_name} {} Tf\n", fmt_num(placement.size)).as_bytes());
    ops.extend_from_slice(
        format!(
            "{} {} {} {} {} {} Tm\n",
            fmt_num(cos),
            fmt_num(sin),
            fmt_num(-sin),
            fmt_num(cos),
            fmt_num(placement.x),
            fmt_num(placement.y)
        )
        .as_bytes(),
    );
    ops.push(b'(');
    ops.extend_from_slice(&escape_literal(&encode_win_ansi(text)));
    ops.extend_from_slice(b") Tj\nET\nQ\n");
    ops
}

/// 数値を content stream 用に整形する（小数4桁、末尾の0を除去）。
pub fn fmt_num(value: f64) -> String {
    let s = format!("{value:.4}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    match s {
        "-0" | "" => "0".to_string(),
        other => other.to_string(),
    }
}
