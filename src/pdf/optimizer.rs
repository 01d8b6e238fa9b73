// FlateDecode圧縮、孤立オブジェクト除去

use std::io::Write;

use flate2::Compression;
use flate2::write::ZlibEncoder;
use lopdf::{Document, Object, ObjectId};
use tracing::debug;

/// ドキュメント内の未圧縮ストリームにFlateDecode圧縮を適用する。
///
/// 既にフィルターが設定されているストリームはスキップする（二重圧縮防止）。
/// 圧縮してもサイズが減らないストリームはそのまま残す。
/// 戻り値は圧縮したストリーム数。
pub fn compress_streams(doc: &mut Document, level: u32) -> usize {
    let ids: Vec<ObjectId> = doc.objects.keys().copied().collect();
    let mut compressed_count = 0;

    for id in ids {
        let Some(Object::Stream(stream)) = doc.objects.get_mut(&id) else {
            continue;
        };
        if stream.dict.get(b"Filter").is_ok() || stream.content.is_empty() {
            continue;
        }

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(level.min(9)));
        if encoder.write_all(&stream.content).is_err() {
            continue;
        }
        let Ok(compressed) = encoder.finish() else {
            continue;
        };
        if compressed.len() >= stream.content.len() {
            continue;
        }

        stream.dict.set("Filter", "FlateDecode");
        stream.set_content(compressed);
        compressed_count += 1;
    }

    debug!(streams = compressed_count, level, "compressed streams");
    compressed_count
}

/// 孤立オブジェクト（どこからも参照されていないオブジェクト）を除去する。
///
/// 戻り値は除去したオブジェクト数。
pub fn delete_unused_objects(doc: &mut Document) -> usize {
    doc.prune_objects().len()
}

/// PDF最適化の全パスを順序通りに実行する。
///
/// 1. 孤立オブジェクトを除去
/// 2. 未圧縮ストリームを圧縮
/// 3. オブジェクト番号を詰める
pub fn optimize(doc: &mut Document, level: u32) {
    let pruned = delete_unused_objects(doc);
    let compressed = compress_streams(doc, level);
    doc.renumber_objects();
    debug!(pruned, compressed, "optimized document");
}
