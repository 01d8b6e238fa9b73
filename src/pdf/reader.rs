use std::collections::HashMap;
use std::path::Path;

use lopdf::{Document, Object, ObjectId};

use crate::error::PdfMantraError;
use crate::pdf::metadata::{self, DocumentMetadata};

pub struct PdfReader {
    doc: Document,
}

impl PdfReader {
    /// PDFファイルを開いてPdfReaderを作成する。
    pub fn open(path: impl AsRef<Path>) -> crate::error::Result<Self> {
        let path = path.as_ref();
        let doc = Document::load(path).map_err(|e| {
            PdfMantraError::pdf_read(format!("failed to load {}: {e}", path.display()))
        })?;
        Ok(Self { doc })
    }

    /// メモリ上のPDFバイト列からPdfReaderを作成する。
    pub fn from_bytes(bytes: &[u8]) -> crate::error::Result<Self> {
        let doc = Document::load_mem(bytes)?;
        Ok(Self { doc })
    }

    /// 内部のlopdf Documentへの参照を返す。
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// 内部のlopdf Documentを取り出す。
    pub fn into_document(self) -> Document {
        self.doc
    }

    /// ページ数を返す。
    pub fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    /// 指定ページ(1-indexed)のMediaBoxからページ寸法(width_pts, height_pts)を返す。
    pub fn page_dimensions(&self, page_num: u32) -> crate::error::Result<(f64, f64)> {
        let page_id = self.get_page_id(page_num)?;
        page_size(&self.doc, page_id)
    }

    /// 指定ページ(1-indexed)の回転角（0, 90, 180, 270）を返す。
    pub fn page_rotation(&self, page_num: u32) -> crate::error::Result<i64> {
        let page_id = self.get_page_id(page_num)?;
        Ok(page_rotation(&self.doc, page_id))
    }

    /// ドキュメント情報辞書とページ数を返す。
    pub fn metadata(&self) -> DocumentMetadata {
        metadata::read_metadata(&self.doc)
    }

    /// 指定ページ(1-indexed)のXObjectリソースのうち、Subtype=ImageのXObject名一覧を返す。
    pub fn page_image_names(&self, page_num: u32) -> crate::error::Result<Vec<String>> {
        let mut names: Vec<String> = self.page_image_streams(page_num)?.into_keys().collect();
        names.sort();
        Ok(names)
    }

    /// 指定ページ(1-indexed)のXObjectリソースから画像Streamオブジェクトを取得する。
    ///
    /// XObject名をキー、lopdf::Streamを値とするHashMapを返す。
    pub fn page_image_streams(
        &self,
        page_num: u32,
    ) -> crate::error::Result<HashMap<String, lopdf::Stream>> {
        let page_id = self.get_page_id(page_num)?;
        let (resource_dict, resource_ids) = self.doc.get_page_resources(page_id)?;

        let mut streams = HashMap::new();

        // ページ辞書に直接埋め込まれたResources
        if let Some(dict) = resource_dict {
            self.collect_image_streams_from_dict(dict, &mut streams)?;
        }
        // 参照されているResources（親ページツリーから継承されたものも含む）
        for res_id in resource_ids {
            let dict = self.doc.get_dictionary(res_id)?;
            self.collect_image_streams_from_dict(dict, &mut streams)?;
        }

        Ok(streams)
    }

    /// リソース辞書のXObjectエントリからSubtype=Imageのストリームを収集する。
    fn collect_image_streams_from_dict(
        &self,
        dict: &lopdf::Dictionary,
        streams: &mut HashMap<String, lopdf::Stream>,
    ) -> crate::error::Result<()> {
        let xobject_dict = match dict.get(b"XObject") {
            Ok(Object::Dictionary(d)) => d,
            Ok(Object::Reference(id)) => self.doc.get_object(*id).and_then(Object::as_dict)?,
            _ => return Ok(()), // XObjectエントリがない場合は何もしない
        };

        for (name_bytes, value) in xobject_dict.iter() {
            let stream = match value {
                Object::Reference(id) => self.doc.get_object(*id).and_then(Object::as_stream)?,
                Object::Stream(s) => s,
                _ => continue,
            };

            if let Ok(subtype) = stream.dict.get(b"Subtype").and_then(Object::as_name)
                && subtype == b"Image"
            {
                let name = String::from_utf8_lossy(name_bytes).into_owned();
                streams.insert(name, stream.clone());
            }
        }

        Ok(())
    }

    /// ページ番号(1-indexed)からObjectIdを取得する。
    fn get_page_id(&self, page_num: u32) -> crate::error::Result<ObjectId> {
        page_id(&self.doc, page_num)
    }
}

/// ページ番号(1-indexed)からObjectIdを取得する。
pub fn page_id(doc: &Document, page_num: u32) -> crate::error::Result<ObjectId> {
    doc.get_pages().get(&page_num).copied().ok_or_else(|| {
        PdfMantraError::page_range(format!(
            "page {} not found (document has {} pages)",
            page_num,
            doc.get_pages().len()
        ))
    })
}

/// ページ辞書の属性を `/Parent` をたどって継承込みで取得する。
pub fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = Some(page_id);
    // 壊れたページツリーの循環参照で無限ループしないよう深さを制限する
    let mut depth = 0;
    while let Some(id) = current {
        if depth > 64 {
            return None;
        }
        let dict = doc.get_dictionary(id).ok()?;
        if let Ok(obj) = dict.get(key) {
            return Some(obj.clone());
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok();
        depth += 1;
    }
    None
}

pub(crate) fn object_to_f64(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(f) => Some(*f as f64),
        _ => None,
    }
}

/// ページのMediaBoxから(width, height)を返す。
pub fn page_size(doc: &Document, page_id: ObjectId) -> crate::error::Result<(f64, f64)> {
    let media_box = inherited_attribute(doc, page_id, b"MediaBox")
        .ok_or_else(|| PdfMantraError::pdf_read("MediaBox not found"))?;
    let media_box = match media_box {
        Object::Reference(id) => doc.get_object(id)?.clone(),
        other => other,
    };

    let values = media_box
        .as_array()?
        .iter()
        .map(object_to_f64)
        .collect::<Option<Vec<f64>>>()
        .ok_or_else(|| PdfMantraError::pdf_read("Invalid MediaBox value"))?;
    if values.len() < 4 {
        return Err(PdfMantraError::pdf_read("Invalid MediaBox"));
    }

    let width = (values[2] - values[0]).abs();
    let height = (values[3] - values[1]).abs();
    if width <= 0.0 || height <= 0.0 {
        return Err(PdfMantraError::pdf_read(
            "Invalid MediaBox: non-positive page dimensions",
        ));
    }
    Ok((width, height))
}

/// ページの `/Rotate` を継承込みで取得し、0..360 に正規化する。
pub fn page_rotation(doc: &Document, page_id: ObjectId) -> i64 {
    inherited_attribute(doc, page_id, b"Rotate")
        .and_then(|obj| obj.as_i64().ok())
        .map(normalize_rotation)
        .unwrap_or(0)
}

/// 角度を 0..360 の範囲に正規化する。
pub fn normalize_rotation(angle: i64) -> i64 {
    angle.rem_euclid(360)
}
