// ページへのテキスト描画（透かし・ページ番号）

use std::collections::HashMap;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};

use crate::pdf::reader::inherited_attribute;
use crate::pdf::text::{TextPlacement, text_operators};

/// 追加するフォントリソース名。既存リソースと衝突しにくい名前にする。
const FONT_RESOURCE: &str = "MantraHelv";

/// ページにテキストを重ね描きする。
///
/// Helvetica フォントオブジェクトはドキュメントに1つだけ追加し、
/// 不透明度ごとの ExtGState も使い回す。
pub struct PageStamper<'a> {
    doc: &'a mut Document,
    font_id: ObjectId,
    gstates: HashMap<u32, (String, ObjectId)>,
}

impl<'a> PageStamper<'a> {
    pub fn new(doc: &'a mut Document) -> Self {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        Self {
            doc,
            font_id,
            gstates: HashMap::new(),
        }
    }

    /// `text` を `placement` の位置に描画する。`opacity` は 0.0..=1.0。
    pub fn stamp_text(
        &mut self,
        page_id: ObjectId,
        text: &str,
        placement: &TextPlacement,
        opacity: f64,
    ) -> crate::error::Result<()> {
        let gstate = if opacity < 1.0 {
            Some(self.gstate_for(opacity))
        } else {
            None
        };

        install_resources(
            self.doc,
            page_id,
            (FONT_RESOURCE, self.font_id),
            gstate.as_ref().map(|(name, id)| (name.as_str(), *id)),
        )?;

        let ops = text_operators(
            text,
            placement,
            FONT_RESOURCE,
            gstate.as_ref().map(|(name, _)| name.as_str()),
        );
        append_content(self.doc, page_id, ops)
    }

    fn gstate_for(&mut self, opacity: f64) -> (String, ObjectId) {
        let permille = (opacity.clamp(0.0, 1.0) * 1000.0).round() as u32;
        if let Some(existing) = self.gstates.get(&permille) {
            return existing.clone();
        }
        let alpha = permille as f32 / 1000.0;
        let id = self.doc.add_object(dictionary! {
            "Type" => "ExtGState",
            "ca" => alpha,
            "CA" => alpha,
        });
        let entry = (format!("MantraGS{permille}"), id);
        self.gstates.insert(permille, entry.clone());
        entry
    }
}

/// ページの Resources にフォントと（必要なら）ExtGState を登録する。
///
/// Resources が参照・インライン・親からの継承のいずれであっても扱う。
/// 継承されている場合はページ辞書にインラインでコピーしてから追加する。
fn install_resources(
    doc: &mut Document,
    page_id: ObjectId,
    font: (&str, ObjectId),
    gstate: Option<(&str, ObjectId)>,
) -> crate::error::Result<()> {
    let page = doc.get_dictionary(page_id)?;
    let indirect = match page.get(b"Resources") {
        Ok(Object::Reference(id)) => Some(*id),
        _ => None,
    };

    let mut resources = match (indirect, page.get(b"Resources")) {
        (Some(id), _) => doc.get_dictionary(id)?.clone(),
        (None, Ok(Object::Dictionary(dict))) => dict.clone(),
        _ => match inherited_attribute(doc, page_id, b"Resources") {
            Some(Object::Reference(id)) => doc.get_dictionary(id)?.clone(),
            Some(Object::Dictionary(dict)) => dict,
            _ => Dictionary::new(),
        },
    };

    add_named_resource(doc, &mut resources, b"Font", font)?;
    if let Some(gs) = gstate {
        add_named_resource(doc, &mut resources, b"ExtGState", gs)?;
    }

    match indirect {
        Some(id) => *doc.get_dictionary_mut(id)? = resources,
        None => doc.get_dictionary_mut(page_id)?.set("Resources", resources),
    }
    Ok(())
}

fn add_named_resource(
    doc: &Document,
    resources: &mut Dictionary,
    category: &[u8],
    (name, id): (&str, ObjectId),
) -> crate::error::Result<()> {
    let mut sub = match resources.get(category) {
        Ok(Object::Dictionary(dict)) => dict.clone(),
        Ok(Object::Reference(sub_id)) => doc.get_dictionary(*sub_id)?.clone(),
        _ => Dictionary::new(),
    };
    sub.set(name, id);
    resources.set(category, sub);
    Ok(())
}

/// ページのコンテンツ末尾にオペレータ列を追加する。
///
/// 既存コンテンツは `q ... Q` で囲み、グラフィックス状態が追加分に漏れないようにする。
pub fn append_content(
    doc: &mut Document,
    page_id: ObjectId,
    ops: Vec<u8>,
) -> crate::error::Result<()> {
    let existing: Vec<Object> = match doc.get_dictionary(page_id)?.get(b"Contents") {
        Ok(Object::Reference(id)) => match doc.get_object(*id)? {
            Object::Array(items) => items.clone(),
            _ => vec![Object::Reference(*id)],
        },
        Ok(Object::Array(items)) => items.clone(),
        _ => Vec::new(),
    };

    let mut contents = Vec::with_capacity(existing.len() + 2);
    let ops = if existing.is_empty() {
        ops
    } else {
        let open_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        contents.push(Object::Reference(open_id));
        contents.extend(existing);
        // ストリームの連結位置でトークンがつながらないよう改行から始める
        [b"\nQ\n".to_vec(), ops].concat()
    };

    let stamp_id = doc.add_object(Stream::new(Dictionary::new(), ops));
    contents.push(Object::Reference(stamp_id));
    doc.get_dictionary_mut(page_id)?.set("Contents", contents);
    Ok(())
}
