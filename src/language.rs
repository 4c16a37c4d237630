//! Language Extraction Module
//!
//! 原文列の右側にある言語列のペアを走査し、検証済みの言語ごとに
//! テンプレートへ渡すレコードを構築するモジュール。

use log::info;
use serde::ser::SerializeTuple;
use serde::{Serialize, Serializer};

use crate::api::{IdentifierRule, LocalFormRule};
use crate::blocks::Block;
use crate::error::LeafletError;
use crate::layout::Layout;
use crate::types::{column_letter, CellCoord, Table};

/// 言語レコードの抽出設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// 原文中でローカル形に置き換えるプレースホルダー
    pub placeholder: String,

    /// 言語識別子の規則
    pub identifier_rule: IdentifierRule,

    /// ローカル形の導出規則
    pub local_form_rule: LocalFormRule,
}

/// ブロック内の1行: (置換済みの原文, 1列目の訳文, 2列目の訳文)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phrase {
    pub original: String,
    pub first: String,
    pub second: String,
}

// テンプレート側では `{% for original, first, second in rows %}` で展開する
impl Serialize for Phrase {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(3)?;
        tuple.serialize_element(&self.original)?;
        tuple.serialize_element(&self.first)?;
        tuple.serialize_element(&self.second)?;
        tuple.end()
    }
}

/// 言語ごとのブロック: (見出し, 行のリスト)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockText {
    pub title: String,
    pub rows: Vec<Phrase>,
}

impl Serialize for BlockText {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&self.title)?;
        tuple.serialize_element(&self.rows)?;
        tuple.end()
    }
}

/// 検証済みの1言語分のレコード
///
/// シリアライズ結果がそのままテンプレートのコンテキストになります。
/// フィールド名はテンプレート内の変数名と一致します。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageRecord {
    /// 1列目の見出し（その言語自身による言語名）
    pub native: String,

    /// 2列目の見出し（言語識別子）
    pub name: String,

    /// プレースホルダーを置き換えるローカル形
    #[serde(rename = "byName")]
    pub by_name: String,

    /// 見出し行の次の行の注記（空でもよい）
    pub note: String,

    /// 翻訳者
    pub translator: String,

    /// 翻訳者の連絡先
    pub contact: String,

    /// ブロックごとの行
    pub data: Vec<BlockText>,
}

impl LanguageRecord {
    /// 出力ファイル名に使用する言語識別子
    pub fn identifier(&self) -> &str {
        &self.name
    }
}

/// 言語名からローカル形を導出する
///
/// * `DropLastChar`: 末尾の1文字を取り除き、全体を小文字にする
/// * `LowercaseFirst`: 先頭の1文字だけを小文字にする
pub fn local_form(name: &str, rule: LocalFormRule) -> String {
    match rule {
        LocalFormRule::DropLastChar => {
            let mut chars = name.chars();
            chars.next_back();
            chars.as_str().to_lowercase()
        }
        LocalFormRule::LowercaseFirst => {
            let mut chars = name.chars();
            match chars.next() {
                Some(first) => first.to_lowercase().chain(chars).collect(),
                None => String::new(),
            }
        }
    }
}

/// 言語識別子が規則に合うかを検証する
///
/// * `Name`: 5文字以上
/// * `Code`: 大文字のみの2文字
pub fn validate_identifier(identifier: &str, rule: IdentifierRule) -> Result<(), String> {
    let len = identifier.chars().count();
    match rule {
        IdentifierRule::Name if len < 5 => Err(format!(
            "language name must have at least 5 characters, got {}",
            len
        )),
        IdentifierRule::Code if len != 2 || !identifier.chars().all(char::is_uppercase) => {
            Err("language code must be exactly 2 uppercase letters".to_string())
        }
        _ => Ok(()),
    }
}

/// 全言語列のペアからレコードを抽出する
///
/// 原文列の次の列から2列ずつ進み、ペアの1列目の検証行セルが（前後の空白を除いて）
/// 空でないペアだけを言語として扱います。
pub fn extract_languages(
    table: &Table,
    layout: &Layout,
    blocks: &[Block],
    options: &ExtractOptions,
) -> Result<Vec<LanguageRecord>, LeafletError> {
    let mut languages = Vec::new();
    let mut col = layout.original_column + 1;
    while col < table.width() {
        if is_validated(table, layout, col) {
            let record = build_record(table, layout, col, blocks, options)?;
            info!(
                "{} {} {} {}",
                record.native, record.name, record.translator, record.contact
            );
            languages.push(record);
        }
        col += 2;
    }
    Ok(languages)
}

/// 翻訳者が検証行に記入済みかどうか
pub fn is_validated(table: &Table, layout: &Layout, col: usize) -> bool {
    !table.cell(col, layout.validate_row).trim().is_empty()
}

/// `col`と`col + 1`の2列から1言語分のレコードを構築する
pub fn build_record(
    table: &Table,
    layout: &Layout,
    col: usize,
    blocks: &[Block],
    options: &ExtractOptions,
) -> Result<LanguageRecord, LeafletError> {
    if col + 1 >= table.width() {
        return Err(LeafletError::UnpairedColumn {
            column: column_letter(col),
        });
    }
    let header = layout.header_row;
    let validate = layout.validate_row;
    let cell = |c: usize, r: usize| table.cell(c, r).to_string();
    let a1 = |c: usize, r: usize| CellCoord::new(r, c).to_a1_notation();

    let name = cell(col + 1, header);
    let language = if name.is_empty() {
        column_letter(col + 1)
    } else {
        name.clone()
    };
    let missing = |field: &'static str, c: usize, r: usize| LeafletError::MissingField {
        language: language.clone(),
        field,
        cell: a1(c, r),
    };

    let native = cell(col, header);
    if native.is_empty() {
        return Err(missing("native name", col, header));
    }
    validate_identifier(&name, options.identifier_rule).map_err(|message| {
        LeafletError::InvalidIdentifier {
            identifier: name.clone(),
            cell: a1(col + 1, header),
            message,
        }
    })?;
    let translator = cell(col, validate);
    if translator.is_empty() {
        return Err(missing("translator", col, validate));
    }
    let contact = cell(col + 1, validate);
    if contact.is_empty() {
        return Err(missing("contact", col + 1, validate));
    }

    let local_source = match options.identifier_rule {
        IdentifierRule::Code => &native,
        _ => &name,
    };
    let by_name = local_form(local_source, options.local_form_rule);

    let data = blocks
        .iter()
        .map(|block| BlockText {
            title: block.title().to_string(),
            rows: block
                .data()
                .iter()
                .zip(block.rows())
                .map(|(original, row)| Phrase {
                    original: original.replace(&options.placeholder, &by_name),
                    first: cell(col, row),
                    second: cell(col + 1, row),
                })
                .collect(),
        })
        .collect();

    Ok(LanguageRecord {
        native,
        name,
        by_name,
        note: cell(col, header + 1),
        translator,
        contact,
        data,
    })
}
