//! Public API Types
//!
//! 公開APIで使用する列挙型を定義するモジュール。

use serde::Deserialize;

/// 言語識別子の規則
///
/// 言語列の2列目の見出しセル（`name`）をどのように解釈するかを指定します。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum IdentifierRule {
    /// 言語名形式（デフォルト）
    ///
    /// `name`は5文字以上の言語名（例: `Английский`）。
    /// 置換用のローカル形は`name`から導出されます。
    Name,

    /// 言語コード形式
    ///
    /// `name`は大文字2文字のコード（例: `EN`）。
    /// 置換用のローカル形は1列目の見出し（`native`）から導出されます。
    Code,
}

/// ローカル形の導出規則
///
/// 原文中のプレースホルダーを置き換える文字列を言語名から導出する方法です。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum LocalFormRule {
    /// 末尾の1文字を取り除き、全体を小文字にする（デフォルト）
    ///
    /// 例: `Английский` → `английски`
    DropLastChar,

    /// 先頭の1文字だけを小文字にする
    ///
    /// 例: `Español` → `español`
    LowercaseFirst,
}
