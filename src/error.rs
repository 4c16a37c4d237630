//! Error Types Module
//!
//! クレート全体で使用する構造化エラー型を定義するモジュール。
//! `thiserror`を使用して、エラーの自動変換とメッセージフォーマットを実現する。

use thiserror::Error;

/// gangwaydictクレート全体で使用するエラー型
///
/// スプレッドシートの読み込み、レイアウト検出、テンプレート描画、PDF変換の
/// 各段階で発生するエラーを統一的に扱います。
///
/// # エラーの種類
///
/// - `Io` / `Parse` / `Zip` / `Xml` / `Template`: 外部ライブラリ由来のエラー
/// - `Config`: 設定の検証に失敗したエラー
/// - `SentinelNotFound` などのレイアウトエラー: スプレッドシートが想定した形をしていない
///   （致命的エラーとして実行全体を中断する）
/// - `Export`: PDF変換の失敗（言語単位で記録され、処理は継続する）
///
/// # 使用例
///
/// ```rust,no_run
/// use gangwaydict::LeafletError;
/// use std::fs::File;
///
/// fn open_template(path: &str) -> Result<(), LeafletError> {
///     let _file = File::open(path)?; // Ioエラーが自動的に変換される
///     Ok(())
/// }
/// ```
#[derive(Error, Debug)]
pub enum LeafletError {
    /// I/O操作中に発生したエラー
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// スプレッドシートの解析中に発生したエラー（calamine由来）
    #[error("Failed to parse spreadsheet: {0}")]
    Parse(#[from] calamine::Error),

    /// ZIPアーカイブ（docxテンプレート）の読み書きエラー
    #[error("ZIP archive error: {0}")]
    Zip(String),

    /// XMLの解析エラー（描画結果の検証時）
    #[error("XML error in '{part}': {message}")]
    Xml {
        /// 問題のあったアーカイブ内のパート名
        part: String,
        /// エラーの詳細
        message: String,
    },

    /// テンプレート描画エラー（minijinja由来）
    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    /// 設定の検証に失敗したエラー
    #[error("Configuration error: {0}")]
    Config(String),

    /// セキュリティ制限に違反したエラー
    #[error("Security violation: {0}")]
    SecurityViolation(String),

    /// 原文列の見出し（センチネル文字列）がどの列にも見つからない
    #[error("Original title '{sentinel}' not found in any column")]
    SentinelNotFound {
        /// 探索したセンチネル文字列
        sentinel: String,
    },

    /// 原文列に見出し以降の値が存在しない
    #[error("Original column {column} has no data below the header row")]
    EmptyOriginalColumn {
        /// 列（A1記法の列名）
        column: String,
    },

    /// ブロック見出し行（大文字のみの行）が一つも見つからない
    #[error("No Originals blocks found between rows {first} and {last}")]
    NoBlocks {
        /// 探索範囲の先頭行（1始まり）
        first: usize,
        /// 探索範囲の末尾行（1始まり）
        last: usize,
    },

    /// 見出しの直後にデータ行がないブロック
    #[error("Originals block '{title}' at {cell} is empty")]
    EmptyBlock {
        /// ブロックの見出し
        title: String,
        /// 見出しセル（A1記法）
        cell: String,
    },

    /// ブロックの不変条件違反
    #[error("Invalid block '{title}': {message}")]
    InvalidBlock {
        /// ブロックの見出し
        title: String,
        /// 違反内容
        message: String,
    },

    /// 検証済み言語の必須項目が空
    #[error("No {field} for {language} at {cell}")]
    MissingField {
        /// 言語名（見出しが空の場合は列名）
        language: String,
        /// 項目名
        field: &'static str,
        /// セル（A1記法）
        cell: String,
    },

    /// 言語識別子が規則に合わない
    #[error("Invalid language identifier '{identifier}' at {cell}: {message}")]
    InvalidIdentifier {
        /// 識別子
        identifier: String,
        /// セル（A1記法）
        cell: String,
        /// 違反した規則
        message: String,
    },

    /// 検証済み言語列に対になる列が存在しない
    #[error("Language column {column} has no paired column")]
    UnpairedColumn {
        /// 列（A1記法の列名）
        column: String,
    },

    /// PDF変換の失敗
    #[error("PDF export failed: {0}")]
    Export(String),
}

impl LeafletError {
    /// スプレッドシートの構造に起因する致命的エラーかどうか
    pub fn is_layout_error(&self) -> bool {
        matches!(
            self,
            LeafletError::SentinelNotFound { .. }
                | LeafletError::EmptyOriginalColumn { .. }
                | LeafletError::NoBlocks { .. }
                | LeafletError::EmptyBlock { .. }
                | LeafletError::InvalidBlock { .. }
                | LeafletError::MissingField { .. }
                | LeafletError::InvalidIdentifier { .. }
                | LeafletError::UnpairedColumn { .. }
        )
    }

    /// 原因のエラーをたどった詳細メッセージ
    ///
    /// ログ出力用です。`source()`の連鎖を`caused by:`で連結します。
    pub fn trace(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            message.push_str("\n  caused by: ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        message
    }
}

impl From<zip::result::ZipError> for LeafletError {
    fn from(e: zip::result::ZipError) -> Self {
        LeafletError::Zip(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_io_error() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error: LeafletError = io_err.into();

        match error {
            LeafletError::Io(e) => {
                assert_eq!(e.kind(), io::ErrorKind::NotFound);
            }
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_parse_error_display() {
        let error: LeafletError = calamine::Error::Msg("Corrupted file").into();
        let error_msg = error.to_string();
        assert!(error_msg.contains("Failed to parse spreadsheet"));
        assert!(error_msg.contains("Corrupted file"));
    }

    #[test]
    fn test_trace_includes_source() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "profile is locked");
        let error: LeafletError = io_err.into();
        assert_eq!(
            error.trace(),
            "IO error: profile is locked\n  caused by: profile is locked"
        );

        let error = LeafletError::Export("soffice: exit status: 1".to_string());
        assert_eq!(error.trace(), error.to_string());
    }

    #[test]
    fn test_missing_field_names_language() {
        let error = LeafletError::MissingField {
            language: "Английский".to_string(),
            field: "contact",
            cell: "E40".to_string(),
        };
        assert_eq!(error.to_string(), "No contact for Английский at E40");
        assert!(error.is_layout_error());
    }

    #[test]
    fn test_sentinel_not_found_display() {
        let error = LeafletError::SentinelNotFound {
            sentinel: "Русский".to_string(),
        };
        assert!(error.to_string().contains("'Русский' not found"));
    }

    #[test]
    fn test_export_error_is_not_layout_error() {
        let error = LeafletError::Export("soffice exited with status 1".to_string());
        assert!(!error.is_layout_error());
        assert!(error.to_string().starts_with("PDF export failed"));
    }

    #[test]
    fn test_error_conversion_with_question_mark() {
        fn io_operation() -> Result<(), LeafletError> {
            let _file = std::fs::File::open("nonexistent_template.docx")?;
            Ok(())
        }

        assert!(matches!(io_operation(), Err(LeafletError::Io(_))));
    }
}
