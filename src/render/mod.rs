//! Document Rendering Module
//!
//! 言語レコードをテンプレートに流し込み、言語ごとの文書を保存するモジュール。

mod docx;
mod preprocess;

pub use docx::DocxTemplate;

use std::path::{Path, PathBuf};

use crate::error::LeafletError;
use crate::language::LanguageRecord;

/// 言語レコードから文書を生成する描画エンジン
pub trait DocumentRenderer {
    /// `record`を描画して`output`に保存する
    fn render(&self, record: &LanguageRecord, output: &Path) -> Result<(), LeafletError>;
}

/// ファイル名パターンの`{}`を言語識別子で置き換え、絶対パスにする
///
/// 識別子に含まれるパス区切り文字は`-`に置き換えられます。
pub fn expand_pattern(pattern: &str, identifier: &str) -> Result<PathBuf, LeafletError> {
    let safe = identifier.replace(['/', '\\'], "-");
    let path = PathBuf::from(pattern.replacen("{}", &safe, 1));
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_pattern() {
        let path = expand_pattern("docx/GangwayDict-{}.docx", "Английский").unwrap();
        assert!(path.is_absolute());
        assert!(path.ends_with("docx/GangwayDict-Английский.docx"));
    }

    #[test]
    fn test_expand_pattern_sanitizes_separators() {
        let path = expand_pattern("/tmp/out-{}.pdf", "A/B").unwrap();
        assert_eq!(path, PathBuf::from("/tmp/out-A-B.pdf"));
    }
}
