//! Block Extraction Module
//!
//! 原文列を見出し行と検証行の間で走査し、大文字のみの見出し行で区切られた
//! ブロックに分割するモジュール。

use log::debug;

use crate::error::LeafletError;
use crate::layout::Layout;
use crate::types::{row_number, CellCoord, Table};

/// 原文列の名前付きブロック
///
/// 見出し行の次の行（`start_row`）から`end_row`までの連続した行を保持します。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    title: String,
    start_row: usize,
    end_row: usize,
    data: Vec<String>,
}

impl Block {
    /// ブロックを生成する
    ///
    /// # 制約
    ///
    /// * `title`が空でないこと
    /// * `start_row >= 1`かつ`end_row > start_row`
    /// * `data.len() == end_row - start_row + 1`
    ///
    /// 制約違反の場合は`LeafletError::InvalidBlock`を返します。
    pub fn new(
        title: impl Into<String>,
        start_row: usize,
        end_row: usize,
        data: Vec<String>,
    ) -> Result<Self, LeafletError> {
        let title = title.into();
        let invalid = |message: String| LeafletError::InvalidBlock {
            title: title.clone(),
            message,
        };
        if title.is_empty() {
            return Err(invalid("title is empty".to_string()));
        }
        if start_row == 0 || end_row <= start_row {
            return Err(invalid(format!(
                "rows {}..{} must span at least two rows below the title",
                row_number(start_row),
                row_number(end_row)
            )));
        }
        if data.len() != end_row - start_row + 1 {
            return Err(invalid(format!(
                "{} values for rows {}..{}",
                data.len(),
                row_number(start_row),
                row_number(end_row)
            )));
        }
        Ok(Self {
            title,
            start_row,
            end_row,
            data,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn start_row(&self) -> usize {
        self.start_row
    }

    pub fn end_row(&self) -> usize {
        self.end_row
    }

    /// ブロックの行範囲（両端を含む）
    pub fn rows(&self) -> std::ops::RangeInclusive<usize> {
        self.start_row..=self.end_row
    }

    /// 原文の各行
    pub fn data(&self) -> &[String] {
        &self.data
    }

    /// 行数
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// 見出し行かどうかを判定する
///
/// 大文字の文字を1つ以上含み、小文字の文字を含まない行を見出し行とします。
/// 数字や記号は判定に影響しません（`"GREETINGS 1"`は見出し行）。
pub fn is_title_row(value: &str) -> bool {
    let mut has_upper = false;
    for c in value.chars() {
        if c.is_lowercase() {
            return false;
        }
        has_upper |= c.is_uppercase();
    }
    has_upper
}

/// 原文列からブロックを抽出する
///
/// 見出し行の次の行から検証行の前の行までを走査します。最初の見出し行より前の行は
/// 無視されます。
///
/// # 発生し得るエラー
///
/// * `LeafletError::NoBlocks`: 見出し行が一つもない場合
/// * `LeafletError::EmptyBlock`: データ行のないブロックがある場合
/// * `LeafletError::InvalidBlock`: ブロックの不変条件に違反した場合
pub fn extract_blocks(table: &Table, layout: &Layout) -> Result<Vec<Block>, LeafletError> {
    let column = layout.original_column;
    let first = layout.header_row + 1;
    let last = layout.validate_row;

    let mut blocks = Vec::new();
    let mut title_row: Option<usize> = None;

    for row in first..last {
        let value = table.cell(column, row);
        if is_title_row(value) {
            if let Some(title) = title_row {
                blocks.push(close_block(table, column, title, row)?);
            }
            title_row = Some(row);
        } else if title_row.is_none() {
            debug!("Skipping row {} before the first block", row_number(row));
        }
    }

    let title = title_row.ok_or(LeafletError::NoBlocks {
        first: row_number(first),
        last: row_number(last.saturating_sub(1)),
    })?;
    blocks.push(close_block(table, column, title, last)?);

    Ok(blocks)
}

/// `title_row`の次の行から`next_row`の前の行までをブロックとして閉じる
fn close_block(
    table: &Table,
    column: usize,
    title_row: usize,
    next_row: usize,
) -> Result<Block, LeafletError> {
    let title = table.cell(column, title_row);
    if next_row <= title_row + 1 {
        return Err(LeafletError::EmptyBlock {
            title: title.to_string(),
            cell: CellCoord::new(title_row, column).to_a1_notation(),
        });
    }
    let data = (title_row + 1..next_row)
        .map(|row| table.cell(column, row).to_string())
        .collect();
    Block::new(title, title_row + 1, next_row - 1, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(header_row: usize, validate_row: usize) -> Layout {
        Layout {
            original_column: 0,
            header_row,
            validate_row,
        }
    }

    #[test]
    fn test_is_title_row() {
        assert!(is_title_row("GREETINGS"));
        assert!(is_title_row("ПРИВЕТСТВИЯ"));
        assert!(is_title_row("GREETINGS 1"));
        assert!(is_title_row("ON BOARD / НА БОРТУ"));
        assert!(!is_title_row("Greetings"));
        assert!(!is_title_row("Говорите по (местному)"));
        assert!(!is_title_row(""));
        assert!(!is_title_row("123"));
        assert!(!is_title_row("   "));
    }

    #[test]
    fn test_extract_two_blocks() {
        let table = Table::from_columns(vec![vec![
            "Русский", "GREETINGS", "Привет", "Пока", "SAFETY", "Стоп", "Жди", "Готово",
        ]]);
        let blocks = extract_blocks(&table, &layout(0, 7)).unwrap();

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].title(), "GREETINGS");
        assert_eq!(blocks[0].rows(), 2..=3);
        assert_eq!(blocks[0].data(), ["Привет", "Пока"]);
        assert_eq!(blocks[1].title(), "SAFETY");
        assert_eq!(blocks[1].rows(), 5..=6);
        assert_eq!(blocks[1].data(), ["Стоп", "Жди"]);
    }

    #[test]
    fn test_rows_before_first_title_are_skipped() {
        let table = Table::from_columns(vec![vec![
            "Русский", "примечание", "GREETINGS", "Привет", "Пока", "Готово",
        ]]);
        let blocks = extract_blocks(&table, &layout(0, 5)).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].rows(), 3..=4);
    }

    #[test]
    fn test_no_title_rows() {
        let table = Table::from_columns(vec![vec!["Русский", "Привет", "Пока", "Готово"]]);
        assert!(matches!(
            extract_blocks(&table, &layout(0, 3)),
            Err(LeafletError::NoBlocks { first: 2, last: 3 })
        ));
    }

    #[test]
    fn test_last_block_empty() {
        let table = Table::from_columns(vec![vec![
            "Русский", "GREETINGS", "Привет", "Пока", "SAFETY", "Готово",
        ]]);
        match extract_blocks(&table, &layout(0, 5)) {
            Err(LeafletError::EmptyBlock { title, cell }) => {
                assert_eq!(title, "SAFETY");
                assert_eq!(cell, "A5");
            }
            other => panic!("Expected EmptyBlock, got {:?}", other),
        }
    }

    #[test]
    fn test_adjacent_titles() {
        let table = Table::from_columns(vec![vec![
            "Русский", "GREETINGS", "SAFETY", "Стоп", "Жди", "Готово",
        ]]);
        assert!(matches!(
            extract_blocks(&table, &layout(0, 5)),
            Err(LeafletError::EmptyBlock { ref title, .. }) if title == "GREETINGS"
        ));
    }

    #[test]
    fn test_single_row_block_is_invalid() {
        let table = Table::from_columns(vec![vec!["Русский", "GREETINGS", "Привет", "Готово"]]);
        assert!(matches!(
            extract_blocks(&table, &layout(0, 3)),
            Err(LeafletError::InvalidBlock { .. })
        ));
    }

    #[test]
    fn test_block_new_invariants() {
        let data = vec!["a".to_string(), "b".to_string()];
        assert!(Block::new("T", 2, 3, data.clone()).is_ok());
        assert!(Block::new("", 2, 3, data.clone()).is_err());
        assert!(Block::new("T", 0, 1, data.clone()).is_err());
        assert!(Block::new("T", 3, 3, vec!["a".to_string()]).is_err());
        assert!(Block::new("T", 2, 4, data).is_err());
    }
}
