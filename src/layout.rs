//! Layout Detection Module
//!
//! スプレッドシートの構造（原文列・見出し行・検証行）を検出するモジュール。

use log::info;

use crate::error::LeafletError;
use crate::types::{column_letter, row_number, CellCoord, Table};

/// 検出されたスプレッドシートの構造
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    /// 原文列（センチネル文字列を含む最初の列）
    pub original_column: usize,

    /// 見出し行（センチネル文字列の行）
    pub header_row: usize,

    /// 検証行（原文列の最後の空でないセルの行）
    pub validate_row: usize,
}

impl Layout {
    /// 見出しセルの座標
    pub fn header_cell(&self) -> CellCoord {
        CellCoord::new(self.header_row, self.original_column)
    }

    /// 検証行セルの座標
    pub fn validate_cell(&self) -> CellCoord {
        CellCoord::new(self.validate_row, self.original_column)
    }
}

/// テーブルから構造を検出する
///
/// 列を先頭から順に走査し、`sentinel`と完全一致するセルを最初に含む列を原文列、
/// その行を見出し行とします。原文列を末尾から走査して最初に見つかる空でないセルの行が
/// 検証行です。
///
/// # 発生し得るエラー
///
/// * `LeafletError::SentinelNotFound`: どの列にも`sentinel`がない場合
/// * `LeafletError::EmptyOriginalColumn`: 見出し行より下に値がない場合
pub fn detect(table: &Table, sentinel: &str) -> Result<Layout, LeafletError> {
    let (original_column, header_row) = table
        .columns()
        .enumerate()
        .find_map(|(col, cells)| {
            cells
                .iter()
                .position(|cell| cell == sentinel)
                .map(|row| (col, row))
        })
        .ok_or_else(|| LeafletError::SentinelNotFound {
            sentinel: sentinel.to_string(),
        })?;
    info!("Original column: {}", column_letter(original_column));
    info!("Header row: {}", row_number(header_row));

    let validate_row = table
        .column(original_column)
        .iter()
        .rposition(|cell| !cell.is_empty())
        .filter(|&row| row > header_row)
        .ok_or_else(|| LeafletError::EmptyOriginalColumn {
            column: column_letter(original_column),
        })?;
    info!("Validate row: {}", row_number(validate_row));

    Ok(Layout {
        original_column,
        header_row,
        validate_row,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column_with(cells: &[(usize, &str)], len: usize) -> Vec<String> {
        let mut column = vec![String::new(); len];
        for &(row, value) in cells {
            column[row] = value.to_string();
        }
        column
    }

    #[test]
    fn test_detect_sentinel_and_validate_row() {
        // 見出しはD列5行目、最後の値は40行目
        let table = Table::from_columns(vec![
            column_with(&[(0, "Gangway")], 40),
            column_with(&[(2, "note")], 40),
            column_with(&[], 40),
            column_with(&[(4, "Русский"), (5, "GREETINGS"), (6, "Привет"), (39, "Проверено")], 40),
        ]);

        let layout = detect(&table, "Русский").unwrap();
        assert_eq!(layout.original_column, 3);
        assert_eq!(layout.header_row, 4);
        assert_eq!(layout.validate_row, 39);
        assert_eq!(layout.header_cell().to_a1_notation(), "D5");
        assert_eq!(layout.validate_cell().to_a1_notation(), "D40");
    }

    #[test]
    fn test_first_column_wins() {
        let table = Table::from_columns(vec![
            vec!["", "Русский", "x", "y"],
            vec!["Русский", "a", "b", "c", "d"],
        ]);
        let layout = detect(&table, "Русский").unwrap();
        assert_eq!(layout.original_column, 0);
        assert_eq!(layout.header_row, 1);
        assert_eq!(layout.validate_row, 3);
    }

    #[test]
    fn test_sentinel_must_match_exactly() {
        let table = Table::from_columns(vec![vec![" Русский", "a"], vec!["русский", "b"]]);
        assert!(matches!(
            detect(&table, "Русский"),
            Err(LeafletError::SentinelNotFound { .. })
        ));
    }

    #[test]
    fn test_validate_row_ignores_trailing_gaps() {
        let table = Table::from_columns(vec![vec!["Русский", "TITLE", "", "row", "", ""]]);
        let layout = detect(&table, "Русский").unwrap();
        assert_eq!(layout.validate_row, 3);
    }

    #[test]
    fn test_nothing_below_header() {
        let table = Table::from_columns(vec![vec!["", "Русский"]]);
        match detect(&table, "Русский") {
            Err(LeafletError::EmptyOriginalColumn { column }) => assert_eq!(column, "A"),
            other => panic!("Expected EmptyOriginalColumn, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_table() {
        assert!(detect(&Table::default(), "Русский").is_err());
    }
}
