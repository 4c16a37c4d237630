//! Types Module
//!
//! クレート全体で使用する共通データ型を定義するモジュール。

use std::fmt;

/// セル座標（0始まり）
///
/// ログやエラーメッセージではA1記法（例: `C5`）で表示されます。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellCoord {
    pub row: usize,
    pub col: usize,
}

impl CellCoord {
    /// 新しい座標を生成
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// A1形式の文字列に変換（例: (0, 0) -> "A1"）
    #[allow(clippy::wrong_self_convention)]
    pub fn to_a1_notation(&self) -> String {
        format!("{}{}", column_letter(self.col), row_number(self.row))
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_a1_notation())
    }
}

/// 列インデックスを文字列に変換（0 -> "A", 25 -> "Z", 26 -> "AA"）
pub fn column_letter(mut col: usize) -> String {
    let mut result = String::new();
    loop {
        let remainder = col % 26;
        result.insert(0, (b'A' + remainder as u8) as char);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    result
}

/// 行インデックスをスプレッドシート上の行番号に変換（0 -> 1）
pub fn row_number(row: usize) -> usize {
    row + 1
}

/// 列優先で保持される文字列テーブル
///
/// スプレッドシートから取得した値をそのまま保持する不変の値型です。
/// 各列の末尾の空セルは取り除かれているため、列ごとに長さが異なる場合があります。
/// 範囲外のセルは空文字列として読み出されます。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    columns: Vec<Vec<String>>,
}

impl Table {
    /// 列のリストからテーブルを生成する
    ///
    /// 各列の末尾の空セルは取り除かれます。
    pub fn from_columns<C, S>(columns: C) -> Self
    where
        C: IntoIterator,
        C::Item: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns = columns
            .into_iter()
            .map(|column| {
                let mut cells: Vec<String> = column.into_iter().map(Into::into).collect();
                while cells.last().is_some_and(|c| c.is_empty()) {
                    cells.pop();
                }
                cells
            })
            .collect();
        Self { columns }
    }

    /// 行のリスト（行優先）からテーブルを生成する
    pub fn from_rows<R, S>(rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut columns: Vec<Vec<String>> = Vec::new();
        for (row_idx, row) in rows.into_iter().enumerate() {
            for (col_idx, cell) in row.into_iter().enumerate() {
                if columns.len() <= col_idx {
                    columns.resize_with(col_idx + 1, Vec::new);
                }
                let column = &mut columns[col_idx];
                if column.len() < row_idx {
                    column.resize(row_idx, String::new());
                }
                column.push(cell.into());
            }
        }
        Self::from_columns(columns)
    }

    /// 列数
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// 最も長い列の行数
    pub fn height(&self) -> usize {
        self.columns.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// 列を取得（範囲外の場合は空スライス）
    pub fn column(&self, col: usize) -> &[String] {
        self.columns.get(col).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 全列を順に走査する
    pub fn columns(&self) -> impl Iterator<Item = &[String]> {
        self.columns.iter().map(Vec::as_slice)
    }

    /// セルの値を取得（範囲外の場合は空文字列）
    pub fn cell(&self, col: usize, row: usize) -> &str {
        self.column(col).get(row).map(String::as_str).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_a1_notation() {
        assert_eq!(CellCoord::new(0, 0).to_a1_notation(), "A1");
        assert_eq!(CellCoord::new(4, 2).to_a1_notation(), "C5");
        assert_eq!(CellCoord::new(9, 25).to_a1_notation(), "Z10");
        assert_eq!(CellCoord::new(0, 26).to_a1_notation(), "AA1");
        assert_eq!(CellCoord::new(0, 701).to_a1_notation(), "ZZ1");
        assert_eq!(CellCoord::new(0, 702).to_a1_notation(), "AAA1");
    }

    #[test]
    fn test_from_columns_trims_trailing_empty_cells() {
        let table = Table::from_columns(vec![vec!["a", "b", "", ""], vec!["", "", "", ""]]);
        assert_eq!(table.width(), 2);
        assert_eq!(table.column(0), ["a", "b"]);
        assert!(table.column(1).is_empty());
        assert_eq!(table.height(), 2);
    }

    #[test]
    fn test_from_rows_transposes() {
        let table = Table::from_rows(vec![vec!["A1", "B1"], vec!["A2"], vec!["A3", "B3", "C3"]]);
        assert_eq!(table.width(), 3);
        assert_eq!(table.column(0), ["A1", "A2", "A3"]);
        assert_eq!(table.column(1), ["B1", "", "B3"]);
        assert_eq!(table.column(2), ["", "", "C3"]);
    }

    #[test]
    fn test_cell_out_of_range_is_empty() {
        let table = Table::from_columns(vec![vec!["x"]]);
        assert_eq!(table.cell(0, 0), "x");
        assert_eq!(table.cell(0, 5), "");
        assert_eq!(table.cell(3, 0), "");
        assert!(table.column(7).is_empty());
    }
}
