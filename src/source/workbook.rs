//! Workbook Source
//!
//! calamineを使用して、エクスポートされたスプレッドシート（xlsx/xlsm/xls/ods）を
//! 列優先の`Table`に変換します。

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use log::{debug, info};
use serde::Deserialize;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use zip::ZipArchive;

use crate::error::LeafletError;
use crate::security::{is_zip, SecurityConfig};
use crate::source::TableSource;
use crate::types::Table;

/// 読み込むシートの選択
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetChoice {
    /// 先頭のシート（デフォルト）
    First,

    /// シート名指定
    Name(String),
}

/// ワークブックファイルからテーブルを取得する
#[derive(Debug, Clone)]
pub struct WorkbookSource {
    path: PathBuf,
    sheet: SheetChoice,
}

impl WorkbookSource {
    /// 先頭のシートを読み込む取得元を生成
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sheet: SheetChoice::First,
        }
    }

    /// 読み込むシートを指定する
    pub fn with_sheet(mut self, sheet: SheetChoice) -> Self {
        self.sheet = sheet;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// メモリ上のワークブックからテーブルを読み込む
    ///
    /// # 引数
    ///
    /// * `data` - ワークブックのバイト列
    /// * `sheet` - 読み込むシート
    ///
    /// # 戻り値
    ///
    /// * `Ok(Table)` - 読み込みに成功した場合
    /// * `Err(LeafletError)` - 解析エラー、シートが存在しない場合、セキュリティ制限違反
    pub fn read_bytes(data: Vec<u8>, sheet: &SheetChoice) -> Result<Table, LeafletError> {
        let security_config = SecurityConfig::default();
        security_config.check_input_size(data.len() as u64)?;
        if is_zip(&data) {
            let mut archive = ZipArchive::new(Cursor::new(data.as_slice()))?;
            security_config.check_archive(&mut archive)?;
        }

        let mut workbook = open_workbook_auto_from_rs(Cursor::new(data))?;
        let sheet_names = workbook.sheet_names();
        let range = match sheet {
            SheetChoice::First => workbook
                .worksheet_range_at(0)
                .ok_or_else(|| LeafletError::Config("Workbook has no sheets".to_string()))??,
            SheetChoice::Name(name) => {
                if !sheet_names.contains(name) {
                    return Err(LeafletError::Config(format!("Sheet '{}' not found", name)));
                }
                workbook.worksheet_range(name)?
            }
        };

        Ok(range_to_table(&range))
    }
}

impl TableSource for WorkbookSource {
    fn fetch(&mut self) -> Result<Table, LeafletError> {
        info!("Loading spreadsheet {}...", self.path.display());
        let mut data = Vec::new();
        File::open(&self.path)?.read_to_end(&mut data)?;
        Self::read_bytes(data, &self.sheet)
    }
}

/// calamineの範囲を列優先のテーブルに変換する
///
/// 使用範囲がA1から始まらない場合でも、行・列の番号がシート上の位置と一致するように
/// 先頭に空セルを補います。
fn range_to_table(range: &Range<Data>) -> Table {
    let (row_offset, col_offset) = range
        .start()
        .map(|(row, col)| (row as usize, col as usize))
        .unwrap_or((0, 0));
    let (height, width) = range.get_size();
    debug!(
        "Used range: {} rows x {} columns at offset ({}, {})",
        height, width, row_offset, col_offset
    );

    let mut columns = vec![vec![String::new(); row_offset + height]; col_offset + width];
    for (row_idx, row) in range.rows().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            columns[col_offset + col_idx][row_offset + row_idx] = cell_text(cell);
        }
    }
    Table::from_columns(columns)
}

/// セルの値を表示用の文字列に変換する
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Bool(true) => "TRUE".to_string(),
        Data::Bool(false) => "FALSE".to_string(),
        other => other.to_string(),
    }
}
