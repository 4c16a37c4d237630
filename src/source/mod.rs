//! Table Source Module
//!
//! スプレッドシートのデータを列優先の`Table`として取得する入口。
//! 取得元は`TableSource`トレイトで差し替えられます。

mod workbook;

pub use workbook::{SheetChoice, WorkbookSource};

use crate::error::LeafletError;
use crate::types::Table;

/// 表データの取得元
///
/// 取得は実行の開始時に一度だけ行われます。
pub trait TableSource {
    /// 全データを列優先のテーブルとして取得する
    fn fetch(&mut self) -> Result<Table, LeafletError>;
}

/// 既に取得済みのテーブルをそのまま返す取得元
impl TableSource for Table {
    fn fetch(&mut self) -> Result<Table, LeafletError> {
        Ok(self.clone())
    }
}
