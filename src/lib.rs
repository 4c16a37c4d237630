//! gangwaydict - Multilingual leaflet generator driven by a translation spreadsheet
//!
//! 翻訳スプレッドシートを読み込み、検証済みの言語ごとにdocxテンプレートから
//! リーフレットを生成し、可能であればPDFに変換するクレートです。
//!
//! # スプレッドシートの形
//!
//! - 原文列: 見出しセル（デフォルト: `Русский`）を含む最初の列
//! - 見出し行の下に、大文字だけの見出し行で区切られたブロックが並ぶ
//! - 原文列の最後の空でないセルの行が検証行で、翻訳者と連絡先が記入される
//! - 原文列の右側に、言語ごとに2列ずつのペアが並ぶ
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use gangwaydict::GeneratorBuilder;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut generator = GeneratorBuilder::new()
//!         .with_spreadsheet("GangwayDict.xlsx")
//!         .with_template("GangwayDict-Template.docx")
//!         .build()?;
//!
//!     let report = generator.run()?;
//!     println!("{} documents, {} PDFs", report.documents.len(), report.pdfs.len());
//!     Ok(())
//! }
//! ```
//!
//! # Parse Only
//!
//! ```rust,no_run
//! use gangwaydict::{GeneratorBuilder, Table};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let table = Table::from_rows(vec![
//!     vec!["Русский", "English", "Английский"],
//!     vec!["GREETINGS"],
//!     vec!["Привет", "Hello", "хэллоу"],
//!     vec!["Пока", "Bye", "бай"],
//!     vec!["Готово", "Jane Doe", "jane@example.com"],
//! ]);
//! let mut generator = GeneratorBuilder::new()
//!     .with_source(table)
//!     .with_pdf_exporter(None)
//!     .build()?;
//! let sheet = generator.parse()?;
//! assert_eq!(sheet.languages[0].name, "Английский");
//! # Ok(())
//! # }
//! ```

mod api;
mod blocks;
mod builder;
mod error;
mod export;
mod language;
mod layout;
mod render;
mod security;
mod source;
mod types;

// 公開API
pub use api::{IdentifierRule, LocalFormRule};
pub use blocks::{extract_blocks, is_title_row, Block};
pub use builder::{
    Failure, Generator, GeneratorBuilder, GeneratorConfig, Output, ParsedSheet, RunReport,
};
pub use error::LeafletError;
pub use export::{OfficeExporter, PdfExporter, PdfSession};
pub use language::{
    extract_languages, local_form, BlockText, ExtractOptions, LanguageRecord, Phrase,
};
pub use layout::{detect, Layout};
pub use render::{expand_pattern, DocumentRenderer, DocxTemplate};
pub use source::{SheetChoice, TableSource, WorkbookSource};
pub use types::{column_letter, CellCoord, Table};
