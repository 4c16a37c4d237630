//! Builder Module
//!
//! Fluent Builder APIを提供し、`Generator`インスタンスを段階的に構築する。

use log::{error, info, warn};
use serde::Deserialize;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::api::{IdentifierRule, LocalFormRule};
use crate::blocks::{extract_blocks, Block};
use crate::error::LeafletError;
use crate::export::{OfficeExporter, PdfExporter};
use crate::language::{extract_languages, ExtractOptions, LanguageRecord};
use crate::layout::{detect, Layout};
use crate::render::{expand_pattern, DocumentRenderer, DocxTemplate};
use crate::source::{SheetChoice, TableSource, WorkbookSource};

/// 生成処理の設定
///
/// すべての項目にデフォルト値があり、JSONファイルから部分的に上書きできます。
///
/// ```json
/// {
///   "spreadsheet": "exports/GangwayDict.xlsx",
///   "local_form_rule": "lowercase_first"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// 入力スプレッドシート
    pub spreadsheet: PathBuf,

    /// 読み込むシート
    pub sheet: SheetChoice,

    /// 原文列の見出し
    pub sentinel: String,

    /// 原文中でローカル形に置き換えるプレースホルダー
    pub placeholder: String,

    /// docxテンプレート
    pub template: PathBuf,

    /// 文書の出力パス（`{}`は言語識別子）
    pub document_pattern: String,

    /// PDFの出力パス（`{}`は言語識別子）
    pub pdf_pattern: String,

    /// 言語識別子の規則
    pub identifier_rule: IdentifierRule,

    /// ローカル形の導出規則
    pub local_form_rule: LocalFormRule,

    /// PDFを生成するか
    pub export_pdf: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            spreadsheet: PathBuf::from("GangwayDict.xlsx"),
            sheet: SheetChoice::First,
            sentinel: "Русский".to_string(),
            placeholder: "(местному)".to_string(),
            template: PathBuf::from("GangwayDict-Template.docx"),
            document_pattern: "docx/GangwayDict-{}.docx".to_string(),
            pdf_pattern: "pdf/GangwayDict-{}.pdf".to_string(),
            identifier_rule: IdentifierRule::Name,
            local_form_rule: LocalFormRule::DropLastChar,
            export_pdf: true,
        }
    }
}

impl GeneratorConfig {
    /// JSONファイルから設定を読み込む
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LeafletError> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        serde_json::from_reader(reader)
            .map_err(|e| LeafletError::Config(format!("{}: {}", path.display(), e)))
    }

    /// 設定値を検証する
    fn validate(&self) -> Result<(), LeafletError> {
        if self.sentinel.is_empty() {
            return Err(LeafletError::Config("Sentinel must not be empty".to_string()));
        }
        if self.placeholder.is_empty() {
            return Err(LeafletError::Config(
                "Placeholder must not be empty".to_string(),
            ));
        }
        for (label, pattern) in [
            ("document", &self.document_pattern),
            ("PDF", &self.pdf_pattern),
        ] {
            if pattern.matches("{}").count() != 1 {
                return Err(LeafletError::Config(format!(
                    "Invalid {} file name pattern '{}': expected exactly one '{{}}'",
                    label, pattern
                )));
            }
        }
        Ok(())
    }

    fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            placeholder: self.placeholder.clone(),
            identifier_rule: self.identifier_rule,
            local_form_rule: self.local_form_rule,
        }
    }
}

/// PDF変換機能の指定方法
enum ExporterSetting {
    /// `build()`時にLibreOfficeを探す
    Detect,
    /// 明示的に指定（`None`はPDF変換なし）
    Fixed(Option<Box<dyn PdfExporter>>),
}

/// Fluent Builder APIを提供する構造体
///
/// # 使用例
///
/// ```rust,no_run
/// use gangwaydict::{GeneratorBuilder, LocalFormRule};
///
/// # fn main() -> Result<(), gangwaydict::LeafletError> {
/// let mut generator = GeneratorBuilder::new()
///     .with_spreadsheet("GangwayDict.xlsx")
///     .with_local_form_rule(LocalFormRule::DropLastChar)
///     .build()?;
/// let report = generator.run()?;
/// # Ok(())
/// # }
/// ```
pub struct GeneratorBuilder {
    config: GeneratorConfig,
    source: Option<Box<dyn TableSource>>,
    renderer: Option<Box<dyn DocumentRenderer>>,
    exporter: ExporterSetting,
}

impl fmt::Debug for GeneratorBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorBuilder")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for GeneratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GeneratorBuilder {
    /// デフォルト設定を持つビルダーインスタンスを生成する
    pub fn new() -> Self {
        Self::from_config(GeneratorConfig::default())
    }

    /// 読み込み済みの設定からビルダーを生成する
    pub fn from_config(config: GeneratorConfig) -> Self {
        Self {
            config,
            source: None,
            renderer: None,
            exporter: ExporterSetting::Detect,
        }
    }

    /// 入力スプレッドシートのパスを指定する
    pub fn with_spreadsheet(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.spreadsheet = path.into();
        self
    }

    /// 読み込むシートを指定する
    pub fn with_sheet(mut self, sheet: SheetChoice) -> Self {
        self.config.sheet = sheet;
        self
    }

    /// 原文列の見出しを指定する
    pub fn with_sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.config.sentinel = sentinel.into();
        self
    }

    /// 原文中のプレースホルダーを指定する
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.config.placeholder = placeholder.into();
        self
    }

    /// docxテンプレートのパスを指定する
    pub fn with_template(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.template = path.into();
        self
    }

    /// 文書の出力パスパターンを指定する（`{}`は言語識別子）
    pub fn with_document_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.config.document_pattern = pattern.into();
        self
    }

    /// PDFの出力パスパターンを指定する（`{}`は言語識別子）
    pub fn with_pdf_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.config.pdf_pattern = pattern.into();
        self
    }

    pub fn with_identifier_rule(mut self, rule: IdentifierRule) -> Self {
        self.config.identifier_rule = rule;
        self
    }

    pub fn with_local_form_rule(mut self, rule: LocalFormRule) -> Self {
        self.config.local_form_rule = rule;
        self
    }

    /// 表データの取得元を差し替える（デフォルト: `WorkbookSource`）
    pub fn with_source(mut self, source: impl TableSource + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// 描画エンジンを差し替える（デフォルト: `DocxTemplate`）
    pub fn with_renderer(mut self, renderer: impl DocumentRenderer + 'static) -> Self {
        self.renderer = Some(Box::new(renderer));
        self
    }

    /// PDF変換機能を指定する
    ///
    /// `None`を指定するとPDF変換フェーズは実行されません。
    /// 指定しない場合は`build()`時にLibreOfficeを探します。
    ///
    /// 明示的な指定は設定の`export_pdf`より優先されます。`export_pdf`が`false`でも
    /// `Some`を渡せばPDF変換は実行されます。
    pub fn with_pdf_exporter(mut self, exporter: Option<Box<dyn PdfExporter>>) -> Self {
        self.exporter = ExporterSetting::Fixed(exporter);
        self
    }

    /// 設定を検証し、`Generator`インスタンスを生成する
    ///
    /// # 発生し得るエラー
    ///
    /// * `LeafletError::Config(String)`: 設定の検証に失敗した場合
    pub fn build(self) -> Result<Generator, LeafletError> {
        self.config.validate()?;

        let exporter = match self.exporter {
            ExporterSetting::Fixed(exporter) => exporter,
            ExporterSetting::Detect if !self.config.export_pdf => None,
            ExporterSetting::Detect => match OfficeExporter::detect() {
                Some(office) => {
                    info!("PDF conversion with {}", office.program().display());
                    Some(Box::new(office) as Box<dyn PdfExporter>)
                }
                None => {
                    warn!(
                        "PDF generation will not be available: install LibreOffice and make sure soffice is on PATH"
                    );
                    None
                }
            },
        };

        let source = match self.source {
            Some(source) => source,
            None => Box::new(
                WorkbookSource::new(&self.config.spreadsheet).with_sheet(self.config.sheet.clone()),
            ),
        };

        Ok(Generator {
            config: self.config,
            source,
            renderer: self.renderer,
            exporter,
        })
    }
}

/// 解析済みのスプレッドシート
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSheet {
    pub layout: Layout,
    pub blocks: Vec<Block>,
    pub languages: Vec<LanguageRecord>,
}

/// 生成されたファイル
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub identifier: String,
    pub path: PathBuf,
}

/// 言語単位の失敗
#[derive(Debug)]
pub struct Failure {
    pub identifier: String,
    pub error: LeafletError,
}

/// 実行結果
#[derive(Debug, Default)]
pub struct RunReport {
    /// 生成された文書
    pub documents: Vec<Output>,
    /// 生成されたPDF
    pub pdfs: Vec<Output>,
    /// 文書の生成に失敗した言語
    pub render_failures: Vec<Failure>,
    /// PDF変換に失敗した言語（セッション開始の失敗は識別子が空）
    pub export_failures: Vec<Failure>,
}

impl RunReport {
    /// すべての言語で失敗がなかったか
    pub fn is_success(&self) -> bool {
        self.render_failures.is_empty() && self.export_failures.is_empty()
    }
}

/// 生成処理のファサード
///
/// 取得 → 構造検出 → ブロック抽出 → 言語抽出 → 文書生成 → PDF変換 の順に
/// 一度だけ実行します。構造検出・抽出の失敗は文書生成の前に実行全体を中断します。
pub struct Generator {
    config: GeneratorConfig,
    source: Box<dyn TableSource>,
    renderer: Option<Box<dyn DocumentRenderer>>,
    exporter: Option<Box<dyn PdfExporter>>,
}

impl fmt::Debug for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generator")
            .field("config", &self.config)
            .field("pdf_export", &self.exporter.is_some())
            .finish_non_exhaustive()
    }
}

impl Generator {
    /// 検証済みの設定
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// PDF変換機能が利用可能か
    pub fn can_export_pdf(&self) -> bool {
        self.exporter.is_some()
    }

    /// すべてのフェーズを実行する
    pub fn run(&mut self) -> Result<RunReport, LeafletError> {
        let sheet = self.parse()?;
        self.render(&sheet)
    }

    /// 表データを取得し、構造・ブロック・言語を抽出する
    pub fn parse(&mut self) -> Result<ParsedSheet, LeafletError> {
        let table = self.source.fetch()?;
        info!("Parsing...");
        let layout = detect(&table, &self.config.sentinel)?;
        let blocks = extract_blocks(&table, &layout)?;
        info!("Found {} blocks", blocks.len());
        let languages =
            extract_languages(&table, &layout, &blocks, &self.config.extract_options())?;
        info!("Found {} validated languages", languages.len());
        Ok(ParsedSheet {
            layout,
            blocks,
            languages,
        })
    }

    /// 言語ごとに文書を生成し、可能であればPDFに変換する
    ///
    /// 1言語の失敗は記録され、残りの言語の処理は継続されます。
    pub fn render(&self, sheet: &ParsedSheet) -> Result<RunReport, LeafletError> {
        let template;
        let renderer: &dyn DocumentRenderer = match &self.renderer {
            Some(renderer) => renderer.as_ref(),
            None => {
                template = DocxTemplate::open(&self.config.template)?;
                &template
            }
        };

        let mut report = RunReport::default();
        info!("Generating DOCX leaflets...");
        for language in &sheet.languages {
            let identifier = language.identifier().to_string();
            let result = expand_pattern(&self.config.document_pattern, &identifier)
                .and_then(|path| renderer.render(language, &path).map(|()| path));
            match result {
                Ok(path) => {
                    info!("{}", path.display());
                    report.documents.push(Output { identifier, path });
                }
                Err(e) => {
                    error!("Failed to render {}: {}", identifier, e.trace());
                    report.render_failures.push(Failure {
                        identifier,
                        error: e,
                    });
                }
            }
        }

        match &self.exporter {
            Some(exporter) => self.export_pdfs(exporter.as_ref(), &mut report),
            None if self.config.export_pdf => warn!("Skipping PDF leaflets"),
            None => {}
        }

        Ok(report)
    }

    /// 生成済みの文書をPDFに変換する
    ///
    /// セッションは一度だけ開かれ、個々の変換の成否にかかわらず最後に閉じられます。
    fn export_pdfs(&self, exporter: &dyn PdfExporter, report: &mut RunReport) {
        info!("Generating PDF leaflets...");
        let mut session = match exporter.open() {
            Ok(session) => session,
            Err(e) => {
                error!("Failed to start the office application: {}", e.trace());
                report.export_failures.push(Failure {
                    identifier: String::new(),
                    error: e,
                });
                return;
            }
        };

        for document in &report.documents {
            let result = expand_pattern(&self.config.pdf_pattern, &document.identifier)
                .and_then(|pdf| session.convert(&document.path, &pdf).map(|()| pdf));
            match result {
                Ok(path) => {
                    info!("{}", path.display());
                    report.pdfs.push(Output {
                        identifier: document.identifier.clone(),
                        path,
                    });
                }
                Err(e) => {
                    error!("Failed to export {}: {}", document.identifier, e.trace());
                    report.export_failures.push(Failure {
                        identifier: document.identifier.clone(),
                        error: e,
                    });
                }
            }
        }

        if let Err(e) = session.close() {
            warn!("Failed to close the office application: {}", e.trace());
        }
    }
}
