//! DOCX Template Renderer
//!
//! docxテンプレートの本文・ヘッダー・フッターをJinjaテンプレートとして描画し、
//! その他のパートはそのままコピーして新しいdocxを書き出します。

use chrono::Utc;
use log::debug;
use minijinja::{AutoEscape, Environment, Value};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::LeafletError;
use crate::language::LanguageRecord;
use crate::render::preprocess::preprocess;
use crate::render::DocumentRenderer;
use crate::security::SecurityConfig;

const CORE_PROPERTIES: &str = "docProps/core.xml";

/// テンプレート内の1パート
#[derive(Debug, Clone)]
enum Part {
    /// 前処理済みのJinjaテンプレート（環境に登録済み）
    Template { name: String },
    /// そのままコピーするパート
    Verbatim { name: String, data: Vec<u8> },
    Directory { name: String },
}

/// docxテンプレート
///
/// テンプレートは一度だけ読み込まれ、言語ごとの描画で再利用されます。
/// 値はXMLとしてエスケープされてから埋め込まれます。
///
/// # 使用例
///
/// ```rust,no_run
/// use gangwaydict::DocxTemplate;
///
/// # fn main() -> Result<(), gangwaydict::LeafletError> {
/// let template = DocxTemplate::open("GangwayDict-Template.docx")?;
/// # Ok(())
/// # }
/// ```
pub struct DocxTemplate {
    path: PathBuf,
    parts: Vec<Part>,
    env: Environment<'static>,
}

impl std::fmt::Debug for DocxTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocxTemplate")
            .field("path", &self.path)
            .field("parts", &self.parts.len())
            .finish()
    }
}

/// Jinjaテンプレートとして描画するパートかどうか
fn is_template_part(name: &str) -> bool {
    name == "word/document.xml"
        || (name.starts_with("word/header") && name.ends_with(".xml"))
        || (name.starts_with("word/footer") && name.ends_with(".xml"))
}

impl DocxTemplate {
    /// テンプレートファイルを開く
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LeafletError> {
        let path = path.as_ref();
        let data = fs::read(path)?;
        let mut template = Self::from_bytes(data)?;
        template.path = path.to_path_buf();
        Ok(template)
    }

    /// メモリ上のdocxからテンプレートを生成する
    ///
    /// # 発生し得るエラー
    ///
    /// * `LeafletError::Zip`: docx（ZIPアーカイブ）として読めない場合
    /// * `LeafletError::SecurityViolation`: アーカイブがセキュリティ制限に違反する場合
    /// * `LeafletError::Template`: テンプレートの構文エラー（読み込み時に検出される）
    pub fn from_bytes(data: Vec<u8>) -> Result<Self, LeafletError> {
        let security_config = SecurityConfig::default();
        security_config.check_input_size(data.len() as u64)?;

        let mut archive = ZipArchive::new(Cursor::new(data))?;
        security_config.check_archive(&mut archive)?;

        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::Html);

        let mut parts = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let name = file.name().to_string();
            if file.is_dir() {
                parts.push(Part::Directory { name });
                continue;
            }
            let mut data = Vec::new();
            file.read_to_end(&mut data)?;

            if is_template_part(&name) {
                let xml = String::from_utf8(data).map_err(|e| LeafletError::Xml {
                    part: name.clone(),
                    message: e.to_string(),
                })?;
                env.add_template_owned(name.clone(), preprocess(&xml))?;
                parts.push(Part::Template { name });
            } else {
                parts.push(Part::Verbatim { name, data });
            }
        }

        if env.get_template("word/document.xml").is_err() {
            return Err(LeafletError::Zip(
                "Template has no word/document.xml".to_string(),
            ));
        }

        Ok(Self {
            path: PathBuf::new(),
            parts,
            env,
        })
    }

    /// レコードを描画してdocxのバイト列を生成する
    pub fn render_to_bytes(&self, record: &LanguageRecord) -> Result<Vec<u8>, LeafletError> {
        let context = Value::from_serialize(record);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

        for part in &self.parts {
            match part {
                Part::Template { name } => {
                    let xml = self.env.get_template(name)?.render(&context)?;
                    check_well_formed(name, &xml)?;
                    zip.start_file(name.as_str(), options)?;
                    zip.write_all(xml.as_bytes())?;
                }
                Part::Verbatim { name, data } if name == CORE_PROPERTIES => {
                    zip.start_file(name.as_str(), options)?;
                    zip.write_all(&touch_modified(data))?;
                }
                Part::Verbatim { name, data } => {
                    zip.start_file(name.as_str(), options)?;
                    zip.write_all(data)?;
                }
                Part::Directory { name } => {
                    zip.add_directory(name.as_str(), options)?;
                }
            }
        }

        Ok(zip.finish()?.into_inner())
    }
}

impl DocumentRenderer for DocxTemplate {
    fn render(&self, record: &LanguageRecord, output: &Path) -> Result<(), LeafletError> {
        let bytes = self.render_to_bytes(record)?;
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(output, bytes)?;
        debug!("Saved {}", output.display());
        Ok(())
    }
}

/// 描画結果が整形式のXMLであることを確認する
fn check_well_formed(part: &str, xml: &str) -> Result<(), LeafletError> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Eof) => return Ok(()),
            Ok(_) => {}
            Err(e) => {
                return Err(LeafletError::Xml {
                    part: part.to_string(),
                    message: format!("{} at position {}", e, reader.buffer_position()),
                })
            }
        }
    }
}

/// `dcterms:modified`を現在時刻に更新する（要素がなければそのまま返す）
fn touch_modified(data: &[u8]) -> Vec<u8> {
    let Ok(xml) = std::str::from_utf8(data) else {
        return data.to_vec();
    };
    let Some(open) = xml.find("<dcterms:modified") else {
        return data.to_vec();
    };
    let Some(value_start) = xml[open..].find('>').map(|i| open + i + 1) else {
        return data.to_vec();
    };
    let Some(value_end) = xml[value_start..]
        .find("</dcterms:modified>")
        .map(|i| value_start + i)
    else {
        return data.to_vec();
    };

    let now = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
    let mut out = String::with_capacity(xml.len());
    out.push_str(&xml[..value_start]);
    out.push_str(&now);
    out.push_str(&xml[value_end..]);
    out.into_bytes()
}
