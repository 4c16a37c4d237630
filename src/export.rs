//! PDF Export Module
//!
//! 生成した文書をオフィスアプリケーションでPDFに変換するモジュール。
//! PDF変換は任意の機能で、`PdfExporter`が存在しない場合は変換フェーズ全体が
//! スキップされます。

use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

use crate::error::LeafletError;

/// PDF変換機能
///
/// バッチ全体で`open`は一度だけ呼ばれ、得られたセッションを全言語で共有します。
pub trait PdfExporter {
    /// オフィスアプリケーションのセッションを開始する
    fn open(&self) -> Result<Box<dyn PdfSession>, LeafletError>;
}

/// PDF変換のセッション
///
/// `close`は変換の成否にかかわらず、フェーズの終了時に一度だけ呼ばれます。
pub trait PdfSession {
    /// `document`をPDFとして`pdf`に保存する
    fn convert(&mut self, document: &Path, pdf: &Path) -> Result<(), LeafletError>;

    /// セッションを終了してリソースを解放する
    fn close(self: Box<Self>) -> Result<(), LeafletError>;
}

/// LibreOfficeをヘッドレスモードで使用するPDF変換
#[derive(Debug, Clone)]
pub struct OfficeExporter {
    program: PathBuf,
}

impl OfficeExporter {
    /// 探索するLibreOfficeの実行ファイル名
    const PROGRAMS: [&'static str; 2] = ["soffice", "libreoffice"];

    /// 実行ファイルを指定して生成する
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// `PATH`からLibreOfficeを探す
    ///
    /// 見つからない場合は`None`を返します。
    pub fn detect() -> Option<Self> {
        Self::PROGRAMS
            .iter()
            .find_map(|name| which::which(name).ok())
            .map(Self::new)
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl PdfExporter for OfficeExporter {
    fn open(&self) -> Result<Box<dyn PdfSession>, LeafletError> {
        let profile = tempfile::Builder::new().prefix("gangwaydict-").tempdir()?;
        let outdir = profile.path().join("out");
        fs::create_dir_all(&outdir)?;
        info!("Using {}", self.program.display());
        Ok(Box::new(OfficeSession {
            program: self.program.clone(),
            profile,
            outdir,
        }))
    }
}

/// LibreOfficeのセッション
///
/// セッションが保持するのは常駐プロセスではなく、一時ディレクトリ上の専用の
/// ユーザープロファイルです。`convert`は文書ごとにヘッドレスの`soffice`を起動して
/// 終了を待ちます。プロファイルはバッチ全体で共有され、初回の変換で作成された設定が
/// 以降の起動で再利用されます。実行中のLibreOfficeとは干渉しません。
/// プロファイルは`close`またはドロップ時に削除されます。
struct OfficeSession {
    program: PathBuf,
    profile: TempDir,
    outdir: PathBuf,
}

impl OfficeSession {
    fn profile_url(&self) -> String {
        file_url(&self.profile.path().join("profile"))
    }
}

impl PdfSession for OfficeSession {
    fn convert(&mut self, document: &Path, pdf: &Path) -> Result<(), LeafletError> {
        let output = Command::new(&self.program)
            .arg(format!("-env:UserInstallation={}", self.profile_url()))
            .args(["--headless", "--norestore", "--convert-to", "pdf"])
            .arg("--outdir")
            .arg(&self.outdir)
            .arg(document)
            .output()?;

        if !output.status.success() {
            return Err(LeafletError::Export(describe_failure(
                &self.program,
                &output.status.to_string(),
                &output.stderr,
            )));
        }

        let stem = document.file_stem().ok_or_else(|| {
            LeafletError::Export(format!("{} has no file name", document.display()))
        })?;
        let mut file_name = stem.to_os_string();
        file_name.push(".pdf");
        let converted = self.outdir.join(file_name);
        if !converted.exists() {
            // LibreOfficeは読み込みに失敗しても終了コード0を返すことがある
            return Err(LeafletError::Export(describe_failure(
                &self.program,
                "no output",
                &[output.stderr, output.stdout].concat(),
            )));
        }

        if let Some(parent) = pdf.parent() {
            fs::create_dir_all(parent)?;
        }
        if fs::rename(&converted, pdf).is_err() {
            fs::copy(&converted, pdf)?;
            fs::remove_file(&converted)?;
        }
        debug!("Saved {}", pdf.display());
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<(), LeafletError> {
        let session = *self;
        session.profile.close()?;
        Ok(())
    }
}

/// 外部アプリケーションのエラーを読みやすいメッセージにまとめる
fn describe_failure(program: &Path, status: &str, output: &[u8]) -> String {
    let details = String::from_utf8_lossy(output)
        .lines()
        .map(|line| line.replace('\r', ""))
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if details.is_empty() {
        format!("{}: {}", program.display(), status)
    } else {
        format!("{}: {} {}", program.display(), status, details)
    }
}

/// パスを`file://`URLに変換する
fn file_url(path: &Path) -> String {
    let path = path.to_string_lossy().replace('\\', "/");
    let path = path.replace(' ', "%20");
    if path.starts_with('/') {
        format!("file://{}", path)
    } else {
        format!("file:///{}", path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_url() {
        assert_eq!(
            file_url(Path::new("/tmp/gangwaydict-x/profile")),
            "file:///tmp/gangwaydict-x/profile"
        );
        assert_eq!(
            file_url(Path::new("/tmp/with space")),
            "file:///tmp/with%20space"
        );
    }

    #[test]
    fn test_describe_failure() {
        let message = describe_failure(
            Path::new("soffice"),
            "exit status: 1",
            b"Error: source file could not be loaded\r\n\r\n",
        );
        assert_eq!(
            message,
            "soffice: exit status: 1 Error: source file could not be loaded"
        );
        assert_eq!(
            describe_failure(Path::new("soffice"), "no output", b""),
            "soffice: no output"
        );
    }

    #[test]
    fn test_program_path() {
        let exporter = OfficeExporter::new("/opt/libreoffice/program/soffice");
        assert_eq!(
            exporter.program(),
            Path::new("/opt/libreoffice/program/soffice")
        );
    }

    #[test]
    fn test_session_reports_missing_program() {
        let exporter = OfficeExporter::new("/nonexistent/soffice");
        let mut session = exporter.open().unwrap();
        let result = session.convert(Path::new("/tmp/missing.docx"), Path::new("/tmp/missing.pdf"));
        assert!(matches!(result, Err(LeafletError::Io(_))));
        session.close().unwrap();
    }
}
