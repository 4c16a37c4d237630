//! Security Module
//!
//! ZIPアーカイブ（スプレッドシート、docxテンプレート）を展開する前の検査を提供します。
//! ZIP bomb攻撃、パストラバーサル攻撃への対策です。

use std::io::{Read, Seek};

use zip::ZipArchive;

use crate::error::LeafletError;

/// セキュリティ設定
///
/// ファイル処理時のセキュリティ制限を定義します。
#[derive(Debug, Clone)]
pub(crate) struct SecurityConfig {
    /// 展開後の最大サイズ（バイト）
    /// デフォルト: 1GB (1_073_741_824 bytes)
    pub max_decompressed_size: u64,
    /// ZIPアーカイブ内の最大ファイル数
    /// デフォルト: 10000
    pub max_file_count: usize,
    /// 単一ファイルの最大サイズ（バイト）
    /// デフォルト: 100MB (104_857_600 bytes)
    pub max_file_size: u64,
    /// 入力ファイルの最大サイズ（バイト）
    /// デフォルト: 2GB (2_147_483_648 bytes)
    pub max_input_file_size: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_decompressed_size: 1_073_741_824, // 1GB
            max_file_count: 10_000,
            max_file_size: 104_857_600,         // 100MB
            max_input_file_size: 2_147_483_648, // 2GB
        }
    }
}

impl SecurityConfig {
    /// 入力サイズの上限を検査
    pub fn check_input_size(&self, size: u64) -> Result<(), LeafletError> {
        if size > self.max_input_file_size {
            return Err(LeafletError::SecurityViolation(format!(
                "Input file size exceeds maximum: {} bytes (max: {} bytes)",
                size, self.max_input_file_size
            )));
        }
        Ok(())
    }

    /// ZIPアーカイブのファイル数・パス・展開後サイズを検査
    pub fn check_archive<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
    ) -> Result<(), LeafletError> {
        if archive.len() > self.max_file_count {
            return Err(LeafletError::SecurityViolation(format!(
                "ZIP archive contains too many files: {} (max: {})",
                archive.len(),
                self.max_file_count
            )));
        }

        let mut total_decompressed_size = 0u64;
        for i in 0..archive.len() {
            let file = archive.by_index(i)?;

            let file_name = file.name();
            validate_zip_path(file_name).map_err(|e| {
                LeafletError::SecurityViolation(format!("Invalid ZIP path: {}", e))
            })?;

            let file_size = file.size();
            if file_size > self.max_file_size {
                return Err(LeafletError::SecurityViolation(format!(
                    "File '{}' exceeds maximum size: {} bytes (max: {} bytes)",
                    file_name, file_size, self.max_file_size
                )));
            }

            total_decompressed_size =
                total_decompressed_size
                    .checked_add(file_size)
                    .ok_or_else(|| {
                        LeafletError::SecurityViolation(
                            "Total decompressed size calculation overflow".to_string(),
                        )
                    })?;

            if total_decompressed_size > self.max_decompressed_size {
                return Err(LeafletError::SecurityViolation(format!(
                    "Total decompressed size exceeds maximum: {} bytes (max: {} bytes)",
                    total_decompressed_size, self.max_decompressed_size
                )));
            }
        }
        Ok(())
    }
}

/// バイト列がZIPアーカイブ（xlsx/ods/docx）かどうか
pub(crate) fn is_zip(data: &[u8]) -> bool {
    data.starts_with(b"PK\x03\x04")
}

/// ファイルパスの検証
///
/// パストラバーサル攻撃を防ぐため、アーカイブ内のパスを検証します。
///
/// # 戻り値
///
/// * `Ok(())` - パスが安全な場合
/// * `Err(String)` - パスが危険な場合（`..`や絶対パスを含む）
pub(crate) fn validate_zip_path(path: &str) -> Result<(), String> {
    if path.is_empty() {
        return Err("Empty path is not allowed".to_string());
    }

    // Windows形式の`C:\`やUnix形式の`/`で始まるパス
    if path.starts_with('/') || path.starts_with("C:\\") || path.starts_with("c:\\") {
        return Err(format!("Absolute path is not allowed: {}", path));
    }

    if path.contains("..") {
        return Err(format!("Path traversal detected: {}", path));
    }

    if path.contains('\\') {
        return Err(format!("Backslash in path is not allowed: {}", path));
    }

    Ok(())
}
