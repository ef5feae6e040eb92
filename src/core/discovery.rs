//! 合約檔探索
//!
//! 輸入結構為 `root/<目的地目錄>/<合約檔>`。只有根目錄無法列出時才是致命錯誤；
//! 無法讀取的目的地目錄記錄警告後略過。

use crate::core::hotel_id::extract_hotel_id;
use crate::domain::model::ContractFile;
use crate::utils::error::{EtlError, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 列出 `root` 之下符合前綴的目的地目錄，再列出其中的合約檔
pub async fn discover_contract_files(
    root: &Path,
    destination_prefix: &str,
    contract_prefix: &str,
) -> Result<Vec<ContractFile>> {
    let destinations = list_destination_dirs(root, destination_prefix).await?;
    tracing::debug!(
        "Found {} destination directories under {}",
        destinations.len(),
        root.display()
    );

    let mut files = Vec::new();
    for destination in destinations {
        match list_contract_files(&destination, contract_prefix).await {
            Ok(found) => files.extend(found),
            Err(e) => {
                tracing::warn!(
                    "⚠️ Skipping unreadable destination directory {}: {}",
                    destination.display(),
                    e
                );
            }
        }
    }

    Ok(files)
}

async fn list_destination_dirs(root: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    let fatal = |source: std::io::Error| EtlError::InputDirectoryError {
        path: root.to_path_buf(),
        source,
    };

    let mut dir = fs::read_dir(root).await.map_err(fatal)?;
    let mut destinations = Vec::new();

    while let Some(entry) = dir.next_entry().await.map_err(fatal)? {
        let name = entry.file_name();
        if !name.to_string_lossy().starts_with(prefix) {
            continue;
        }
        match entry.file_type().await {
            Ok(file_type) if file_type.is_dir() => destinations.push(entry.path()),
            Ok(_) => {}
            Err(e) => tracing::warn!("⚠️ Cannot stat {}: {}", entry.path().display(), e),
        }
    }

    destinations.sort();
    Ok(destinations)
}

async fn list_contract_files(destination: &Path, prefix: &str) -> Result<Vec<ContractFile>> {
    let mut dir = fs::read_dir(destination).await?;
    let mut files = Vec::new();

    while let Some(entry) = dir.next_entry().await? {
        let filename = entry.file_name().to_string_lossy().into_owned();
        if !filename.starts_with(prefix) {
            continue;
        }
        if !entry.file_type().await?.is_file() {
            continue;
        }

        files.push(ContractFile {
            path: entry.path(),
            hotel_id: extract_hotel_id(&filename),
            filename,
        });
    }

    files.sort_by(|a, b| a.filename.cmp(&b.filename));
    Ok(files)
}
