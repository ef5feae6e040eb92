use crate::utils::error::{EtlError, Result};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use zip::write::{SimpleFileOptions, ZipWriter};

/// 將已關閉的輸出串流逐一複製進 ZIP，不整檔載入記憶體
pub fn bundle_outputs(sources: &[PathBuf], destination: &Path) -> Result<PathBuf> {
    let file = File::create(destination)?;
    let mut zip = ZipWriter::new(BufWriter::new(file));

    for source in sources {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| EtlError::ProcessingError {
                message: format!("Cannot bundle {}: no file name", source.display()),
            })?;

        zip.start_file(name, SimpleFileOptions::default())?;
        let mut input = File::open(source)?;
        std::io::copy(&mut input, &mut zip)?;
    }

    let mut writer = zip.finish()?;
    std::io::Write::flush(&mut writer)?;

    tracing::debug!(
        "Bundled {} files into {}",
        sources.len(),
        destination.display()
    );
    Ok(destination.to_path_buf())
}
