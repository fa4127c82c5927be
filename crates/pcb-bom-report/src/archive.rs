use std::fs::{self, File};
use std::path::Path;

use anyhow::{Context, Result};
use zip::{CompressionMethod, ZipWriter, write::FileOptions};

/// Zip `dir` into `zip_path`. Entries keep the directory's own name as their first component.
pub fn zip_directory(dir: &Path, zip_path: &Path) -> Result<()> {
    let base_path = dir.parent().unwrap_or(dir);
    let zip_file = File::create(zip_path)
        .with_context(|| format!("Failed to create {}", zip_path.display()))?;
    let mut zip = ZipWriter::new(zip_file);
    add_directory_to_zip(&mut zip, dir, base_path)?;
    zip.finish()?;
    Ok(())
}

fn add_directory_to_zip(zip: &mut ZipWriter<File>, dir: &Path, base_path: &Path) -> Result<()> {
    let mut entries = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()?;
    entries.sort();

    for path in entries {
        if path.is_dir() {
            add_directory_to_zip(zip, &path, base_path)?;
        } else {
            let file_name = path
                .strip_prefix(base_path)?
                .to_string_lossy()
                .replace('\\', "/");
            let options =
                FileOptions::<()>::default().compression_method(CompressionMethod::Deflated);
            zip.start_file(file_name, options)?;
            std::io::copy(&mut File::open(&path)?, zip)?;
        }
    }
    Ok(())
}

/// Unpack a zip archive of static assets into `output_dir`.
pub fn extract_zip(zip_path: &Path, output_dir: &Path) -> Result<()> {
    let file = File::open(zip_path)
        .with_context(|| format!("Failed to open assets {}", zip_path.display()))?;
    let mut archive = zip::ZipArchive::new(file)?;

    fs::create_dir_all(output_dir)?;

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let Some(relative) = file.enclosed_name() else {
            log::warn!("Skipping unsafe asset path {}", file.name());
            continue;
        };
        let outpath = output_dir.join(relative);

        if file.is_dir() {
            fs::create_dir_all(&outpath)?;
        } else {
            if let Some(parent) = outpath.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut outfile = File::create(&outpath)?;
            std::io::copy(&mut file, &mut outfile)?;
        }
    }

    Ok(())
}
