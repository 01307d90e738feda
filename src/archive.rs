use std::fs::File;
use std::io::{copy, Cursor, Write};
use std::path::{Path, PathBuf};

use zip::write::{FileOptions, ZipWriter};

use crate::error::Result;
use crate::report::Reporter;

/// Streaming chapter archive. Pages are written straight into the zip as
/// they arrive, never through intermediate files on disk.
pub struct ChapterArchive {
    writer: ZipWriter<File>,
    path: PathBuf,
    pages: usize,
}

impl ChapterArchive {
    pub fn create(directory: &Path, file_name: &str, comicinfo: Option<&str>) -> Result<Self> {
        let path = directory.join(file_name);
        let file = File::create(&path)?;
        let mut writer = ZipWriter::new(file);
        if let Some(xml) = comicinfo {
            writer.start_file("ComicInfo.xml", FileOptions::default())?;
            writer.write_all(xml.as_bytes())?;
        }
        Ok(Self {
            writer,
            path,
            pages: 0,
        })
    }

    pub fn add_page(&mut self, extension: &str, bytes: &[u8]) -> Result<()> {
        self.pages += 1;
        self.writer.start_file(
            format!("page_{:03}.{}", self.pages, extension),
            FileOptions::default(),
        )?;
        copy(&mut Cursor::new(bytes), &mut self.writer)?;
        Ok(())
    }

    pub fn page_count(&self) -> usize {
        self.pages
    }

    pub fn finish(mut self, reporter: &Reporter) -> Result<()> {
        self.writer.finish()?;
        let mut shown = self.path.display().to_string();
        if let Some(home) = dirs::home_dir() {
            let home = home.display().to_string();
            if shown.starts_with(&home) {
                shown = shown.replacen(&home, "~", 1);
            }
        }
        reporter.info(&format!("Zip created: {shown}"));
        Ok(())
    }
}
