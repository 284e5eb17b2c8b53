//! Whole-file access of tables.
use crate::error::Result;
use crate::table::Table;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use xdbf_datatype::EncodingRef;

impl Table {
    /// Read the whole file and parse it.
    #[inline]
    pub fn open<P: AsRef<Path>>(path: P, enc: Option<EncodingRef>) -> Result<Self> {
        let data = fs::read(path.as_ref())?;
        log::debug!("read {} bytes from {}", data.len(), path.as_ref().display());
        Table::from_bytes(data, enc)
    }

    /// Write the whole table into file, replacing existing content.
    #[inline]
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.write_file(File::create(path)?)
    }

    /// Same as [`Table::save`], but a newly created file gets given
    /// permission bits, e.g. 0o644. Permissions of an existing file
    /// are kept.
    #[cfg(unix)]
    #[inline]
    pub fn save_with_mode<P: AsRef<Path>>(&self, path: P, mode: u32) -> Result<()> {
        use std::fs::OpenOptions;
        use std::os::unix::fs::OpenOptionsExt;
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(mode)
            .open(path)?;
        self.write_file(file)
    }

    #[inline]
    fn write_file(&self, file: File) -> Result<()> {
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
