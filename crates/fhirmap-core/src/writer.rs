//! Table sinks.
//!
//! A [`RelationalWriter`] receives one header and the rows of a table and
//! owns whatever storage backs it. [`TsvWriter`] writes one
//! `<table>.tsv` file per table; [`MemoryWriter`] keeps tables in memory.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use csv::{QuoteStyle, Terminator, WriterBuilder};
use tracing::debug;

use fhirmap_model::TableKind;

use crate::error::{MapError, Result};
use crate::projector::Row;

pub trait RelationalWriter {
    fn write_table(&mut self, table: TableKind, header: &[&str], rows: &[Row]) -> Result<()>;
}

/// Writes tab-separated files into one directory.
///
/// Cells are written unquoted. Tabs and line breaks inside a value are
/// replaced with spaces so every record stays on one line.
#[derive(Debug)]
pub struct TsvWriter {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl TsvWriter {
    /// Creates the output directory if it does not exist.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| MapError::io(&dir, source))?;
        Ok(Self {
            dir,
            written: Vec::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Files written so far, in write order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

fn sanitize(cell: &str) -> Cow<'_, [u8]> {
    const BREAKS: [char; 3] = ['\t', '\n', '\r'];
    if cell.contains(BREAKS) {
        Cow::Owned(cell.replace(BREAKS, " ").into_bytes())
    } else {
        Cow::Borrowed(cell.as_bytes())
    }
}

impl RelationalWriter for TsvWriter {
    fn write_table(&mut self, table: TableKind, header: &[&str], rows: &[Row]) -> Result<()> {
        let path = self.dir.join(table.file_name());
        let file = File::create(&path).map_err(|source| MapError::io(&path, source))?;
        let mut writer = WriterBuilder::new()
            .delimiter(b'\t')
            .quote_style(QuoteStyle::Never)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(file);

        writer.write_record(header)?;
        for row in rows {
            writer.write_record(row.iter().map(|cell| sanitize(cell)))?;
        }
        let mut file = writer
            .into_inner()
            .map_err(|e| MapError::io(&path, e.into_error()))?;
        file.flush().map_err(|source| MapError::io(&path, source))?;

        debug!(table = %table, rows = rows.len(), path = %path.display(), "wrote table");
        self.written.push(path);
        Ok(())
    }
}

/// Keeps every table in memory, keyed by table.
#[derive(Debug, Default)]
pub struct MemoryWriter {
    tables: BTreeMap<TableKind, (Vec<String>, Vec<Row>)>,
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(&self, table: TableKind) -> Option<&[String]> {
        self.tables.get(&table).map(|(header, _)| header.as_slice())
    }

    pub fn rows(&self, table: TableKind) -> Option<&[Row]> {
        self.tables.get(&table).map(|(_, rows)| rows.as_slice())
    }

    pub fn tables(&self) -> impl Iterator<Item = TableKind> + '_ {
        self.tables.keys().copied()
    }
}

impl RelationalWriter for MemoryWriter {
    fn write_table(&mut self, table: TableKind, header: &[&str], rows: &[Row]) -> Result<()> {
        let header = header.iter().map(ToString::to_string).collect();
        self.tables.insert(table, (header, rows.to_vec()));
        Ok(())
    }
}
