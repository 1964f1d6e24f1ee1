use std::{
    fs::File,
    io::{BufRead, BufWriter, Write},
    path::Path,
};

use tracing::{debug, info, instrument};

use crate::{
    catalog::{page::HeapPage, schema::Schema},
    config::{check_page_size, DEFAULT_PAGE_SIZE},
    error::{DbResult, Error},
    exec::{tuple::Tuple, value::Value},
};

/// Builds heap files from rows, packing as many tuples per page as fit.
pub struct HeapFileEncoder<'a> {
    schema: &'a Schema,
    page_size: usize,
}

impl<'a> HeapFileEncoder<'a> {
    /// Constructs an encoder for the given schema, using the default page size.
    pub fn new(schema: &'a Schema) -> Self {
        Self::with_page_size(schema, DEFAULT_PAGE_SIZE)
    }

    /// Constructs an encoder for the given schema and page size.
    pub fn with_page_size(schema: &'a Schema, page_size: usize) -> Self {
        HeapFileEncoder { schema, page_size }
    }

    /// Returns the number of tuples that fit in one page.
    pub fn rows_per_page(&self) -> usize {
        HeapPage::slot_count(self.page_size, self.schema)
    }

    /// Writes the rows as a sequence of pages, returning the number of pages
    /// written. No page is written for an empty input.
    #[instrument(level = "debug", skip_all)]
    pub fn encode<W, I>(&self, rows: I, mut out: W) -> DbResult<u32>
    where
        W: Write,
        I: IntoIterator<Item = DbResult<Vec<Value>>>,
    {
        check_page_size(self.page_size)?;
        let per_page = self.rows_per_page();
        if per_page == 0 {
            return Err(Error::InvalidArgument(
                format!(
                    "a {}-byte tuple doesn't fit in a {}-byte page",
                    self.schema.byte_size(),
                    self.page_size
                )
                .into(),
            ));
        }

        let mut pages = 0;
        let mut batch = Vec::with_capacity(per_page);
        for row in rows {
            let row = row?;
            Tuple::check_row(self.schema, &row)?;
            batch.push(row);
            if batch.len() == per_page {
                self.flush(&mut batch, &mut out)?;
                pages += 1;
            }
        }
        if !batch.is_empty() {
            self.flush(&mut batch, &mut out)?;
            pages += 1;
        }
        out.flush()?;

        debug!(pages, "encoded heap file");
        Ok(pages)
    }

    /// Parses comma-separated lines (one row per line, one value per field)
    /// and writes them as pages. Blank lines are skipped.
    pub fn encode_text<R, W>(&self, input: R, out: W) -> DbResult<u32>
    where
        R: BufRead,
        W: Write,
    {
        let rows = input
            .lines()
            .enumerate()
            .filter(|(_, line)| line.as_ref().map_or(true, |line| !line.trim().is_empty()))
            .map(|(n, line)| self.parse_line(n + 1, &line?));
        self.encode(rows, out)
    }

    /// Encodes comma-separated text from `input` into a new heap file at
    /// `output`.
    pub fn convert(&self, input: &Path, output: &Path) -> DbResult<u32> {
        let reader = std::io::BufReader::new(File::open(input)?);
        let writer = BufWriter::new(File::create(output)?);
        let pages = self.encode_text(reader, writer)?;
        info!(?input, ?output, pages, "converted text file");
        Ok(pages)
    }

    fn parse_line(&self, line_number: usize, line: &str) -> DbResult<Vec<Value>> {
        let raw: Vec<_> = line.split(',').collect();
        if raw.len() != self.schema.field_count() {
            return Err(Error::InvalidArgument(
                format!(
                    "line {line_number}: expected {} fields, but got {}",
                    self.schema.field_count(),
                    raw.len()
                )
                .into(),
            ));
        }
        self.schema
            .types()
            .zip(raw)
            .map(|(ty, raw)| ty.parse_value(raw))
            .collect()
    }

    fn flush<W: Write>(&self, batch: &mut Vec<Vec<Value>>, out: &mut W) -> DbResult<()> {
        let bytes = HeapPage::encode(self.schema, batch, self.page_size)?;
        out.write_all(&bytes)?;
        batch.clear();
        Ok(())
    }
}
