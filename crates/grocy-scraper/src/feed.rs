//! JSON-lines feed files, one card per line.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use grocy_core::RawScrapedFields;

use crate::error::ScraperError;
use crate::extract::RawFieldsExtractor;

/// A restartable feed: every [`FeedReader::open`] starts again from the top
/// of the file.
pub struct FeedReader {
    path: PathBuf,
    extractor: Box<dyn RawFieldsExtractor>,
}

impl FeedReader {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, extractor: Box<dyn RawFieldsExtractor>) -> Self {
        Self {
            path: path.into(),
            extractor,
        }
    }

    #[must_use]
    pub fn source(&self) -> &'static str {
        self.extractor.source()
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Opens the feed for a fresh pass.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::FeedIo`] if the file cannot be opened. This is
    /// the only feed-wide failure; per-line problems surface as `Err` items.
    pub fn open(&self) -> Result<FeedRecords<'_>, ScraperError> {
        let file = File::open(&self.path).map_err(|source| ScraperError::FeedIo {
            path: self.path.display().to_string(),
            source,
        })?;
        Ok(FeedRecords {
            lines: BufReader::new(file).lines(),
            extractor: self.extractor.as_ref(),
            path: &self.path,
            line_no: 0,
            done: false,
        })
    }

    /// Reads the whole feed in order.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::FeedIo`] if the file cannot be opened.
    pub fn read_all(&self) -> Result<Vec<Result<RawScrapedFields, ScraperError>>, ScraperError> {
        Ok(self.open()?.collect())
    }
}

/// Iterator over one pass of a feed. Blank lines are skipped; a read error
/// ends the pass after being yielded once.
pub struct FeedRecords<'a> {
    lines: Lines<BufReader<File>>,
    extractor: &'a dyn RawFieldsExtractor,
    path: &'a Path,
    line_no: usize,
    done: bool,
}

impl FeedRecords<'_> {
    /// 1-based number of the line most recently read.
    #[must_use]
    pub fn line_no(&self) -> usize {
        self.line_no
    }
}

impl Iterator for FeedRecords<'_> {
    type Item = Result<RawScrapedFields, ScraperError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(source) => {
                    self.done = true;
                    return Some(Err(ScraperError::FeedIo {
                        path: self.path.display().to_string(),
                        source,
                    }));
                }
            };
            self.line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            let result = self.extractor.extract(&line).map_err(|e| match e {
                ScraperError::Deserialize { context, source } => ScraperError::Deserialize {
                    context: format!("{context} at {}:{}", self.path.display(), self.line_no),
                    source,
                },
                other => other,
            });
            return Some(result);
        }
    }
}
