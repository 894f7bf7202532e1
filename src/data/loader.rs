//! Census Data Loader Module
//! Reads the delimited microdata file into memory using Polars.

use polars::prelude::*;
use std::fmt;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Delimiters tried when diagnosing a header that parsed into one column.
const OTHER_DELIMITERS: [u8; 3] = [b',', b'\t', b'|'];

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read {source_name}: {error}")]
    Io {
        source_name: String,
        #[source]
        error: std::io::Error,
    },
    #[error("{0} is not valid UTF-8; try the Latin-1 encoding")]
    Encoding(String),
    #[error("{source_name}: header has a single column but contains {found:?}; expected {expected:?} as delimiter")]
    DelimiterMismatch {
        source_name: String,
        expected: char,
        found: char,
    },
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] PolarsError),
    #[error("Failed to fetch {url}: {reason}")]
    Remote { url: String, reason: String },
    #[error("Remote sources need the `remote` feature: {0}")]
    RemoteUnsupported(String),
}

/// Where the microdata comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Path(PathBuf),
    Url(String),
}

impl DataSource {
    /// Strings starting with http:// or https:// are URLs, anything else a path.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            DataSource::Url(trimmed.to_string())
        } else {
            DataSource::Path(PathBuf::from(trimmed))
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Path(path) => write!(f, "{}", path.display()),
            DataSource::Url(url) => write!(f, "{}", url),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum SourceEncoding {
    #[default]
    Latin1,
    Utf8,
}

/// Parsing options for the census file.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    pub encoding: SourceEncoding,
    pub delimiter: char,
    pub infer_schema_length: usize,
    /// Cells that do not parse as the inferred column type become null
    /// instead of failing the load.
    pub ignore_parse_errors: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            encoding: SourceEncoding::Latin1,
            delimiter: ';',
            infer_schema_length: 10000,
            ignore_parse_errors: true,
        }
    }
}

/// One census year loaded into memory. Never mutated after load.
#[derive(Debug, Clone)]
pub struct Dataset {
    frame: DataFrame,
    source: String,
}

impl Dataset {
    pub fn new(frame: DataFrame, source: impl Into<String>) -> Self {
        Self {
            frame,
            source: source.into(),
        }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn row_count(&self) -> usize {
        self.frame.height()
    }

    pub fn columns(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }
}

/// Loads the census file and keeps the result for the process lifetime.
pub struct DataLoader {
    options: LoadOptions,
    dataset: Option<(DataSource, Arc<Dataset>)>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new(LoadOptions::default())
    }
}

impl DataLoader {
    pub fn new(options: LoadOptions) -> Self {
        Self {
            options,
            dataset: None,
        }
    }

    /// Load `source`, returning the memoized dataset if it was already loaded.
    pub fn load(&mut self, source: &DataSource) -> Result<Arc<Dataset>, LoadError> {
        if let Some((loaded, dataset)) = &self.dataset {
            if loaded == source {
                log::debug!("Reusing loaded dataset for {}", source);
                return Ok(Arc::clone(dataset));
            }
        }

        let dataset = Arc::new(Self::read_source(source, &self.options)?);
        self.dataset = Some((source.clone(), Arc::clone(&dataset)));
        Ok(dataset)
    }

    /// Memoized dataset for `source`, if that is what was loaded last.
    pub fn cached(&self, source: &DataSource) -> Option<Arc<Dataset>> {
        self.dataset
            .as_ref()
            .filter(|(loaded, _)| loaded == source)
            .map(|(_, d)| Arc::clone(d))
    }

    /// Store a dataset read elsewhere (used for async loading)
    pub fn set_dataset(&mut self, source: DataSource, dataset: Arc<Dataset>) {
        self.dataset = Some((source, dataset));
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Read and parse without touching any memoized state.
    pub fn read_source(source: &DataSource, options: &LoadOptions) -> Result<Dataset, LoadError> {
        log::info!("Loading census data from {}", source);
        let bytes = match source {
            DataSource::Path(path) => std::fs::read(path).map_err(|error| LoadError::Io {
                source_name: source.to_string(),
                error,
            })?,
            DataSource::Url(url) => fetch_remote(url)?,
        };

        let frame = Self::parse_bytes(&bytes, &source.to_string(), options)?;
        log::info!(
            "Loaded {} rows, {} columns from {}",
            frame.height(),
            frame.width(),
            source
        );
        Ok(Dataset::new(frame, source.to_string()))
    }

    /// Decode and parse raw file contents.
    pub fn parse_bytes(
        bytes: &[u8],
        source_name: &str,
        options: &LoadOptions,
    ) -> Result<DataFrame, LoadError> {
        let text = decode(bytes, options.encoding, source_name)?;
        check_delimiter(&text, options.delimiter, source_name)?;

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(options.infer_schema_length))
            .with_ignore_errors(options.ignore_parse_errors)
            .with_parse_options(
                CsvParseOptions::default()
                    .with_separator(options.delimiter as u8)
                    .with_quote_char(Some(b'"')),
            )
            .into_reader_with_file_handle(Cursor::new(text.into_bytes()))
            .finish()?;

        Ok(df)
    }
}

/// Latin-1 maps every byte to the code point of the same value.
fn decode(bytes: &[u8], encoding: SourceEncoding, source_name: &str) -> Result<String, LoadError> {
    match encoding {
        SourceEncoding::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
        SourceEncoding::Utf8 => {
            let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
            String::from_utf8(bytes.to_vec())
                .map_err(|_| LoadError::Encoding(source_name.to_string()))
        }
    }
}

fn check_delimiter(text: &str, delimiter: char, source_name: &str) -> Result<(), LoadError> {
    let header = text.lines().next().unwrap_or_default();
    if header.contains(delimiter) {
        return Ok(());
    }
    match OTHER_DELIMITERS
        .iter()
        .map(|&b| b as char)
        .find(|&c| c != delimiter && header.contains(c))
    {
        Some(found) => Err(LoadError::DelimiterMismatch {
            source_name: source_name.to_string(),
            expected: delimiter,
            found,
        }),
        None => Ok(()),
    }
}

#[cfg(feature = "remote")]
fn fetch_remote(url: &str) -> Result<Vec<u8>, LoadError> {
    let remote_err = |reason: String| LoadError::Remote {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::blocking::Client::builder()
        .gzip(true)
        .build()
        .map_err(|e| remote_err(e.to_string()))?;
    let resp = client.get(url).send().map_err(|e| remote_err(e.to_string()))?;
    let status = resp.status();
    if !status.is_success() {
        return Err(remote_err(format!("HTTP {status}")));
    }
    resp.bytes()
        .map(|b| b.to_vec())
        .map_err(|e| remote_err(e.to_string()))
}

#[cfg(not(feature = "remote"))]
fn fetch_remote(url: &str) -> Result<Vec<u8>, LoadError> {
    Err(LoadError::RemoteUnsupported(url.to_string()))
}
