//! I/O utilities.
//!
//! This module reads JSON and TOML settings files, reads JSONL or CSV work
//! records, and writes JSONL output. Formats are detected from the file
//! extension, or from the first byte when reading standard input.

use std::{pin::Pin, sync::Arc, task::Context};

use futures::{TryStreamExt as _, pin_mut, stream::StreamExt as _};
use peekable::tokio::AsyncPeekable;
use serde_json::Map;
use tokio::{
    fs::File,
    io::{
        AsyncBufRead, AsyncBufReadExt as _, AsyncRead, AsyncReadExt as _, AsyncWrite,
        AsyncWriteExt as _, BufReader, BufWriter, ReadBuf,
    },
};
use tokio_stream::wrappers::LinesStream;

use super::BoxedStream;
use crate::{
    prelude::*,
    ui::{ProgressConfig, Ui},
};

/// A smart async reader that knows whether its input is JSON-like.
pub struct SmartReader {
    /// Do we expect our input to be either JSON or JSONL?
    is_json_like: bool,

    /// A human-readable description of the input source, for error messages.
    description: String,

    /// Our reader, pinned because async reads may hold pointers into it.
    reader: Pin<Box<dyn AsyncBufRead + Unpin + Send + Sync + 'static>>,
}

impl SmartReader {
    /// Create a new `SmartReader` from an existing reader, peeking at the
    /// first byte to detect JSON.
    pub async fn new_from_reader(
        description: String,
        reader: impl AsyncRead + Unpin + Send + Sync + 'static,
    ) -> Result<Self> {
        let mut peekable = AsyncPeekable::new(BufReader::new(reader));
        let mut buffer = [0; 1];
        // An empty input is neither, and will simply produce no records.
        let is_json_like = match peekable.peek_exact(&mut buffer).await {
            Ok(_) => buffer[0] == b'{',
            Err(err) if err.kind() == std::io::ErrorKind::UnexpectedEof => true,
            Err(err) => {
                return Err(err).with_context(|| format!("Failed to read {description}"));
            }
        };
        Ok(Self {
            is_json_like,
            description,
            reader: Box::pin(BufReader::new(peekable)),
        })
    }

    /// Create a new `SmartReader` from a [`Path`].
    pub async fn new_from_path(path: &Path) -> Result<Self> {
        let ext = path.extension().unwrap_or_default();
        let is_json_like = ext == "json" || ext == "jsonl";
        let file = File::open(path)
            .await
            .with_context(|| format!("Failed to open file at path: {:?}", path))?;
        Ok(Self {
            is_json_like,
            description: path.to_string_lossy().into_owned(),
            reader: Box::pin(BufReader::new(file)),
        })
    }

    /// Create a new `SmartReader` from either a [`Path`] or standard input.
    pub async fn new_from_path_or_stdin(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::new_from_path(path).await,
            None => Self::new_from_reader("stdin".to_owned(), tokio::io::stdin()).await,
        }
    }

    /// Is our input JSON-like?
    pub fn is_json_like(&self) -> bool {
        self.is_json_like
    }
}

impl AsyncRead for SmartReader {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> std::task::Poll<std::io::Result<()>> {
        Pin::get_mut(self).reader.as_mut().poll_read(cx, buf)
    }
}

impl AsyncBufRead for SmartReader {
    fn poll_fill_buf(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> std::task::Poll<std::io::Result<&[u8]>> {
        Pin::get_mut(self).reader.as_mut().poll_fill_buf(cx)
    }

    fn consume(self: Pin<&mut Self>, amt: usize) {
        Pin::get_mut(self).reader.as_mut().consume(amt)
    }
}

/// Read TOML or JSON from a file.
pub async fn read_json_or_toml<T>(path: &Path) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let mut reader = SmartReader::new_from_path(path).await?;
    let mut data = String::new();
    // Read all at once because our parsing libraries don't do async I/O.
    reader
        .read_to_string(&mut data)
        .await
        .with_context(|| format!("Failed to read file at path: {:?}", path))?;
    if reader.is_json_like() {
        serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse JSON from file at path: {:?}", path))
    } else {
        toml::from_str(&data)
            .with_context(|| format!("Failed to parse TOML from file at path: {:?}", path))
    }
}

/// Count JSONL or CSV records in a file, for our progress bar.
///
/// Returns `None` if we can't count without consuming the input.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub async fn count_jsonl_or_csv_records(ui: &Ui, path: &Path) -> Result<Option<usize>> {
    // Named pipes and the like can only be read once.
    if !path.is_file() {
        return Ok(None);
    }

    let spinner = ui.new_spinner(&ProgressConfig {
        emoji: "🧮",
        msg: "Counting input records",
        done_msg: "Counted input records",
    });

    let reader = SmartReader::new_from_path(path).await?;
    let count = if reader.is_json_like() {
        LinesStream::new(reader.lines())
            .try_filter(|line| futures::future::ready(!line.trim().is_empty()))
            .try_fold(0, |acc, _line| async move { Ok(acc + 1) })
            .await?
    } else {
        csv_async::AsyncReaderBuilder::new()
            .create_reader(reader)
            .into_byte_records()
            .try_fold(0, |acc, _record| async move { Ok(acc + 1) })
            .await?
    };
    spinner.finish_with_message(format!("Found {count} records"));
    Ok(Some(count))
}

/// A stream of [`serde_json::Value`] values.
pub type JsonStream = BoxedStream<Result<Value>>;

/// Read JSONL or CSV records from a file or stdin.
///
/// CSV columns become string-valued JSON fields. Blank JSONL lines are
/// skipped.
pub async fn read_jsonl_or_csv(path: Option<&Path>) -> Result<JsonStream> {
    let reader = SmartReader::new_from_path_or_stdin(path).await?;
    let description = Arc::new(reader.description.clone());
    if reader.is_json_like() {
        let lines = LinesStream::new(reader.lines())
            .try_filter(|line| futures::future::ready(!line.trim().is_empty()));
        Ok(lines
            .map(move |line| {
                let line = line
                    .with_context(|| format!("Failed to read line from {:?}", description))?;
                serde_json::from_str::<Value>(&line).with_context(|| {
                    format!("Failed to parse JSON from line in {:?}: {:?}", description, line)
                })
            })
            .boxed())
    } else {
        let mut reader = csv_async::AsyncReaderBuilder::new().create_reader(reader);
        let headers = Arc::new(
            reader
                .headers()
                .await
                .with_context(|| format!("Failed to read CSV headers from {:?}", description))?
                .to_owned(),
        );
        Ok(reader
            .into_records()
            .map(move |record| {
                let record = record
                    .with_context(|| format!("Failed to read CSV record from {:?}", description))?;
                let map = headers
                    .iter()
                    .zip(record.iter())
                    .map(|(header, value)| (header.to_owned(), Value::String(value.to_owned())))
                    .collect::<Map<String, Value>>();
                Ok(Value::Object(map))
            })
            .boxed())
    }
}

/// Create an [`AsyncWrite`] for a file or stdout.
pub async fn create_writer(
    path: Option<&Path>,
) -> Result<Box<dyn AsyncWrite + Unpin + Send + Sync + 'static>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .await
                .with_context(|| format!("Failed to create file at path: {:?}", path))?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(tokio::io::stdout())),
    }
}

/// Write a stream of JSON values to either standard output or a file, one
/// per line.
pub async fn write_output(path: Option<&Path>, stream: JsonStream) -> Result<()> {
    let mut writer = BufWriter::new(create_writer(path).await?);
    pin_mut!(stream);
    while let Some(value) = stream.next().await {
        let value = value?;
        let json = serde_json::to_string(&value)
            .with_context(|| format!("Failed to serialize JSON: {:?}", value))?;
        writer
            .write_all(json.as_bytes())
            .await
            .context("Failed to write JSON to output")?;
        writer
            .write_all(b"\n")
            .await
            .context("Failed to write newline to output")?;
    }
    writer.flush().await.context("Failed to flush output")?;
    Ok(())
}
