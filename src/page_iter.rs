//! Iterate over the pages of a document as raster images.

use std::{collections::BTreeMap, fs, io::Cursor, process::Output, sync::LazyLock, vec};

use clap::Args;
use image::ImageReader;
use regex::Regex;
use tokio::process::Command;

use crate::{async_utils::check_for_command_failure, cpu_limit::with_cpu_semaphore, prelude::*};

/// Image types we can pass to OCR as-is. Each is a single page.
const SUPPORTED_IMAGE_TYPES: &[&str] = &[
    "image/png",
    "image/jpeg",
    "image/bmp",
    "image/tiff",
    "image/webp",
];

/// Poppler prints "Error" for lots of things, not all of them fatal.
static ERROR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)error").expect("failed to compile regex"));

/// Damaged cross-reference tables are common in scans, and Poppler recovers.
static DOWNGRADE_TO_WARNING_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)error: xref num").expect("failed to compile regex"));

/// Does this line of Poppler output mean the command failed?
fn is_error_line(line: &str) -> bool {
    ERROR_REGEX.is_match(line) && !DOWNGRADE_TO_WARNING_REGEX.is_match(line)
}

/// A raster image of one page.
#[derive(Debug)]
pub struct Page {
    /// The MIME type of our data. One of [`SUPPORTED_IMAGE_TYPES`].
    pub mime_type: String,
    /// The encoded image.
    pub data: Vec<u8>,
}

impl Page {
    /// Width and height in pixels, read from the image header.
    pub fn dimensions(&self) -> Result<(u32, u32)> {
        ImageReader::new(Cursor::new(&self.data))
            .with_guessed_format()
            .context("failed to detect page image format")?
            .into_dimensions()
            .context("failed to read page image dimensions")
    }
}

/// Options for constructing a [`PageIter`].
#[derive(Args, Clone, Debug)]
pub struct PageIterOptions {
    /// The DPI to use when rasterizing PDFs.
    #[clap(long, default_value = "300")]
    pub rasterize_dpi: u32,

    /// The maximum number of pages to process per document. Later pages are
    /// skipped, with a warning.
    #[clap(long)]
    pub max_pages: Option<usize>,
}

impl Default for PageIterOptions {
    fn default() -> Self {
        Self {
            rasterize_dpi: 300,
            max_pages: None,
        }
    }
}

/// A forward-only iterator over the pages of a document.
///
/// PDFs are rasterized up front into a temporary directory, using Poppler's
/// `pdftocairo`. Each page file is deleted as soon as it has been read, so at
/// most the pages not yet consumed take up disk space.
pub struct PageIter {
    /// Holds rasterized pages, if we made any. Deleted on [`Drop`].
    tmpdir: Option<tempfile::TempDir>,
    /// The MIME type of our outputs.
    mime_type: String,
    /// The page files still to be read.
    paths: vec::IntoIter<PathBuf>,
    /// Number of pages in the document.
    total_pages: usize,
    /// The maximum number of pages we are allowed to process.
    max_pages: Option<usize>,
    /// Anything the rasterizer reported about the document.
    warnings: Vec<String>,
}

impl PageIter {
    /// Create a new [`PageIter`] from a path, based on the detected MIME type.
    #[instrument(level = "debug", skip_all, fields(path = %path.display()))]
    pub async fn from_path(path: &Path, options: &PageIterOptions) -> Result<Self> {
        let mime_type = get_mime_type(path)?;
        if SUPPORTED_IMAGE_TYPES.contains(&mime_type.as_str()) {
            Ok(Self {
                tmpdir: None,
                mime_type,
                paths: vec![path.to_owned()].into_iter(),
                total_pages: 1,
                max_pages: options.max_pages,
                warnings: vec![],
            })
        } else if mime_type == "application/pdf" {
            Self::from_rasterized_pdf(path, options).await
        } else {
            Err(anyhow!(
                "unsupported MIME type {} for {:?} (supported: PDF, PNG, JPEG, BMP, TIFF, WebP)",
                mime_type,
                path.display()
            ))
        }
    }

    /// Rasterize a PDF to one PNG per page.
    #[instrument(level = "debug", skip_all, fields(path = %path.display(), dpi = options.rasterize_dpi))]
    async fn from_rasterized_pdf(path: &Path, options: &PageIterOptions) -> Result<Self> {
        let total_pages = get_pdf_page_count(path).await?;

        let filename = path
            .file_name()
            .context("failed to get filename from PDF path")?;
        let tmpdir = tempfile::TempDir::with_prefix("pages")?;

        // pdftocairo adds a zero-padded page number to this name.
        let out_path = tmpdir.path().join(filename).with_extension("");
        let mut cmd = Command::new("pdftocairo");
        cmd.arg("-png")
            .arg("-r")
            .arg(options.rasterize_dpi.to_string());
        if let Some(max_pages) = options.max_pages
            && total_pages > max_pages
        {
            // Poppler page numbers are 1-based and the range is inclusive.
            cmd.arg("-l").arg(max_pages.to_string());
        }
        let output = with_cpu_semaphore(|| async {
            cmd.arg(path)
                .arg(&out_path)
                .output()
                .await
                .with_context(|| format!("failed to run pdftocairo on {:?}", path.display()))
        })
        .await?;
        check_for_command_failure("pdftocairo", &output, Some(&is_error_line))?;

        let paths = sorted_dir_entries(tmpdir.path())?;
        debug!(pages = paths.len(), total_pages, "Rasterized PDF");
        Ok(Self {
            tmpdir: Some(tmpdir),
            mime_type: "image/png".to_owned(),
            paths: paths.into_iter(),
            total_pages,
            max_pages: options.max_pages,
            warnings: command_warnings(&output),
        })
    }

    /// Anything the rasterizer reported about the document.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Will this iterator skip some of the document's pages?
    pub fn is_incomplete(&self) -> bool {
        self.max_pages
            .is_some_and(|max_pages| self.total_pages > max_pages)
    }

    /// Return an error describing skipped pages, if there are any.
    pub fn check_complete(&self) -> Result<()> {
        match self.max_pages {
            Some(max_pages) if self.is_incomplete() => Err(anyhow!(
                "Only {}/{} pages processed (because of --max-pages)",
                max_pages,
                self.total_pages
            )),
            _ => Ok(()),
        }
    }
}

impl Drop for PageIter {
    fn drop(&mut self) {
        if let Some(tmpdir) = self.tmpdir.take() {
            let tmpdir_path = tmpdir.path().to_owned();
            if let Err(err) = tmpdir.close() {
                error!(
                    directory = ?tmpdir_path.display(),
                    "failed to delete temporary directory: {}",
                    err
                );
            }
        }
    }
}

impl Iterator for PageIter {
    type Item = Result<Page>;

    fn next(&mut self) -> Option<Self::Item> {
        let path = self.paths.next()?;
        Some(self.read_page(&path))
    }
}

impl PageIter {
    /// Read one page, deleting it afterwards if it's one of our temp files.
    fn read_page(&self, path: &Path) -> Result<Page> {
        let data =
            fs::read(path).with_context(|| format!("failed to read file {:?}", path.display()))?;
        if self.tmpdir.is_some() {
            fs::remove_file(path)
                .with_context(|| format!("failed to delete file {:?}", path.display()))?;
        }
        Ok(Page {
            mime_type: self.mime_type.clone(),
            data,
        })
    }
}

/// List a directory's files in lexical order, which is page order for
/// `pdftocairo` output.
fn sorted_dir_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = dir
        .read_dir()
        .with_context(|| format!("failed to read temporary directory {:?}", dir.display()))?
        .map(|entry| {
            entry.map(|e| e.path()).with_context(|| {
                format!("failed to read entry in temporary directory {:?}", dir.display())
            })
        })
        .collect::<Result<Vec<_>>>()?;
    paths.sort();
    Ok(paths)
}

/// Non-empty output lines of a successful command.
fn command_warnings(output: &Output) -> Vec<String> {
    [&output.stdout, &output.stderr]
        .into_iter()
        .flat_map(|bytes| {
            String::from_utf8_lossy(bytes)
                .lines()
                .map(|line| line.trim().to_owned())
                .filter(|line| !line.is_empty())
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Get the number of pages in a PDF file.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub async fn get_pdf_page_count(path: &Path) -> Result<usize> {
    let output = with_cpu_semaphore(|| async {
        Command::new("pdfinfo")
            .arg(path)
            .output()
            .await
            .with_context(|| format!("failed to run pdfinfo on {:?}", path.display()))
    })
    .await?;
    check_for_command_failure("pdfinfo", &output, None)?;

    let output = String::from_utf8(output.stdout).context("pdfinfo output was not valid UTF-8")?;
    let properties = output
        .lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim(), value.trim()))
        .collect::<BTreeMap<_, _>>();
    properties
        .get("Pages")
        .ok_or_else(|| anyhow!("failed to find page count in pdfinfo output"))?
        .parse::<usize>()
        .with_context(|| {
            format!("failed to parse page count for {:?} from pdfinfo output", path.display())
        })
}

/// Get the MIME type of a file from its contents.
pub fn get_mime_type(path: &Path) -> Result<String> {
    Ok(infer::get_from_path(path)
        .with_context(|| format!("failed to get MIME type for {:?}", path.display()))?
        .ok_or_else(|| anyhow!("unknown MIME type for {:?}", path.display()))?
        .mime_type()
        .to_string())
}
