//! Tesseract OCR engine.
//!
//! We ask `tesseract` for TSV output, which lists every recognized word with
//! its box and confidence. Words are regrouped into phrase-sized blocks,
//! because our table detector expects one block per cell, not per word.

use std::{fs::File, io::Write as _};

use tokio::process::Command;

use super::page::{OcrPageEngine, OcrPageInput};
use crate::{
    async_utils::{blocking_iter_streams::spawn_blocking_propagating_panics, check_for_command_failure},
    cpu_limit::with_cpu_semaphore,
    prelude::*,
    structure::{OcrPage, TextBlock},
};

/// TSV `level` of a single word.
const WORD_LEVEL: u32 = 5;

/// OCR engine wrapping the `tesseract` CLI tool.
pub struct TesseractOcrPageEngine {
    /// Language models, like `chi_sim+eng`.
    lang: String,
    /// Resolution of our rasters, so Tesseract doesn't have to guess.
    dpi: u32,
}

impl TesseractOcrPageEngine {
    /// Create a new `tesseract` engine.
    pub fn new(lang: &str, dpi: u32) -> Self {
        Self {
            lang: lang.to_owned(),
            dpi,
        }
    }
}

#[async_trait]
impl OcrPageEngine for TesseractOcrPageEngine {
    #[instrument(level = "debug", skip_all, fields(page = input.page_number))]
    async fn ocr_page(&self, input: OcrPageInput) -> Result<OcrPage> {
        let extension = mime_guess::get_mime_extensions_str(&input.page.mime_type)
            .and_then(|exts| exts.first())
            .ok_or_else(|| anyhow!("cannot determine extension for {}", input.page.mime_type))?;
        let page_number = input.page_number;
        let (width, height) = input.page.dimensions()?;

        // Write our input to a temporary file.
        let tmpdir = tempfile::TempDir::with_prefix("tesseract")?;
        let input_path = tmpdir.path().join(format!("input.{extension}"));
        let mut input_file =
            File::create(&input_path).context("cannot create tesseract input file")?;
        input_file
            .write_all(&input.page.data)
            .context("cannot write tesseract input file")?;
        input_file.flush().context("cannot flush tesseract input file")?;
        // The page can be large, and we don't need it any more.
        drop(input);

        let output = with_cpu_semaphore(|| async {
            Command::new("tesseract")
                .arg(&input_path)
                .arg("stdout")
                .arg("-l")
                .arg(&self.lang)
                .arg("--dpi")
                .arg(self.dpi.to_string())
                .arg("tsv")
                .output()
                .await
                .context("cannot run tesseract")
        })
        .await?;
        check_for_command_failure("tesseract", &output, None)?;

        let tsv = output.stdout;
        let blocks = spawn_blocking_propagating_panics(move || parse_tsv(&tsv)).await??;
        debug!(blocks = blocks.len(), width, height, "OCRed page");
        Ok(OcrPage {
            page: page_number,
            width,
            height,
            blocks,
        })
    }
}

/// One row of Tesseract's TSV output.
#[derive(Debug, Deserialize)]
struct TsvRow {
    level: u32,
    page_num: u32,
    block_num: u32,
    par_num: u32,
    line_num: u32,
    left: i32,
    top: i32,
    width: i32,
    height: i32,
    conf: f64,
    #[serde(default)]
    text: String,
}

impl TsvRow {
    fn line_key(&self) -> (u32, u32, u32, u32) {
        (self.page_num, self.block_num, self.par_num, self.line_num)
    }

    fn right(&self) -> i32 {
        self.left + self.width
    }
}

/// Parse TSV output into phrase blocks.
///
/// Only the first image page is used, since each [`Page`](crate::page_iter::Page)
/// is a single raster.
fn parse_tsv(tsv: &[u8]) -> Result<Vec<TextBlock>> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .flexible(true)
        .from_reader(tsv);
    let mut words = vec![];
    for row in rdr.deserialize::<TsvRow>() {
        let row = row.context("cannot parse tesseract TSV output")?;
        if row.level == WORD_LEVEL && row.page_num == 1 && row.conf >= 0.0 && !row.text.trim().is_empty() {
            words.push(row);
        }
    }

    // TSV rows are already in reading order, grouped by line.
    let mut blocks = vec![];
    let mut line_start = 0;
    for idx in 1..=words.len() {
        if idx == words.len() || words[idx].line_key() != words[line_start].line_key() {
            blocks.extend(line_phrases(&words[line_start..idx]));
            line_start = idx;
        }
    }
    Ok(blocks)
}

/// Split one line of words into phrases wherever the horizontal gap is
/// larger than the line is tall.
fn line_phrases(line: &[TsvRow]) -> Vec<TextBlock> {
    let Some(line_height) = line.iter().map(|w| w.height).max() else {
        return vec![];
    };
    let mut sorted = line.iter().collect::<Vec<_>>();
    sorted.sort_by_key(|w| w.left);

    let mut phrases: Vec<Vec<&TsvRow>> = vec![];
    for word in sorted {
        let prev = phrases.last().and_then(|phrase| phrase.last());
        let joins = prev.is_some_and(|prev| word.left - prev.right() <= line_height);
        match phrases.last_mut() {
            Some(phrase) if joins => phrase.push(word),
            _ => phrases.push(vec![word]),
        }
    }
    phrases.iter().map(|phrase| phrase_block(phrase)).collect()
}

/// Merge the words of a phrase into one block.
fn phrase_block(words: &[&TsvRow]) -> TextBlock {
    let mut text = String::new();
    for word in words {
        let word_text = word.text.trim();
        // CJK text has no spaces between words, but Tesseract splits it into
        // one "word" per character or two.
        if let (Some(prev), Some(next)) = (text.chars().last(), word_text.chars().next())
            && prev.is_ascii()
            && next.is_ascii()
        {
            text.push(' ');
        }
        text.push_str(word_text);
    }
    let x1 = words.iter().map(|w| w.left).min().unwrap_or_default();
    let y1 = words.iter().map(|w| w.top).min().unwrap_or_default();
    let x2 = words.iter().map(|w| w.right()).max().unwrap_or_default();
    let y2 = words.iter().map(|w| w.top + w.height).max().unwrap_or_default();
    let confidence = words.iter().map(|w| w.conf).sum::<f64>() / words.len().max(1) as f64 / 100.0;
    TextBlock::new(text, confidence, [[x1, y1], [x2, y1], [x2, y2], [x1, y2]])
}
