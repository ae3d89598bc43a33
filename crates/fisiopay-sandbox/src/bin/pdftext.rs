//! fisiopay-pdftext - the extraction worker
//!
//! Receives a PDF path as its sole argument and writes exactly one JSON
//! protocol line to stdout: `{"success":true,"text":"..."}` or
//! `{"error":"message"}`. Exit code 0 on success, 1 on failure.
//!
//! No logger is installed here, so `log`-facade records from the PDF
//! library are discarded instead of reaching any stream the parent reads;
//! the parent additionally routes this process's stderr to the null
//! device. Input is path-based only - the worker never reads PDF bytes
//! from stdin.

use anyhow::{anyhow, bail, Result};
use fisiopay_sandbox::WorkerReply;
use std::io::Write;
use std::path::Path;

fn main() {
    let (reply, code) = match std::env::args().nth(1) {
        Some(path) => match extract(Path::new(&path)) {
            Ok(text) => (WorkerReply::success(text), 0),
            Err(e) => (WorkerReply::failure(format!("{:#}", e)), 1),
        },
        None => (WorkerReply::failure("file path argument missing"), 1),
    };

    let mut stdout = std::io::stdout();
    let _ = writeln!(stdout, "{}", reply.to_line());
    let _ = stdout.flush();

    std::process::exit(code);
}

fn extract(path: &Path) -> Result<String> {
    if !path.is_file() {
        bail!("file not found: {}", path.display());
    }

    pdf_extract::extract_text(path)
        .map_err(|e| anyhow!("failed to extract text from {}: {}", path.display(), e))
}
