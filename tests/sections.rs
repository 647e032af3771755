//! PDF upload → sections → relational store.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn rnl_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop();
    path.pop();
    path.push("rnl");
    path
}

/// Single-page PDF showing `phrase` in Helvetica.
/// Builds body then xref with correct byte offsets so pdf-extract can parse it.
fn minimal_pdf(phrase: &str) -> Vec<u8> {
    let stream = format!("BT /F1 12 Tf 100 700 Td ({}) Tj ET", phrase);
    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");
    let o1 = out.len();
    out.extend_from_slice(b"1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n");
    let o2 = out.len();
    out.extend_from_slice(b"2 0 obj << /Type /Pages /Kids [3 0 R] /Count 1 >> endobj\n");
    let o3 = out.len();
    out.extend_from_slice(b"3 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >> endobj\n");
    let o4 = out.len();
    out.extend_from_slice(
        format!(
            "4 0 obj << /Length {} >> stream\n{}\nendstream endobj\n",
            stream.len(),
            stream
        )
        .as_bytes(),
    );
    let o5 = out.len();
    out.extend_from_slice(
        b"5 0 obj << /Type /Font /Subtype /Type1 /BaseFont /Helvetica >> endobj\n",
    );
    let xref_start = out.len();
    out.extend_from_slice(b"xref\n0 6\n");
    out.extend_from_slice(format!("{:010} 65535 f \n", 0).as_bytes());
    for offset in [o1, o2, o3, o4, o5] {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(b"trailer << /Size 6 /Root 1 0 R >>\nstartxref\n");
    out.extend_from_slice(format!("{}\n", xref_start).as_bytes());
    out.extend_from_slice(b"%%EOF\n");
    out
}

fn setup() -> (TempDir, PathBuf, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();
    let config_path = root.join("renalyser.toml");
    fs::write(
        &config_path,
        format!(
            "[store]\nurl = \"sqlite:{}/store.sqlite\"\n\n[llm]\nprovider = \"disabled\"\n",
            root.display()
        ),
    )
    .unwrap();
    let pdf = root.join("paper.pdf");
    fs::write(&pdf, minimal_pdf("spec test phrase")).unwrap();
    (tmp, config_path, pdf)
}

fn run_rnl(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let output = Command::new(rnl_binary())
        .arg("--config")
        .arg(config_path)
        .args(args)
        .env_remove("RENALYSER_STORE_URL")
        .env_remove("RENALYSER_SECTIONS_URL")
        .output()
        .unwrap();
    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.success(),
    )
}

#[test]
fn dry_run_prints_without_storing() {
    let (tmp, config_path, pdf) = setup();

    let (stdout, stderr, success) =
        run_rnl(&config_path, &["sections", pdf.to_str().unwrap(), "--dry-run"]);
    assert!(success, "sections failed: {}", stderr);
    assert!(stdout.contains("Preamble"));
    assert!(stdout.contains("dry-run"));
    assert!(!tmp.path().join("store.sqlite").exists());
}

#[test]
fn sections_are_stored_and_counted() {
    let (_tmp, config_path, pdf) = setup();

    let (stdout, stderr, success) = run_rnl(&config_path, &["sections", pdf.to_str().unwrap()]);
    assert!(success, "sections failed: {}", stderr);
    assert!(stdout.contains("stored: 1 sections"));

    let (stdout, stderr, success) = run_rnl(&config_path, &["stats"]);
    assert!(success, "stats failed: {}", stderr);
    assert!(stdout.contains("Sections:    1"));
}

#[test]
fn csv_is_not_a_document() {
    let (tmp, config_path, _) = setup();
    let csv = tmp.path().join("table.csv");
    fs::write(&csv, "a\n1\n").unwrap();

    let (_, stderr, success) = run_rnl(&config_path, &["sections", csv.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("not a PDF document"));
}
