// # -----------------------------
// # crates/tools/src/fs.rs
// # -----------------------------
use anyhow::{Context, Result};
use std::io::{stdin, Read};
use std::path::Path;

pub fn read_to_string(path: &str) -> Result<String> {
    let p = Path::new(path);
    let s = std::fs::read_to_string(p).with_context(|| format!("read {path}"))?;
    Ok(s)
}

/// Reads `input` as a file path, or stdin when it is `-`.
pub fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut s = String::new();
        stdin().lock().read_to_string(&mut s).context("read stdin")?;
        Ok(s)
    } else {
        read_to_string(input)
    }
}

/// Writes through a sibling temp file and a rename so a crash never leaves a
/// half-written source file behind.
pub fn write_from_string(path: &str, content: &str) -> Result<()> {
    let p = Path::new(path);
    if let Some(parent) = p.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let file_name = p
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "out".to_string());
    let tmp = p.with_file_name(format!(".{file_name}.coda-tmp"));
    std::fs::write(&tmp, content).with_context(|| format!("write {}", tmp.display()))?;
    std::fs::rename(&tmp, p).with_context(|| format!("rename into {path}"))?;
    Ok(())
}
