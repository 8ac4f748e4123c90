use anyhow::{Context, Result, bail};
use std::fs;
use std::io::{IsTerminal, Read, Write};
use std::path::{Path, PathBuf};

pub fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
}

/// Resolves the input convention shared by every mode: a positional FILE,
/// `--input FILE`, or piped stdin.
pub fn read_input(positional: Option<&PathBuf>, flag: Option<&PathBuf>) -> Result<String> {
    let path = flag.or(positional);
    let content = match path {
        Some(path) => read_to_string(path)?,
        None => {
            let mut stdin = std::io::stdin();
            if stdin.is_terminal() {
                bail!("no input was provided and there was none from stdin");
            }
            let mut buffer = String::new();
            stdin
                .read_to_string(&mut buffer)
                .context("read from stdin")?;
            buffer
        }
    };
    if content.trim().is_empty() {
        bail!("input is empty");
    }
    Ok(content)
}

/// Writes one line per result to the given file, or stdout when absent.
pub fn write_output(path: Option<&PathBuf>, lines: &[String]) -> Result<()> {
    match path {
        Some(path) => {
            let mut out = String::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
            for line in lines {
                out.push_str(line);
                out.push('\n');
            }
            fs::write(path, out).with_context(|| format!("write {}", path.display()))
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            for line in lines {
                writeln!(handle, "{line}")?;
            }
            Ok(())
        }
    }
}
