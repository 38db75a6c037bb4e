use super::SimulationJob;
use crate::truth::bit_string;
use serde_json::json;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Scratch files of a single simulator invocation.
#[derive(Debug, Clone)]
pub struct SimulationFiles {
    pub problem: PathBuf,
    pub result: PathBuf,
    pub stdout: PathBuf,
    pub stderr: PathBuf,
}

impl SimulationFiles {
    pub fn remove(&self) {
        for p in [&self.problem, &self.result, &self.stdout, &self.stderr] {
            let _ = fs::remove_file(p);
        }
    }

    /// Clears the result left by an earlier run of the same layout and input.
    pub fn clear_result(&self) -> io::Result<()> {
        remove_if_present(&self.result)
    }
}

fn remove_if_present(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

/// Copies the raw simulator input/output and logs into
/// `<root>/<name>/<layout id>/<input bits>/` with a small manifest.
pub fn export_bundle(
    root: &Path,
    job: &SimulationJob,
    files: &SimulationFiles,
    state: &str,
) -> io::Result<PathBuf> {
    let bits = bit_string(job.input);
    let dir = root.join(job.name).join(job.layout.id()).join(&bits);
    fs::create_dir_all(&dir)?;

    fs::copy(&files.problem, dir.join("problem.json"))?;
    let bundled_result = dir.join("result.json");
    if files.result.exists() {
        fs::copy(&files.result, &bundled_result)?;
    } else {
        remove_if_present(&bundled_result)?;
    }
    fs::copy(&files.stdout, dir.join("stdout.log"))?;
    fs::copy(&files.stderr, dir.join("stderr.log"))?;

    let manifest = json!({
        "name": format!("{}_{}", job.name, job.layout.id()),
        "input": bits,
        "state": state,
        "problemPath": "problem.json",
        "resultPath": "result.json",
    });
    let text = serde_json::to_string_pretty(&manifest).map_err(io::Error::other)?;
    fs::write(dir.join("manifest.json"), text)?;

    Ok(dir)
}
