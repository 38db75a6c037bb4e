use super::artifacts::{self, SimulationFiles};
use super::{Oracle, SimulationJob, SimulationOutput, SimulationProblem, SimulationResult};
use crate::error::{DbForgeError, DfResult};
use crate::truth::bit_string;
use std::fs::{self, File};
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

enum RunOutcome {
    Finished(ExitStatus),
    TimedOut,
}

/// Runs an external simulator as `<executable> <problem.json> <result.json>`.
#[derive(Debug, Clone)]
pub struct ProcessOracle {
    pub executable: PathBuf,
    pub work_dir: PathBuf,
    pub timeout: Duration,
}

impl ProcessOracle {
    pub fn new(executable: impl Into<PathBuf>, work_dir: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            executable: executable.into(),
            work_dir: work_dir.into(),
            timeout,
        }
    }

    fn files_for(&self, job: &SimulationJob) -> DfResult<SimulationFiles> {
        let problem_dir = self.work_dir.join("simulation-files");
        let result_dir = self.work_dir.join("simulation-results");
        fs::create_dir_all(&problem_dir)?;
        fs::create_dir_all(&result_dir)?;

        let stem = format!("{}--{}--{}", job.name, job.layout.id(), bit_string(job.input));
        Ok(SimulationFiles {
            problem: problem_dir.join(format!("{}.json", stem)),
            result: result_dir.join(format!("{}.json", stem)),
            stdout: result_dir.join(format!("{}.stdout.log", stem)),
            stderr: result_dir.join(format!("{}.stderr.log", stem)),
        })
    }

    fn execute(&self, files: &SimulationFiles) -> DfResult<RunOutcome> {
        files.clear_result()?;
        let stdout = File::create(&files.stdout)?;
        let stderr = File::create(&files.stderr)?;

        let mut child = Command::new(&self.executable)
            .arg(&files.problem)
            .arg(&files.result)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .spawn()
            .map_err(|e| {
                DbForgeError::Oracle(format!(
                    "Could not execute simulator '{}': {}",
                    self.executable.display(),
                    e
                ))
            })?;

        let start = Instant::now();
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(RunOutcome::Finished(status));
            }
            let elapsed = start.elapsed();
            if elapsed >= self.timeout {
                let _ = child.kill();
                let _ = child.wait();
                return Ok(RunOutcome::TimedOut);
            }
            thread::sleep(POLL_INTERVAL.min(self.timeout - elapsed));
        }
    }

    fn read_result(&self, job: &SimulationJob, files: &SimulationFiles) -> Option<SimulationResult> {
        match SimulationOutput::load(&files.result) {
            Ok(output) => output
                .ground_state()
                .map(|d| SimulationResult::from_distribution(job.layout, d)),
            Err(e) => {
                warn!(
                    "Unreadable simulator result '{}': {}",
                    files.result.display(),
                    e
                );
                None
            }
        }
    }
}

impl Oracle for ProcessOracle {
    fn simulate(&self, job: &SimulationJob) -> DfResult<Option<SimulationResult>> {
        let files = self.files_for(job)?;
        SimulationProblem::build(job)?.save(&files.problem)?;

        let outcome = match self.execute(&files) {
            Ok(outcome) => outcome,
            Err(e) => {
                files.remove();
                return Err(e);
            }
        };
        let (result, state) = match outcome {
            RunOutcome::Finished(status) if status.success() => {
                (self.read_result(job, &files), "FinishedNormally")
            }
            RunOutcome::Finished(status) => {
                warn!(
                    "Simulator exited with {} for layout {} input {}",
                    status,
                    job.layout.id(),
                    bit_string(job.input)
                );
                (None, "FinishedWithError")
            }
            RunOutcome::TimedOut => {
                warn!(
                    "Simulator timed out after {:?} for layout {} input {}",
                    self.timeout,
                    job.layout.id(),
                    bit_string(job.input)
                );
                (None, "TimedOut")
            }
        };

        if job.export_artifacts {
            let root = self.work_dir.join("simulation-results");
            match artifacts::export_bundle(&root, job, &files, state) {
                Ok(path) => debug!("Simulation artifacts exported to {}", path.display()),
                Err(e) => warn!("Failed to export simulation artifacts, ignored: {}", e),
            }
        }

        if !job.retain_files {
            files.remove();
        }

        Ok(result)
    }
}
