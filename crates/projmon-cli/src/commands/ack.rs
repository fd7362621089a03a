//! Ack command: Mark pending changes as reviewed

use anyhow::Result;
use projmon_core::{ChangeType, MonitorService};

/// What to acknowledge
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AckTarget {
    /// One file, optionally one change type
    File {
        job: String,
        path: String,
        change_type: Option<ChangeType>,
    },
    /// Every pending change of one job
    Job(String),
    /// Every pending change of every job
    Everything,
}

impl AckTarget {
    /// Build the target from the command-line arguments
    ///
    /// # Errors
    /// Returns an error when neither a job nor `--everything` is given.
    pub fn from_args(
        job: Option<String>,
        path: Option<String>,
        change_type: Option<ChangeType>,
        everything: bool,
    ) -> Result<Self> {
        if everything {
            return Ok(Self::Everything);
        }
        match (job, path) {
            (Some(job), Some(path)) => Ok(Self::File {
                job,
                path,
                change_type,
            }),
            (Some(job), None) => Ok(Self::Job(job)),
            (None, _) => anyhow::bail!("A job identifier or --everything is required"),
        }
    }
}

/// Run the ack command, returning the number of events acknowledged
///
/// # Errors
/// Returns an error if the database cannot be written.
pub fn run(service: &MonitorService, target: &AckTarget) -> Result<usize> {
    let count = match target {
        AckTarget::File {
            job,
            path,
            change_type,
        } => service.acknowledge(job, path, *change_type)?,
        AckTarget::Job(job) => service.acknowledge_job(job)?,
        AckTarget::Everything => service.acknowledge_everything()?,
    };
    println!("Acknowledged {count} changes");
    Ok(count)
}
