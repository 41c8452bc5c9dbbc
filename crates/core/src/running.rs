use crate::types::{ExecutionProcess, RunReason};

/// True while a setup, agent or cleanup process runs and no manual stop is
/// pending. Dev servers never count.
pub fn is_attempt_running(processes: &[ExecutionProcess], stopping: bool) -> bool {
    if stopping {
        return false;
    }
    processes.iter().any(|p| {
        matches!(
            p.run_reason,
            RunReason::CodingAgent | RunReason::SetupScript | RunReason::CleanupScript
        ) && p.is_running()
    })
}
