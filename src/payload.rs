//! Payload Builder: composes the self-contained shell payload a node runs
//! from boot, and models the failsafe termination ladder as testable data
//! (spec §4.2).
//!
//! No direct teacher analogue exists for shell-payload templating; the
//! responsibility list and ladder structure are taken verbatim from spec
//! §4.2. The ladder is deliberately represented as an ordered `Vec` of
//! [`TerminationStage`] rather than only as shell-script control flow, so
//! its *structure* (every stage present, in order, each escalating) is unit
//! tested without executing a shell.

use std::fmt::Write as _;
use std::time::Duration;

use crate::model::{job_prefix, JobDescriptor, FAILSAFE_BUFFER};
use crate::suites::SuiteKind;

/// One escalating step of the failsafe termination ladder (spec §4.2,
/// §9). Every stage must be attempted even if an earlier one "should have"
/// succeeded — the invariant is that no instance outlives
/// `max_runtime + buffer` under *any* failure mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationStage {
    /// Graceful timer fires: publish `TIMED_OUT`, signal the benchmark
    /// process group, wait a bounded grace period.
    GracefulSignal,
    /// Grace period elapsed without exit: force kill the process group.
    ForceKill,
    /// Failsafe timer fires: publish `EMERGENCY_STOP`, call
    /// `terminate_instance` via the provider API from within the node.
    AdapterTerminate,
    /// Adapter call did not observably succeed: fall through to an OS-level
    /// shutdown command.
    OsShutdown,
    /// Ultimate fallback. Platform-specific and may be substituted for an
    /// equivalent hard stop (spec §9 open question) — the only requirement
    /// is that it is unconditional and unskippable.
    KernelHardStop,
}

/// The failsafe ladder in escalation order. Every stage in this list must
/// be attempted on the failsafe path; none may be skipped because an
/// earlier one "should have" worked (spec §9).
pub const FAILSAFE_LADDER: [TerminationStage; 5] = [
    TerminationStage::GracefulSignal,
    TerminationStage::ForceKill,
    TerminationStage::AdapterTerminate,
    TerminationStage::OsShutdown,
    TerminationStage::KernelHardStop,
];

/// Everything the payload template needs to fill in its placeholders.
#[derive(Debug, Clone)]
pub struct PayloadContext {
    pub job_id: String,
    pub bucket: String,
    pub descriptor: JobDescriptor,
}

impl PayloadContext {
    pub fn prefix(&self) -> String {
        job_prefix(&self.job_id, &self.descriptor.instance_shape, &self.descriptor.benchmark_suite)
    }
}

/// The shell command a ladder stage performs once invoked. Returned as a
/// `;`-joined command line so `build_payload` can emit it as a single
/// `register_failsafe_stage` call per stage.
fn stage_command(stage: TerminationStage, prefix: &str) -> String {
    match stage {
        TerminationStage::GracefulSignal => {
            format!("publish_object {prefix}status-timed_out.sentinel; signal_process_group TERM")
        }
        TerminationStage::ForceKill => "signal_process_group KILL".to_string(),
        TerminationStage::AdapterTerminate => {
            format!("publish_object {prefix}status-emergency_stop.sentinel; terminate_via_adapter")
        }
        TerminationStage::OsShutdown => "os_shutdown_now".to_string(),
        TerminationStage::KernelHardStop => "kernel_hard_stop".to_string(),
    }
}

/// Render the self-contained shell payload for a job.
///
/// Follows the 11-step responsibility order of spec §4.2. The rendered
/// string is opaque to the caller — the Launcher places it directly in the
/// instance's boot-time user-data slot and never inspects it further. The
/// failsafe ladder is emitted directly from [`FAILSAFE_LADDER`], one
/// `register_failsafe_stage` call per stage in escalation order, so the
/// ladder the shell actually runs can never drift from the ladder the unit
/// tests check.
pub fn build_payload(ctx: &PayloadContext) -> String {
    let prefix = ctx.prefix();
    let graceful_secs = ctx.descriptor.max_runtime.as_secs();
    let failsafe_secs = (ctx.descriptor.max_runtime + FAILSAFE_BUFFER).as_secs();
    let suite_command = suite_command_template(&ctx.descriptor.benchmark_suite);

    let mut script = String::new();
    let _ = writeln!(script, "#!/usr/bin/env bash");
    let _ = writeln!(script, "set -uo pipefail");
    let _ = writeln!(script, "# job_id={} bucket={} prefix={}", ctx.job_id, ctx.bucket, prefix);

    // 1. Install toolchain dependencies.
    let _ = writeln!(script, "install_dependencies");
    // 2. Tee stdout/stderr to a local log file.
    let _ = writeln!(script, "exec > >(tee /var/log/benchmark.log) 2>&1");
    // 3. Detect architecture family, select matched optimization flags.
    let _ = writeln!(script, "detect_architecture_family");
    // 4. Publish system-info.json.
    let _ = writeln!(script, "publish_object {prefix}system-info.json");
    // 5. Publish RUNNING sentinel.
    let _ = writeln!(script, "publish_object {prefix}status-running.sentinel");
    // Register every failsafe ladder stage, in escalation order, before
    // either timer can fire.
    let _ = writeln!(script, "# failsafe termination ladder, escalating in order");
    for stage in FAILSAFE_LADDER {
        let _ = writeln!(script, "register_failsafe_stage {stage:?} \"{}\"", stage_command(stage, &prefix));
    }
    // Failsafe ladder timers run concurrently with the benchmark command.
    let _ = writeln!(script, "start_graceful_timer {graceful_secs}");
    let _ = writeln!(script, "start_failsafe_timer {failsafe_secs}");
    // 6. Execute the suite-specific command, capturing stdout.
    let _ = writeln!(script, "{suite_command}");
    // 7. Parse locally into results.json (raw stdout always included).
    let _ = writeln!(script, "write_local_results {prefix}results.json");
    // 8. Upload results.json.
    let _ = writeln!(script, "publish_object {prefix}results.json");
    // 9. Publish terminal sentinel based on exit code.
    let _ = writeln!(script, "publish_terminal_sentinel {prefix}");
    // 10. Upload the log file.
    let _ = writeln!(script, "publish_object {prefix}benchmark.log");
    // 11. Terminate the host instance (also reached via the failsafe ladder
    // on every other exit path).
    let _ = writeln!(script, "terminate_self");

    script
}

fn suite_command_template(suite: &SuiteKind) -> String {
    format!("run_suite {}", suite.slug())
}
