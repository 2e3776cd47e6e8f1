//! System call tracing using ptrace
//!
//! One parent drives one child strictly sequentially: resume to the next
//! syscall stop, read the call number, record and log, repeat until the
//! child exits.

use nix::sys::ptrace;
use nix::sys::signal::{raise, Signal};
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{fork, ForkResult, Pid};
use std::os::unix::process::CommandExt;
use std::process::Command;
use tracing::{debug, warn};

use crate::clock::TraceClock;
use crate::errors::{Result, TraceError};
use crate::report::ReportWriter;
use crate::stats::{StatsAccumulator, TraceEvent};

/// What a resume step ran into
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Boundary {
    /// The child stopped at a syscall boundary
    SyscallStop,
    /// The child is gone; carries its exit status (128+signo if killed)
    Exited(i32),
}

/// The process under trace, from fork to termination
///
/// Exclusively owned by the trace loop; nothing else resumes or signals
/// the child.
pub struct TracedChild {
    pid: Pid,
}

impl TracedChild {
    /// Fork the traced process
    ///
    /// The child enables tracing on itself, stops so the parent can take
    /// control, then execs `program`. An exec failure is reported from
    /// the child on stderr and surfaces to the parent as an ordinary
    /// non-zero exit, not a spawn error.
    pub fn spawn(program: &str, args: &[String]) -> Result<Self> {
        match unsafe { fork() }.map_err(TraceError::Spawn)? {
            ForkResult::Parent { child } => {
                debug!(pid = %child, program, "spawned traced child");
                Ok(Self { pid: child })
            }
            ForkResult::Child => {
                if ptrace::traceme().and_then(|()| raise(Signal::SIGSTOP)).is_err() {
                    std::process::exit(1);
                }
                let err = Command::new(program).args(args).exec();
                eprintln!("Failed to exec {}: {}", program, err);
                std::process::exit(1);
            }
        }
    }

    /// Wait for the handoff stop and arm syscall tracing
    ///
    /// PTRACE_O_EXITKILL keeps the child from outliving an interrupted
    /// tracer.
    fn attach(&self) -> Result<()> {
        waitpid(self.pid, None).map_err(|e| TraceError::control("initial stop", e))?;
        let options = ptrace::Options::PTRACE_O_TRACESYSGOOD | ptrace::Options::PTRACE_O_EXITKILL;
        ptrace::setoptions(self.pid, options)
            .map_err(|e| TraceError::control("PTRACE_SETOPTIONS", e))?;
        Ok(())
    }

    /// Resume the stopped child until its next syscall stop or exit
    ///
    /// The sole blocking point in the system. Non-syscall stops (signal
    /// delivery, ptrace events) are not call boundaries and are resumed
    /// through.
    pub fn resume_until_boundary(&self) -> Result<Boundary> {
        loop {
            ptrace::syscall(self.pid, None)
                .map_err(|e| TraceError::control("PTRACE_SYSCALL", e))?;
            match waitpid(self.pid, None).map_err(|e| TraceError::control("waitpid", e))? {
                WaitStatus::PtraceSyscall(_) => return Ok(Boundary::SyscallStop),
                WaitStatus::Exited(_, code) => return Ok(Boundary::Exited(code)),
                WaitStatus::Signaled(_, sig, _) => {
                    debug!(signal = %sig, "traced child killed by signal");
                    return Ok(Boundary::Exited(128 + sig as i32));
                }
                _ => continue,
            }
        }
    }

    /// Read the number of the syscall the child is stopped at
    #[cfg(target_arch = "x86_64")]
    pub fn read_call_number(&self) -> Result<i64> {
        let regs = ptrace::getregs(self.pid)
            .map_err(|e| TraceError::control("PTRACE_GETREGS", e))?;
        Ok(regs.orig_rax as i64)
    }

    /// Read the number of the syscall the child is stopped at
    ///
    /// aarch64 has no PTRACE_GETREGS; go through the NT_PRSTATUS regset
    /// and take x8.
    #[cfg(target_arch = "aarch64")]
    pub fn read_call_number(&self) -> Result<i64> {
        let regs: libc::user_regs_struct =
            ptrace::getregset::<ptrace::regset::NT_PRSTATUS>(self.pid)
                .map_err(|e| TraceError::control("PTRACE_GETREGSET", e))?;
        Ok(regs.regs[8] as i64)
    }
}

/// Drives the child and turns syscall stops into timed trace events
struct TraceLoop<'a> {
    child: TracedChild,
    clock: TraceClock,
    stats: StatsAccumulator,
    report: &'a mut ReportWriter,
    synced: bool,
    sequence: u64,
}

impl<'a> TraceLoop<'a> {
    fn new(child: TracedChild, report: &'a mut ReportWriter) -> Self {
        Self {
            child,
            clock: TraceClock::start(),
            stats: StatsAccumulator::new(),
            report,
            synced: false,
            sequence: 0,
        }
    }

    fn run(mut self) -> Result<()> {
        loop {
            let boundary = match self.child.resume_until_boundary() {
                Ok(boundary) => boundary,
                Err(err) => return self.finish(Some(err)),
            };
            match boundary {
                Boundary::Exited(status) => {
                    debug!(status, "traced process exited");
                    return self.finish(None);
                }
                Boundary::SyscallStop => {
                    let call_number = match self.child.read_call_number() {
                        Ok(num) => num,
                        Err(err) => return self.finish(Some(err)),
                    };
                    if !self.synced {
                        // The stop from the exec transition synchronizes
                        // the loop; it is not application data
                        self.synced = true;
                        continue;
                    }
                    self.sequence += 1;
                    let mark = self.clock.mark();
                    let event = TraceEvent {
                        sequence: self.sequence,
                        elapsed_since_start: mark.elapsed,
                        call_number,
                        interval_since_previous: mark.interval,
                    };
                    self.stats.record(&event);
                    // An unwritable sink makes the whole run pointless;
                    // bail without attempting a summary
                    self.report.event(&event)?;
                }
            }
        }
    }

    /// Emit the summary, with whatever was collected if the session died
    /// on a trace-control failure
    fn finish(&mut self, session_err: Option<TraceError>) -> Result<()> {
        if let Some(err) = &session_err {
            warn!(error = %err, "trace session aborted");
        }
        self.report.summary(self.stats.summary())?;
        match session_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Trace a command and write the timed event log to `report`
pub fn trace_command(command: &[String], report: &mut ReportWriter) -> anyhow::Result<()> {
    let Some((program, args)) = command.split_first() else {
        anyhow::bail!("Command array is empty");
    };

    let child = TracedChild::spawn(program, args)?;
    child.attach()?;
    report.start()?;
    TraceLoop::new(child, report).run()?;
    Ok(())
}
