use crate::backend::{MetricsSource, ProcSource, Sampler};
use crate::config::Config;
use crate::error::Result;
use crate::ui::{self, format::CLEAR_SCREEN, Layout};
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Granularity at which sleeps notice an interrupt.
const STOP_POLL: Duration = Duration::from_millis(50);

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

extern "C" fn on_interrupt(_: nix::libc::c_int) {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

pub struct MonitorApp {
    config: Config,
}

impl MonitorApp {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Returns the process exit code.
    pub fn run(&self) -> i32 {
        if let Err(e) = install_interrupt_handler() {
            log::warn!("Could not install interrupt handler: {}", e);
        }

        println!("Starting system monitor...");

        let sampler = match ProcSource::open(&self.config)
            .and_then(|source| Sampler::initialize(source, self.config.top_processes))
        {
            Ok(sampler) => sampler,
            Err(e) => {
                log::error!("Startup failed: {}", e);
                eprintln!("ERROR: {}", e);
                return 1;
            }
        };

        let identity = sampler.identity();
        println!("Operating system: {}", identity.os_name);
        println!("Hostname: {}", identity.hostname);
        println!("Kernel: {}\n", identity.kernel);

        if !sleep_unless_stopped(Duration::from_millis(self.config.startup_delay_ms), &INTERRUPTED) {
            println!("\n\nMonitor stopped by user.");
            return 0;
        }

        let stdout = io::stdout();
        let result = run_loop(
            sampler,
            &mut stdout.lock(),
            &Layout::from(&self.config),
            Duration::from_millis(self.config.refresh_interval_ms),
            &INTERRUPTED,
        );

        match result {
            Ok(()) => {
                println!("\n\nMonitor stopped by user.");
                0
            }
            Err(e) => {
                log::error!("Sampling stopped: {}", e);
                eprintln!("ERROR: {}", e);
                1
            }
        }
    }
}

/// Sample, render, sleep; until `stop` is raised or the source fails.
pub fn run_loop<S: MetricsSource, W: Write>(
    mut sampler: Sampler<S>,
    out: &mut W,
    layout: &Layout,
    interval: Duration,
    stop: &AtomicBool,
) -> Result<()> {
    while !stop.load(Ordering::SeqCst) {
        let snapshot = sampler.sample()?;
        write!(out, "{}{}", CLEAR_SCREEN, ui::render(&snapshot, layout))?;
        out.flush()?;

        if !sleep_unless_stopped(interval, stop) {
            break;
        }
    }
    Ok(())
}

/// Sleeps in short slices; returns false as soon as `stop` is raised.
fn sleep_unless_stopped(duration: Duration, stop: &AtomicBool) -> bool {
    let deadline = Instant::now() + duration;
    loop {
        if stop.load(Ordering::SeqCst) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep(STOP_POLL.min(deadline - now));
    }
}

fn install_interrupt_handler() -> nix::Result<()> {
    let action = SigAction::new(SigHandler::Handler(on_interrupt), SaFlags::empty(), SigSet::empty());
    // Safety: the handler only stores to an atomic.
    unsafe {
        sigaction(Signal::SIGINT, &action)?;
        sigaction(Signal::SIGTERM, &action)?;
    }
    Ok(())
}
