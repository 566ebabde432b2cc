use log::info;

/// Progress reporting for long-running operator commands.
///
/// The run and the importers report through this trait so the same code can
/// print a trace on a terminal or be recorded in tests.
pub trait ProgressReporter {
    /// Start a numbered stage (`[stage/total] message`)
    fn stage_start(&self, stage: u32, total: u32, message: &str);

    /// A completed step within the current stage
    fn stage_finish(&self, message: &str);

    /// Periodic update for a long stage, e.g. every N imported rows
    fn progress(&self, message: &str);
}

/// Prints a human-readable trace to stdout, mirroring each line into the log.
pub struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn stage_start(&self, stage: u32, total: u32, message: &str) {
        println!("\n[{}/{}] {}", stage, total, message);
        info!("[{}/{}] {}", stage, total, message);
    }

    fn stage_finish(&self, message: &str) {
        println!("  ✓ {}", message);
        info!("{}", message);
    }

    fn progress(&self, message: &str) {
        println!("  {}", message);
        info!("{}", message);
    }
}

#[cfg(test)]
pub mod testing {
    use std::cell::RefCell;

    use super::ProgressReporter;

    /// Collects every message so tests can assert on the trace.
    #[derive(Default)]
    pub struct RecordingReporter {
        pub stages: RefCell<Vec<String>>,
        pub finished: RefCell<Vec<String>>,
        pub updates: RefCell<Vec<String>>,
    }

    impl ProgressReporter for RecordingReporter {
        fn stage_start(&self, stage: u32, total: u32, message: &str) {
            self.stages
                .borrow_mut()
                .push(format!("[{}/{}] {}", stage, total, message));
        }

        fn stage_finish(&self, message: &str) {
            self.finished.borrow_mut().push(message.to_owned());
        }

        fn progress(&self, message: &str) {
            self.updates.borrow_mut().push(message.to_owned());
        }
    }
}
