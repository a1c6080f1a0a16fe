use anyhow::Result;
use console::{style, Term};
use std::time::Instant;

/// Runs the setup steps in order, printing `[n/N] step` before a step and
/// `[n/N] step [ms]` or `[n/N] step [FAILED]` after it.
pub struct TaskRunner {
    term: Term,
    num_tasks: u32,
    current_task: u32,
    verbose: bool,
}

impl TaskRunner {
    pub fn new(num_tasks: u32, verbose: bool) -> Self {
        Self {
            term: Term::stdout(),
            num_tasks,
            current_task: 0,
            verbose,
        }
    }

    fn task_id(&self) -> String {
        style(format!("[{}/{}]", self.current_task + 1, self.num_tasks))
            .force_styling(true)
            .to_string()
    }

    /// Runs `task`. With `keep_output` the lines the task drew itself, like a
    /// progress bar, stay on screen even when not verbose.
    pub fn run_task<T>(
        &mut self,
        descr: &str,
        keep_output: bool,
        task: impl FnOnce() -> Result<T>,
    ) -> Result<T> {
        let now = Instant::now();
        println!("{} {}", self.task_id(), descr);
        let result = task();
        if !self.verbose && !keep_output && self.term.is_term() {
            self.term.clear_last_lines(1).ok();
        }
        let status = match &result {
            Ok(_) => format!("[{}ms]", now.elapsed().as_millis()),
            Err(_) => style("[FAILED]").red().to_string(),
        };
        println!("{} {} {}", self.task_id(), descr, status);
        self.current_task += 1;
        result
    }
}
