//! C7 — Scheduler: a bounded worker-thread pool that drains a LIFO stack
//! of build tasks, fail-fast on the first failure while letting in-flight
//! tasks finish.

use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;

use console::style;

use crate::config::CompileTask;
use crate::error::{Error, Result};
use crate::shell;

/// Polymorphism here is a tagged enum rather than a trait object or a
/// base-class/virtual-override hierarchy: a compile task and a resource
/// task are the only two kinds of work the scheduler ever runs.
pub enum Task {
    Compile(CompileTask),
    Resource(ResourceTask),
}

pub struct ResourceTask {
    pub label: String,
}

pub struct TaskOutcome {
    pub label: String,
    pub output: String,
    pub success: bool,
}

impl Task {
    fn label(&self) -> String {
        match self {
            Task::Compile(t) => t.label.clone(),
            Task::Resource(t) => t.label.clone(),
        }
    }

    fn run(self) -> TaskOutcome {
        match self {
            Task::Compile(task) => {
                let result = shell::run_captured(&task.compiler, &task.args, &[]);
                match result {
                    Ok(captured) => TaskOutcome {
                        label: task.label,
                        output: captured.output,
                        success: captured.success,
                    },
                    Err(e) => TaskOutcome {
                        label: task.label,
                        output: e.to_string(),
                        success: false,
                    },
                }
            }
            Task::Resource(task) => TaskOutcome {
                label: task.label,
                output: String::new(),
                success: true,
            },
        }
    }
}

/// Runs `tasks` (treated as a LIFO stack, matching `appbuild`'s
/// `BuildTaskStack`) across at most `worker_count` concurrent OS threads.
/// Uses an `mpsc` channel for completion signaling instead of the
/// original's busy-`yield()`-on-an-atomic-bool loop. On the first failure,
/// pending tasks are dropped without starting, but tasks already running
/// are allowed to finish so their output can still be reported.
pub fn run(
    mut tasks: Vec<Task>,
    worker_count: usize,
    truncate_output: Option<usize>,
) -> Result<()> {
    let worker_count = worker_count.max(1).min(tasks.len().max(1));
    let (tx, rx) = mpsc::channel::<TaskOutcome>();

    let mut running = 0usize;
    let mut ok = true;
    let mut failures: Vec<String> = Vec::new();

    while !tasks.is_empty() || running > 0 {
        while ok && running < worker_count {
            let task = match tasks.pop() {
                Some(t) => t,
                None => break,
            };
            let tx = tx.clone();
            running += 1;
            thread::spawn(move || {
                let outcome = task.run();
                tx.send(outcome).ok();
            });
        }

        if !ok {
            // A task has already failed: stop starting new ones and drain
            // whatever is left on the stack without running it.
            tasks.clear();
            if running == 0 {
                break;
            }
        }

        match rx.recv() {
            Ok(outcome) => {
                running -= 1;
                report(&outcome, truncate_output);
                if !outcome.success {
                    ok = false;
                    failures.push(outcome.label);
                }
            }
            Err(_) => break,
        }
    }

    if ok {
        Ok(())
    } else {
        Err(Error::TaskFailed(failures.join(", "), "see output above".to_string()))
    }
}

fn report(outcome: &TaskOutcome, truncate_output: Option<usize>) {
    if outcome.success {
        log::info!("{} {}", style("compiled").green(), outcome.label);
    } else {
        log::error!("{} {}", style("failed").red(), outcome.label);
    }
    if !outcome.output.trim().is_empty() {
        let text = match truncate_output {
            Some(limit) => outcome
                .output
                .lines()
                .take(limit)
                .collect::<Vec<_>>()
                .join("\n"),
            None => outcome.output.clone(),
        };
        println!("{}", text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok_task(label: &str) -> Task {
        Task::Compile(CompileTask {
            label: label.to_string(),
            input: PathBuf::new(),
            output: PathBuf::new(),
            compiler: "true".to_string(),
            args: Vec::new(),
        })
    }

    fn failing_task(label: &str) -> Task {
        Task::Compile(CompileTask {
            label: label.to_string(),
            input: PathBuf::new(),
            output: PathBuf::new(),
            compiler: "false".to_string(),
            args: Vec::new(),
        })
    }

    #[test]
    fn all_successful_tasks_report_ok() {
        let tasks: Vec<Task> = (0..5).map(|i| ok_task(&format!("t{}", i))).collect();
        assert!(run(tasks, 2, None).is_ok());
    }

    #[test]
    fn failure_is_reported_and_stops_future_starts() {
        let mut tasks: Vec<Task> = (0..9).map(|i| ok_task(&format!("t{}", i))).collect();
        tasks.push(failing_task("bad"));
        let result = run(tasks, 4, None);
        assert!(result.is_err());
    }
}
