use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use crate::encoder::{hide_console, locate};
use crate::lines::Lines;
use crate::planner::ConversionCommand;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TaskOutcome {
    pub succeeded: bool,
    /// `None` when the encoder never started or was killed by a signal.
    pub exit_code: Option<i32>,
}

impl TaskOutcome {
    pub fn not_started() -> Self {
        TaskOutcome { succeeded: false, exit_code: None }
    }

    fn from_status(status: ExitStatus) -> Self {
        TaskOutcome {
            succeeded: status.success(),
            exit_code: status.code(),
        }
    }
}

/// Receives a task's output lines in order, then exactly one outcome.
pub trait TaskObserver {
    fn on_log_line(&mut self, line: String);

    fn on_complete(&mut self, outcome: TaskOutcome);
}

#[derive(Clone, Debug, PartialEq)]
pub enum RunnerEvent {
    Line(String),
    Finished(TaskOutcome),
}

/// Forwards observer callbacks over a channel so they can be applied on the
/// thread that owns the receiver.
pub struct ChannelObserver {
    tx: Sender<RunnerEvent>,
}

impl ChannelObserver {
    pub fn new(tx: Sender<RunnerEvent>) -> Self {
        ChannelObserver { tx }
    }

    pub fn channel() -> (Self, Receiver<RunnerEvent>) {
        let (tx, rx) = mpsc::channel();
        (ChannelObserver::new(tx), rx)
    }
}

impl TaskObserver for ChannelObserver {
    fn on_log_line(&mut self, line: String) {
        let _ = self.tx.send(RunnerEvent::Line(line));
    }

    fn on_complete(&mut self, outcome: TaskOutcome) {
        let _ = self.tx.send(RunnerEvent::Finished(outcome));
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TaskRunner;

impl TaskRunner {
    pub fn new() -> Self {
        TaskRunner
    }

    /// Runs `command` on a background thread.
    pub fn spawn<O>(&self, command: ConversionCommand, working_dir: PathBuf, mut observer: O) -> JoinHandle<TaskOutcome>
    where
        O: TaskObserver + Send + 'static,
    {
        let runner = *self;
        thread::spawn(move || runner.run(&command, &working_dir, &mut observer))
    }

    /// Runs `command` to completion on the calling thread.
    pub fn run<O: TaskObserver>(&self, command: &ConversionCommand, working_dir: &Path, observer: &mut O) -> TaskOutcome {
        let program = match locate(&command.program) {
            Ok(program) => program,
            Err(err) => {
                warn!(program = ?command.program, "encoder not found");
                return fail_to_start(observer, format!("ERROR: {err}"));
            },
        };

        info!(command = %command.display_line(), working_dir = %working_dir.display(), "starting encoder");
        let (mut child, output) = match self.start(&program, command, working_dir) {
            Ok(started) => started,
            Err(err) => {
                warn!(error = %err, "unable to start encoder");
                return fail_to_start(observer, format!("ERROR: unable to start {}: {err}", program.display()));
            },
        };

        let mut line_count = 0usize;
        for line in Lines::new(BufReader::new(output)) {
            match line {
                Ok(l) => {
                    line_count += 1;
                    observer.on_log_line(l);
                },
                Err(err) => {
                    warn!(error = %err, "error reading encoder output");
                    observer.on_log_line(format!("ERROR: reading encoder output failed: {err}"));
                    break;
                },
            }
        }

        let outcome = match child.wait() {
            Ok(status) => TaskOutcome::from_status(status),
            Err(err) => {
                warn!(error = %err, "error waiting for encoder");
                observer.on_log_line(format!("ERROR: waiting for the encoder failed: {err}"));
                TaskOutcome::not_started()
            },
        };

        debug!(lines = line_count, "encoder output closed");
        info!(succeeded = outcome.succeeded, exit_code = ?outcome.exit_code, "encoder finished");
        observer.on_complete(outcome);
        outcome
    }

    /// Spawns the encoder with stdout and stderr sharing one pipe, so the
    /// reader sees both streams in the order the process wrote them.
    fn start(&self, program: &Path, command: &ConversionCommand, working_dir: &Path) -> io::Result<(Child, io::PipeReader)> {
        let (reader, writer) = io::pipe()?;
        let mut cmd = Command::new(program);
        cmd.args(&command.args)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(writer.try_clone()?)
            .stderr(writer);
        hide_console(&mut cmd);

        let child = cmd.spawn()?;
        // the Command holds our copies of the write end; the reader only sees
        // EOF once they are closed
        drop(cmd);
        Ok((child, reader))
    }
}

fn fail_to_start<O: TaskObserver>(observer: &mut O, line: String) -> TaskOutcome {
    let outcome = TaskOutcome::not_started();
    observer.on_log_line(line);
    observer.on_complete(outcome);
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    impl TaskObserver for Vec<RunnerEvent> {
        fn on_log_line(&mut self, line: String) {
            self.push(RunnerEvent::Line(line));
        }

        fn on_complete(&mut self, outcome: TaskOutcome) {
            self.push(RunnerEvent::Finished(outcome));
        }
    }

    fn shell(script: &str) -> ConversionCommand {
        ConversionCommand {
            program: OsString::from("sh"),
            args: vec![OsString::from("-c"), OsString::from(script)],
            output: PathBuf::from("unused"),
        }
    }

    fn lines(events: &[RunnerEvent]) -> Vec<String> {
        events.iter().filter_map(|e| match e {
            RunnerEvent::Line(l) => Some(l.clone()),
            RunnerEvent::Finished(_) => None,
        }).collect()
    }

    #[test]
    fn test_missing_encoder() {
        let command = ConversionCommand {
            program: OsString::from("nonexistent_encoder_12345"),
            args: vec![],
            output: PathBuf::from("unused"),
        };
        let mut events = vec![];
        let outcome = TaskRunner::new().run(&command, Path::new("."), &mut events);

        assert_eq!(outcome, TaskOutcome { succeeded: false, exit_code: None });
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], RunnerEvent::Line(l) if l.contains("nonexistent_encoder_12345")));
        assert_eq!(events[1], RunnerEvent::Finished(outcome));
    }

    #[cfg(unix)]
    #[test]
    fn test_lines_then_success() {
        let mut events = vec![];
        let outcome = TaskRunner::new().run(&shell("for i in 1 2 3 4 5; do echo line $i; done"), Path::new("."), &mut events);

        assert_eq!(outcome, TaskOutcome { succeeded: true, exit_code: Some(0) });
        assert_eq!(lines(&events), vec!["line 1", "line 2", "line 3", "line 4", "line 5"]);
        assert_eq!(events.last(), Some(&RunnerEvent::Finished(outcome)));
    }

    #[cfg(unix)]
    #[test]
    fn test_failure_after_all_lines() {
        let mut events = vec![];
        let outcome = TaskRunner::new().run(&shell("echo one; echo two; exit 1"), Path::new("."), &mut events);

        assert_eq!(outcome, TaskOutcome { succeeded: false, exit_code: Some(1) });
        assert_eq!(events, vec![
            RunnerEvent::Line(String::from("one")),
            RunnerEvent::Line(String::from("two")),
            RunnerEvent::Finished(outcome),
        ]);
    }

    #[cfg(unix)]
    #[test]
    fn test_stderr_is_merged_in_order() {
        let mut events = vec![];
        TaskRunner::new().run(&shell("echo out; echo err 1>&2; echo out again"), Path::new("."), &mut events);
        assert_eq!(lines(&events), vec!["out", "err", "out again"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_carriage_return_progress() {
        let mut events = vec![];
        TaskRunner::new().run(&shell("printf 'frame=1\\rframe=2\\rdone\\n'"), Path::new("."), &mut events);
        assert_eq!(lines(&events), vec!["frame=1", "frame=2", "done"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut events = vec![];
        let outcome = TaskRunner::new().run(&shell("touch marker && echo ok"), dir.path(), &mut events);
        assert!(outcome.succeeded);
        assert!(dir.path().join("marker").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_spawn_marshals_over_channel() {
        let (observer, rx) = ChannelObserver::channel();
        let handle = TaskRunner::new().spawn(shell("echo a; echo b; echo c; exit 3"), PathBuf::from("."), observer);

        let events: Vec<RunnerEvent> = rx.iter().collect();
        let outcome = handle.join().unwrap();

        assert_eq!(outcome, TaskOutcome { succeeded: false, exit_code: Some(3) });
        assert_eq!(events, vec![
            RunnerEvent::Line(String::from("a")),
            RunnerEvent::Line(String::from("b")),
            RunnerEvent::Line(String::from("c")),
            RunnerEvent::Finished(outcome),
        ]);
    }
}
