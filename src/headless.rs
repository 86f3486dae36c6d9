use kdam::{term, tqdm, BarExt};
use tracing::info;

use crate::encoder::locate;
use crate::error::{ConvertError, Result};
use crate::runner::{ChannelObserver, RunnerEvent, TaskOutcome, TaskRunner};
use crate::session::Session;

/// Runs one conversion without the interactive screen. Log lines are
/// printed above a bar counting them; the session is driven exactly as the
/// interactive front-end drives it. Nothing is printed when the form is
/// rejected before dispatch.
pub fn convert(session: &mut Session, runner: &TaskRunner) -> Result<TaskOutcome> {
    let command = session.start()?;
    let working_dir = command.working_dir().to_path_buf();
    let program = command.program.clone();
    let mut printed = 0;

    term::init(false);
    let mut pbar = tqdm!(
        desc = "converting",
        unit = " lines",
        position = 0,
        force_refresh = true
    );
    printed = flush_log(session, &mut pbar, printed)?;

    let (observer, rx) = ChannelObserver::channel();
    let handle = runner.spawn(command, working_dir, observer);

    let mut outcome = TaskOutcome::not_started();
    for ev in rx {
        if let RunnerEvent::Finished(o) = &ev {
            outcome = *o;
        } else {
            pbar.update(1)?;
        }
        session.apply(ev);
        printed = flush_log(session, &mut pbar, printed)?;
    }
    pbar.refresh()?;
    eprintln!();

    if handle.join().is_err() && session.is_busy() {
        session.apply(RunnerEvent::Finished(outcome));
        flush_log(session, &mut pbar, printed)?;
    }

    eprintln!("{}", session.status_text);
    info!(succeeded = outcome.succeeded, "headless conversion done");
    if outcome.succeeded {
        return Ok(outcome);
    }
    match outcome.exit_code {
        None => Err(locate(&program).err().unwrap_or(ConvertError::EncodingFailure { code: None })),
        code => Err(ConvertError::EncodingFailure { code }),
    }
}

fn flush_log(session: &Session, pbar: &mut kdam::Bar, from: usize) -> Result<usize> {
    for line in &session.log[from..] {
        pbar.write(line.as_str())?;
    }
    Ok(session.log.len())
}
