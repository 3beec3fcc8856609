//! Show saved sessions.

use std::path::PathBuf;

use repcoach_pose_model::results::SessionHistory;
use repcoach_session::HistoryStore;

pub fn run(dir: PathBuf, last: bool) -> anyhow::Result<()> {
    let store = HistoryStore::new(dir);

    if last {
        match store.last_session()? {
            Some(record) => print!("{}", record.summary_text()),
            None => println!("No sessions recorded yet."),
        }
        return Ok(());
    }

    let history = store.load_history()?;
    if history.is_empty() {
        println!("No sessions recorded yet.");
        return Ok(());
    }

    println!("Session history ({})", store.dir().display());
    println!("{}", "=".repeat(60));
    for line in listing(&history) {
        println!("{line}");
    }
    Ok(())
}

/// One line per session, newest first.
fn listing(history: &SessionHistory) -> Vec<String> {
    history
        .newest_first()
        .map(|record| {
            format!(
                "{}  {:<16} {:>2}/{:<2} correct  score {:>3}%",
                record.finished_at,
                record.workout_name,
                record.reps.correct,
                record.reps.total,
                record.performance_score
            )
        })
        .collect()
}
