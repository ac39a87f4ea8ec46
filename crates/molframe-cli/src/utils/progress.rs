use indicatif::{ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle};
use molframe::engine::progress::{Progress, ProgressCallback};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{info, warn};

const SPINNER_TICK_MS: u64 = 100;

/// Renders engine progress events on a single stderr bar.
#[derive(Clone)]
pub struct ProgressDisplay {
    bar: Arc<Mutex<ProgressBar>>,
}

impl ProgressDisplay {
    pub fn new(visible: bool) -> Self {
        let target = if visible {
            ProgressDrawTarget::stderr()
        } else {
            ProgressDrawTarget::hidden()
        };
        let bar = ProgressBar::with_draw_target(Some(0), target).with_style(spinner_style());
        bar.finish_and_clear();
        Self {
            bar: Arc::new(Mutex::new(bar)),
        }
    }

    pub fn callback(&self) -> ProgressCallback<'static> {
        let bar = Arc::clone(&self.bar);
        Box::new(move |event: Progress| {
            let Ok(bar) = bar.lock() else {
                warn!("Progress display lock is poisoned; dropping event.");
                return;
            };
            apply(&bar, event);
        })
    }
}

fn apply(bar: &ProgressBar, event: Progress) {
    match event {
        Progress::PhaseStart { name } => {
            bar.reset();
            bar.set_length(0);
            bar.set_style(spinner_style());
            bar.set_message(name);
            bar.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
        }
        Progress::TaskStart { total_steps } => {
            bar.disable_steady_tick();
            bar.set_style(bar_style());
            bar.set_length(total_steps);
            bar.set_position(0);
        }
        Progress::TaskIncrement { steps } => bar.inc(steps),
        Progress::TaskFinish => {
            if let Some(len) = bar.length() {
                bar.set_position(len);
            }
        }
        Progress::PhaseFinish => {
            bar.disable_steady_tick();
            bar.finish_with_message("done");
        }
        Progress::Message(msg) => {
            if bar.is_finished() {
                info!("{}", msg);
            } else {
                bar.println(format!("  {}", msg));
            }
        }
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn bar_style() -> ProgressStyle {
    match ProgressStyle::with_template("{msg:<16} [{bar:40.cyan/blue}] {pos}/{len} ({eta})") {
        Ok(style) => style
            .with_key("eta", |state: &ProgressState, w: &mut dyn std::fmt::Write| {
                let _ = write!(w, "{:.1}s", state.eta().as_secs_f64());
            })
            .progress_chars("##-"),
        Err(_) => ProgressStyle::default_bar(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn new_display_starts_finished_and_empty() {
        let display = ProgressDisplay::new(false);
        let bar = display.bar.lock().unwrap();
        assert_eq!(bar.length(), Some(0));
        assert!(bar.is_finished());
    }

    #[test]
    fn events_drive_the_bar() {
        let display = ProgressDisplay::new(false);
        let callback = display.callback();

        callback(Progress::PhaseStart { name: "Symmetry Mates" });
        assert_eq!(display.bar.lock().unwrap().message(), "Symmetry Mates");

        callback(Progress::TaskStart { total_steps: 10 });
        callback(Progress::TaskIncrement { steps: 4 });
        assert_eq!(display.bar.lock().unwrap().position(), 4);

        callback(Progress::TaskFinish);
        assert_eq!(display.bar.lock().unwrap().position(), 10);

        callback(Progress::PhaseFinish);
        let bar = display.bar.lock().unwrap();
        assert!(bar.is_finished());
        assert_eq!(bar.message(), "done");
    }

    #[test]
    fn callback_can_move_to_another_thread() {
        let display = ProgressDisplay::new(false);
        let callback = display.callback();
        thread::spawn(move || {
            callback(Progress::PhaseStart { name: "Derived Data" });
            callback(Progress::TaskStart { total_steps: 2 });
            callback(Progress::TaskIncrement { steps: 2 });
        })
        .join()
        .unwrap();
        assert_eq!(display.bar.lock().unwrap().position(), 2);
    }
}
