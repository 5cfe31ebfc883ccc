//! Download progress bars.

use indicatif::{ProgressBar, ProgressStyle};

use crate::transport::{DownloadObserver, DownloadResult};

use super::theme::ActorTheme;
use super::DownloadProgress;

const BAR_TEMPLATE: &str = "  {msg:24} [{bar:30.cyan/blue}] {pos:>3}%";

/// A percentage bar for one download.
pub struct DownloadBar {
    bar: ProgressBar,
    label: String,
    theme: ActorTheme,
}

impl DownloadBar {
    pub fn new(label: &str, theme: ActorTheme) -> Self {
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::default_bar()
            .template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        bar.set_style(style);
        bar.set_message(label.to_string());
        Self {
            bar,
            label: label.to_string(),
            theme,
        }
    }
}

impl DownloadProgress for DownloadBar {
    fn set_percent(&mut self, percent: u8) {
        self.bar.set_position(u64::from(percent.min(100)));
    }

    fn finish(&mut self, success: bool) {
        let line = if success {
            self.theme.format_success(&format!("Downloaded {}", self.label))
        } else {
            self.theme.format_error(&format!("Download of {} failed", self.label))
        };
        self.bar.set_style(
            ProgressStyle::default_bar()
                .template("  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        self.bar.finish_with_message(line);
    }
}

/// Progress display that draws nothing (quiet modes and headless runs).
#[derive(Debug, Default)]
pub struct HiddenProgress;

impl DownloadProgress for HiddenProgress {
    fn set_percent(&mut self, _percent: u8) {}

    fn finish(&mut self, _success: bool) {}
}

/// Forwards transport progress to a UI progress display.
pub struct ProgressObserver<'a> {
    display: &'a mut dyn DownloadProgress,
}

impl<'a> ProgressObserver<'a> {
    pub fn new(display: &'a mut dyn DownloadProgress) -> Self {
        Self { display }
    }
}

impl DownloadObserver for ProgressObserver<'_> {
    fn on_progress(&mut self, percent: u8) {
        self.display.set_percent(percent);
    }

    fn on_complete(&mut self, result: &DownloadResult) {
        self.display.finish(result.is_success());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::MockProgress;

    #[test]
    fn observer_forwards_progress_and_outcome() {
        let mut display = MockProgress::default();
        {
            let mut observer = ProgressObserver::new(&mut display);
            observer.on_progress(10);
            observer.on_progress(100);
            observer.on_complete(&DownloadResult::success("/tmp/a.zip"));
        }
        assert_eq!(display.percents, vec![10, 100]);
        assert_eq!(display.finished, Some(true));
    }

    #[test]
    fn observer_reports_failure() {
        let mut display = MockProgress::default();
        ProgressObserver::new(&mut display).on_complete(&DownloadResult::fail("/tmp/a.zip"));
        assert_eq!(display.finished, Some(false));
    }

    #[test]
    fn hidden_bar_draws_nothing() {
        let mut bar = DownloadBar {
            bar: ProgressBar::hidden(),
            label: "ACT".to_string(),
            theme: ActorTheme::plain(),
        };
        bar.set_percent(50);
        assert_eq!(bar.bar.position(), 50);
        bar.finish(true);
        assert!(bar.bar.is_finished());
    }
}
