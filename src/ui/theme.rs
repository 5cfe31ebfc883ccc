//! Terminal styling for installer output.

use console::Style;

/// Styles applied to status lines, headers and download bars.
#[derive(Debug, Clone)]
pub struct ActorTheme {
    pub success: Style,
    pub warning: Style,
    pub error: Style,
    /// Secondary text such as the exit hint.
    pub dim: Style,
    /// Section titles ("Prerequisites", "Components").
    pub title: Style,
    /// Marker drawn before a section title.
    pub marker: Style,
}

impl Default for ActorTheme {
    fn default() -> Self {
        Self::colored()
    }
}

impl ActorTheme {
    pub fn colored() -> Self {
        Self {
            success: Style::new().green(),
            warning: Style::new().yellow(),
            error: Style::new().red().bold(),
            dim: Style::new().dim(),
            title: Style::new().bold(),
            marker: Style::new().cyan().bold(),
        }
    }

    /// No styling at all; used when colors are off.
    pub fn plain() -> Self {
        Self {
            success: Style::new(),
            warning: Style::new(),
            error: Style::new(),
            dim: Style::new(),
            title: Style::new(),
            marker: Style::new(),
        }
    }

    pub fn for_colors(colors: bool) -> Self {
        if colors {
            Self::colored()
        } else {
            Self::plain()
        }
    }

    pub fn format_success(&self, msg: &str) -> String {
        self.status('✓', &self.success, msg)
    }

    pub fn format_warning(&self, msg: &str) -> String {
        self.status('⚠', &self.warning, msg)
    }

    pub fn format_error(&self, msg: &str) -> String {
        self.status('✗', &self.error, msg)
    }

    pub fn format_header(&self, title: &str) -> String {
        format!("{} {}", self.marker.apply_to("▶"), self.title.apply_to(title))
    }

    fn status(&self, icon: char, style: &Style, msg: &str) -> String {
        style.apply_to(format!("{} {}", icon, msg)).to_string()
    }
}

/// Colors are used only on a terminal, and never with `--no-color` or
/// `NO_COLOR` set (https://no-color.org/).
pub fn should_use_colors(no_color_flag: bool) -> bool {
    if no_color_flag || std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    console::Term::stdout().is_term()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_status_lines_carry_icons() {
        let theme = ActorTheme::plain();
        assert_eq!(theme.format_success("Installed ACT"), "✓ Installed ACT");
        assert_eq!(
            theme.format_warning("Installer exited with 3"),
            "⚠ Installer exited with 3"
        );
        assert_eq!(theme.format_error("Download failed"), "✗ Download failed");
    }

    #[test]
    fn header_contains_title() {
        assert_eq!(ActorTheme::plain().format_header("Components"), "▶ Components");
    }

    #[test]
    fn no_color_flag_wins() {
        assert!(!should_use_colors(true));
    }

    #[test]
    fn plain_theme_selected_without_colors() {
        let theme = ActorTheme::for_colors(false);
        assert_eq!(theme.format_success("ok"), "✓ ok");
    }
}
