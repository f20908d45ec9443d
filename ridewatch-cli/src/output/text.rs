//! Text output formatting with colors.

use chrono::{DateTime, Local, Utc};
use ridewatch_core::{SessionState, Slot};
use ridewatch_fetch::SessionInfo;
use ridewatch_monitor::CycleReport;
use ridewatch_store::RideStats;

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    // ========================================================================
    // Rides
    // ========================================================================

    /// Formats a ride table.
    pub fn format_rides(&self, rides: &[Slot]) -> String {
        if rides.is_empty() {
            return self.dim("No rides found");
        }

        let mut lines = vec![self.bold(&format!(
            "{:<16}  {:<24}  {:<13}  {}",
            "Start", "Location", "Exam", "Cost"
        ))];
        lines.extend(rides.iter().map(|ride| self.format_ride_line(ride)));
        lines.push(self.dim(&format!(
            "{} ride{}",
            rides.len(),
            if rides.len() == 1 { "" } else { "s" }
        )));
        lines.join("\n")
    }

    /// Formats one ride as a table row.
    pub fn format_ride_line(&self, ride: &Slot) -> String {
        let start = ride.starts_at.format("%Y-%m-%d %H:%M").to_string();
        let row = format!(
            "{:<16}  {:<24}  {:<13}  {}",
            start,
            truncate(&ride.location, 24),
            ride.exam_type.display_name(),
            ride.cost.as_deref().unwrap_or("−")
        );

        match ride.absent_since {
            Some(since) => format!(
                "{}  {}",
                self.dim(&row),
                self.dim(&format!("gone since {}", format_local(since)))
            ),
            None => row,
        }
    }

    /// Formats the next available ride.
    pub fn format_next_ride(&self, ride: Option<&Slot>) -> String {
        match ride {
            Some(ride) => format!("{} {}", self.bold("Next ride:"), self.green(&ride.summary())),
            None => self.dim("No upcoming rides recorded"),
        }
    }

    /// Formats ride counts.
    pub fn format_stats(&self, stats: &RideStats) -> String {
        format!(
            "{} present, {} gone",
            self.green(&stats.present.to_string()),
            self.dim(&stats.absent.to_string())
        )
    }

    // ========================================================================
    // Monitor
    // ========================================================================

    /// Formats a poll cycle summary.
    pub fn format_cycle_report(&self, report: &CycleReport) -> String {
        let mut lines = vec![format!(
            "{} {} fetched, {} new, {} gone, {} malformed",
            self.bold("Cycle:"),
            report.fetched,
            if report.added > 0 {
                self.green(&report.added.to_string())
            } else {
                report.added.to_string()
            },
            report.removed,
            if report.malformed > 0 {
                self.yellow(&report.malformed.to_string())
            } else {
                report.malformed.to_string()
            }
        )];
        lines.push(self.format_next_ride(report.next_available.as_ref()));
        lines.join("\n")
    }

    /// Formats a skipped cycle.
    pub fn format_skipped(&self, kind: &str, detail: &str) -> String {
        format!("{} {} ({})", self.yellow("Cycle skipped:"), detail, kind)
    }

    // ========================================================================
    // Session
    // ========================================================================

    /// Formats a session report.
    pub fn format_session(&self, info: &SessionInfo) -> String {
        let state = match info.state {
            SessionState::Fresh if info.renewal_due => self.yellow("renewal due"),
            SessionState::Fresh => self.green("fresh"),
            SessionState::Renewing => self.yellow("renewing"),
            SessionState::Invalid => self.red("invalid"),
        };

        let mut lines = vec![
            self.bold("Session"),
            "─".repeat(40),
            format!("State:       {state}"),
            format!("Subject:     {}", self.cyan(&info.subject)),
            format!("Generation:  {}", info.generation),
            format!("Cookies:     {}", info.cookie_count),
        ];

        if info.missing_cookies.is_empty() {
            lines.push(format!("Required:    {}", self.green("all present")));
        } else {
            lines.push(format!(
                "Required:    {} {}",
                self.red("missing"),
                info.missing_cookies.join(", ")
            ));
        }

        if let Some(login_valid) = &info.login_valid {
            lines.push(format!("LoginValid:  {login_valid}"));
        }
        lines.push(format!(
            "Expires:     {} ({})",
            format_local(info.expires_at),
            self.format_remaining(info.minutes_remaining)
        ));
        lines.push(format!(
            "Refreshed:   {}",
            info.last_refresh
                .map_or_else(|| self.dim("never"), format_local)
        ));
        if let Some(error) = &info.last_error {
            lines.push(format!("Last error:  {}", self.red(error)));
        }

        lines.join("\n")
    }

    fn format_remaining(&self, minutes: i64) -> String {
        if minutes <= 0 {
            return self.red("expired");
        }
        let text = if minutes < 60 {
            format!("{minutes} min left")
        } else {
            format!("{}h {}m left", minutes / 60, minutes % 60)
        };
        if minutes < 15 { self.yellow(&text) } else { self.green(&text) }
    }

    // ========================================================================
    // Color/style helpers
    // ========================================================================

    fn paint(&self, color: &str, text: &str) -> String {
        if self.use_colors {
            format!("{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    fn green(&self, text: &str) -> String {
        self.paint(GREEN, text)
    }

    fn yellow(&self, text: &str) -> String {
        self.paint(YELLOW, text)
    }

    fn red(&self, text: &str) -> String {
        self.paint(RED, text)
    }

    fn cyan(&self, text: &str) -> String {
        self.paint(CYAN, text)
    }
}

fn format_local(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Farsta", 24), "Farsta");
        assert_eq!(truncate("Göteborg Högsbo", 8), "Götebor…");
        assert_eq!(truncate("Göteborg Högsbo", 8).chars().count(), 8);
    }

    #[test]
    fn test_remaining_thresholds() {
        let formatter = TextFormatter::new(true);
        assert!(formatter.format_remaining(0).contains("expired"));
        assert!(formatter.format_remaining(10).contains(YELLOW));
        assert!(formatter.format_remaining(90).contains("1h 30m left"));
        assert!(formatter.format_remaining(90).contains(GREEN));
    }

    #[test]
    fn test_no_colors_is_plain() {
        let formatter = TextFormatter::new(false);
        assert_eq!(formatter.bold("x"), "x");
        assert_eq!(formatter.red("x"), "x");
    }
}
