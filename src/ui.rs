use anyhow::Result;
use console::{Style, Term};
use costphrase::Stats;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::{Duration, Instant};

/// Below this many phrases the output is done before a bar would render.
pub const MIN_PROGRESS_COUNT: u64 = 10_000;

/// Bits per unit of cost below which the stats line gets a warning colour.
pub const MIN_BITS_PER_COST: f64 = 1.0;

pub struct DisplayOptions {
    pub color_support: bool,
    pub progress: bool,
}

impl DisplayOptions {
    pub fn detect() -> Self {
        Self {
            color_support: detect_color_support(),
            progress: Term::stderr().is_term(),
        }
    }
}

pub fn detect_color_support() -> bool {
    supports_color::on(supports_color::Stream::Stdout).is_some()
}

pub fn stats_line(stats: &Stats, options: &DisplayOptions) -> String {
    let line = stats.to_string();

    if !options.color_support {
        return line;
    }

    let style = if stats.bits_per_cost >= MIN_BITS_PER_COST {
        Style::new().green()
    } else {
        Style::new().yellow()
    };
    style.apply_to(line).to_string()
}

pub fn show_progress<F, T>(enabled: bool, message: &'static str, f: F) -> Result<(T, Duration)>
where
    F: FnOnce() -> Result<T>,
{
    let pb = if enabled {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("-\\|/-"),
        );
        pb.set_message(message);
        pb.enable_steady_tick(Duration::from_millis(80));
        pb
    } else {
        ProgressBar::hidden()
    };

    let start = Instant::now();
    let result = f();
    let elapsed = start.elapsed();

    pb.finish_and_clear();

    result.map(|r| (r, elapsed))
}

pub fn phrase_progress(count: u64, options: &DisplayOptions) -> ProgressBar {
    if !options.progress || count < MIN_PROGRESS_COUNT {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(count);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{bar:40} {pos}/{len} phrases ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() -> DisplayOptions {
        DisplayOptions {
            color_support: false,
            progress: false,
        }
    }

    fn stats(bits_per_cost: f64) -> Stats {
        Stats {
            bits: 81.5,
            low: 40,
            high: 41,
            bits_per_cost,
        }
    }

    #[test]
    fn test_stats_line_plain() {
        let line = stats_line(&stats(1.987805), &plain());
        assert_eq!(line, "# bits=81.500000 cost=[40..41] bits_per_cost=1.987805");
    }

    #[test]
    fn test_stats_line_colored_keeps_text() {
        let options = DisplayOptions {
            color_support: true,
            progress: false,
        };
        let line = stats_line(&stats(0.5), &options);
        assert_eq!(
            console::strip_ansi_codes(&line),
            "# bits=81.500000 cost=[40..41] bits_per_cost=0.500000"
        );
    }

    #[test]
    fn test_phrase_progress_hidden_for_small_counts() {
        let options = DisplayOptions {
            color_support: false,
            progress: true,
        };
        assert!(phrase_progress(10, &options).is_hidden());
        assert!(phrase_progress(MIN_PROGRESS_COUNT, &plain()).is_hidden());
    }

    #[test]
    fn test_show_progress_passes_result() {
        let (value, _) = show_progress(false, "Working...", || Ok(42)).unwrap();
        assert_eq!(value, 42);

        let result: Result<((), Duration)> =
            show_progress(false, "Working...", || anyhow::bail!("failed"));
        assert!(result.is_err());
    }
}
