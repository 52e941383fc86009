use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "secure-switch-bench",
    about = "World-switch benchmark: round-trip time vs. secure-world cycles"
)]
pub struct Cli {
    /// Benchmark iterations; omit (or give 1) for a single switch read.
    /// Unparsable or < 1 counts as 1.
    #[arg(allow_negative_numbers = true)]
    pub iterations: Option<String>,
    /// Simulated world-switch latency added to every invoke, in microseconds
    #[arg(long, default_value_t = 0)]
    pub latency_us: u64,
    /// Debug logging (overrides RUST_LOG)
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl Cli {
    pub fn iterations(&self) -> usize {
        iterations_from_arg(self.iterations.as_deref())
    }
}

/// Iteration count, clamped to at least 1.
pub fn iterations_from_arg(arg: Option<&str>) -> usize {
    let n = arg.map(atoi).unwrap_or(1).max(1);
    usize::try_from(n).unwrap_or(usize::MAX)
}

/// C `atoi`: optional leading whitespace and sign, then as many digits as
/// are present. Anything unparsable is 0. Saturates instead of overflowing.
pub fn atoi(s: &str) -> i64 {
    let s = s.trim_start();
    let (neg, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let mut v: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        v = v.saturating_mul(10).saturating_add((b - b'0') as i64);
    }
    if neg { -v } else { v }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atoi_follows_c_semantics() {
        assert_eq!(atoi("250"), 250);
        assert_eq!(atoi("  42"), 42);
        assert_eq!(atoi("+7"), 7);
        assert_eq!(atoi("-3"), -3);
        assert_eq!(atoi("12abc"), 12);
        assert_eq!(atoi("abc"), 0);
        assert_eq!(atoi(""), 0);
        assert_eq!(atoi("-"), 0);
        assert_eq!(atoi("99999999999999999999999"), i64::MAX);
    }

    #[test]
    fn iterations_clamp_to_one() {
        assert_eq!(iterations_from_arg(None), 1);
        assert_eq!(iterations_from_arg(Some("0")), 1);
        assert_eq!(iterations_from_arg(Some("-5")), 1);
        assert_eq!(iterations_from_arg(Some("lots")), 1);
        assert_eq!(iterations_from_arg(Some("1000")), 1000);
    }

    #[test]
    fn parses_command_line() {
        let cli = Cli::parse_from(["secure-switch-bench"]);
        assert_eq!(cli.iterations(), 1);
        assert_eq!(cli.latency_us, 0);

        let cli = Cli::parse_from(["secure-switch-bench", "500", "--latency-us", "20", "-v"]);
        assert_eq!(cli.iterations(), 500);
        assert_eq!(cli.latency_us, 20);
        assert!(cli.verbose);

        let cli = Cli::parse_from(["secure-switch-bench", "-8"]);
        assert_eq!(cli.iterations(), 1);
    }
}
