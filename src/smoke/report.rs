use std::io::Write;

/// Prefixes for success and failure lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Marks {
    pub ok: &'static str,
    pub fail: &'static str,
}

impl Marks {
    pub const BRACKETS: Marks = Marks {
        ok: "[OK]",
        fail: "[FAIL]",
    };

    pub const SYMBOLS: Marks = Marks {
        ok: "✓",
        fail: "✗",
    };
}

impl Default for Marks {
    fn default() -> Self {
        Marks::BRACKETS
    }
}

/// Writes the human-readable report. Write errors are logged and otherwise
/// ignored so a closed stdout never changes the outcome of a run.
#[derive(Debug)]
pub struct Reporter<W: Write> {
    out: W,
    width: usize,
    marks: Marks,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            width: 50,
            marks: Marks::default(),
        }
    }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    pub fn with_marks(mut self, marks: Marks) -> Self {
        self.marks = marks;
        self
    }

    pub fn marks(&self) -> Marks {
        self.marks
    }

    pub fn line(&mut self, text: impl AsRef<str>) {
        if let Err(err) = writeln!(self.out, "{}", text.as_ref()) {
            log::warn!("failed to write report line: {err}");
        }
    }

    pub fn blank(&mut self) {
        self.line("");
    }

    pub fn ok(&mut self, text: impl AsRef<str>) {
        let line = format!("{} {}", self.marks.ok, text.as_ref());
        self.line(line);
    }

    pub fn fail(&mut self, text: impl AsRef<str>) {
        let line = format!("{} {}", self.marks.fail, text.as_ref());
        self.line(line);
    }

    /// Indented continuation of the previous line.
    pub fn detail(&mut self, text: impl AsRef<str>) {
        let line = format!("    {}", text.as_ref());
        self.line(line);
    }

    pub fn rule(&mut self) {
        let rule = "=".repeat(self.width);
        self.line(rule);
    }

    pub fn banner(&mut self, title: &str) {
        self.rule();
        self.line(title);
        self.rule();
    }

    /// `=== Testing <area> ===`, preceded by an empty line.
    pub fn section(&mut self, area: &str) {
        self.heading(&format!("=== Testing {area} ==="));
    }

    pub fn heading(&mut self, text: &str) {
        self.blank();
        self.line(text);
    }

    pub fn summary(&mut self, report: &SuiteReport) {
        self.blank();
        self.banner("Test Summary");
        for result in &report.results {
            let status = if result.passed {
                format!("{} PASSED", self.marks.ok)
            } else {
                format!("{} FAILED", self.marks.fail)
            };
            self.line(format!("{}: {status}", result.label));
        }
        self.rule();
    }

    pub fn flush(&mut self) {
        if let Err(err) = self.out.flush() {
            log::warn!("failed to flush report: {err}");
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckResult {
    pub label: String,
    pub passed: bool,
    /// Rendered error when the check failed with one.
    pub error: Option<String>,
}

impl CheckResult {
    pub fn passed(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            passed: true,
            error: None,
        }
    }

    pub fn failed(label: impl Into<String>, error: Option<String>) -> Self {
        Self {
            label: label.into(),
            passed: false,
            error,
        }
    }
}

/// Outcome of one profile run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SuiteReport {
    pub profile: String,
    pub results: Vec<CheckResult>,
}

impl SuiteReport {
    pub fn new(profile: impl Into<String>) -> Self {
        Self {
            profile: profile.into(),
            results: Vec::new(),
        }
    }

    pub fn push(&mut self, result: CheckResult) {
        self.results.push(result);
    }

    /// False for an empty report: a run that checked nothing did not pass.
    pub fn all_passed(&self) -> bool {
        !self.results.is_empty() && self.results.iter().all(|result| result.passed)
    }

    pub fn failed(&self) -> impl Iterator<Item = &CheckResult> {
        self.results.iter().filter(|result| !result.passed)
    }

    pub fn exit_code(&self) -> i32 {
        if self.all_passed() {
            0
        } else {
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(reporter: Reporter<Vec<u8>>) -> String {
        String::from_utf8(reporter.into_inner()).unwrap()
    }

    #[test]
    fn banner_uses_configured_width() {
        let mut reporter = Reporter::new(Vec::new()).with_width(60);
        reporter.banner("Firebase Emulator Tests - StA2BLE Custom Ports");
        let text = output(reporter);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "=".repeat(60));
        assert_eq!(lines[1], "Firebase Emulator Tests - StA2BLE Custom Ports");
        assert_eq!(lines[2], "=".repeat(60));
    }

    #[test]
    fn section_and_marks() {
        let mut reporter = Reporter::new(Vec::new());
        reporter.section("Authentication (Port 9199)");
        reporter.ok("Deleted user");
        reporter.detail("Response: {}");
        let text = output(reporter);
        assert_eq!(
            text,
            "\n=== Testing Authentication (Port 9199) ===\n[OK] Deleted user\n    Response: {}\n"
        );
    }

    #[test]
    fn summary_lists_every_result() {
        let mut report = SuiteReport::new("default-ports");
        report.push(CheckResult::passed("Authentication"));
        report.push(CheckResult::failed("Storage", Some("boom".into())));
        let mut reporter = Reporter::new(Vec::new());
        reporter.summary(&report);
        let text = output(reporter);
        assert!(text.contains("\nTest Summary\n"));
        assert!(text.contains("Authentication: [OK] PASSED\n"));
        assert!(text.contains("Storage: [FAIL] FAILED\n"));
    }

    #[test]
    fn symbol_marks() {
        let mut reporter = Reporter::new(Vec::new()).with_marks(Marks::SYMBOLS);
        reporter.ok("Created document");
        assert_eq!(output(reporter), "✓ Created document\n");
    }

    #[test]
    fn exit_code_reflects_results() {
        let mut report = SuiteReport::new("quick");
        assert_eq!(report.exit_code(), 1);
        report.push(CheckResult::passed("Auth"));
        assert_eq!(report.exit_code(), 0);
        report.push(CheckResult::failed("Firestore", None));
        assert_eq!(report.exit_code(), 1);
        assert_eq!(report.failed().count(), 1);
    }
}
