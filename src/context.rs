//! Per-invocation run settings passed through the pipeline

/// Global flags that steer one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunContext {
    /// Debug-level diagnostics
    pub verbose: bool,
    /// Fetch and render, but never write files or send email
    pub dry_run: bool,
}

impl RunContext {
    pub fn new(verbose: bool, dry_run: bool) -> Self {
        Self { verbose, dry_run }
    }

    /// Default tracing directive for this run
    pub fn log_directive(&self) -> &'static str {
        if self.verbose {
            "zaptec_reporter=debug"
        } else {
            "zaptec_reporter=info"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_directive() {
        assert_eq!(RunContext::new(false, false).log_directive(), "zaptec_reporter=info");
        assert_eq!(RunContext::new(true, false).log_directive(), "zaptec_reporter=debug");
    }
}
