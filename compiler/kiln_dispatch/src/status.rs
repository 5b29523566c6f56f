use std::fmt;

/// Where a [`CompileJob`](crate::CompileJob) is in its pipeline.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum CompileJobStatus {
    Initial,
    ReadyToParse,
    Parsed,
    ReadyToAnalyze,
    ReadyToCompile,
    Compiled,
    Done,
    Failed,
}

impl CompileJobStatus {
    /// `Done` or `Failed`: only a reset may follow.
    pub fn is_terminal(self) -> bool {
        matches!(self, CompileJobStatus::Done | CompileJobStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CompileJobStatus::Initial => "Initial",
            CompileJobStatus::ReadyToParse => "ReadyToParse",
            CompileJobStatus::Parsed => "Parsed",
            CompileJobStatus::ReadyToAnalyze => "ReadyToAnalyze",
            CompileJobStatus::ReadyToCompile => "ReadyToCompile",
            CompileJobStatus::Compiled => "Compiled",
            CompileJobStatus::Done => "Done",
            CompileJobStatus::Failed => "Failed",
        }
    }
}

impl fmt::Display for CompileJobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
