use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    WriteLeveling { module: usize },
    /// `window` is the widest passing window found, if any.
    ReadLeveling { module: usize, window: Option<(u16, u16)> },
    CommandDelay,
    MemoryTest { errors: usize, total: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            &Error::WriteLeveling { module } =>
                write!(f, "write leveling found no DQS edge on module {}", module),
            &Error::ReadLeveling { module, window: None } =>
                write!(f, "no read window on module {}", module),
            &Error::ReadLeveling { module, window: Some((first, last)) } =>
                write!(f, "read window too small on module {}: {}-{}", module, first, last),
            &Error::CommandDelay =>
                write!(f, "no working command delay"),
            &Error::MemoryTest { errors, total } =>
                write!(f, "memory test failed ({}/{} words incorrect)", errors, total),
        }
    }
}

/// Steps of `sdrinit`, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    EnterSoftware,
    ProgramModeRegisters,
    Calibrate,
    EnterHardware,
    Validate,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            &Stage::EnterSoftware => write!(f, "software control"),
            &Stage::ProgramModeRegisters => write!(f, "mode register setup"),
            &Stage::Calibrate => write!(f, "calibration"),
            &Stage::EnterHardware => write!(f, "hardware control"),
            &Stage::Validate => write!(f, "validation"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Failure {
    pub stage: Stage,
    pub error: Error,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} failed: {}", self.stage, self.error)
    }
}
