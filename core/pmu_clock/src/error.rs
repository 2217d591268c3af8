use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PmuError {
    #[error(
        "user mode access to the PMU is disabled (PMUSERENR.EN is clear), load the PMU enable kernel module first"
    )]
    UserAccessDisabled,
}

pub type PmuResult<T> = Result<T, PmuError>;
