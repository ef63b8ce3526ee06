use thiserror::Error;

////////////////////////////////////////////////////////////////////////////////

/// Internal-consistency faults of the checking pipeline.
///
/// Each one means a collaborator broke its contract. They are reported,
/// never recovered from.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckError {
    #[error("state at depth {depth} has no predecessor in layer {}", .depth.saturating_sub(1))]
    MissingPredecessor { depth: usize },
    #[error("no input moves the depth-{depth} state to its successor")]
    MissingInputs { depth: usize },
    #[error("cannot pick a member of the empty {what} set")]
    EmptyPick { what: &'static str },
    #[error("violating states lie outside every reachability layer")]
    ViolationOutsideLayers,
}

////////////////////////////////////////////////////////////////////////////////

pub type CheckResult<T> = Result<T, CheckError>;
