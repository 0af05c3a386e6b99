pub mod dhondt;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AllocationError {
    #[error("Cannot distribute {seats} seat(s): no parties have been seen")]
    EmptyPartySet { seats: u32 },
}

pub type AllocationResult<T> = std::result::Result<T, AllocationError>;
