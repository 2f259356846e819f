use thiserror::Error;

/// Everything that can go wrong while handling an invite, an RSVP or the seating plan.
#[derive(Debug, Error)]
pub enum RsvpError {
    #[error("An invite token is required.")]
    MissingToken,
    #[error("Invite not found.")]
    InviteNotFound,
    #[error("This invite has expired.")]
    InviteExpired,
    #[error("Missing required field: {0}.")]
    MissingField(&'static str),
    #[error("The number of guests ({requested}) exceeds the allowed ({allowed}).")]
    TooManyGuests { requested: i32, allowed: i32 },
    #[error("{0}")]
    InvalidInput(String),
    #[error("RSVP not found.")]
    RsvpNotFound,
    #[error("Table not found.")]
    TableNotFound,
    #[error("A table named \"{0}\" already exists.")]
    DuplicateTable(String),
    #[error("Table \"{0}\" still has guests seated.")]
    TableOccupied(String),
    #[error("Table \"{name}\" has only {free} free seats, {needed} needed.")]
    TableFull { name: String, free: i32, needed: i32 },
    #[error("Could not generate an unused invite token after {0} attempts.")]
    TokenExhausted(usize),
    #[error("Ticket generation failed: {0}")]
    Ticket(String),
    #[error("Background task failed: {0}")]
    Task(String),
    #[error(transparent)]
    Database(#[from] diesel::result::Error),
    #[error("Database pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),
    #[error(transparent)]
    Connection(#[from] diesel::ConnectionError),
}

impl RsvpError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        RsvpError::InvalidInput(msg.into())
    }

    /// True when the failure is on our side rather than in what the caller sent.
    pub fn is_server_fault(&self) -> bool {
        matches!(
            self,
            RsvpError::TokenExhausted(_)
                | RsvpError::Ticket(_)
                | RsvpError::Task(_)
                | RsvpError::Database(_)
                | RsvpError::Pool(_)
                | RsvpError::Connection(_)
        )
    }
}

impl From<std::io::Error> for RsvpError {
    fn from(err: std::io::Error) -> Self {
        RsvpError::Ticket(err.to_string())
    }
}
