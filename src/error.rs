#[derive(Debug)]
pub enum PtuError {
    TransportUnavailable(String),
    DiscoveryFailed,
    CommandFailed(String),
    NoResponse,
    InvalidAxisSelection,
    Io(std::io::Error),
}

impl std::fmt::Display for PtuError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PtuError::TransportUnavailable(msg) => write!(f, "Transport unavailable: {}", msg),
            PtuError::DiscoveryFailed => write!(f, "Device address discovery failed"),
            PtuError::CommandFailed(response) => {
                write!(f, "Command rejected by device: {}", response)
            }
            PtuError::NoResponse => write!(f, "No response from device"),
            PtuError::InvalidAxisSelection => {
                write!(f, "At least one axis must be selected")
            }
            PtuError::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for PtuError {}

impl From<std::io::Error> for PtuError {
    fn from(err: std::io::Error) -> Self {
        PtuError::Io(err)
    }
}
