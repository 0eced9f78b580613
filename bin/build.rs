use crate::engine::{Engine, EngineConfig, Uci, UciError};
use crate::io::Process;

/// Trait for types that build other types.
pub trait Build {
    /// The type to be built.
    type Output;

    /// The reason why [`Build::Output`] could not be built.
    type Error;

    /// Build an instance of [`Build::Output`].
    fn build(self) -> Result<Self::Output, Self::Error>;
}

impl Build for EngineConfig {
    type Output = Engine;
    type Error = UciError;

    fn build(self) -> Result<Self::Output, Self::Error> {
        match self {
            EngineConfig::Uci(path, args, options) => {
                let io = Process::spawn(&path, &args)?;
                Ok(Uci::new(io, options))
            }
        }
    }
}
