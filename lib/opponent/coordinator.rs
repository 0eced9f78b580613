use super::{Difficulty, Opponent, OpponentError};
use crate::chess::{Move, Position};
use derive_more::{Display, Error};
use futures_util::FutureExt;
use std::time::Duration;
use tokio::{runtime::Handle, task::JoinHandle, time::timeout};
use tracing::{debug, error, instrument, warn, Instrument, Span};

/// The reason why a request could not be submitted to the [`Coordinator`].
#[derive(Debug, Display, Copy, Clone, Eq, PartialEq, Hash, Error)]
pub enum SubmitError {
    #[display(fmt = "a request is already outstanding")]
    Busy,

    #[display(fmt = "the opponent is unavailable")]
    Unavailable,
}

type Reply<O> = (O, Result<Move, OpponentError>);

/// Runs requests to the [`Opponent`] in the background.
///
/// The opponent is moved into the task serving the request and handed back
/// along with the reply, so at most one request is ever outstanding. Requests
/// are tagged with the generation of the game that issued them, replies to
/// earlier generations are discarded.
#[derive(Debug)]
pub struct Coordinator<O> {
    engine: Option<O>,
    configured: Option<u64>,
    pending: Option<(u64, JoinHandle<Reply<O>>)>,
    budget: Duration,
    grace: Duration,
    runtime: Handle,
}

impl<O: Opponent + 'static> Coordinator<O> {
    /// Constructs [`Coordinator`] with the given thinking time.
    ///
    /// A request is abandoned once `budget + grace` elapses without a reply.
    pub fn new(engine: Option<O>, budget: Duration, grace: Duration, runtime: Handle) -> Self {
        Coordinator {
            engine,
            configured: None,
            pending: None,
            budget,
            grace,
            runtime,
        }
    }

    /// Whether the opponent can accept requests, either now or once the outstanding one completes.
    pub fn is_available(&self) -> bool {
        self.engine.is_some() || self.pending.is_some()
    }

    /// Whether a request is outstanding.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Asks the opponent for a reply to the given [`Position`] without waiting for it.
    ///
    /// The opponent is configured with the [`Difficulty`] on the first request of each generation.
    #[instrument(level = "debug", skip(self, pos), fields(%pos), err)]
    pub fn submit(
        &mut self,
        generation: u64,
        pos: Position,
        difficulty: Difficulty,
    ) -> Result<(), SubmitError> {
        if self.pending.is_some() {
            return Err(SubmitError::Busy);
        }

        let mut engine = self.engine.take().ok_or(SubmitError::Unavailable)?;
        let configure = self.configured.replace(generation) != Some(generation);
        let (budget, deadline) = (self.budget, self.budget + self.grace);

        let task = async move {
            let reply = async {
                if configure {
                    engine.configure(difficulty).await?;
                }

                engine.play(pos.clone(), budget).await
            };

            let reply = timeout(deadline, reply).await;
            let result = match reply {
                Err(_) => Err(OpponentError::Timeout),
                Ok(Ok(m)) if !pos.is_legal(m) => Err(OpponentError::Protocol(format!(
                    "move `{}` is illegal in position `{}`",
                    m, pos
                ))),
                Ok(result) => result,
            };

            (engine, result)
        };

        let handle = self.runtime.spawn(task.instrument(Span::current()));
        self.pending = Some((generation, handle));

        Ok(())
    }

    /// The reply to the request of the given generation, if it has completed.
    ///
    /// Replies to requests of other generations are discarded.
    pub fn poll(&mut self, generation: u64) -> Option<Result<Move, OpponentError>> {
        let (tag, handle) = self.pending.as_mut()?;
        let joined = handle.now_or_never()?;
        let tag = *tag;
        self.pending = None;

        let result = match joined {
            Ok((engine, result)) => {
                self.engine = Some(engine);
                result
            }

            Err(e) => {
                error!("the opponent task failed: {}", e);
                Err(OpponentError::Terminated)
            }
        };

        if tag == generation {
            debug!(?result, "reply received");
            Some(result)
        } else {
            warn!(tag, generation, ?result, "discarding stale reply");
            None
        }
    }
}
