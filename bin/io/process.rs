use super::{Io, Pipe};
use anyhow::{bail, Context, Error as Anyhow};
use async_trait::async_trait;
use std::{io, process::Stdio, time::Duration};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::{ChildStdin, ChildStdout, Command};
use tokio::{runtime, task::block_in_place, time::timeout};
use tracing::{debug, error, instrument};

/// The lifecycle of a running child process.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait Lifecycle: Send {
    /// Waits for the child process to exit, describing its exit status.
    async fn exit(&mut self) -> io::Result<String>;

    /// Forcibly ends the child process.
    async fn kill(&mut self) -> io::Result<()>;
}

#[async_trait]
impl Lifecycle for tokio::process::Child {
    async fn exit(&mut self) -> io::Result<String> {
        Ok(self.wait().await?.to_string())
    }

    async fn kill(&mut self) -> io::Result<()> {
        tokio::process::Child::kill(self).await
    }
}

/// An engine running as a child process, talking over its standard streams.
///
/// When dropped, the engine is given a grace period to exit on its own before it's killed.
#[derive(Debug)]
pub struct Process<C = tokio::process::Child, W = ChildStdin, R = ChildStdout>
where
    C: Lifecycle,
    W: AsyncWrite + Send + Unpin,
    R: AsyncRead + Send + Unpin,
{
    program: String,
    pipe: Pipe<W, R>,
    child: C,
    grace: Duration,
}

impl Process {
    /// How long the engine has to exit after its standard input is flushed.
    pub const GRACE: Duration = Duration::from_secs(1);

    /// Launches the program, discarding whatever it writes to its standard error.
    #[instrument(level = "debug", err)]
    pub fn spawn(program: &str, args: &[String]) -> io::Result<Self> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        let (stdin, stdout) = Option::zip(child.stdin.take(), child.stdout.take())
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "missing standard streams"))?;

        Ok(Process::attach(program, Pipe::new(stdin, stdout), child, Self::GRACE))
    }
}

impl<C, W, R> Process<C, W, R>
where
    C: Lifecycle,
    W: AsyncWrite + Send + Unpin,
    R: AsyncRead + Send + Unpin,
{
    /// Takes ownership of a child process that is already running.
    pub fn attach(program: &str, pipe: Pipe<W, R>, child: C, grace: Duration) -> Self {
        Process {
            program: program.into(),
            pipe,
            child,
            grace,
        }
    }

    async fn shutdown(&mut self) -> Result<String, Anyhow> {
        self.pipe
            .flush()
            .await
            .context("failed to flush the engine's standard input")?;

        match timeout(self.grace, self.child.exit()).await {
            Ok(status) => Ok(status?),
            Err(_) => {
                self.child.kill().await?;
                bail!("killed the engine after it lingered for {:?}", self.grace);
            }
        }
    }
}

impl<C, W, R> Drop for Process<C, W, R>
where
    C: Lifecycle,
    W: AsyncWrite + Send + Unpin,
    R: AsyncRead + Send + Unpin,
{
    fn drop(&mut self) {
        let result = match runtime::Handle::try_current() {
            Ok(rt) => block_in_place(|| rt.block_on(self.shutdown())),
            Err(e) => Err(e.into()),
        };

        match result {
            Ok(status) => debug!(program = %self.program, %status, "engine exited"),
            Err(e) => error!(program = %self.program, "failed to shut the engine down: {:?}", e),
        }
    }
}

#[async_trait]
impl<C, W, R> Io for Process<C, W, R>
where
    C: Lifecycle,
    W: AsyncWrite + Send + Unpin,
    R: AsyncRead + Send + Unpin,
{
    async fn recv(&mut self) -> io::Result<String> {
        self.pipe.recv().await
    }

    async fn send(&mut self, msg: &str) -> io::Result<()> {
        self.pipe.send(msg).await
    }

    async fn flush(&mut self) -> io::Result<()> {
        self.pipe.flush().await
    }
}
