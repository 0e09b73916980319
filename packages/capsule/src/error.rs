use thiserror::Error;

/// Any error raised through the [`App`](crate::App) surface.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Task(#[from] capsule_task::TaskError),

    #[error(transparent)]
    Dispatch(#[from] capsule_task::DispatchError),

    #[error(transparent)]
    Fs(#[from] capsule_fs::FsError),

    #[error(transparent)]
    Http(#[from] capsule_http::Error),

    #[error(transparent)]
    Host(#[from] capsule_host::HostError),

    #[cfg(feature = "native")]
    #[error(transparent)]
    Runner(#[from] capsule_runner::RunnerError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
