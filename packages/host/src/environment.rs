//! WASI-style environment capability (`wasi:cli/environment`).

/// Environment exposed to the guest by the host.
pub trait Environment: Send + Sync {
    /// All environment variables as ordered `(key, value)` pairs.
    fn get_environment(&self) -> Vec<(String, String)>;

    /// Command-line arguments, program name first.
    fn get_arguments(&self) -> Vec<String>;

    /// The working directory the instance was started in, if the host set one.
    fn initial_cwd(&self) -> Option<String>;
}
