/// Reportable exit conditions from [`crate::run`]. Anything not covered here
/// — out-of-bounds access, a size mismatch between stages, an ROI that
/// violates a downstream precondition — is a bug and panics instead, per the
/// state-machine contract each stage enforces on its inputs.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// The caller-supplied image or parameter bundle is structurally wrong:
    /// buffer length doesn't match `width * height [* channels]`, a zero
    /// dimension, or a parameter outside its valid domain.
    InvalidArgument(String),
    /// The input is well-formed but too small or too uniform to produce a
    /// meaningful result once cropped (e.g. narrower than `2 *
    /// n_cropped_pixels`).
    DegenerateInput(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Self::DegenerateInput(msg) => write!(f, "degenerate input: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
