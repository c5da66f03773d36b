#[derive(Debug)]
pub enum Error {
    ReadImage(image::ImageError),
    Pipeline(texton_pipeline::Error),
    WriteOutput(std::io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReadImage(e) => write!(f, "failed to read input image: {e}"),
            Self::Pipeline(e) => write!(f, "pipeline failed: {e}"),
            Self::WriteOutput(e) => write!(f, "failed to write output: {e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        Self::ReadImage(e)
    }
}

impl From<texton_pipeline::Error> for Error {
    fn from(e: texton_pipeline::Error) -> Self {
        Self::Pipeline(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::WriteOutput(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
