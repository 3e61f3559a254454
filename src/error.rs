use std::io;
use quick_error::quick_error;

quick_error! {
    #[derive(Debug)]
    pub enum Error {
        Aborted {
            display("aborted")
        }
        Decode(err: gif::DecodingError) {
            display("GIF decoding error: {}", err)
        }
        Encode(err: gif::EncodingError) {
            display("GIF encoding error: {}", err)
        }
        NoFrames {
            display("Found no frames in the input animation")
        }
        NoPalette(frame_index: usize) {
            display("Frame {} has neither a local nor a global palette", frame_index)
        }
        InvalidFps(fps: u16) {
            display("Frame rate {} can't be expressed in 1/100s delays", fps)
        }
        Io(err: io::Error) {
            from()
            from(_oom: std::collections::TryReserveError) -> (io::ErrorKind::OutOfMemory.into())
            display("I/O: {}", err)
        }
    }
}

pub type CatResult<T, E = Error> = Result<T, E>;

impl From<gif::EncodingError> for Error {
    #[cold]
    fn from(err: gif::EncodingError) -> Self {
        match err {
            gif::EncodingError::Io(err) => err.into(),
            other => Error::Encode(other),
        }
    }
}

impl From<gif::DecodingError> for Error {
    #[cold]
    fn from(err: gif::DecodingError) -> Self {
        match err {
            gif::DecodingError::Io(err) => err.into(),
            other => Error::Decode(other),
        }
    }
}
