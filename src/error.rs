use async_std::io::Error as IoError;
use std::convert::From;
use std::fmt::{Display, Formatter};

const ERR411: &str = "Input Error 411: no memory allocated for results.";
const ERR412: &str = "Input Error 412: no results; binary file hasn't been opened.";
const ERR421: &str = "Input Error 421: invalid parameter code.";
const ERR423: &str = "Input Error 423: element index out of range.";
const ERR434: &str = "File Error  434: unable to open binary output file.";
const ERR435: &str = "File Error  435: run terminated; no results in binary file.";
const ERR436: &str = "File Error  436: no results in binary file.";
const ERR441: &str = "Error 441: need to call open before calling this function";

/// Errors reported by the output file reader.
///
/// The numeric codes are stable and match the ones SWMM tooling has always
/// used, so they can be handed to callers that still dispatch on integers.
#[derive(Debug)]
pub enum Error {
    /// No buffer was allocated for results (legacy code, kept for
    /// [`Error::message_for`] lookups).
    NoOutputBuffer,
    /// A query was issued without an open file (legacy code; an owned
    /// [`SwmmOutput`](crate::SwmmOutput) cannot reach this state).
    NotOpen,
    /// An unknown selector or code was passed.
    InvalidParameter,
    /// An element index, attribute, or period lies outside the file.
    OutOfRange,
    /// The operating system refused to open the file.
    FileUnopenable,
    /// The leading and trailing magic numbers disagree.
    NotASwmmOutputFile,
    /// The simulation run terminated with an error; the file holds no
    /// usable results.
    RunTerminatedNoResults,
    /// The file is well-formed but contains zero reporting periods.
    NoResults,
    /// Legacy code for calling an operation before `open`.
    OpenRequired,
    /// The underlying read failed mid-stream (short read or I/O error).
    ReadFailed(IoError),
}

impl Error {
    /// The stable numeric code for this error.
    pub fn code(&self) -> i32 {
        match self {
            Error::NoOutputBuffer => 411,
            Error::NotOpen => 412,
            Error::InvalidParameter => 421,
            Error::OutOfRange => 423,
            Error::FileUnopenable => 434,
            // The original reader reported a failed handshake with the same
            // code as a terminated run.
            Error::NotASwmmOutputFile => 435,
            Error::RunTerminatedNoResults => 435,
            Error::NoResults => 436,
            Error::OpenRequired => 441,
            Error::ReadFailed(_) => 412,
        }
    }

    /// Looks up the fixed message for a numeric error code.
    ///
    /// Returns [`Error::InvalidParameter`] for a code outside the table.
    pub fn message_for(code: i32) -> Result<&'static str, Error> {
        match code {
            411 => Ok(ERR411),
            412 => Ok(ERR412),
            421 => Ok(ERR421),
            423 => Ok(ERR423),
            434 => Ok(ERR434),
            435 => Ok(ERR435),
            436 => Ok(ERR436),
            441 => Ok(ERR441),
            _ => Err(Error::InvalidParameter),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::NotASwmmOutputFile => {
                write!(f, "File Error  435: not a SWMM binary output file.")
            }
            Error::ReadFailed(err) => write!(f, "read from output file failed: {}", err),
            other => {
                // code() only yields values present in the table
                write!(f, "{}", Error::message_for(other.code()).unwrap())
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ReadFailed(err) => Some(err),
            _ => None,
        }
    }
}

impl From<IoError> for Error {
    fn from(err: IoError) -> Self {
        Self::ReadFailed(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest(
        code,
        message,
        case(411, "Input Error 411: no memory allocated for results."),
        case(412, "Input Error 412: no results; binary file hasn't been opened."),
        case(421, "Input Error 421: invalid parameter code."),
        case(434, "File Error  434: unable to open binary output file."),
        case(435, "File Error  435: run terminated; no results in binary file."),
        case(441, "Error 441: need to call open before calling this function")
    )]
    fn message_lookup(code: i32, message: &str) {
        assert_eq!(Error::message_for(code).unwrap(), message);
    }

    #[test]
    fn message_lookup_rejects_unknown_code() {
        let err = Error::message_for(500).unwrap_err();
        assert_eq!(err.code(), 421);
    }

    #[test]
    fn handshake_failure_shares_the_legacy_code() {
        assert_eq!(
            Error::NotASwmmOutputFile.code(),
            Error::RunTerminatedNoResults.code()
        );
    }
}
