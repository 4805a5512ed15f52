use thiserror::Error as ThisError;

///
/// Owned form of a `nom::Err`, so parse failures can outlive the buffer they were raised on
///
#[derive(Debug, ThisError)]
pub enum Error {
    #[error("Incomplete: {size:?}")]
    Incomplete {
        size: Option<usize>
    },
    #[error("{msg}")]
    Failure {
        msg: String
    }
}

impl<I, E> From<&nom::Err<I, E>> for Error
    where
        I: std::fmt::Debug,
        E: std::fmt::Debug,
{
    fn from(err: &nom::Err<I, E>) -> Error {
        match err {
            nom::Err::Incomplete(nom::Needed::Unknown) => {
                Error::Incomplete {
                    size: None
                }
            }
            nom::Err::Incomplete(nom::Needed::Size(sz)) => {
                Error::Incomplete {
                    size: Some(*sz)
                }
            }
            nom::Err::Error(c) => {
                Error::Failure {
                    msg: format!("Error: {:?}", c)
                }
            }
            nom::Err::Failure(c) => {
                Error::Failure {
                    msg: format!("Failure: {:?}", c)
                }
            }
        }
    }
}

impl<I, E> From<nom::Err<I, E>> for Error
    where
        I: std::fmt::Debug,
        E: std::fmt::Debug,
{
    fn from(err: nom::Err<I, E>) -> Error {
        Error::from(&err)
    }
}
