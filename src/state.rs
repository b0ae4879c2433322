#[cfg(test)]
mod unit_tests;

use thiserror::Error;

/**
 * Save-state streaming. The same `stream_state` routine is used for both
 * directions so the field order can't drift between save and load.
 */
pub enum StateStream {
    Saving(Vec<u8>),
    Loading { data: Vec<u8>, position: usize },
}

impl StateStream {
    pub fn saver() -> Self {
        StateStream::Saving(Vec::new())
    }

    pub fn loader(data: Vec<u8>) -> Self {
        StateStream::Loading { data, position: 0 }
    }

    pub fn is_saving(&self) -> bool {
        matches!(self, StateStream::Saving(_))
    }

    pub fn stream<T: Streamable>(&mut self, value: &mut T) -> Result<(), StateError> {
        match self {
            StateStream::Saving(out) => {
                value.save(out);
                Ok(())
            }
            StateStream::Loading { data, position } => {
                let remaining = &data[*position..];
                if remaining.len() < T::SIZE {
                    Err(StateError::UnexpectedEnd {
                        needed: T::SIZE,
                        remaining: remaining.len(),
                    })?;
                }
                *value = T::load(&remaining[..T::SIZE]);
                *position += T::SIZE;
                Ok(())
            }
        }
    }

    /// Streams a fixed size block. On load the block must be exactly as long as `buffer`.
    pub fn stream_bytes(&mut self, buffer: &mut [u8]) -> Result<(), StateError> {
        let mut len = buffer.len() as u32;
        self.stream(&mut len)?;
        match self {
            StateStream::Saving(out) => {
                out.extend_from_slice(buffer);
                Ok(())
            }
            StateStream::Loading { data, position } => {
                if len as usize != buffer.len() {
                    Err(StateError::InvalidValue {
                        field: "block length",
                        value: len,
                    })?;
                }
                let remaining = &data[*position..];
                if remaining.len() < buffer.len() {
                    Err(StateError::UnexpectedEnd {
                        needed: buffer.len(),
                        remaining: remaining.len(),
                    })?;
                }
                buffer.copy_from_slice(&remaining[..buffer.len()]);
                *position += buffer.len();
                Ok(())
            }
        }
    }

    /// Saved bytes, or an error if a load didn't consume the whole stream.
    pub fn finish(self) -> Result<Vec<u8>, StateError> {
        match self {
            StateStream::Saving(out) => Ok(out),
            StateStream::Loading { data, position } => {
                if position != data.len() {
                    Err(StateError::TrailingBytes(data.len() - position))?;
                }
                Ok(Vec::new())
            }
        }
    }
}

pub trait Streamable: Sized {
    const SIZE: usize;
    fn save(&self, out: &mut Vec<u8>);
    fn load(bytes: &[u8]) -> Self;
}

macro_rules! streamable_int {
    ($($t:ty),*) => {
        $(
            impl Streamable for $t {
                const SIZE: usize = std::mem::size_of::<$t>();

                fn save(&self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }

                fn load(bytes: &[u8]) -> Self {
                    let mut raw = [0; std::mem::size_of::<$t>()];
                    raw.copy_from_slice(bytes);
                    <$t>::from_le_bytes(raw)
                }
            }
        )*
    };
}

streamable_int!(u8, u16, u32, i16);

impl Streamable for bool {
    const SIZE: usize = 1;

    fn save(&self, out: &mut Vec<u8>) {
        out.push(*self as u8);
    }

    fn load(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum StateError {
    #[error("Save state ended early: needed {needed} bytes but only {remaining} remain")]
    UnexpectedEnd { needed: usize, remaining: usize },
    #[error("Save state has invalid {field} {value}")]
    InvalidValue { field: &'static str, value: u32 },
    #[error("Save state has {0} unread bytes")]
    TrailingBytes(usize),
}
