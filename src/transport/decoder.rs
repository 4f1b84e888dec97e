use crate::prelude::*;

use bytes::BytesMut;
use tokio_util::codec::Decoder;

const MAX_BUFFER_SIZE: usize = 65536;

/// Splits the device byte stream into replies, one per prompt.
pub struct PromptDecoder {
    prompt: Vec<u8>,
}

impl PromptDecoder {
    pub fn new(prompt: &str) -> Self {
        Self {
            prompt: prompt.as_bytes().to_vec(),
        }
    }

    fn find_prompt(&self, src: &[u8]) -> Option<usize> {
        if self.prompt.is_empty() || src.len() < self.prompt.len() {
            return None;
        }
        src.windows(self.prompt.len())
            .position(|w| w == self.prompt.as_slice())
    }
}

impl Decoder for PromptDecoder {
    type Item = String;
    type Error = TransportError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.find_prompt(src) {
            Some(pos) => {
                let frame = src.split_to(pos + self.prompt.len());
                let text = String::from_utf8_lossy(&frame[..pos]).into_owned();
                Ok(Some(text))
            }
            None if src.len() >= MAX_BUFFER_SIZE => Err(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("no prompt within {} bytes", MAX_BUFFER_SIZE),
            ))),
            None => Ok(None),
        }
    }
}
