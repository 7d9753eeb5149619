use super::Backend;
use crate::Result;

/// Input buffer owned in memory
#[derive(Debug)]
pub struct Memory {
    data: Vec<u8>,
}

impl Memory {
    /// Create a new memory backend
    ///
    /// ## Arguments
    /// * 'data' - The data buffer to consume
    pub fn new(data: Vec<u8>) -> Memory {
        Memory { data }
    }
}

impl Backend for Memory {
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let Some(offset_end) = offset.checked_add(len) else {
            return Err(bad_image_format!("Range {}+{} overflows", offset, len));
        };

        if offset_end > self.data.len() {
            return Err(bad_image_format!(
                "Range {}..{} exceeds buffer of {} bytes",
                offset,
                offset_end,
                self.data.len()
            ));
        }

        Ok(&self.data[offset..offset_end])
    }

    fn data(&self) -> &[u8] {
        self.data.as_slice()
    }

    fn len(&self) -> usize {
        self.data.len()
    }
}
