//! Local images: files to program, or flash contents read back.

use crate::error::{Error, Result};
use crate::protocol::PAGE_SIZE;
use log::debug;
use std::fs;
use std::path::Path;

/// Whether an image is zero-padded to whole flash pages when loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Padding {
    /// Pad to a multiple of [`PAGE_SIZE`] (flash modes).
    Page,
    /// Keep the file length as is (FPGA mode).
    None,
}

/// Pad `data` with zero bytes up to the next multiple of [`PAGE_SIZE`].
///
/// Already aligned data is returned unchanged.
pub fn pad_to_page(mut data: Vec<u8>) -> Vec<u8> {
    let len = data.len().next_multiple_of(PAGE_SIZE);
    data.resize(len, 0);
    data
}

/// An in-memory image.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Image {
    data: Vec<u8>,
}

impl Image {
    /// Wrap raw bytes, applying `padding`.
    pub fn from_bytes(data: Vec<u8>, padding: Padding) -> Self {
        let data = match padding {
            Padding::Page => pad_to_page(data),
            Padding::None => data,
        };
        Self { data }
    }

    /// Load a file, applying `padding`.
    pub fn load<P: AsRef<Path>>(path: P, padding: Padding) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read(path)?;
        let raw_len = raw.len();
        let image = Self::from_bytes(raw, padding);
        debug!(
            "Loaded {} ({} bytes, {} after padding)",
            path.display(),
            raw_len,
            image.len()
        );
        Ok(image)
    }

    /// Write the image to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, &self.data)?;
        Ok(())
    }

    /// Image bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consume the image and return its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the image holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether the length is a whole number of flash pages.
    pub fn is_page_aligned(&self) -> bool {
        self.data.len() % PAGE_SIZE == 0
    }

    /// Number of whole flash pages.
    pub fn page_count(&self) -> usize {
        self.data.len() / PAGE_SIZE
    }

    /// Page `index`, i.e. bytes `[256*index, 256*index + 256)`.
    pub fn page(&self, index: usize) -> Option<&[u8]> {
        let start = index.checked_mul(PAGE_SIZE)?;
        self.data.get(start..start.checked_add(PAGE_SIZE)?)
    }

    /// Iterate over whole pages in ascending address order.
    pub fn pages(&self) -> std::slice::ChunksExact<'_, u8> {
        self.data.chunks_exact(PAGE_SIZE)
    }

    /// Page count as sent in the 4-byte write header.
    pub fn page_count_header(&self) -> Result<u32> {
        if !self.is_page_aligned() {
            return Err(Error::Image(format!(
                "length {} is not a multiple of {PAGE_SIZE}",
                self.len()
            )));
        }
        u32::try_from(self.page_count()).map_err(|_| {
            Error::Image(format!(
                "{} pages do not fit the page count header",
                self.page_count()
            ))
        })
    }
}

impl From<Vec<u8>> for Image {
    fn from(data: Vec<u8>) -> Self {
        Self { data }
    }
}

impl AsRef<[u8]> for Image {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}
