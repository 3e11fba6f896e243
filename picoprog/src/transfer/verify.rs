//! Read-back verification.

use log::warn;

/// Byte-for-byte comparison of one page.
pub fn verify_page(expected: &[u8], actual: &[u8]) -> bool {
    expected == actual
}

/// Accumulates verification failures without ever stopping the caller.
#[derive(Debug, Default)]
pub struct Verifier {
    failed_pages: Vec<usize>,
}

impl Verifier {
    /// Create an empty verifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare page `index`; on mismatch log both contents and count it.
    pub fn check(&mut self, index: usize, expected: &[u8], actual: &[u8]) -> bool {
        if verify_page(expected, actual) {
            return true;
        }

        for line in mismatch_report(index, expected, actual) {
            warn!("{line}");
        }

        self.failed_pages.push(index);
        false
    }

    /// Number of failed pages so far.
    pub fn failures(&self) -> usize {
        self.failed_pages.len()
    }

    /// Indices of the failed pages, in the order they were checked.
    pub fn failed_pages(&self) -> &[usize] {
        &self.failed_pages
    }

    /// Consume the verifier and return the failed page indices.
    pub fn into_failed_pages(self) -> Vec<usize> {
        self.failed_pages
    }
}

/// Lines describing a bad page: first differing offset, then both contents.
fn mismatch_report(index: usize, expected: &[u8], actual: &[u8]) -> [String; 3] {
    let first = expected
        .iter()
        .zip(actual)
        .position(|(e, a)| e != a)
        .unwrap_or(expected.len().min(actual.len()));
    [
        format!("Bad data in page {index} (first difference at offset {first})"),
        format!("Expected: {}", hex(expected)),
        format!("Got:      {}", hex(actual)),
    ]
}

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}
