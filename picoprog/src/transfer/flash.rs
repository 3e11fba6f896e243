//! Flash sub-protocols: write with read-back verification, and full read.
//!
//! ## Write
//!
//! ```text
//! programmer: "<prompt>\n"
//! host:       page_count (u32, little-endian)
//! repeat page_count times:
//!     host:       256 bytes
//!     programmer: '#'  | <code> "<message>\n"
//! repeat page_count times:
//!     programmer: 256 bytes (read-back)
//! ```
//!
//! The programmer starts the read-back on its own after acknowledging the
//! last page; no command byte separates the two phases.

use crate::error::{Error, Result};
use crate::image::Image;
use crate::port::Port;
use crate::protocol::PAGE_SIZE;
use crate::protocol::ack::expect_ack;
use crate::protocol::line::{read_exact_into, read_line};
use crate::transfer::{Phase, Progress, TransferResult, Verifier, WriteOptions};
use byteorder::{LittleEndian, WriteBytesExt};
use log::{debug, info, trace};

/// Run the flash-write sub-protocol for a page-aligned image.
///
/// Validation failures do not stop the transfer; they are returned in the
/// [`TransferResult`]. Use [`TransferResult::into_result`] to treat them as
/// an error.
pub fn write_flash<P: Port + ?Sized>(
    port: &mut P,
    image: &Image,
    options: WriteOptions,
    progress: Progress<'_>,
) -> Result<TransferResult> {
    // Checked before anything goes on the wire
    check_image(image)?;

    let prompt = read_line(port)?;
    debug!("Write prompt: {:?}", prompt.text);

    let pages_sent = write_pages(port, image, &mut *progress)?;

    if !options.verify {
        drain_readback(port, image, progress)?;
        return Ok(TransferResult {
            pages_sent,
            ..Default::default()
        });
    }

    let verifier = verify_readback(port, image, progress)?;
    Ok(TransferResult {
        pages_sent,
        validation_failures: verifier.failures(),
        failed_pages: verifier.into_failed_pages(),
        verified: true,
    })
}

/// Reject images that cannot be written: empty, unaligned, or with more
/// pages than the header can count. Returns the header value.
pub fn check_image(image: &Image) -> Result<u32> {
    if image.is_empty() {
        return Err(Error::Image("nothing to write".to_string()));
    }
    image.page_count_header()
}

/// Send the page count header and every page, waiting for each acknowledgement.
///
/// Returns the number of pages sent. An in-band error report aborts the
/// transfer; the remaining pages are never sent.
pub fn write_pages<P: Port + ?Sized>(
    port: &mut P,
    image: &Image,
    progress: Progress<'_>,
) -> Result<usize> {
    let count = image.page_count_header()?;
    let total = image.page_count();
    info!("Writing {total} pages");

    port.write_u32::<LittleEndian>(count)?;
    port.flush()?;

    for (index, page) in image.pages().enumerate() {
        trace!("Page {index}: sending {} bytes", page.len());
        port.write_all_bytes(page)?;
        if let Err(e) = expect_ack(port) {
            debug!("Page {index} of {total} not acknowledged");
            return Err(e);
        }
        progress(Phase::Write, index + 1, total);
    }

    Ok(total)
}

/// Read every page of `image` back from the programmer and compare it.
///
/// Mismatches are recorded in the returned [`Verifier`] and never stop the
/// loop; transport errors do.
pub fn verify_readback<P: Port + ?Sized>(
    port: &mut P,
    image: &Image,
    progress: Progress<'_>,
) -> Result<Verifier> {
    let total = image.page_count();
    info!("Verifying {total} pages");

    let mut verifier = Verifier::new();
    let mut readback = [0u8; PAGE_SIZE];
    for (index, expected) in image.pages().enumerate() {
        read_exact_into(port, &mut readback)?;
        verifier.check(index, expected, &readback);
        progress(Phase::Verify, index + 1, total);
    }

    if verifier.failures() > 0 {
        info!(
            "Verification finished with {} bad pages",
            verifier.failures()
        );
    }
    Ok(verifier)
}

/// Consume the read-back stream without comparing it.
///
/// The programmer sends every page back regardless; leaving them unread
/// would feed stale flash contents to the next session's banner read.
pub fn drain_readback<P: Port + ?Sized>(
    port: &mut P,
    image: &Image,
    progress: Progress<'_>,
) -> Result<()> {
    let total = image.page_count();
    info!("Skipping verification, discarding {total} read-back pages");

    let mut scratch = [0u8; PAGE_SIZE];
    for index in 0..total {
        read_exact_into(port, &mut scratch)?;
        progress(Phase::Verify, index + 1, total);
    }
    Ok(())
}

/// Read `capacity_bytes` of flash streamed by the programmer.
///
/// No acknowledgement is exchanged. Any transport error discards everything
/// read so far.
pub fn read_flash<P: Port + ?Sized>(
    port: &mut P,
    capacity_bytes: usize,
    progress: Progress<'_>,
) -> Result<Image> {
    if capacity_bytes % PAGE_SIZE != 0 {
        return Err(Error::Image(format!(
            "capacity {capacity_bytes} is not a multiple of {PAGE_SIZE}"
        )));
    }

    let total = capacity_bytes / PAGE_SIZE;
    info!("Reading {capacity_bytes} bytes ({total} pages)");

    let mut data = vec![0u8; capacity_bytes];
    for (index, page) in data.chunks_exact_mut(PAGE_SIZE).enumerate() {
        read_exact_into(port, page)?;
        progress(Phase::Read, index + 1, total);
    }

    Ok(Image::from(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::Padding;
    use crate::testing::{MockPort, Op};

    fn pattern(pages: usize) -> Image {
        let data = (0..pages * PAGE_SIZE)
            .map(|i| (i % 251) as u8)
            .collect::<Vec<_>>();
        Image::from_bytes(data, Padding::Page)
    }

    fn no_progress() -> impl FnMut(Phase, usize, usize) {
        |_, _, _| {}
    }

    #[test]
    fn test_write_pages_sends_header_then_pages() {
        let image = pattern(3);
        let mut port = MockPort::new(b"###");
        let sent = write_pages(&mut port, &image, &mut no_progress()).unwrap();

        assert_eq!(sent, 3);
        assert_eq!(&port.written[..4], &[3, 0, 0, 0]);
        assert_eq!(&port.written[4..], image.as_bytes());
    }

    #[test]
    fn test_write_pages_waits_for_each_ack() {
        let image = pattern(2);
        let mut port = MockPort::new(b"##");
        write_pages(&mut port, &image, &mut no_progress()).unwrap();

        let expected = vec![
            Op::Write(vec![2, 0, 0, 0]),
            Op::Write(image.page(0).unwrap().to_vec()),
            Op::Read(1),
            Op::Write(image.page(1).unwrap().to_vec()),
            Op::Read(1),
        ];
        assert_eq!(port.ops, expected);
    }

    #[test]
    fn test_write_pages_stops_on_error_report() {
        let image = pattern(4);
        let mut port = MockPort::new(b"#?flash busy\n");
        let err = write_pages(&mut port, &image, &mut no_progress()).unwrap_err();

        assert!(matches!(
            err,
            Error::Device { code: b'?', ref message } if message == "flash busy"
        ));
        // Header plus the first two pages only
        assert_eq!(port.written.len(), 4 + 2 * PAGE_SIZE);
    }

    #[test]
    fn test_write_flash_verifies_readback() {
        let image = pattern(2);
        let mut script = b"+++\n##".to_vec();
        script.extend_from_slice(image.as_bytes());
        let mut port = MockPort::new(&script).with_chunk(100);

        let mut events = Vec::new();
        let result = write_flash(&mut port, &image, WriteOptions::default(), &mut |p, d, t| {
            events.push((p, d, t));
        })
        .unwrap();

        assert_eq!(result.pages_sent, 2);
        assert_eq!(result.validation_failures, 0);
        assert!(result.verified);
        assert!(result.is_success());
        assert_eq!(
            events,
            vec![
                (Phase::Write, 1, 2),
                (Phase::Write, 2, 2),
                (Phase::Verify, 1, 2),
                (Phase::Verify, 2, 2),
            ]
        );
        assert_eq!(port.remaining(), 0);
    }

    #[test]
    fn test_write_flash_counts_mismatches() {
        let image = pattern(3);
        let mut readback = image.as_bytes().to_vec();
        readback[PAGE_SIZE + 10] ^= 0xFF;
        readback[2 * PAGE_SIZE] ^= 0x01;
        let mut script = b"+++\n###".to_vec();
        script.extend_from_slice(&readback);
        let mut port = MockPort::new(&script);

        let result =
            write_flash(&mut port, &image, WriteOptions::default(), &mut no_progress()).unwrap();
        assert_eq!(result.validation_failures, 2);
        assert_eq!(result.failed_pages, vec![1, 2]);
        assert!(matches!(
            result.into_result(),
            Err(Error::ValidationFailed { failures: 2 })
        ));
    }

    #[test]
    fn test_write_flash_without_verify_consumes_readback() {
        let image = pattern(2);
        let mut readback = image.as_bytes().to_vec();
        readback[3] ^= 0xFF;
        let mut script = b"+++\n##".to_vec();
        script.extend_from_slice(&readback);
        let mut port = MockPort::new(&script).with_chunk(100);

        let options = WriteOptions { verify: false };
        let result = write_flash(&mut port, &image, options, &mut no_progress()).unwrap();
        assert!(!result.verified);
        assert!(result.is_success());
        assert_eq!(result.validation_failures, 0);
        assert_eq!(port.remaining(), 0);
        assert!(!port.cleared);
    }

    #[test]
    fn test_write_flash_without_verify_fails_on_short_readback() {
        let image = pattern(2);
        let mut script = b"+++\n##".to_vec();
        script.extend_from_slice(&image.as_bytes()[..PAGE_SIZE + 20]);
        let mut port = MockPort::new(&script).timeout_when_empty();

        let options = WriteOptions { verify: false };
        let err = write_flash(&mut port, &image, options, &mut no_progress()).unwrap_err();
        assert!(err.is_transport());
    }

    #[test]
    fn test_write_flash_rejects_unaligned_image_before_io() {
        let image = Image::from_bytes(vec![1; 100], Padding::None);
        let mut port = MockPort::new(b"+++\n");
        let err =
            write_flash(&mut port, &image, WriteOptions::default(), &mut no_progress()).unwrap_err();
        assert!(matches!(err, Error::Image(_)));
        assert!(port.ops.is_empty());
    }

    #[test]
    fn test_write_flash_rejects_empty_image() {
        let mut port = MockPort::new(b"+++\n");
        let err = write_flash(&mut port, &Image::default(), WriteOptions::default(), &mut no_progress())
            .unwrap_err();
        assert!(matches!(err, Error::Image(_)));
        assert!(port.ops.is_empty());
    }

    #[test]
    fn test_readback_short_stream_is_fatal() {
        let image = pattern(2);
        let mut script = b"+++\n##".to_vec();
        script.extend_from_slice(&image.as_bytes()[..PAGE_SIZE + 5]);
        let mut port = MockPort::new(&script);

        let err =
            write_flash(&mut port, &image, WriteOptions::default(), &mut no_progress()).unwrap_err();
        assert!(matches!(
            err,
            Error::UnexpectedEof {
                expected: PAGE_SIZE,
                received: 5
            }
        ));
    }

    #[test]
    fn test_read_flash_two_pages() {
        let data: Vec<u8> = (0..512).map(|i| (i * 7 % 256) as u8).collect();
        let mut port = MockPort::new(&data).with_chunk(64);
        let mut pages = 0;
        let image = read_flash(&mut port, 512, &mut |phase, done, total| {
            assert_eq!(phase, Phase::Read);
            assert_eq!(total, 2);
            pages = done;
        })
        .unwrap();

        assert_eq!(pages, 2);
        assert_eq!(image.as_bytes(), &data[..]);
        assert!(port.written.is_empty());
    }

    #[test]
    fn test_read_flash_error_discards_data() {
        let mut port = MockPort::new(&[0u8; 300]).timeout_when_empty();
        let err = read_flash(&mut port, 512, &mut no_progress()).unwrap_err();
        assert!(err.is_transport());
    }

    #[test]
    fn test_read_flash_rejects_unaligned_capacity() {
        let mut port = MockPort::new(&[]);
        assert!(matches!(
            read_flash(&mut port, 300, &mut no_progress()),
            Err(Error::Image(_))
        ));
    }
}
