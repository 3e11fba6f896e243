//! FPGA configuration streaming.
//!
//! ```text
//! programmer: "<prompt>\n"
//! repeat while bytes remain:
//!     host:       len (1..=255), len bytes
//!     programmer: '#'  | <code> "<message>\n"
//! host:       0x00
//! programmer: 'H' (CDONE high) | anything else (CDONE low)
//! ```

use crate::error::Result;
use crate::port::Port;
use crate::protocol::ack::expect_ack;
use crate::protocol::line::{read_byte, read_line};
use crate::protocol::{END_OF_BLOCKS, MAX_BLOCK_SIZE};
use crate::transfer::{CdoneState, FpgaResult, Phase, Progress};
use log::{debug, info, trace};

/// Stream `bitstream` into the FPGA configuration port.
///
/// The bitstream is sent unpadded; the last block may be short. The CDONE
/// level is a status, not an error.
pub fn write_fpga<P: Port + ?Sized>(
    port: &mut P,
    bitstream: &[u8],
    progress: Progress<'_>,
) -> Result<FpgaResult> {
    let prompt = read_line(port)?;
    debug!("Configure prompt: {:?}", prompt.text);

    let total = bitstream.len().div_ceil(MAX_BLOCK_SIZE);
    info!("Sending {} bytes in {total} blocks", bitstream.len());

    let mut blocks_sent = 0;
    for block in bitstream.chunks(MAX_BLOCK_SIZE) {
        // chunks() never yields more than MAX_BLOCK_SIZE (255) bytes
        #[allow(clippy::cast_possible_truncation)]
        let len = block.len() as u8;
        trace!("Block {blocks_sent}: {len} bytes");

        port.write_all_bytes(&[len])?;
        port.write_all_bytes(block)?;
        if let Err(e) = expect_ack(port) {
            debug!("Block {blocks_sent} of {total} not acknowledged");
            return Err(e);
        }

        blocks_sent += 1;
        progress(Phase::Configure, blocks_sent, total);
    }

    port.write_all_bytes(&[END_OF_BLOCKS])?;

    let status = read_byte(port)?;
    let cdone = CdoneState::from_status(status);
    info!("Got a {cdone} on CDONE");

    Ok(FpgaResult {
        blocks_sent,
        bytes_sent: bitstream.len(),
        cdone,
    })
}
