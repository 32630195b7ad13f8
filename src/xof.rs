//! RustCrypto `digest` trait implementations, so the hashers plug into code written
//! against [`digest::ExtendableOutput`] and friends.

use std::io;

use digest::{ExtendableOutput, ExtendableOutputReset, HashMarker, Reset, Update, XofReader};

use crate::blake3::{Blake3Hasher, Blake3Reader};
use crate::engine::Engine;
use crate::squeeze::SqueezeContext;
use crate::tree::TreeHasher;

/// TreeReader streams the output of a finalized [`TreeHasher`].
#[derive(Clone, Debug)]
pub struct TreeReader {
    squeeze: SqueezeContext,
}

impl XofReader for TreeReader {
    fn read(&mut self, buffer: &mut [u8]) {
        self.squeeze.read(buffer);
    }
}

impl HashMarker for TreeHasher {}

impl Update for TreeHasher {
    fn update(&mut self, data: &[u8]) {
        self.ingest(data);
    }
}

impl ExtendableOutput for TreeHasher {
    type Reader = TreeReader;

    fn finalize_xof(self) -> Self::Reader {
        TreeReader {
            squeeze: self.into_squeeze(),
        }
    }
}

impl Reset for TreeHasher {
    fn reset(&mut self) {
        TreeHasher::reset(self);
    }
}

impl ExtendableOutputReset for TreeHasher {
    fn finalize_xof_reset(&mut self) -> Self::Reader {
        let reader = self.clone().finalize_xof();
        TreeHasher::reset(self);
        reader
    }
}

impl io::Write for TreeHasher {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.ingest(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl XofReader for Blake3Reader {
    fn read(&mut self, buffer: &mut [u8]) {
        Blake3Reader::read(self, buffer);
    }
}

impl HashMarker for Blake3Hasher {}

impl Update for Blake3Hasher {
    fn update(&mut self, data: &[u8]) {
        self.ingest(data);
    }
}

impl ExtendableOutput for Blake3Hasher {
    type Reader = Blake3Reader;

    fn finalize_xof(self) -> Self::Reader {
        self.into_reader()
    }
}

impl Reset for Blake3Hasher {
    fn reset(&mut self) {
        Blake3Hasher::reset(self);
    }
}

impl ExtendableOutputReset for Blake3Hasher {
    fn finalize_xof_reset(&mut self) -> Self::Reader {
        let reader = self.clone().finalize_xof();
        Blake3Hasher::reset(self);
        reader
    }
}

impl io::Write for Blake3Hasher {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.ingest(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
