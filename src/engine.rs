/// Engine is the streaming contract shared by every hasher in this crate.
///
/// An engine accumulates input with [`Engine::ingest`], is sealed exactly once with
/// [`Engine::start_digesting`] and then produces an output stream of any length with
/// [`Engine::continue_digesting`]. Misusing the protocol (ingesting after sealing,
/// sealing twice, reading before sealing) panics rather than yielding a wrong digest.
///
/// Engines own all of their state and perform no internal synchronization: an
/// instance may be moved to another thread, but concurrent use from several threads
/// requires an external lock.
pub trait Engine {
    /// ingest absorbs more input. It may be called any number of times with any sizes.
    fn ingest(&mut self, bytes: &[u8]);

    /// start_digesting seals the input and prepares the output stream.
    fn start_digesting(&mut self);

    /// continue_digesting writes the next `length` output bytes into
    /// `dest[offset..offset + length]`.
    fn continue_digesting(&mut self, dest: &mut [u8], offset: usize, length: usize);

    /// squeeze fills `out` with the next output bytes.
    fn squeeze(&mut self, out: &mut [u8]) {
        let length = out.len();
        self.continue_digesting(out, 0, length);
    }

    /// finalize_and_squeeze seals the engine and fills `out` with the start of the
    /// output stream.
    fn finalize_and_squeeze(mut self, out: &mut [u8])
    where
        Self: Sized,
    {
        self.start_digesting();
        self.squeeze(out);
    }
}

/// output_window checks the bounds of a `continue_digesting` request and returns the
/// destination window.
pub(crate) fn output_window(dest: &mut [u8], offset: usize, length: usize) -> &mut [u8] {
    match offset.checked_add(length) {
        Some(end) if end <= dest.len() => &mut dest[offset..end],
        _ => panic!(
            "output window {}+{} exceeds destination of {} bytes",
            offset,
            length,
            dest.len()
        ),
    }
}
