//! Length-framed content messages from the supervisor to its worker
//!
//! Wire format: a native-endian `i32` byte count followed by exactly that
//! many payload bytes. No magic, no checksum, no acknowledgement.

use std::fs::File;
use std::io::{self, ErrorKind, Read, Write};
use std::os::fd::{AsFd, AsRawFd, OwnedFd};

use nix::fcntl::{fcntl, FcntlArg, OFlag};
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use thiserror::Error;

use crate::domain::content::ClipboardContent;
use crate::domain::error::ContentError;

const HEADER_LEN: usize = std::mem::size_of::<i32>();

/// How long a reader waits for the rest of a frame whose header arrived
const PAYLOAD_WAIT_MS: u16 = 1000;

/// Framing violations seen by the reading side
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("Truncated frame header ({got} of {HEADER_LEN} bytes)")]
    ShortHeader { got: usize },

    #[error("Negative frame length {0}")]
    NegativeLength(i32),

    #[error("Truncated frame payload ({got} of {expected} bytes)")]
    ShortPayload { expected: usize, got: usize },

    #[error(transparent)]
    Content(#[from] ContentError),

    #[error("Pipe I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// Encode one frame for `content`
pub fn encode_frame(content: &ClipboardContent) -> Vec<u8> {
    let mut frame = Vec::with_capacity(HEADER_LEN + content.len());
    frame.extend_from_slice(&content.wire_len().to_ne_bytes());
    frame.extend_from_slice(content.as_bytes());
    frame
}

/// Put a descriptor into non-blocking mode
pub fn set_nonblocking(fd: &impl AsRawFd) -> nix::Result<()> {
    let raw = fd.as_raw_fd();
    let flags = OFlag::from_bits_truncate(fcntl(raw, FcntlArg::F_GETFL)?);
    fcntl(raw, FcntlArg::F_SETFL(flags | OFlag::O_NONBLOCK))?;
    Ok(())
}

/// Supervisor side of the pipe (blocking writes)
#[derive(Debug)]
pub struct FrameWriter {
    file: File,
}

impl FrameWriter {
    pub fn new(fd: OwnedFd) -> Self {
        Self {
            file: File::from(fd),
        }
    }

    /// Write one whole frame. Fails with `BrokenPipe` once the reader is gone.
    pub fn send(&mut self, content: &ClipboardContent) -> io::Result<()> {
        self.file.write_all(&encode_frame(content))?;
        self.file.flush()
    }
}

/// Worker side of the pipe (non-blocking reads)
#[derive(Debug)]
pub struct FrameReader {
    file: File,
}

impl FrameReader {
    /// Wrap a read end that was already set non-blocking
    pub fn new(fd: OwnedFd) -> Self {
        Self {
            file: File::from(fd),
        }
    }

    /// Take the next frame if one is waiting.
    ///
    /// Returns `Ok(None)` when nothing is pending or the writer has closed.
    pub fn try_recv(&mut self) -> Result<Option<ClipboardContent>, FrameError> {
        let mut header = [0u8; HEADER_LEN];
        let got = match read_some(&mut self.file, &mut header) {
            Ok(0) => return Ok(None),
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let got = got + self.read_remaining(&mut header[got..])?;
        if got < HEADER_LEN {
            return Err(FrameError::ShortHeader { got });
        }

        let length = i32::from_ne_bytes(header);
        if length < 0 {
            return Err(FrameError::NegativeLength(length));
        }

        let expected = length as usize;
        let mut payload = vec![0u8; expected];
        let got = self.read_remaining(&mut payload)?;
        if got < expected {
            return Err(FrameError::ShortPayload { expected, got });
        }

        Ok(Some(ClipboardContent::new(payload)?))
    }

    /// Fill `buf` as far as the writer delivers within the wait window
    fn read_remaining(&mut self, buf: &mut [u8]) -> Result<usize, FrameError> {
        let mut filled = 0;
        while filled < buf.len() {
            match read_some(&mut self.file, &mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    if !self.wait_readable()? {
                        break;
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(filled)
    }

    fn wait_readable(&self) -> Result<bool, FrameError> {
        let mut fds = [PollFd::new(self.file.as_fd(), PollFlags::POLLIN)];
        loop {
            match poll(&mut fds, PollTimeout::from(PAYLOAD_WAIT_MS)) {
                Ok(n) => return Ok(n > 0),
                Err(nix::errno::Errno::EINTR) => continue,
                Err(e) => return Err(FrameError::Io(e.into())),
            }
        }
    }
}

fn read_some(file: &mut File, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match file.read(buf) {
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::unistd::pipe;

    fn channel() -> (FrameWriter, FrameReader, File) {
        let (read_end, write_end) = pipe().unwrap();
        set_nonblocking(&read_end).unwrap();
        let raw_writer = File::from(write_end.try_clone().unwrap());
        (FrameWriter::new(write_end), FrameReader::new(read_end), raw_writer)
    }

    #[test]
    fn frame_layout_is_length_then_payload() {
        let content = ClipboardContent::from_text("This is a test.").unwrap();
        let frame = encode_frame(&content);
        assert_eq!(&frame[..4], &15i32.to_ne_bytes());
        assert_eq!(&frame[4..], b"This is a test.");
    }

    #[test]
    fn empty_pipe_yields_nothing() {
        let (_writer, mut reader, _raw) = channel();
        assert!(reader.try_recv().unwrap().is_none());
    }

    #[test]
    fn frames_arrive_in_send_order() {
        let (mut writer, mut reader, _raw) = channel();
        writer.send(&ClipboardContent::from_text("first").unwrap()).unwrap();
        writer.send(&ClipboardContent::from_text("second").unwrap()).unwrap();

        let first = reader.try_recv().unwrap().unwrap();
        let second = reader.try_recv().unwrap().unwrap();
        assert_eq!(first.as_bytes(), b"first");
        assert_eq!(second.as_bytes(), b"second");
        assert!(reader.try_recv().unwrap().is_none());
    }

    #[test]
    fn empty_content_is_a_zero_length_frame() {
        let (mut writer, mut reader, _raw) = channel();
        writer.send(&ClipboardContent::empty()).unwrap();
        let content = reader.try_recv().unwrap().unwrap();
        assert!(content.is_empty());
    }

    #[test]
    fn closed_writer_reads_as_nothing_pending() {
        let (writer, mut reader, raw) = channel();
        drop(writer);
        drop(raw);
        assert!(reader.try_recv().unwrap().is_none());
    }

    #[test]
    fn negative_length_is_rejected() {
        let (_writer, mut reader, mut raw) = channel();
        raw.write_all(&(-5i32).to_ne_bytes()).unwrap();
        assert!(matches!(
            reader.try_recv(),
            Err(FrameError::NegativeLength(-5))
        ));
    }

    #[test]
    fn truncated_header_is_rejected() {
        let (writer, mut reader, mut raw) = channel();
        raw.write_all(&[1, 0]).unwrap();
        drop(writer);
        drop(raw);
        assert!(matches!(
            reader.try_recv(),
            Err(FrameError::ShortHeader { got: 2 })
        ));
    }

    #[test]
    fn truncated_payload_is_rejected() {
        let (writer, mut reader, mut raw) = channel();
        raw.write_all(&10i32.to_ne_bytes()).unwrap();
        raw.write_all(b"abc").unwrap();
        drop(writer);
        drop(raw);
        assert!(matches!(
            reader.try_recv(),
            Err(FrameError::ShortPayload {
                expected: 10,
                got: 3
            })
        ));
    }

    #[test]
    fn broken_pipe_surfaces_on_send() {
        let (read_end, write_end) = pipe().unwrap();
        drop(read_end);
        let mut writer = FrameWriter::new(write_end);
        // Rust ignores SIGPIPE by default, so the write returns EPIPE
        let err = writer
            .send(&ClipboardContent::from_text("lost").unwrap())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BrokenPipe);
    }
}
