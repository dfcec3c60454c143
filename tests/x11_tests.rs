//! Round trips against a live X server
//!
//! Run with `cargo test -- --ignored` inside an X session (or under Xvfb).

#![cfg(unix)]

use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use clipkeep::{read_clipboard, write_clipboard_text, ClipboardError, ClipboardSettings, Delivery};
use clipkeep::infrastructure::clipboard::x11::{read_selection, X11Clipboard};
use clipkeep::{Clipboard, ClipboardContent};

/// A fresh worker needs a moment before it owns CLIPBOARD
fn read_expecting(expected: &[u8]) -> ClipboardContent {
    let mut last = None;
    for _ in 0..50 {
        match read_clipboard() {
            Ok(content) if content.as_bytes() == expected => return content,
            other => last = Some(other),
        }
        thread::sleep(Duration::from_millis(40));
    }
    panic!("clipboard never held {:?}, last read: {:?}", expected, last);
}

#[test]
#[ignore = "needs a running X server"]
fn written_text_reads_back_with_exact_length() {
    let delivery = write_clipboard_text("This is a test.").unwrap();
    assert!(matches!(
        delivery,
        Delivery::BackgroundWorker | Delivery::ClipboardManager
    ));

    let content = read_expecting(b"This is a test.");
    assert_eq!(content.len(), 15);
    assert_eq!(content.as_bytes(), b"This is a test.");
}

#[test]
#[ignore = "needs a running X server"]
fn writing_same_text_twice_keeps_it() {
    write_clipboard_text("twice").unwrap();
    read_expecting(b"twice");

    write_clipboard_text("twice").unwrap();
    assert_eq!(read_clipboard().unwrap().as_bytes(), b"twice");
}

#[test]
#[ignore = "needs a running X server"]
fn multibyte_text_survives_round_trip() {
    let text = "Umlaut ü, Buckel-ß, greek β";
    write_clipboard_text(text).unwrap();
    assert_eq!(read_expecting(text.as_bytes()).into_text().unwrap(), text);
}

#[test]
#[ignore = "needs a running X server"]
fn cli_write_detached_then_read() {
    // The detached worker keeps stderr open, so do not capture it
    let write = Command::new(env!("CARGO_BIN_EXE_clipkeep"))
        .args(["write", "--detach", "from the cli"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .expect("Failed to execute command");
    assert!(write.success());

    assert_eq!(read_expecting(b"from the cli").len(), 12);
}

#[test]
#[ignore = "needs a running X server without a clipboard owner"]
fn read_without_owner_fails_immediately() {
    let err = read_selection(&ClipboardSettings::default()).unwrap_err();
    assert_eq!(err, ClipboardError::NoOwner);
}

#[test]
fn unreachable_display_is_a_connection_failure() {
    let clipboard = X11Clipboard::new(ClipboardSettings::with_display(":4243"));
    assert!(matches!(
        clipboard.read(),
        Err(ClipboardError::ConnectionFailed(_))
    ));
    assert!(matches!(
        clipboard.write(&ClipboardContent::from_text("x").unwrap()),
        Err(ClipboardError::ConnectionFailed(_))
    ));
}
