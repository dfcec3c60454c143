//! UTF-8 to locale charset conversion for the legacy STRING target

use std::env;
use std::ffi::{c_char, CStr, CString};

use nix::errno::Errno;
use thiserror::Error;

/// Codeset glibc reports for the "C" and "POSIX" locales
const C_LOCALE_CODESET: &str = "ANSI_X3.4-1968";

/// Charset conversion errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("No converter from UTF-8 to {codeset}: {errno}")]
    Unsupported { codeset: String, errno: Errno },

    #[error("Text cannot be represented in {codeset}: {errno}")]
    Unconvertible { codeset: String, errno: Errno },
}

/// Converts UTF-8 text into the locale's charset with a growable buffer.
#[derive(Debug, Clone)]
pub struct LocaleConverter {
    codeset: String,
    chunk: usize,
}

impl LocaleConverter {
    /// Converter targeting the codeset of the current locale environment
    pub fn from_environment(chunk: usize) -> Self {
        Self::new(locale_codeset(), chunk)
    }

    pub fn new(codeset: impl Into<String>, chunk: usize) -> Self {
        Self {
            codeset: codeset.into(),
            chunk: chunk.max(1),
        }
    }

    pub fn codeset(&self) -> &str {
        &self.codeset
    }

    /// Convert `input` (UTF-8) into the target codeset.
    ///
    /// The output buffer starts at one chunk and grows by one chunk each time
    /// the converter runs out of room, resuming where it stopped.
    pub fn convert(&self, input: &[u8]) -> Result<Vec<u8>, ConversionError> {
        let converter = Iconv::open(&self.codeset, "UTF-8")?;

        let mut output = vec![0u8; self.chunk];
        let mut written = 0usize;
        let mut in_ptr = input.as_ptr() as *mut c_char;
        let mut in_left = input.len();

        loop {
            // SAFETY: `written <= output.len()` is kept by the loop below
            let mut out_ptr = unsafe { output.as_mut_ptr().add(written) } as *mut c_char;
            let mut out_left = output.len() - written;

            // Once the input is used up, stateful codesets still owe a reset sequence
            let flushing = in_left == 0;
            let result = if flushing {
                converter.finish(&mut out_ptr, &mut out_left)
            } else {
                converter.convert(&mut in_ptr, &mut in_left, &mut out_ptr, &mut out_left)
            };
            written = output.len() - out_left;

            match result {
                Ok(()) if flushing => break,
                Ok(()) => {}
                Err(Errno::E2BIG) => output.resize(output.len() + self.chunk, 0),
                Err(errno) => {
                    return Err(ConversionError::Unconvertible {
                        codeset: self.codeset.clone(),
                        errno,
                    })
                }
            }
        }

        output.truncate(written);
        Ok(output)
    }
}

/// Owned iconv conversion descriptor
struct Iconv {
    descriptor: ffi::IconvT,
}

impl Iconv {
    fn open(to: &str, from: &str) -> Result<Self, ConversionError> {
        let unsupported = |errno| ConversionError::Unsupported {
            codeset: to.to_string(),
            errno,
        };
        let to_c = CString::new(to).map_err(|_| unsupported(Errno::EINVAL))?;
        let from_c = CString::new(from).map_err(|_| unsupported(Errno::EINVAL))?;

        // SAFETY: both arguments are valid NUL-terminated strings
        let descriptor = unsafe { ffi::iconv_open(to_c.as_ptr(), from_c.as_ptr()) };
        if descriptor as isize == -1 {
            return Err(unsupported(Errno::last()));
        }
        Ok(Self { descriptor })
    }

    fn convert(
        &self,
        in_ptr: &mut *mut c_char,
        in_left: &mut usize,
        out_ptr: &mut *mut c_char,
        out_left: &mut usize,
    ) -> Result<(), Errno> {
        // SAFETY: the pointers and counts describe live buffers owned by the caller
        let result = unsafe { ffi::iconv(self.descriptor, in_ptr, in_left, out_ptr, out_left) };
        if result == usize::MAX {
            return Err(Errno::last());
        }
        Ok(())
    }

    /// Emit the sequence returning the output to its initial shift state
    fn finish(&self, out_ptr: &mut *mut c_char, out_left: &mut usize) -> Result<(), Errno> {
        // SAFETY: a null input buffer asks iconv for the reset sequence only
        let result = unsafe {
            ffi::iconv(
                self.descriptor,
                std::ptr::null_mut(),
                std::ptr::null_mut(),
                out_ptr,
                out_left,
            )
        };
        if result == usize::MAX {
            return Err(Errno::last());
        }
        Ok(())
    }
}

impl Drop for Iconv {
    fn drop(&mut self) {
        // SAFETY: descriptor came from a successful iconv_open
        unsafe {
            ffi::iconv_close(self.descriptor);
        }
    }
}

mod ffi {
    use std::ffi::{c_char, c_int, c_void};

    pub type IconvT = *mut c_void;

    #[cfg_attr(
        any(target_os = "macos", target_os = "freebsd", target_os = "openbsd"),
        link(name = "iconv")
    )]
    extern "C" {
        pub fn iconv_open(tocode: *const c_char, fromcode: *const c_char) -> IconvT;
        pub fn iconv(
            cd: IconvT,
            inbuf: *mut *mut c_char,
            inbytesleft: *mut usize,
            outbuf: *mut *mut c_char,
            outbytesleft: *mut usize,
        ) -> usize;
        pub fn iconv_close(cd: IconvT) -> c_int;
    }
}

/// Charset of the locale the environment selects for LC_CTYPE.
///
/// Follows the `LC_ALL` > `LC_CTYPE` > `LANG` precedence. A locale name
/// without an explicit codeset falls back to what the C library reports.
pub fn locale_codeset() -> String {
    let name = ["LC_ALL", "LC_CTYPE", "LANG"]
        .iter()
        .filter_map(|key| env::var(key).ok())
        .find(|value| !value.is_empty());

    match name {
        None => C_LOCALE_CODESET.to_string(),
        Some(name) => codeset_from_locale_name(&name).unwrap_or_else(process_codeset),
    }
}

/// Extract the codeset from a locale name such as `de_DE.ISO-8859-1@euro`
pub fn codeset_from_locale_name(name: &str) -> Option<String> {
    let name = name.split('@').next().unwrap_or(name);
    if name == "C" || name == "POSIX" {
        return Some(C_LOCALE_CODESET.to_string());
    }
    name.split_once('.')
        .map(|(_, codeset)| codeset)
        .filter(|codeset| !codeset.is_empty())
        .map(str::to_string)
}

fn process_codeset() -> String {
    // SAFETY: nl_langinfo returns a pointer to a static NUL-terminated string
    let raw = unsafe { nix::libc::nl_langinfo(nix::libc::CODESET) };
    if raw.is_null() {
        return C_LOCALE_CODESET.to_string();
    }
    unsafe { CStr::from_ptr(raw) }.to_string_lossy().into_owned()
}
