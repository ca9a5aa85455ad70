// C entry points for sentence highlighting. Stateless: nothing here outlives a call.
// In unwinding builds a panic is caught and reported as null. The release
// profile sets `panic = 'abort'`, where a panic aborts the process instead;
// either way nothing unwinds across the FFI boundary.
use crate::core::types::Sentence;
use crate::fuzzy::{highlight_sentence, EnglishStemmer};
use std::ffi::{c_char, CStr, CString};
use std::panic::catch_unwind;
use std::ptr;
use tracing::error;

/// # Safety
/// `ptr` must be null or point to a NUL-terminated string.
unsafe fn read_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok()
}

/// Returns the highlighted sentence as a newly allocated string, or null on
/// invalid input. `phrase` may be null. Free the result with
/// `wordmark_free_string`.
///
/// # Safety
/// Non-null arguments must point to NUL-terminated strings.
#[no_mangle]
pub unsafe extern "C" fn wordmark_highlight_sentence(
    sentence: *const c_char,
    phrase: *const c_char,
    word: *const c_char,
) -> *mut c_char {
    let (Some(sentence), Some(word)) = (read_str(sentence), read_str(word)) else {
        return ptr::null_mut();
    };
    let input = Sentence {
        sentence: sentence.to_string(),
        highlight_phrase: read_str(phrase).map(str::to_string),
    };
    let result = catch_unwind(|| highlight_sentence(&input, word, &EnglishStemmer::new()));
    match result.map(CString::new) {
        Ok(Ok(html)) => html.into_raw(),
        Ok(Err(_)) => ptr::null_mut(),
        Err(_) => {
            error!("panic in wordmark_highlight_sentence");
            ptr::null_mut()
        }
    }
}

/// # Safety
/// `s` must be null or a pointer returned by `wordmark_highlight_sentence`.
#[no_mangle]
pub unsafe extern "C" fn wordmark_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}
