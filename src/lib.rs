//! rhythmlib — MusicXML rhythm fragment extraction and remixing library.
//!
//! Loads a reference score (uncompressed `.musicxml`/`.xml` or compressed
//! `.mxl`), splits it into standalone one-beat fragments, recombines randomly
//! sampled fragments into a single N-beat measure, and serializes or engraves
//! the result as SVG.
//!
//! # Example
//! ```no_run
//! use rhythmlib::{compose_from_pool, extract_fragments, parse_file, ComposeOptions};
//!
//! let score = parse_file("path/to/patterns.musicxml").unwrap();
//! let pool = extract_fragments(&score).unwrap();
//! let remix = compose_from_pool(&pool, &ComposeOptions::new(4)).unwrap();
//! println!("{}", rhythmlib::score_to_musicxml(&remix));
//! ```

pub mod composer;
pub mod engraver;
pub mod error;
pub mod fragment;
pub mod model;
pub mod mxl;
pub mod parser;
pub mod writer;

#[cfg(target_os = "android")]
pub mod android;

use std::path::Path;

pub use composer::{
    compose_from_pool, compose_measure, BeatPicker, ComposeOptions, SequencePicker, UniformPicker,
};
pub use engraver::{engrave, Backend, Engraver, EngraverOptions, FingeringPosition};
pub use error::RemixError;
pub use fragment::{extract_fragments, Fragment, FragmentPool};
pub use model::*;
pub use mxl::parse_mxl;
pub use parser::parse_musicxml;
pub use writer::{ensure_declaration, score_to_musicxml, XML_DECLARATION};

/// Parse a MusicXML file from a file path.
/// Automatically detects format based on file extension:
/// - `.musicxml` or `.xml` → uncompressed MusicXML
/// - `.mxl` → compressed MXL (ZIP archive)
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Score, RemixError> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|source| RemixError::Read {
        path: path.display().to_string(),
        source,
    })?;

    parse_bytes(&data, path.extension().and_then(|e| e.to_str()))
}

/// Parse MusicXML from raw bytes with an optional format hint.
/// If `extension` is None, tries to auto-detect the format.
pub fn parse_bytes(data: &[u8], extension: Option<&str>) -> Result<Score, RemixError> {
    match extension {
        Some("mxl") => parse_mxl(data),
        Some("musicxml") | Some("xml") => {
            let xml = std::str::from_utf8(data)
                .map_err(|e| RemixError::Parse(format!("invalid UTF-8 in MusicXML data: {e}")))?;
            parse_musicxml(xml)
        }
        _ => {
            // Auto-detect: try as XML first, then as MXL
            if let Ok(xml) = std::str::from_utf8(data) {
                if xml.trim_start().starts_with("<?xml") || xml.trim_start().starts_with('<') {
                    return parse_musicxml(xml);
                }
            }
            parse_mxl(data)
        }
    }
}

/// Convert a parsed score to a JSON string.
/// Useful for passing data across FFI boundaries.
pub fn score_to_json(score: &Score) -> Result<String, RemixError> {
    serde_json::to_string_pretty(score)
        .map_err(|e| RemixError::Render(format!("JSON serialization error: {e}")))
}

/// Result of a full remix pipeline run: the composed measure in both
/// serialized forms.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RemixOutput {
    /// Serialized MusicXML of the composed measure, declaration included.
    pub musicxml: String,
    /// SVG engraving of the composed measure.
    pub svg: String,
    /// Number of beats the measure holds.
    pub beats: i32,
}

/// Remix an already-parsed score: extract fragments, sample `options.beats`
/// of them with replacement, and compose the single-measure result.
pub fn remix_score(score: &Score, options: &ComposeOptions) -> Result<Score, RemixError> {
    let pool = extract_fragments(score)?;
    compose_from_pool(&pool, options)
}

/// Full pipeline: load a file, remix it into one `beats`-beat measure, and
/// return both the serialized MusicXML and the default SVG engraving.
pub fn remix_file<P: AsRef<Path>>(path: P, beats: i32) -> Result<RemixOutput, RemixError> {
    let source = parse_file(path)?;
    let composed = remix_score(&source, &ComposeOptions::new(beats))?;
    let musicxml = score_to_musicxml(&composed);
    let svg = engrave(&composed, &EngraverOptions::default());
    Ok(RemixOutput {
        musicxml,
        svg,
        beats,
    })
}

/// Parse a MusicXML file and engrave it directly, without remixing.
pub fn render_file<P: AsRef<Path>>(
    path: P,
    options: &EngraverOptions,
) -> Result<String, RemixError> {
    let score = parse_file(path)?;
    Ok(engrave(&score, options))
}

// ═══════════════════════════════════════════════════════════════════════
// C FFI — for iOS (static library) and Android (JNI)
// ═══════════════════════════════════════════════════════════════════════

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

/// Remix a MusicXML file into one `beats`-beat measure and return the
/// serialized MusicXML as a C string.
/// The caller must free the returned string with `rhythmlib_free_string`.
///
/// # Safety
/// `path` must be a valid null-terminated UTF-8 C string.
#[no_mangle]
pub unsafe extern "C" fn rhythmlib_remix_file(path: *const c_char, beats: i32) -> *mut c_char {
    if path.is_null() {
        return std::ptr::null_mut();
    }
    let c_str = unsafe { CStr::from_ptr(path) };
    let path_str = match c_str.to_str() {
        Ok(s) => s,
        Err(_) => return std::ptr::null_mut(),
    };

    match remix_file(path_str, beats) {
        Ok(output) => CString::new(output.musicxml).unwrap_or_default().into_raw(),
        Err(_) => std::ptr::null_mut(),
    }
}

/// Parse a MusicXML file and return its SVG engraving as a C string.
/// The caller must free the returned string with `rhythmlib_free_string`.
///
/// `page_width` sets the target width in user units. Pass 0.0 to use the
/// default zoom instead of fitting a width.
///
/// # Safety
/// `path` must be a valid null-terminated UTF-8 C string.
#[no_mangle]
pub unsafe extern "C" fn rhythmlib_render_file(
    path: *const c_char,
    page_width: f64,
) -> *mut c_char {
    if path.is_null() {
        return std::ptr::null_mut();
    }
    let c_str = unsafe { CStr::from_ptr(path) };
    let path_str = match c_str.to_str() {
        Ok(s) => s,
        Err(_) => return std::ptr::null_mut(),
    };

    let mut options = EngraverOptions::default();
    if page_width > 0.0 {
        options.fit_page_width = Some(page_width);
    }

    match render_file(path_str, &options) {
        Ok(svg) => CString::new(svg).unwrap_or_default().into_raw(),
        Err(_) => std::ptr::null_mut(),
    }
}

/// Free a string previously returned by rhythmlib functions.
///
/// # Safety
/// `ptr` must be a string previously returned by a rhythmlib function, or null.
#[no_mangle]
pub unsafe extern "C" fn rhythmlib_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        unsafe {
            let _ = CString::from_raw(ptr);
        }
    }
}
