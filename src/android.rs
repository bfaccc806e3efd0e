//! JNI bindings for Android.
//!
//! These functions are called from Kotlin via the JNI bridge.

use jni::objects::{JClass, JString};
use jni::sys::{jfloat, jint, jstring};
use jni::JNIEnv;

use crate::{remix_file, render_file, EngraverOptions};

/// Remix a MusicXML file into a single randomized measure and return the
/// serialized MusicXML.
///
/// Called from Kotlin as:
///   external fun remixFile(path: String, beats: Int): String?
#[no_mangle]
pub extern "system" fn Java_com_rhythmlab_app_RhythmLib_remixFile(
    mut env: JNIEnv,
    _class: JClass,
    path: JString,
    beats: jint,
) -> jstring {
    let path_str: String = match env.get_string(&path) {
        Ok(s) => s.into(),
        Err(_) => return std::ptr::null_mut(),
    };

    match remix_file(&path_str, beats) {
        Ok(output) => match env.new_string(&output.musicxml) {
            Ok(js) => js.into_raw(),
            Err(_) => std::ptr::null_mut(),
        },
        Err(_) => std::ptr::null_mut(),
    }
}

/// Render a MusicXML file at the given path to SVG.
///
/// Called from Kotlin as:
///   external fun renderFile(path: String, pageWidth: Float): String?
#[no_mangle]
pub extern "system" fn Java_com_rhythmlab_app_RhythmLib_renderFile(
    mut env: JNIEnv,
    _class: JClass,
    path: JString,
    page_width: jfloat,
) -> jstring {
    let path_str: String = match env.get_string(&path) {
        Ok(s) => s.into(),
        Err(_) => return std::ptr::null_mut(),
    };

    let mut options = EngraverOptions::default();
    if page_width > 0.0 {
        options.fit_page_width = Some(page_width as f64);
    }

    match render_file(&path_str, &options) {
        Ok(svg) => match env.new_string(&svg) {
            Ok(js) => js.into_raw(),
            Err(_) => std::ptr::null_mut(),
        },
        Err(_) => std::ptr::null_mut(),
    }
}
