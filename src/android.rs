//! JNI entry points for `com.scorelayout.ScoreLayout`.
//!
//! Kotlin side:
//! ```kotlin
//! external fun renderFile(path: String, pageWidth: Float): String?
//! external fun renderBytes(data: ByteArray, extension: String?, pageWidth: Float): String?
//! ```
//! Any failure surfaces in Kotlin as `null`.

use jni::objects::{JByteArray, JClass, JString};
use jni::sys::{jfloat, jstring};
use jni::JNIEnv;

use crate::{render_bytes_to_svg, render_file_to_svg, Error, LayoutOptions, Result};

fn layout_options(page_width: jfloat) -> LayoutOptions {
    LayoutOptions::default().with_page_width(Some(f64::from(page_width)))
}

fn read_string(env: &mut JNIEnv, value: &JString) -> Result<String> {
    env.get_string(value)
        .map(String::from)
        .map_err(|e| Error::InvalidData(format!("unreadable java string: {e}")))
}

/// Runs `render` and hands its SVG back to the JVM, or null on any error.
fn respond<'local, F>(env: &mut JNIEnv<'local>, render: F) -> jstring
where
    F: FnOnce(&mut JNIEnv<'local>) -> Result<String>,
{
    let svg = match render(env) {
        Ok(svg) => svg,
        Err(e) => {
            log::warn!("render failed: {e}");
            return std::ptr::null_mut();
        }
    };
    env.new_string(svg).map_or(std::ptr::null_mut(), |s| s.into_raw())
}

#[no_mangle]
pub extern "system" fn Java_com_scorelayout_ScoreLayout_renderFile(
    mut env: JNIEnv,
    _class: JClass,
    path: JString,
    page_width: jfloat,
) -> jstring {
    respond(&mut env, |env| {
        let path = read_string(env, &path)?;
        render_file_to_svg(path, &layout_options(page_width))
    })
}

#[no_mangle]
pub extern "system" fn Java_com_scorelayout_ScoreLayout_renderBytes(
    mut env: JNIEnv,
    _class: JClass,
    data: JByteArray,
    extension: JString,
    page_width: jfloat,
) -> jstring {
    respond(&mut env, |env| {
        let bytes = env
            .convert_byte_array(&data)
            .map_err(|e| Error::InvalidData(format!("unreadable byte array: {e}")))?;
        let hint = if extension.is_null() {
            None
        } else {
            Some(read_string(env, &extension)?)
        };
        render_bytes_to_svg(&bytes, hint.as_deref(), &layout_options(page_width))
    })
}
