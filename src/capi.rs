//! C ABI for host processes
//!
//! Every function is prefixed `statrt_`. Status-returning functions return
//! `STATUS_OK` on success and `STATUS_ERROR` on failure; the failure message,
//! when there is one, is left in the context's error slot for
//! `statrt_context_get_error`. Constructors return null on failure.
//!
//! A negative element count is a broken caller contract and aborts the
//! process after printing a diagnostic.
//!
//! ```text
//! cfg = statrt_context_config_new();
//! statrt_context_config_set_debugging(cfg, 1);
//! ctx = statrt_context_new(cfg);
//! arr = statrt_new_f64_1d(ctx, data, n);
//! statrt_entry_mean(ctx, &out, arr);
//! statrt_free_f64_1d(ctx, arr);
//! statrt_context_free(ctx);
//! statrt_context_config_free(cfg);
//! ```

use crate::config::ContextConfig;
use crate::entry::Statistic;
use crate::error::RuntimeError;
use crate::runtime::{ArrayF64, Context, ELEMENT_SIZE};
use std::ffi::CString;
use std::os::raw::{c_char, c_int};
use std::ptr;

/// Success status
pub const STATUS_OK: c_int = 0;
/// Failure status
pub const STATUS_ERROR: c_int = 1;

/// Print `err` and abort the process.
fn abort_fatal(err: &RuntimeError) -> ! {
    eprintln!("statrt: fatal: {}", err);
    std::process::abort()
}

fn negative_count(count: i64, tag: &str) -> RuntimeError {
    RuntimeError::NegativeAllocation {
        size: count.saturating_mul(ELEMENT_SIZE as i64),
        tag: tag.to_string(),
    }
}

/// Map a construction result to a raw pointer, aborting on fatal errors.
fn into_raw<T>(result: crate::Result<T>) -> *mut T {
    match result {
        Ok(value) => Box::into_raw(Box::new(value)),
        Err(err) if err.is_fatal() => abort_fatal(&err),
        Err(_) => ptr::null_mut(),
    }
}

fn status<T>(result: crate::Result<T>) -> c_int {
    match result {
        Ok(_) => STATUS_OK,
        Err(err) if err.is_fatal() => abort_fatal(&err),
        Err(_) => STATUS_ERROR,
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// Create a configuration with every flag off.
#[no_mangle]
pub extern "C" fn statrt_context_config_new() -> *mut ContextConfig {
    Box::into_raw(Box::new(ContextConfig::new()))
}

/// # Safety
/// `cfg` must be null or come from `statrt_context_config_new`, and must not
/// be used afterwards.
#[no_mangle]
pub unsafe extern "C" fn statrt_context_config_free(cfg: *mut ContextConfig) {
    if !cfg.is_null() {
        drop(Box::from_raw(cfg));
    }
}

/// # Safety
/// `cfg` must be null or a live configuration.
#[no_mangle]
pub unsafe extern "C" fn statrt_context_config_set_debugging(
    cfg: *mut ContextConfig,
    flag: c_int,
) {
    if let Some(cfg) = cfg.as_mut() {
        cfg.set_debugging(flag != 0);
    }
}

/// # Safety
/// `cfg` must be null or a live configuration.
#[no_mangle]
pub unsafe extern "C" fn statrt_context_config_set_logging(
    cfg: *mut ContextConfig,
    flag: c_int,
) {
    if let Some(cfg) = cfg.as_mut() {
        cfg.set_logging(flag != 0);
    }
}

// =============================================================================
// Context
// =============================================================================

/// Create a context from `cfg`. The configuration may be freed afterwards.
///
/// # Safety
/// `cfg` must be null or a live configuration.
#[no_mangle]
pub unsafe extern "C" fn statrt_context_new(cfg: *const ContextConfig) -> *mut Context {
    match cfg.as_ref() {
        Some(cfg) => Box::into_raw(Box::new(Context::new(cfg))),
        None => ptr::null_mut(),
    }
}

/// # Safety
/// `ctx` must be null or come from `statrt_context_new`, and must not be used
/// afterwards.
#[no_mangle]
pub unsafe extern "C" fn statrt_context_free(ctx: *mut Context) {
    if !ctx.is_null() {
        Box::from_raw(ctx).free();
    }
}

/// # Safety
/// `ctx` must be null or a live context.
#[no_mangle]
pub unsafe extern "C" fn statrt_context_sync(ctx: *mut Context) -> c_int {
    match ctx.as_ref() {
        Some(ctx) => status(ctx.sync()),
        None => STATUS_ERROR,
    }
}

/// Take the pending error message, or null if there is none.
///
/// The returned string must be released with `statrt_free_string`.
///
/// # Safety
/// `ctx` must be null or a live context.
#[no_mangle]
pub unsafe extern "C" fn statrt_context_get_error(ctx: *mut Context) -> *mut c_char {
    let message = match ctx.as_ref().and_then(|ctx| ctx.take_error()) {
        Some(message) => message,
        None => return ptr::null_mut(),
    };
    // Messages never contain interior NULs, but strip them rather than lose
    // the error.
    let message = message.replace('\0', " ");
    CString::new(message)
        .map(CString::into_raw)
        .unwrap_or(ptr::null_mut())
}

/// # Safety
/// `s` must be null or come from `statrt_context_get_error`.
#[no_mangle]
pub unsafe extern "C" fn statrt_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

/// Write the debugging report to stderr (silent unless debugging).
///
/// # Safety
/// `ctx` must be null or a live context.
#[no_mangle]
pub unsafe extern "C" fn statrt_debugging_report(ctx: *mut Context) {
    if let Some(ctx) = ctx.as_ref() {
        ctx.debugging_report();
    }
}

// =============================================================================
// Arrays
// =============================================================================

/// Create an array holding a copy of `dim0` values from `data`.
///
/// # Safety
/// `ctx` must be a live context; `data` must point to `dim0` readable f64s
/// (it may be null when `dim0` is 0).
#[no_mangle]
pub unsafe extern "C" fn statrt_new_f64_1d(
    ctx: *mut Context,
    data: *const f64,
    dim0: i64,
) -> *mut ArrayF64 {
    let ctx = match ctx.as_ref() {
        Some(ctx) => ctx,
        None => return ptr::null_mut(),
    };
    if dim0 < 0 {
        abort_fatal(&negative_count(dim0, "statrt_new_f64_1d"));
    }
    if data.is_null() && dim0 > 0 {
        return ptr::null_mut();
    }
    let values = if dim0 == 0 {
        &[][..]
    } else {
        std::slice::from_raw_parts(data, dim0 as usize)
    };
    into_raw(ctx.new_array(values))
}

/// Create an array of `dim0` f64s read from `data` starting at byte `offset`.
///
/// # Safety
/// `ctx` must be a live context; `data` must point to at least
/// `offset + dim0 * 8` readable bytes.
#[no_mangle]
pub unsafe extern "C" fn statrt_new_raw_f64_1d(
    ctx: *mut Context,
    data: *const u8,
    offset: i64,
    dim0: i64,
) -> *mut ArrayF64 {
    let ctx = match ctx.as_ref() {
        Some(ctx) => ctx,
        None => return ptr::null_mut(),
    };
    if dim0 < 0 {
        abort_fatal(&negative_count(dim0, "statrt_new_raw_f64_1d"));
    }
    if offset < 0 || (data.is_null() && dim0 > 0) {
        return ptr::null_mut();
    }
    let (offset, count) = (offset as usize, dim0 as usize);
    let len = match count
        .checked_mul(ELEMENT_SIZE)
        .and_then(|n| n.checked_add(offset))
    {
        Some(len) => len,
        None => return ptr::null_mut(),
    };
    let bytes = if len == 0 || data.is_null() {
        &[][..]
    } else {
        std::slice::from_raw_parts(data, len)
    };
    into_raw(ctx.new_array_from_raw(bytes, offset, count))
}

/// Free an array handle.
///
/// # Safety
/// `ctx` must be a live context; `arr` must come from one of the array
/// constructors and must not be used afterwards.
#[no_mangle]
pub unsafe extern "C" fn statrt_free_f64_1d(ctx: *mut Context, arr: *mut ArrayF64) -> c_int {
    match (ctx.as_ref(), arr.is_null()) {
        (Some(ctx), false) => status(ctx.free_array(*Box::from_raw(arr))),
        _ => STATUS_ERROR,
    }
}

/// Copy the array's values into `out`.
///
/// # Safety
/// `ctx` and `arr` must be live; `out` must have room for `shape[0]` f64s.
#[no_mangle]
pub unsafe extern "C" fn statrt_values_f64_1d(
    ctx: *mut Context,
    arr: *const ArrayF64,
    out: *mut f64,
) -> c_int {
    let (ctx, arr) = match (ctx.as_ref(), arr.as_ref()) {
        (Some(ctx), Some(arr)) => (ctx, arr),
        _ => return STATUS_ERROR,
    };
    if arr.is_empty() {
        return status(ctx.array_values(arr, &mut []));
    }
    if out.is_null() {
        return STATUS_ERROR;
    }
    let out = std::slice::from_raw_parts_mut(out, arr.len());
    status(ctx.array_values(arr, out))
}

/// Address of the array's storage. No copy and no locking.
///
/// # Safety
/// `arr` must be live. The pointer dangles once the array is freed.
#[no_mangle]
pub unsafe extern "C" fn statrt_values_raw_f64_1d(
    ctx: *mut Context,
    arr: *const ArrayF64,
) -> *const f64 {
    match (ctx.as_ref(), arr.as_ref()) {
        (Some(ctx), Some(arr)) => ctx.array_values_raw(arr),
        _ => ptr::null(),
    }
}

/// Pointer to the array's one-element shape vector.
///
/// # Safety
/// `arr` must be live. The pointer dangles once the array is freed.
#[no_mangle]
pub unsafe extern "C" fn statrt_shape_f64_1d(
    _ctx: *mut Context,
    arr: *const ArrayF64,
) -> *const i64 {
    match arr.as_ref() {
        Some(arr) => arr.shape_ref().as_ptr(),
        None => ptr::null(),
    }
}

// =============================================================================
// Entry points
// =============================================================================

unsafe fn run_entry(
    stat: Statistic,
    ctx: *mut Context,
    out: *mut f64,
    arr: *const ArrayF64,
) -> c_int {
    let (ctx, arr) = match (ctx.as_ref(), arr.as_ref()) {
        (Some(ctx), Some(arr)) => (ctx, arr),
        _ => return STATUS_ERROR,
    };
    if out.is_null() {
        return STATUS_ERROR;
    }
    match ctx.entry(stat, arr) {
        Ok(value) => {
            *out = value;
            STATUS_OK
        }
        Err(_) => STATUS_ERROR,
    }
}

/// # Safety
/// `ctx` and `arr` must be live; `out` must be writable.
#[no_mangle]
pub unsafe extern "C" fn statrt_entry_sum(
    ctx: *mut Context,
    out: *mut f64,
    arr: *const ArrayF64,
) -> c_int {
    run_entry(Statistic::Sum, ctx, out, arr)
}

/// # Safety
/// `ctx` and `arr` must be live; `out` must be writable.
#[no_mangle]
pub unsafe extern "C" fn statrt_entry_mean(
    ctx: *mut Context,
    out: *mut f64,
    arr: *const ArrayF64,
) -> c_int {
    run_entry(Statistic::Mean, ctx, out, arr)
}

/// # Safety
/// `ctx` and `arr` must be live; `out` must be writable.
#[no_mangle]
pub unsafe extern "C" fn statrt_entry_variance(
    ctx: *mut Context,
    out: *mut f64,
    arr: *const ArrayF64,
) -> c_int {
    run_entry(Statistic::Variance, ctx, out, arr)
}

/// # Safety
/// `ctx` and `arr` must be live; `out` must be writable.
#[no_mangle]
pub unsafe extern "C" fn statrt_entry_skew(
    ctx: *mut Context,
    out: *mut f64,
    arr: *const ArrayF64,
) -> c_int {
    run_entry(Statistic::Skew, ctx, out, arr)
}

/// # Safety
/// `ctx` and `arr` must be live; `out` must be writable.
#[no_mangle]
pub unsafe extern "C" fn statrt_entry_kurtosis(
    ctx: *mut Context,
    out: *mut f64,
    arr: *const ArrayF64,
) -> c_int {
    run_entry(Statistic::Kurtosis, ctx, out, arr)
}

/// # Safety
/// `ctx` and `arr` must be live; `out` must be writable.
#[no_mangle]
pub unsafe extern "C" fn statrt_entry_stddev(
    ctx: *mut Context,
    out: *mut f64,
    arr: *const ArrayF64,
) -> c_int {
    run_entry(Statistic::Stddev, ctx, out, arr)
}
