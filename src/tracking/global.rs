use std::sync::OnceLock;
use tracing::{trace, warn};

use super::DrainHandle;

pub static GLOBAL_DRAIN_HANDLE: OnceLock<DrainHandle> = OnceLock::new();

/// 注册全局落库句柄（只允许注册一次，重复注册被忽略）
pub fn set_global_drain_handle(handle: DrainHandle) {
    if GLOBAL_DRAIN_HANDLE.set(handle).is_err() {
        warn!("GLOBAL_DRAIN_HANDLE has already been set, ignoring");
    }
}

/// 获取全局落库句柄
pub fn get_drain_handle() -> Option<&'static DrainHandle> {
    match GLOBAL_DRAIN_HANDLE.get() {
        Some(handle) => Some(handle),
        None => {
            trace!("GLOBAL_DRAIN_HANDLE has not been initialized yet");
            None
        }
    }
}
