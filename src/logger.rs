//! 日志初始化
//!
//! 优先使用 `RUST_LOG`；未设置时默认 `info`，开启详细日志时为 `debug`。
//! 重复调用不会报错。

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub fn init() {
    init_with(false);
}

pub fn init_with(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let fmt_layer = fmt::layer().with_target(false).with_line_number(false);

    let _ = tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init();
}
