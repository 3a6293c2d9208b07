use log::LevelFilter;
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

/// 初始化终端日志，输出到 stderr 以免干扰进度行
pub fn init_logger(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let config = ConfigBuilder::new()
        .set_time_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Off)
        .build();
    // 重复初始化时保留已有的logger
    let _ = TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto);
}
