use tracing::Level;
use tracing_subscriber::EnvFilter;

/// 为调用方应用安装一个 fmt 订阅者。
/// `RUST_LOG` 优先；否则使用 `dracoon=<level>` 作为默认过滤条件。
/// 重复调用不会报错，已有全局订阅者时直接忽略。
pub fn init_logging(level: Level) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

fn default_directive(level: Level) -> String {
    format!("dracoon={}", level.as_str().to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_targets_crate() {
        assert_eq!(default_directive(Level::DEBUG), "dracoon=debug");
    }

    #[test]
    fn init_twice_is_harmless() {
        init_logging(Level::WARN);
        init_logging(Level::INFO);
    }
}
