use std::time::{Duration, Instant};

/// 累计计时器，用于统计推理等阶段的总耗时。
#[derive(Clone)]
pub struct AccTimer {
    consumed: Duration,
    since: Instant,
}

impl AccTimer {
    /// 初始化计时器。初始化时视为已经调用过一次`self.start()`。
    #[inline]
    pub fn new() -> Self {
        Self {
            consumed: Duration::ZERO,
            since: Instant::now(),
        }
    }

    /// 开始一段计时。
    #[inline]
    pub fn start(&mut self) {
        self.since = Instant::now();
    }

    /// 结束一段计时并累计。上一次调用必须是`self.start()`，否则结果无意义。
    #[inline]
    pub fn elapsed(&mut self) {
        self.consumed += self.since.elapsed();
    }

    /// 在一段计时内执行`f`。
    pub fn time<T>(&mut self, f: impl FnOnce() -> T) -> T {
        self.start();
        let ret = f();
        self.elapsed();
        ret
    }

    /// 累计时间（毫秒）。
    #[inline]
    pub fn get_total_ms(&self) -> u64 {
        self.consumed.as_millis() as u64
    }
}

impl Default for AccTimer {
    fn default() -> Self {
        Self::new()
    }
}
