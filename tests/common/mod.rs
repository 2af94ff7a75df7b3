#![allow(dead_code)]

pub use xbot_test_utils::builders;
pub use xbot_test_utils::fake_client::FakeClient;
pub use xbot_test_utils::fake_executor::FakeExecutor;
pub use xbot_test_utils::{init_tracing, with_timeout};

use std::time::Duration;

use xbot::log_buffer::LogBuffer;

/// Messages currently in `log`, newest first.
pub fn messages(log: &LogBuffer) -> Vec<String> {
    log.snapshot().into_iter().map(|e| e.message).collect()
}

/// Poll `cond` every 10ms until it holds or 5 seconds pass.
pub async fn wait_until<F>(mut cond: F)
where
    F: FnMut() -> bool,
{
    with_timeout(async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
}
