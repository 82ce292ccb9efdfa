use std::{fmt::Display, time::Duration};
use tokio::time::sleep;
use tracing::{error, info};

/// Runs `f` until it succeeds or `max_retries` attempts were made, sleeping
/// `base_delay * 2^attempt` (saturating) between attempts. The last error is returned.
pub async fn retry_with_backoff<F, Fut, R, E>(
    mut f: F,
    max_retries: u8,
    base_delay: Duration,
) -> Result<R, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<R, E>>,
    E: Display,
{
    let mut curr_try: u8 = 1;
    loop {
        match f().await {
            Ok(v) => {
                return Ok(v);
            }
            Err(e) => {
                error!(error=%e,retry=%curr_try,"Error happened while running closure");
                if curr_try >= max_retries {
                    error!("Reached max retries return error");
                    return Err(e);
                }
            }
        }
        let sleep_duration = base_delay.saturating_mul(2u32.saturating_pow(curr_try as u32));
        curr_try += 1;
        info!(?sleep_duration, "Waiting before retry");
        sleep(sleep_duration).await;
    }
}
