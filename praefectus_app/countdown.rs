use std::{
    io::{self, Write},
    time::Duration,
};

/// Sleeps for `seconds`, rewriting a "Sleeping for N seconds" line on stdout
/// every second and erasing it at the end.
pub async fn countdown(seconds: u64) {
    if seconds == 0 {
        return;
    }

    let mut stdout = io::stdout();
    for remaining in (1..=seconds).rev() {
        let _ = write!(stdout, "\rSleeping for {remaining} seconds");
        let _ = stdout.flush();
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    // Erase to end of line
    let _ = write!(stdout, "\r\x1b[K");
    let _ = stdout.flush();
}
