use crate::commands::view::dashboard;
use crate::commands::Out;
use crate::state::BudgetState;
use crate::store::StoreMode;
use crate::{Config, Result};
use anyhow::Context;
use tracing::{debug, info};

/// Shows the dashboard and redraws it each time another process changes the data, until Ctrl-C.
/// Returns the number of changes applied.
pub async fn watch(config: Config, mode: StoreMode) -> Result<Out<usize>> {
    let storage = config.storage(mode, true).await?;
    let mut state = BudgetState::load(storage).await;
    let limit = config.recent_limit();
    println!("{}", dashboard(&state, limit));
    info!(
        "Watching for changes every {}ms, press Ctrl-C to stop",
        config.watch_interval().as_millis()
    );

    let mut changes = 0;
    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("Unable to listen for Ctrl-C")?;
                break;
            }
            changed = state.next_external_change() => match changed {
                Some(key) => {
                    changes += 1;
                    debug!("'{key}' changed");
                    println!("\n{}", dashboard(&state, limit));
                }
                None => break,
            },
        }
    }
    state.close();

    Ok(Out::new(
        format!(
            "Stopped watching after {changes} change{}",
            if changes == 1 { "" } else { "s" }
        ),
        changes,
    ))
}
